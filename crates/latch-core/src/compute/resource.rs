use std::fmt;

use tracing::trace;

use crate::descriptor::Descriptor;
use crate::error::{LatchError, Result};
use crate::keypoint::KernelKeypoint;
use crate::table::Triplet;

/// Which accelerator resource an operation concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    TripletTable,
    Image,
    Keypoints,
    Descriptors,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TripletTable => write!(f, "triplet table"),
            Self::Image => write!(f, "image"),
            Self::Keypoints => write!(f, "keypoint buffer"),
            Self::Descriptors => write!(f, "descriptor buffer"),
        }
    }
}

/// Out-of-bounds policy of a bound resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressMode {
    /// Coordinates are clamped to the nearest edge texel.
    #[default]
    Clamp,
    /// Out-of-bounds reads return zero.
    Border,
}

impl AddressMode {
    /// Shader-side encoding.
    pub(crate) fn code(self) -> u32 {
        match self {
            Self::Clamp => 0,
            Self::Border => 1,
        }
    }
}

/// Sampling policy of a bound resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// Texels are returned verbatim.
    #[default]
    Point,
    /// Neighbouring texels are blended. Not available for integer resources.
    Linear,
}

/// Addressing and filtering contract a resource is bound with.
///
/// Coordinates are never normalized; reads return the element type unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceDesc {
    /// Per-axis addressing; linear resources only use axis 0.
    pub address: [AddressMode; 2],
    pub filter: FilterMode,
}

impl ResourceDesc {
    /// Linearly addressed, clamped, point-sampled (the triplet table binding).
    pub const fn linear_table() -> Self {
        Self {
            address: [AddressMode::Clamp, AddressMode::Clamp],
            filter: FilterMode::Point,
        }
    }

    /// 2D, clamped on both axes, point-sampled (the image binding).
    pub const fn planar_image() -> Self {
        Self {
            address: [AddressMode::Clamp, AddressMode::Clamp],
            filter: FilterMode::Point,
        }
    }

    /// Map a coordinate on `axis` into `0..extent`, or `None` for a border read.
    pub fn resolve(&self, axis: usize, coord: i64, extent: usize) -> Option<usize> {
        if extent == 0 {
            return None;
        }
        match self.address[axis] {
            AddressMode::Clamp => Some(coord.clamp(0, extent as i64 - 1) as usize),
            AddressMode::Border => {
                if coord < 0 || coord >= extent as i64 {
                    None
                } else {
                    Some(coord as usize)
                }
            }
        }
    }

    /// Integer resources are read as elements; blending them is meaningless.
    pub(crate) fn check_element_read(&self, resource: ResourceKind) -> Result<()> {
        match self.filter {
            FilterMode::Point => Ok(()),
            FilterMode::Linear => Err(LatchError::Binding {
                resource,
                reason: "integer elements require point filtering".into(),
            }),
        }
    }
}

/// Shape of a bound resource in elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extent {
    Linear(usize),
    Planar { width: usize, height: usize },
}

impl Extent {
    pub fn len(&self) -> usize {
        match *self {
            Self::Linear(n) => n,
            Self::Planar { width, height } => width * height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> usize {
        match *self {
            Self::Linear(n) => n,
            Self::Planar { width, .. } => width,
        }
    }

    pub fn height(&self) -> usize {
        match *self {
            Self::Linear(_) => 1,
            Self::Planar { height, .. } => height,
        }
    }
}

pub(crate) enum ResourceInner<T> {
    Host(Vec<T>),
    #[cfg(feature = "gpu")]
    Texture {
        texture: wgpu::Texture,
        view: wgpu::TextureView,
    },
}

/// Read-only resource bound on an accelerator. Owns its memory; dropping the
/// handle releases it.
pub struct ReadOnlyResource<T> {
    pub(crate) inner: ResourceInner<T>,
    kind: ResourceKind,
    extent: Extent,
    desc: ResourceDesc,
}

pub type ImageResource = ReadOnlyResource<u8>;
pub type TableResource = ReadOnlyResource<Triplet>;

impl<T> ReadOnlyResource<T> {
    pub(crate) fn host(kind: ResourceKind, texels: Vec<T>, extent: Extent, desc: ResourceDesc) -> Self {
        Self {
            inner: ResourceInner::Host(texels),
            kind,
            extent,
            desc,
        }
    }

    #[cfg(feature = "gpu")]
    pub(crate) fn texture(
        kind: ResourceKind,
        texture: wgpu::Texture,
        view: wgpu::TextureView,
        extent: Extent,
        desc: ResourceDesc,
    ) -> Self {
        Self {
            inner: ResourceInner::Texture { texture, view },
            kind,
            extent,
            desc,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn desc(&self) -> ResourceDesc {
        self.desc
    }

    /// Element access honouring the binding contract, for host-backed resources.
    pub fn host_view(&self) -> Option<HostView<'_, T>> {
        match &self.inner {
            ResourceInner::Host(texels) => Some(HostView {
                texels,
                extent: self.extent,
                desc: self.desc,
            }),
            #[cfg(feature = "gpu")]
            ResourceInner::Texture { .. } => None,
        }
    }
}

impl<T> Drop for ReadOnlyResource<T> {
    fn drop(&mut self) {
        #[cfg(feature = "gpu")]
        {
            if let ResourceInner::Texture { texture, .. } = &self.inner {
                texture.destroy();
            }
        }
        trace!(resource = %self.kind, elements = self.extent.len(), "Released");
    }
}

/// Borrowed host texels plus the addressing contract they were bound with.
#[derive(Clone, Copy)]
pub struct HostView<'a, T> {
    texels: &'a [T],
    extent: Extent,
    desc: ResourceDesc,
}

impl<T: Copy + Default> HostView<'_, T> {
    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn fetch_1d(&self, i: i64) -> T {
        match self.desc.resolve(0, i, self.extent.len()) {
            Some(idx) => self.texels[idx],
            None => T::default(),
        }
    }

    pub fn fetch_2d(&self, x: i64, y: i64) -> T {
        let width = self.extent.width();
        let col = self.desc.resolve(0, x, width);
        let row = self.desc.resolve(1, y, self.extent.height());
        match (col, row) {
            (Some(c), Some(r)) => self.texels[r * width + c],
            _ => T::default(),
        }
    }
}

pub(crate) enum BufferInner<T> {
    Host(Vec<T>),
    #[cfg(feature = "gpu")]
    Wgpu { buffer: wgpu::Buffer },
}

/// Linear accelerator buffer. Owns its memory; dropping the handle releases it.
pub struct DeviceBuffer<T> {
    pub(crate) inner: BufferInner<T>,
    kind: ResourceKind,
    len: usize,
}

pub type KeypointBuffer = DeviceBuffer<KernelKeypoint>;
pub type DescriptorBuffer = DeviceBuffer<Descriptor>;

impl<T> DeviceBuffer<T> {
    pub(crate) fn host(kind: ResourceKind, data: Vec<T>) -> Self {
        Self {
            len: data.len(),
            inner: BufferInner::Host(data),
            kind,
        }
    }

    #[cfg(feature = "gpu")]
    pub(crate) fn wgpu(kind: ResourceKind, buffer: wgpu::Buffer, len: usize) -> Self {
        Self {
            inner: BufferInner::Wgpu { buffer },
            kind,
            len,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }

    pub fn host_slice(&self) -> Option<&[T]> {
        match &self.inner {
            BufferInner::Host(data) => Some(data),
            #[cfg(feature = "gpu")]
            BufferInner::Wgpu { .. } => None,
        }
    }

    pub fn host_slice_mut(&mut self) -> Option<&mut [T]> {
        match &mut self.inner {
            BufferInner::Host(data) => Some(data),
            #[cfg(feature = "gpu")]
            BufferInner::Wgpu { .. } => None,
        }
    }
}

impl<T> Drop for DeviceBuffer<T> {
    fn drop(&mut self) {
        #[cfg(feature = "gpu")]
        {
            if let BufferInner::Wgpu { buffer } = &self.inner {
                buffer.destroy();
            }
        }
        trace!(resource = %self.kind, bytes = self.byte_len(), "Released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_clamp() {
        let desc = ResourceDesc::planar_image();
        assert_eq!(desc.resolve(0, -5, 10), Some(0));
        assert_eq!(desc.resolve(0, 4, 10), Some(4));
        assert_eq!(desc.resolve(1, 99, 10), Some(9));
        assert_eq!(desc.resolve(0, 0, 0), None);
    }

    #[test]
    fn test_resolve_border() {
        let desc = ResourceDesc {
            address: [AddressMode::Border, AddressMode::Border],
            filter: FilterMode::Point,
        };
        assert_eq!(desc.resolve(0, -1, 10), None);
        assert_eq!(desc.resolve(0, 10, 10), None);
        assert_eq!(desc.resolve(0, 9, 10), Some(9));
    }

    #[test]
    fn test_linear_filter_rejected() {
        let desc = ResourceDesc {
            filter: FilterMode::Linear,
            ..ResourceDesc::planar_image()
        };
        assert!(matches!(
            desc.check_element_read(ResourceKind::Image),
            Err(LatchError::Binding {
                resource: ResourceKind::Image,
                ..
            })
        ));
    }
}
