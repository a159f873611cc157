use image::GrayImage;
use rayon::prelude::*;

use crate::consts::{
    LATCH_PATCH_HALF, LATCH_REFERENCE_SIZE, LATCH_WINDOW, TRIPLET_COUNT,
};
use crate::descriptor::Descriptor;
use crate::error::{LatchError, Result};
use crate::keypoint::KernelKeypoint;
use crate::table::{unpack_point, ConstantTable, Triplet};

use super::resource::{
    DescriptorBuffer, DeviceBuffer, Extent, HostView, ImageResource, KeypointBuffer,
    ReadOnlyResource, ResourceDesc, ResourceKind, TableResource,
};
use super::{check_launch_bounds, Accelerator, DescriptorKernel};

const BACKEND_NAME: &str = "CPU/Rayon";

/// Host memory standing in for accelerator memory; launches run synchronously
/// on the Rayon pool.
#[derive(Debug, Default)]
pub struct CpuAccelerator;

impl CpuAccelerator {
    pub fn new() -> Self {
        Self
    }
}

impl Accelerator for CpuAccelerator {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn upload_table(&self, table: &ConstantTable, desc: ResourceDesc) -> Result<TableResource> {
        desc.check_element_read(ResourceKind::TripletTable)?;
        Ok(ReadOnlyResource::host(
            ResourceKind::TripletTable,
            table.entries().to_vec(),
            Extent::Linear(table.len()),
            desc,
        ))
    }

    fn upload_image(&self, image: &GrayImage, desc: ResourceDesc) -> Result<ImageResource> {
        desc.check_element_read(ResourceKind::Image)?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(LatchError::Provision {
                resource: ResourceKind::Image,
                reason: format!("empty {width}x{height} image"),
            });
        }
        // The container may hold more than width * height bytes.
        let expected = width as usize * height as usize;
        let texels = image
            .as_raw()
            .get(..expected)
            .ok_or_else(|| LatchError::Provision {
                resource: ResourceKind::Image,
                reason: format!("expected {expected} bytes, got {}", image.as_raw().len()),
            })?
            .to_vec();
        Ok(ReadOnlyResource::host(
            ResourceKind::Image,
            texels,
            Extent::Planar {
                width: width as usize,
                height: height as usize,
            },
            desc,
        ))
    }

    fn upload_keypoints(&self, keypoints: &[KernelKeypoint]) -> Result<KeypointBuffer> {
        Ok(DeviceBuffer::host(ResourceKind::Keypoints, keypoints.to_vec()))
    }

    fn alloc_descriptors(&self, count: usize) -> Result<DescriptorBuffer> {
        Ok(DeviceBuffer::host(
            ResourceKind::Descriptors,
            vec![Descriptor::default(); count],
        ))
    }

    fn download_descriptors(&self, buffer: &DescriptorBuffer) -> Result<Vec<Descriptor>> {
        buffer
            .host_slice()
            .map(<[Descriptor]>::to_vec)
            .ok_or(LatchError::ForeignResource {
                backend: BACKEND_NAME,
            })
    }

    fn synchronize(&self) -> Result<()> {
        Ok(())
    }

    fn take_last_error(&self) -> Option<String> {
        None
    }

    fn descriptor_kernel(&self) -> Result<Box<dyn DescriptorKernel>> {
        Ok(Box::new(CpuLatchKernel))
    }
}

/// Reference LATCH kernel over host-backed resources.
#[derive(Debug, Default)]
pub struct CpuLatchKernel;

impl DescriptorKernel for CpuLatchKernel {
    fn name(&self) -> &str {
        "LATCH (CPU reference)"
    }

    fn compute_descriptors(
        &self,
        image: &ImageResource,
        triplets: &TableResource,
        keypoints: &KeypointBuffer,
        count: usize,
        output: &mut DescriptorBuffer,
    ) -> Result<()> {
        check_launch_bounds(keypoints, count, output)?;
        if count == 0 {
            return Ok(());
        }
        let foreign = || LatchError::ForeignResource {
            backend: BACKEND_NAME,
        };
        let image = image.host_view().ok_or_else(foreign)?;
        let table = triplets.host_view().ok_or_else(foreign)?;
        let kps = keypoints.host_slice().ok_or_else(foreign)?;
        let out = output.host_slice_mut().ok_or_else(foreign)?;

        out[..count]
            .par_iter_mut()
            .zip(kps[..count].par_iter())
            .for_each(|(desc, kp)| *desc = latch_descriptor(&image, &table, kp));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LATCH reference
// ---------------------------------------------------------------------------

const WINDOW_AREA: usize = LATCH_WINDOW * LATCH_WINDOW;

/// Compute one descriptor: bit `i` is set when the anchor patch of triplet
/// `i` is further (SSD) from its first companion than from its second.
pub fn latch_descriptor(
    image: &HostView<'_, u8>,
    table: &HostView<'_, Triplet>,
    kp: &KernelKeypoint,
) -> Descriptor {
    let window = warp_window(image, kp);
    let mut desc = Descriptor::default();
    for bit in 0..TRIPLET_COUNT {
        let [anchor, first, second, _] = table.fetch_1d(bit as i64);
        let anchor = window_center(anchor);
        let ssd_first = patch_ssd(&window, anchor, window_center(first));
        let ssd_second = patch_ssd(&window, anchor, window_center(second));
        if ssd_first > ssd_second {
            desc.set_bit(bit);
        }
    }
    desc
}

/// Sample the rotated, scaled window around `kp` with nearest-texel reads.
fn warp_window(image: &HostView<'_, u8>, kp: &KernelKeypoint) -> [i32; WINDOW_AREA] {
    let scale = kp.scale / LATCH_REFERENCE_SIZE;
    let (sin, cos) = kp.angle.sin_cos();
    let half = LATCH_WINDOW as f32 * 0.5 - 0.5;

    let mut window = [0i32; WINDOW_AREA];
    for (i, texel) in window.iter_mut().enumerate() {
        let lx = ((i % LATCH_WINDOW) as f32 - half) * scale;
        let ly = ((i / LATCH_WINDOW) as f32 - half) * scale;
        let px = kp.x + cos * lx - sin * ly;
        let py = kp.y + sin * lx + cos * ly;
        *texel = image.fetch_2d((px + 0.5).floor() as i64, (py + 0.5).floor() as i64) as i32;
    }
    window
}

/// Window coordinates of a packed point, clamped so the mini-patch fits.
fn window_center(packed: u16) -> (usize, usize) {
    let (x, y) = unpack_point(packed);
    let lo = LATCH_PATCH_HALF;
    let hi = LATCH_WINDOW - 1 - LATCH_PATCH_HALF;
    (x.clamp(lo, hi), y.clamp(lo, hi))
}

fn patch_ssd(window: &[i32; WINDOW_AREA], p: (usize, usize), q: (usize, usize)) -> i32 {
    let mut sum = 0i32;
    for dy in 0..=2 * LATCH_PATCH_HALF {
        let row_p = (p.1 + dy - LATCH_PATCH_HALF) * LATCH_WINDOW;
        let row_q = (q.1 + dy - LATCH_PATCH_HALF) * LATCH_WINDOW;
        for dx in 0..=2 * LATCH_PATCH_HALF {
            let d = window[row_p + p.0 + dx - LATCH_PATCH_HALF]
                - window[row_q + q.0 + dx - LATCH_PATCH_HALF];
            sum += d * d;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_center_clamps_out_of_range_points() {
        assert_eq!(window_center(0), (3, 3));
        assert_eq!(window_center(0xffff), (28, 28));
        assert_eq!(window_center(0x0a0b), (11, 10));
    }

    #[test]
    fn test_patch_ssd_identical_patches() {
        let mut window = [0i32; WINDOW_AREA];
        for (i, v) in window.iter_mut().enumerate() {
            *v = (i % 17) as i32;
        }
        assert_eq!(patch_ssd(&window, (10, 10), (10, 10)), 0);
        assert!(patch_ssd(&window, (10, 10), (11, 10)) > 0);
    }
}
