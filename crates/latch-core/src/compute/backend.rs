use std::fmt;
use std::sync::Arc;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::keypoint::KernelKeypoint;
use crate::table::ConstantTable;

use super::cpu::CpuAccelerator;
use super::resource::{DescriptorBuffer, ImageResource, KeypointBuffer, ResourceDesc, TableResource};

/// Where descriptors are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevicePreference {
    /// GPU when one is available, otherwise CPU.
    #[default]
    Auto,
    Cpu,
    Gpu,
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Cpu => write!(f, "CPU"),
            Self::Gpu => write!(f, "GPU"),
        }
    }
}

/// Provisioning, transfer and synchronisation surface of an accelerator.
///
/// Uploads and downloads block until the transfer (and all work queued
/// before it) has completed. Kernel launches may run asynchronously on a
/// single in-order queue; `synchronize` waits for them.
pub trait Accelerator: Send + Sync {
    fn name(&self) -> &str;

    fn is_gpu(&self) -> bool {
        false
    }

    /// Upload the triplet table and bind it as a linear read-only resource.
    fn upload_table(&self, table: &ConstantTable, desc: ResourceDesc) -> Result<TableResource>;

    /// Upload the grayscale image and bind it as a 2D read-only resource.
    fn upload_image(&self, image: &GrayImage, desc: ResourceDesc) -> Result<ImageResource>;

    fn upload_keypoints(&self, keypoints: &[KernelKeypoint]) -> Result<KeypointBuffer>;

    /// Allocate storage for `count` descriptors (`64 * count` bytes).
    fn alloc_descriptors(&self, count: usize) -> Result<DescriptorBuffer>;

    fn download_descriptors(&self, buffer: &DescriptorBuffer) -> Result<Vec<Descriptor>>;

    /// Block until every queued launch has completed.
    fn synchronize(&self) -> Result<()>;

    /// Return and clear the last asynchronous error reported by the device.
    fn take_last_error(&self) -> Option<String>;

    /// The descriptor kernel bound to this accelerator.
    fn descriptor_kernel(&self) -> Result<Box<dyn DescriptorKernel>>;
}

/// The opaque descriptor computation.
///
/// Writes one descriptor per keypoint into `output[..count]`, overwriting
/// whatever was there. A returned `Ok` means the launch was issued; on
/// asynchronous accelerators failures surface later through
/// [`Accelerator::take_last_error`].
pub trait DescriptorKernel {
    fn name(&self) -> &str;

    fn compute_descriptors(
        &self,
        image: &ImageResource,
        triplets: &TableResource,
        keypoints: &KeypointBuffer,
        count: usize,
        output: &mut DescriptorBuffer,
    ) -> Result<()>;
}

/// Create the accelerator matching `preference`.
pub fn create_accelerator(preference: &DevicePreference) -> Result<Arc<dyn Accelerator>> {
    match preference {
        DevicePreference::Cpu => Ok(Arc::new(CpuAccelerator::new())),
        DevicePreference::Gpu => gpu_accelerator(),
        DevicePreference::Auto => gpu_accelerator().or_else(|e| {
            warn!(error = %e, "GPU unavailable, falling back to CPU");
            Ok(Arc::new(CpuAccelerator::new()) as Arc<dyn Accelerator>)
        }),
    }
}

#[cfg(feature = "gpu")]
fn gpu_accelerator() -> Result<Arc<dyn Accelerator>> {
    Ok(Arc::new(super::wgpu_backend::WgpuAccelerator::new()?))
}

#[cfg(not(feature = "gpu"))]
fn gpu_accelerator() -> Result<Arc<dyn Accelerator>> {
    Err(crate::error::LatchError::Device(
        "built without the `gpu` feature".into(),
    ))
}

/// Reject launches that would read or write past a buffer.
pub(crate) fn check_launch_bounds(
    keypoints: &KeypointBuffer,
    count: usize,
    output: &DescriptorBuffer,
) -> Result<()> {
    if count > keypoints.len() || count > output.len() {
        return Err(crate::error::LatchError::Launch(format!(
            "count {count} exceeds keypoint buffer ({}) or descriptor buffer ({})",
            keypoints.len(),
            output.len()
        )));
    }
    Ok(())
}
