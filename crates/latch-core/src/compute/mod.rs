mod backend;
pub mod cpu;
mod resource;
#[cfg(feature = "gpu")]
pub mod wgpu_backend;

pub(crate) use backend::check_launch_bounds;
pub use backend::{create_accelerator, Accelerator, DescriptorKernel, DevicePreference};
pub use resource::{
    AddressMode, DescriptorBuffer, DeviceBuffer, Extent, FilterMode, HostView, ImageResource,
    KeypointBuffer, ReadOnlyResource, ResourceDesc, ResourceKind, TableResource,
};
