//! wgpu-based descriptor backend (Metal / Vulkan / DX12).

use std::sync::{Arc, Mutex};

use bytemuck::{Pod, Zeroable};
use image::GrayImage;
use tracing::{debug, info};
use wgpu::util::DeviceExt;

use crate::consts::{DESCRIPTOR_BYTES, DESCRIPTOR_WORDS};
use crate::descriptor::Descriptor;
use crate::error::{LatchError, Result};
use crate::keypoint::KernelKeypoint;
use crate::table::ConstantTable;

use super::resource::{
    BufferInner, DescriptorBuffer, DeviceBuffer, Extent, ImageResource, KeypointBuffer,
    ReadOnlyResource, ResourceDesc, ResourceInner, ResourceKind, TableResource,
};
use super::{check_launch_bounds, Accelerator, DescriptorKernel};

const BACKEND_NAME: &str = "wgpu";

/// Upper bound on workgroups per dispatch dimension.
const MAX_GROUPS_PER_DIM: u32 = 65_535;

// ---------------------------------------------------------------------------
// Uniform parameter struct (must match the WGSL layout exactly)
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct LatchParams {
    count: u32,
    groups_x: u32,
    image_address_x: u32,
    image_address_y: u32,
    table_address: u32,
    table_len: u32,
    _pad: [u32; 2],
}

type ErrorSink = Arc<Mutex<Option<String>>>;

fn provision_err(resource: ResourceKind, reason: impl Into<String>) -> LatchError {
    LatchError::Provision {
        resource,
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// WgpuAccelerator
// ---------------------------------------------------------------------------

pub struct WgpuAccelerator {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    adapter_name: String,
    errors: ErrorSink,
    latch_pipeline: Arc<wgpu::ComputePipeline>,
}

impl WgpuAccelerator {
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| LatchError::Device(format!("No suitable GPU adapter found: {e}")))?;

        let adapter_name = adapter.get_info().name.clone();
        info!("GPU adapter: {adapter_name}");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("latch"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
        ))
        .map_err(|e| LatchError::Device(format!("Failed to create GPU device: {e}")))?;

        let errors: ErrorSink = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&errors);
        device.on_uncaptured_error(Arc::new(move |err: wgpu::Error| {
            if let Ok(mut slot) = sink.lock() {
                slot.get_or_insert_with(|| err.to_string());
            }
        }));

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("latch"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/latch.wgsl").into()),
        });
        let latch_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("latch"),
            layout: None,
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let accelerator = Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            errors,
            latch_pipeline: Arc::new(latch_pipeline),
        };
        if let Some(e) = accelerator.take_last_error() {
            return Err(LatchError::Device(format!("LATCH shader rejected: {e}")));
        }
        Ok(accelerator)
    }

    fn wait_idle(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| LatchError::Device(e.to_string()))
    }

    /// Flush pending uploads and turn any device error into a provisioning
    /// failure for `resource`.
    fn check_provisioned(&self, resource: ResourceKind) -> Result<()> {
        self.wait_idle()
            .map_err(|e| provision_err(resource, e.to_string()))?;
        match self.take_last_error() {
            Some(reason) => Err(provision_err(resource, reason)),
            None => Ok(()),
        }
    }

    fn create_texture(
        &self,
        label: &str,
        dimension: wgpu::TextureDimension,
        format: wgpu::TextureFormat,
        size: wgpu::Extent3d,
    ) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn write_texture(&self, texture: &wgpu::Texture, data: &[u8], bytes_per_row: u32, size: wgpu::Extent3d) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size.height),
            },
            size,
        );
    }
}

impl Accelerator for WgpuAccelerator {
    fn name(&self) -> &str {
        &self.adapter_name
    }

    fn is_gpu(&self) -> bool {
        true
    }

    fn upload_table(&self, table: &ConstantTable, desc: ResourceDesc) -> Result<TableResource> {
        let resource = ResourceKind::TripletTable;
        desc.check_element_read(resource)?;
        let len = table.len() as u32;
        let max = self.device.limits().max_texture_dimension_1d;
        if len == 0 || len > max {
            return Err(provision_err(
                resource,
                format!("{len} entries outside 1..={max}"),
            ));
        }

        // Four 16-bit unsigned channels per entry, fetched verbatim.
        let size = wgpu::Extent3d {
            width: len,
            height: 1,
            depth_or_array_layers: 1,
        };
        let texture = self.create_texture(
            "latch::triplets",
            wgpu::TextureDimension::D1,
            wgpu::TextureFormat::Rgba16Uint,
            size,
        );
        self.write_texture(
            &texture,
            bytemuck::cast_slice(table.entries()),
            len * 8,
            size,
        );
        self.check_provisioned(resource)?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        debug!(entries = len, bytes = table.byte_len(), "Triplet table bound");
        Ok(ReadOnlyResource::texture(
            resource,
            texture,
            view,
            Extent::Linear(table.len()),
            desc,
        ))
    }

    fn upload_image(&self, image: &GrayImage, desc: ResourceDesc) -> Result<ImageResource> {
        let resource = ResourceKind::Image;
        desc.check_element_read(resource)?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(provision_err(resource, format!("empty {width}x{height} image")));
        }
        let expected = width as usize * height as usize;
        let texels = image.as_raw().get(..expected).ok_or_else(|| {
            provision_err(
                resource,
                format!("expected {expected} bytes, got {}", image.as_raw().len()),
            )
        })?;
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(provision_err(
                resource,
                format!("{width}x{height} exceeds the {max} texel texture limit"),
            ));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.create_texture(
            "latch::image",
            wgpu::TextureDimension::D2,
            wgpu::TextureFormat::R8Uint,
            size,
        );
        self.write_texture(&texture, texels, width, size);
        self.check_provisioned(resource)?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        debug!(width, height, "Image bound");
        Ok(ReadOnlyResource::texture(
            resource,
            texture,
            view,
            Extent::Planar {
                width: width as usize,
                height: height as usize,
            },
            desc,
        ))
    }

    fn upload_keypoints(&self, keypoints: &[KernelKeypoint]) -> Result<KeypointBuffer> {
        let resource = ResourceKind::Keypoints;
        if keypoints.is_empty() {
            return Err(provision_err(resource, "no keypoints to upload"));
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("latch::keypoints"),
                contents: bytemuck::cast_slice(keypoints),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            });
        self.check_provisioned(resource)?;
        Ok(DeviceBuffer::wgpu(resource, buffer, keypoints.len()))
    }

    fn alloc_descriptors(&self, count: usize) -> Result<DescriptorBuffer> {
        let resource = ResourceKind::Descriptors;
        let size = (count * DESCRIPTOR_BYTES) as u64;
        let max = self.device.limits().max_storage_buffer_binding_size as u64;
        if count == 0 || size > max {
            return Err(provision_err(
                resource,
                format!("{size} bytes outside 1..={max}"),
            ));
        }
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("latch::descriptors"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        self.check_provisioned(resource)?;
        Ok(DeviceBuffer::wgpu(resource, buffer, count))
    }

    fn download_descriptors(&self, buffer: &DescriptorBuffer) -> Result<Vec<Descriptor>> {
        let BufferInner::Wgpu { buffer: source } = &buffer.inner else {
            return Err(LatchError::ForeignResource {
                backend: BACKEND_NAME,
            });
        };
        let size = buffer.byte_len() as u64;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("latch::readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut enc = self.device.create_command_encoder(&Default::default());
        enc.copy_buffer_to_buffer(source, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(enc.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        slice.map_async(wgpu::MapMode::Read, move |r| {
            tx.send(r).ok();
        });
        self.wait_idle()?;
        rx.recv()
            .map_err(|_| LatchError::Device("GPU channel closed".into()))?
            .map_err(|e| LatchError::Device(format!("Buffer mapping failed: {e}")))?;

        let data = slice.get_mapped_range();
        let descriptors = data
            .chunks_exact(DESCRIPTOR_BYTES)
            .map(|chunk| {
                let mut words = [0u64; DESCRIPTOR_WORDS];
                for (word, bytes) in words.iter_mut().zip(chunk.chunks_exact(8)) {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(bytes);
                    *word = u64::from_le_bytes(raw);
                }
                Descriptor(words)
            })
            .collect();
        drop(data);
        staging.unmap();
        Ok(descriptors)
    }

    fn synchronize(&self) -> Result<()> {
        self.wait_idle()
    }

    fn take_last_error(&self) -> Option<String> {
        self.errors.lock().ok().and_then(|mut slot| slot.take())
    }

    fn descriptor_kernel(&self) -> Result<Box<dyn DescriptorKernel>> {
        Ok(Box::new(WgpuLatchKernel {
            device: Arc::clone(&self.device),
            queue: Arc::clone(&self.queue),
            pipeline: Arc::clone(&self.latch_pipeline),
        }))
    }
}

// ---------------------------------------------------------------------------
// WgpuLatchKernel
// ---------------------------------------------------------------------------

/// LATCH compute shader. Each launch is one `queue.submit`; launches are
/// ordered on the device queue and not waited for.
pub struct WgpuLatchKernel {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: Arc<wgpu::ComputePipeline>,
}

impl DescriptorKernel for WgpuLatchKernel {
    fn name(&self) -> &str {
        "LATCH (wgpu)"
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
        let ResourceInner::Texture { view: image_view, .. } = &image.inner else {
            return Err(foreign());
        };
        let ResourceInner::Texture { view: table_view, .. } = &triplets.inner else {
            return Err(foreign());
        };
        let BufferInner::Wgpu { buffer: kp_buf } = &keypoints.inner else {
            return Err(foreign());
        };
        let BufferInner::Wgpu { buffer: out_buf } = &output.inner else {
            return Err(foreign());
        };

        let groups = count as u32;
        let groups_x = groups.min(MAX_GROUPS_PER_DIM);
        let groups_y = groups.div_ceil(groups_x);
        let image_desc = image.desc();
        let params = LatchParams {
            count: groups,
            groups_x,
            image_address_x: image_desc.address[0].code(),
            image_address_y: image_desc.address[1].code(),
            table_address: triplets.desc().address[0].code(),
            table_len: triplets.extent().len() as u32,
            _pad: [0; 2],
        };
        let uniform = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("latch::params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let layout = self.pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("latch"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(image_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(table_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: kp_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: out_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: uniform.as_entire_binding(),
                },
            ],
        });

        let mut enc = self.device.create_command_encoder(&Default::default());
        {
            let mut pass = enc.begin_compute_pass(&Default::default());
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        self.queue.submit(std::iter::once(enc.finish()));
        Ok(())
    }
}
