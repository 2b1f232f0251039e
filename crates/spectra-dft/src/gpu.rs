use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::{oneside_size, validate_batch_size, validate_io, DftCompute, DftError, KernelVariant};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct DftParams {
    n: u32,
    oneside: u32,
    _padding: [u32; 2],
}

/// GPU transform session.
///
/// All backend resources are sized to the batch length at construction and
/// reused for every `execute` call; wgpu releases them when the session is
/// dropped, the error path included.
pub struct GpuDft {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    input_buffer: wgpu::Buffer,
    output_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    output_bytes: u64,
    batch_size: usize,
    oneside: usize,
}

impl GpuDft {
    pub fn new(batch_size: usize, variant: KernelVariant) -> Result<Self, DftError> {
        validate_batch_size(batch_size)?;
        pollster::block_on(Self::setup(batch_size, variant))
    }

    async fn setup(batch_size: usize, variant: KernelVariant) -> Result<Self, DftError> {
        let oneside = oneside_size(batch_size);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DftError::NoAdapter)?;

        tracing::info!("DFT compute adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("DFT Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("DFT Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("dft.wgsl").into()),
        });

        let input_bytes = (batch_size * std::mem::size_of::<f32>()) as u64;
        let output_bytes = (oneside * std::mem::size_of::<f32>()) as u64;

        let input_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DFT Input Buffer"),
            size: input_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DFT Output Buffer"),
            size: output_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DFT Staging Buffer"),
            size: output_bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params = DftParams {
            n: batch_size as u32,
            oneside: oneside as u32,
            _padding: [0; 2],
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("DFT Params Buffer"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("DFT Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("DFT Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: input_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("DFT Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let entry_point = match variant {
            KernelVariant::Power => "dft_power",
            KernelVariant::NormalizedPower => "dft_power_norm",
        };

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("DFT Compute Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point,
            compilation_options: Default::default(),
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group,
            input_buffer,
            output_buffer,
            staging_buffer,
            output_bytes,
            batch_size,
            oneside,
        })
    }
}

impl DftCompute for GpuDft {
    fn execute(&mut self, input: &[f32], oneside_power: &mut [f32]) -> Result<(), DftError> {
        validate_io(self.batch_size, input, oneside_power)?;

        self.queue
            .write_buffer(&self.input_buffer, 0, bytemuck::cast_slice(input));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("DFT Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("DFT Compute Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            // One invocation per one-sided bin, 64 threads per workgroup.
            let workgroups = (self.oneside as u32 + 63) / 64;
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(
            &self.output_buffer,
            0,
            &self.staging_buffer,
            0,
            self.output_bytes,
        );
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = self.staging_buffer.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);
        pollster::block_on(receiver)
            .map_err(|_| DftError::backend("readback channel cancelled"))?
            .map_err(|e| DftError::backend(format!("failed to map staging buffer: {e:?}")))?;

        {
            let data = buffer_slice.get_mapped_range();
            oneside_power.copy_from_slice(bytemuck::cast_slice(&data));
        }
        self.staging_buffer.unmap();

        Ok(())
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn oneside_size(&self) -> usize {
        self.oneside
    }
}
