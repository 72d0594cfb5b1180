//! Batched 1D FFT on wgpu compute shaders (Metal / Vulkan / DX12).

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use num_complex::Complex32;
use wgpu::util::DeviceExt;

use crate::consts::GPU_FFT_WORKGROUP_SIZE;
use crate::error::{Result, SkyshiftError};

use super::backend::{check_batch_buffers, BatchFftBackend, BatchFftKernel, BatchShape, FftDirection};

// Radix-2 Stockham autosort, one dispatch per stage. Thread t handles one
// butterfly of batch t / (n/2); results land in natural order after log2(n)
// stages of ping-pong between `src` and `dst`.
const FFT_STOCKHAM_WGSL: &str = r"
struct Params {
    n: u32,
    stage: u32,
    direction: f32,
    batch_count: u32,
    batch_stride: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}
@group(0) @binding(0) var<storage, read>       src:    array<vec2<f32>>;
@group(0) @binding(1) var<storage, read_write> dst:    array<vec2<f32>>;
@group(0) @binding(2) var<uniform>             params: Params;
const TAU: f32 = 6.283185307179586;
@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let half = params.n / 2u;
    if gid.x >= half * params.batch_count { return; }
    let base = (gid.x / half) * params.batch_stride;
    let j = gid.x % half;
    let s = 1u << params.stage;
    let n_k = params.n >> params.stage;
    let p = j / s;
    let q = j % s;
    let a = src[base + q + s * p];
    let b = src[base + q + s * (p + n_k / 2u)];
    let angle = -params.direction * TAU * f32(p) / f32(n_k);
    let w = vec2<f32>(cos(angle), sin(angle));
    let d = a - b;
    dst[base + q + s * (2u * p)] = a + b;
    dst[base + q + s * (2u * p + 1u)] = vec2<f32>(d.x * w.x - d.y * w.y, d.x * w.y + d.y * w.x);
}
";

/// Uniform block of the FFT shader, padded to 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FftParams {
    n: u32,
    stage: u32,
    direction: f32,
    batch_count: u32,
    batch_stride: u32,
    _pad: [u32; 3],
}

const fn div_ceil(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

const COMPLEX_BYTES: u64 = 8;

pub struct WgpuBatchFft {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    name: String,
    pipeline: Arc<wgpu::ComputePipeline>,
}

impl WgpuBatchFft {
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| SkyshiftError::HardwareUnavailable(format!("no suitable GPU adapter: {e}")))?;

        let adapter_name = adapter.get_info().name.clone();
        tracing::info!("GPU adapter: {adapter_name}");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("skyshift"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
        ))
        .map_err(|e| SkyshiftError::HardwareUnavailable(format!("GPU device: {e}")))?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fft_stockham"),
            source: wgpu::ShaderSource::Wgsl(FFT_STOCKHAM_WGSL.into()),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("fft_stockham"),
            layout: None,
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            name: format!("wgpu/{adapter_name}"),
            pipeline: Arc::new(pipeline),
        })
    }

    fn create_storage(&self, byte_size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: byte_size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_uniform<T: Pod>(&self, data: &T) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: None,
                contents: bytemuck::bytes_of(data),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
    }
}

impl BatchFftBackend for WgpuBatchFft {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_hardware(&self) -> bool {
        true
    }

    fn prepare(&self, shape: BatchShape) -> Result<Box<dyn BatchFftKernel>> {
        if shape.log2_n == 0 {
            return Err(SkyshiftError::HardwareUnavailable(
                "GPU FFT needs at least 2 points".into(),
            ));
        }
        let n = shape.len();
        let step = n;
        let limits = self.device.limits();

        let byte_size = (step * shape.batch) as u64 * COMPLEX_BYTES;
        if byte_size > u64::from(limits.max_storage_buffer_binding_size) {
            return Err(SkyshiftError::HardwareUnavailable(format!(
                "{}x{n} batch ({byte_size} bytes) exceeds the device storage binding limit",
                shape.batch
            )));
        }
        let butterflies = (n / 2 * shape.batch) as u32;
        if div_ceil(butterflies, GPU_FFT_WORKGROUP_SIZE) > limits.max_compute_workgroups_per_dimension
        {
            return Err(SkyshiftError::HardwareUnavailable(format!(
                "{}x{n} batch needs more workgroups than the device allows",
                shape.batch
            )));
        }

        let direction = match shape.direction {
            FftDirection::Forward => 1.0,
            FftDirection::Inverse => -1.0,
        };
        let stage_uniforms = (0..shape.log2_n)
            .map(|stage| {
                self.create_uniform(&FftParams {
                    n: n as u32,
                    stage,
                    direction,
                    batch_count: shape.batch as u32,
                    batch_stride: step as u32,
                    _pad: [0; 3],
                })
            })
            .collect();

        Ok(Box::new(WgpuKernel {
            device: Arc::clone(&self.device),
            queue: Arc::clone(&self.queue),
            pipeline: Arc::clone(&self.pipeline),
            shape,
            step,
            direction,
            buf_a: self.create_storage(byte_size),
            buf_b: self.create_storage(byte_size),
            staging: self.device.create_buffer(&wgpu::BufferDescriptor {
                label: None,
                size: byte_size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            stage_uniforms,
            host: Vec::new(),
        }))
    }
}

/// Device buffers for one batch shape, allocated once in `prepare`.
struct WgpuKernel {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: Arc<wgpu::ComputePipeline>,
    shape: BatchShape,
    step: usize,
    direction: f32,
    buf_a: wgpu::Buffer,
    buf_b: wgpu::Buffer,
    staging: wgpu::Buffer,
    stage_uniforms: Vec<wgpu::Buffer>,
    host: Vec<f32>,
}

impl WgpuKernel {
    fn download(&self, byte_size: u64) -> Result<Vec<f32>> {
        let slice = self.staging.slice(..byte_size);
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        slice.map_async(wgpu::MapMode::Read, move |r| {
            tx.send(r).ok();
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| SkyshiftError::Backend(format!("GPU poll failed: {e}")))?;
        rx.recv()
            .map_err(|_| SkyshiftError::Backend("GPU channel closed".into()))?
            .map_err(|e| SkyshiftError::Backend(format!("buffer mapping failed: {e}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        self.staging.unmap();
        Ok(result)
    }
}

impl BatchFftKernel for WgpuKernel {
    fn shape(&self) -> BatchShape {
        self.shape
    }

    fn step(&self) -> usize {
        self.step
    }

    fn execute(
        &mut self,
        input: &[Complex32],
        output: &mut [Complex32],
        rows: usize,
    ) -> Result<()> {
        check_batch_buffers(self.shape, self.step, input, output, rows)?;
        if rows == 0 {
            return Ok(());
        }
        let n = self.shape.len();
        let elements = rows * self.step;
        let byte_size = elements as u64 * COMPLEX_BYTES;

        self.host.clear();
        self.host
            .extend(input[..elements].iter().flat_map(|c| [c.re, c.im]));
        self.queue
            .write_buffer(&self.buf_a, 0, bytemuck::cast_slice(&self.host));

        for (stage, uniform) in self.stage_uniforms.iter().enumerate() {
            let params = FftParams {
                n: n as u32,
                stage: stage as u32,
                direction: self.direction,
                batch_count: rows as u32,
                batch_stride: self.step as u32,
                _pad: [0; 3],
            };
            self.queue.write_buffer(uniform, 0, bytemuck::bytes_of(&params));
        }

        let layout = self.pipeline.get_bind_group_layout(0);
        let wg_x = div_ceil((n / 2 * rows) as u32, GPU_FFT_WORKGROUP_SIZE);
        let mut enc = self.device.create_command_encoder(&Default::default());
        for (stage, uniform) in self.stage_uniforms.iter().enumerate() {
            let (src, dst) = if stage % 2 == 0 {
                (&self.buf_a, &self.buf_b)
            } else {
                (&self.buf_b, &self.buf_a)
            };
            let bg = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: None,
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: src.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: dst.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniform.as_entire_binding(),
                    },
                ],
            });
            let mut pass = enc.begin_compute_pass(&Default::default());
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bg, &[]);
            pass.dispatch_workgroups(wg_x, 1, 1);
        }

        // Even stage count ends in buf_a, odd in buf_b.
        let result = if self.stage_uniforms.len() % 2 == 0 {
            &self.buf_a
        } else {
            &self.buf_b
        };
        enc.copy_buffer_to_buffer(result, 0, &self.staging, 0, byte_size);
        self.queue.submit(std::iter::once(enc.finish()));

        let floats = self.download(byte_size)?;
        for b in 0..rows {
            let start = b * self.step;
            for (k, dst) in output[start..start + n].iter_mut().enumerate() {
                let i = 2 * (start + k);
                *dst = Complex32::new(floats[i], floats[i + 1]);
            }
        }
        Ok(())
    }
}
