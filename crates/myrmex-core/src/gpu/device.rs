use wgpu::{Adapter, Device, Instance, Queue, RequestAdapterOptions};
use wgpu::util::DeviceExt;

/// GPU device manager for headless compute operations.
///
/// The interactive viewer builds its own device against a surface; this type
/// covers the headless runner and the integration tests, which only need
/// compute and readback.
pub struct GpuDevice {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl GpuDevice {
    /// Create a new GPU device for headless compute.
    ///
    /// Returns `None` when no suitable adapter exists (e.g. CI machines
    /// without a GPU or software rasterizer); callers decide whether that is
    /// fatal or a reason to skip.
    pub async fn new() -> Option<Self> {
        let instance = Instance::default();

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    // Read-write storage textures (the deposit step's trail
                    // binding) need this native-only feature.
                    required_features: wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
                    required_limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await
            .ok()?;

        Some(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Get device info for logging.
    pub fn info(&self) -> String {
        let info = self.adapter.get_info();
        format!("GPU: {} ({:?})", info.name, info.backend)
    }

    /// Create a buffer with initial data.
    pub fn create_buffer_with_data<T: bytemuck::Pod>(
        &self,
        label: &str,
        usage: wgpu::BufferUsages,
        data: &[T],
    ) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage,
            })
    }

    /// Wait for all submitted GPU work to complete.
    pub fn wait(&self) {
        self.queue.on_submitted_work_done(|| {});
        self.device.poll(wgpu::Maintain::Wait);
    }
}

/// Copy an `R32Float` texture back to the CPU as a row-major `Vec<f32>`.
///
/// Blocks until the copy completes. Only used by the headless runner and the
/// integration tests; the frame loop never reads textures back.
pub fn read_texture_r32f(
    device: &Device,
    queue: &Queue,
    texture: &wgpu::Texture,
    size: [u32; 2],
) -> Vec<f32> {
    let bytes_per_pixel = 4u32;
    let unpadded_bpr = size[0] * bytes_per_pixel;
    let padded_bpr = ((unpadded_bpr + 255) / 256) * 256; // COPY_BYTES_PER_ROW_ALIGNMENT

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("texture_readback_staging"),
        size: (padded_bpr * size[1]) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("texture_readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(size[1]),
            },
        },
        wgpu::Extent3d {
            width: size[0],
            height: size[1],
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    staging.slice(..).map_async(wgpu::MapMode::Read, |_| {});
    device.poll(wgpu::Maintain::Wait);

    let data = staging.slice(..).get_mapped_range();
    let mut out = Vec::with_capacity((size[0] * size[1]) as usize);
    for row in 0..size[1] {
        let start = (row * padded_bpr) as usize;
        let end = start + unpadded_bpr as usize;
        out.extend(
            data[start..end]
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])),
        );
    }
    drop(data);
    staging.unmap();

    out
}

/// Copy a storage buffer back to the CPU. Blocks until the copy completes.
pub fn read_buffer<T: bytemuck::Pod>(
    device: &Device,
    queue: &Queue,
    buffer: &wgpu::Buffer,
    len: usize,
) -> Vec<T> {
    let byte_len = (len * std::mem::size_of::<T>()) as u64;
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("buffer_readback_staging"),
        size: byte_len,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("buffer_readback_encoder"),
    });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, byte_len);
    queue.submit(Some(encoder.finish()));

    staging.slice(..).map_async(wgpu::MapMode::Read, |_| {});
    device.poll(wgpu::Maintain::Wait);

    let data = staging.slice(..).get_mapped_range();
    let out = bytemuck::cast_slice(&data).to_vec();
    drop(data);
    staging.unmap();

    out
}
