use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::{Device, Queue};

use crate::gpu::pipelines::{workgroups_for, PassPipelines, WORKGROUP_1D};
use myrmex_params::SeedParams;

/// Particle state as laid out in the GPU buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Particle {
    pub pos: [f32; 2],
    /// Heading in radians.
    pub angle: f32,
    pub _pad: f32,
}

// WGSL sees `Particle { pos: vec2<f32>, angle: f32, _pad: f32 }`, stride 16.
const _: () = assert!(std::mem::size_of::<Particle>() == 16);

impl Particle {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.pos[0], self.pos[1])
    }
}

/// Owns the particle buffer and its seeding.
///
/// The buffer is reallocated whole on every count change or resize, never
/// grown in place; seeding happens in a GPU pass (`generate_ants`) that
/// places each particle on a circle of radius `height / 4` around the surface
/// center at a hash-derived angle, heading equal to that angle.
pub struct ParticleStore {
    pub buffer: wgpu::Buffer,
    count: u32,
    seed: u32,
    surface_size: [u32; 2],
}

impl ParticleStore {
    /// Allocate and seed a fresh particle buffer. Issues one dispatch and
    /// returns without waiting for it.
    ///
    /// A non-positive `count` is a valid empty simulation: one zeroed slot is
    /// still allocated so the update pass binding stays valid, but no seeding
    /// or update threads ever touch it.
    pub fn seed(
        device: &Device,
        queue: &Queue,
        pipelines: &PassPipelines,
        count: i32,
        surface_size: [u32; 2],
        seed: u32,
    ) -> Self {
        let count = count.max(0) as u32;
        let slots = count.max(1) as u64;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ant_buffer"),
            size: slots * std::mem::size_of::<Particle>() as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let store = Self {
            buffer,
            count,
            seed,
            surface_size,
        };
        store.dispatch_seed(device, queue, pipelines, seed);
        store
    }

    /// Discard the old buffer and seed anew. Invoked whenever the surface is
    /// resized (so ants stay within the visible field) or the particle count
    /// changes live.
    pub fn reseed(
        &mut self,
        device: &Device,
        queue: &Queue,
        pipelines: &PassPipelines,
        count: i32,
        surface_size: [u32; 2],
    ) {
        let seed = self.seed.wrapping_add(1);
        *self = Self::seed(device, queue, pipelines, count, surface_size, seed);
    }

    fn dispatch_seed(&self, device: &Device, queue: &Queue, pipelines: &PassPipelines, seed: u32) {
        if self.count == 0 {
            return;
        }
        let params = SeedParams {
            width: self.surface_size[0] as f32,
            height: self.surface_size[1] as f32,
            count: self.count,
            seed,
        };
        let params_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("seed_params"),
                contents: bytemuck::cast_slice(&[params]),
                usage: wgpu::BufferUsages::UNIFORM,
            },
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("generate_bind_group"),
            layout: &pipelines.generate_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("generate_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("generate_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipelines.generate_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(workgroups_for(self.count, WORKGROUP_1D), 1, 1);
        }
        queue.submit(Some(encoder.finish()));
        log::debug!(
            "seeded {} ants on {}x{}",
            self.count,
            self.surface_size[0],
            self.surface_size[1]
        );
    }

    /// Number of live particle slots (0 for an empty simulation).
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn surface_size(&self) -> [u32; 2] {
        self.surface_size
    }
}
