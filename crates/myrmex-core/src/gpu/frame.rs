use wgpu::{Device, Queue};
use wgpu::util::DeviceExt;

use crate::gpu::particles::ParticleStore;
use crate::gpu::pipelines::{workgroups_for, PassPipelines, WORKGROUP_1D, WORKGROUP_2D};
use crate::gpu::textures::TrailRing;
use myrmex_params::{AntParams, AntVariables, TrailParams, TrailVariables};

/// Per-frame driver.
///
/// Owns the pipelines, the trail ring, the particle store, the parameter
/// uniform buffers and the accumulated simulation time. Each [`step`] encodes
/// the four passes in strict order into a single command submission, so pass
/// N's writes are visible to pass N+1's reads, then rotates the ring.
///
/// [`step`]: Simulation::step
pub struct Simulation {
    pub pipelines: PassPipelines,
    pub ring: TrailRing,
    pub particles: ParticleStore,
    ant_params_buffer: wgpu::Buffer,
    trail_params_buffer: wgpu::Buffer,
    pub current_time: f32,
}

impl Simulation {
    /// Build the full pipeline, allocate surfaces at `size` and seed the
    /// particle buffer. Shader validation failures are fatal here; there is
    /// no simulation without a complete pipeline.
    pub fn new(
        device: &Device,
        queue: &Queue,
        size: [u32; 2],
        ants: &AntVariables,
        seed: u32,
    ) -> Self {
        let pipelines = PassPipelines::new(device);
        let ring = TrailRing::new(device, queue, &pipelines, size);
        let particles = ParticleStore::seed(device, queue, &pipelines, ants.count, size, seed);

        let ant_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ant_params"),
            contents: bytemuck::cast_slice(&[AntParams::from(ants)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let trail_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("trail_params"),
            contents: bytemuck::cast_slice(&[TrailParams::from(&TrailVariables::default())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            pipelines,
            ring,
            particles,
            ant_params_buffer,
            trail_params_buffer,
            current_time: 0.0,
        }
    }

    pub fn size(&self) -> [u32; 2] {
        self.ring.size()
    }

    /// The composited output of the most recent frame.
    pub fn display_view(&self) -> &wgpu::TextureView {
        &self.ring.display_view
    }

    /// Apply a new surface size: reallocate the whole ring and reseed the
    /// particle store. Must complete before the next `step`; callers apply
    /// resize notifications between frames, never mid-frame.
    pub fn resize(&mut self, device: &Device, queue: &Queue, new_size: [u32; 2], ants: &AntVariables) {
        if new_size[0] == 0 || new_size[1] == 0 {
            return;
        }
        log::info!("resizing to {}x{}", new_size[0], new_size[1]);
        self.ring = TrailRing::new(device, queue, &self.pipelines, new_size);
        self.particles
            .reseed(device, queue, &self.pipelines, ants.count, new_size);
    }

    /// Advance the simulation by one tick.
    ///
    /// Snapshots both parameter blocks up front (the UI may mutate them at
    /// any time between frames), encodes reset, decay, update-and-deposit and
    /// combine in order, submits, then rotates the ring.
    pub fn step(
        &mut self,
        device: &Device,
        queue: &Queue,
        delta_time: f32,
        ants: &AntVariables,
        trail: &TrailVariables,
    ) {
        self.current_time += delta_time;

        // Live particle-count change means a fresh buffer, like a resize.
        if ants.count.max(0) as u32 != self.particles.count() {
            self.particles
                .reseed(device, queue, &self.pipelines, ants.count, self.ring.size());
        }

        let mut ant_params = AntParams::from(ants);
        ant_params.time = self.current_time;
        queue.write_buffer(&self.ant_params_buffer, 0, bytemuck::cast_slice(&[ant_params]));
        queue.write_buffer(
            &self.trail_params_buffer,
            0,
            bytemuck::cast_slice(&[TrailParams::from(trail)]),
        );

        let [width, height] = self.ring.size();
        let groups_x = workgroups_for(width, WORKGROUP_2D.0);
        let groups_y = workgroups_for(height, WORKGROUP_2D.1);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        // 1. reset: clear the ants overlay
        self.ring
            .encode_clear(device, &mut encoder, &self.pipelines, &self.ring.ants_view);

        // 2. decay: previous trail -> current trail
        {
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("decay_bind_group"),
                layout: &self.pipelines.decay_bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(self.ring.previous()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(self.ring.current()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.trail_params_buffer.as_entire_binding(),
                    },
                ],
            });
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("decay_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.decay_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        // 3. update-and-deposit: one thread per ant
        {
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("update_bind_group"),
                layout: &self.pipelines.update_bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.particles.buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(self.ring.previous()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(self.ring.current()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&self.ring.ants_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: self.ant_params_buffer.as_entire_binding(),
                    },
                ],
            });
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("update_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.update_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(workgroups_for(self.particles.count(), WORKGROUP_1D), 1, 1);
        }

        // 4. combine: trail + overlay -> display surface
        {
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("combine_bind_group"),
                layout: &self.pipelines.combine_bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(self.ring.current()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&self.ring.ants_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&self.ring.display_view),
                    },
                ],
            });
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("combine_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines.combine_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        queue.submit(Some(encoder.finish()));

        // Rotation happens once per completed frame: next frame's decay reads
        // the surface this frame just wrote.
        self.ring.advance();
    }
}
