use myrmex_core::gpu::{
    read_buffer, read_texture_r32f, workgroups_for, GpuDevice, Particle, Simulation, TrailRing,
    PassPipelines, WORKGROUP_2D,
};
use myrmex_params::{AntVariables, TrailParams, TrailVariables};
use wgpu::util::DeviceExt;

fn gpu() -> Option<GpuDevice> {
    let gpu = pollster::block_on(GpuDevice::new());
    if gpu.is_none() {
        eprintln!("skipping: no GPU adapter available");
    }
    gpu
}

fn read_particles(gpu: &GpuDevice, sim: &Simulation) -> Vec<Particle> {
    gpu.wait();
    read_buffer(
        &gpu.device,
        &gpu.queue,
        &sim.particles.buffer,
        sim.particles.count() as usize,
    )
}

/// Trail surface written by the most recent completed frame (the ring has
/// already advanced past it).
fn read_latest_trail(gpu: &GpuDevice, sim: &Simulation) -> Vec<f32> {
    gpu.wait();
    read_texture_r32f(
        &gpu.device,
        &gpu.queue,
        sim.ring.previous_texture(),
        sim.size(),
    )
}

#[test]
fn motionless_ants_accumulate_trail_in_place() {
    let Some(gpu) = gpu() else { return };

    let ants = AntVariables {
        count: 4,
        move_speed: 0.0,
        turn_speed: 0.0,
        trail_weight: 0.5,
        ..AntVariables::default()
    };
    let trail = TrailVariables {
        diffuse_rate: 0.0,
        decay_rate: 0.0,
    };
    let size = [100u32, 100u32];
    let mut sim = Simulation::new(&gpu.device, &gpu.queue, size, &ants, 7);

    let initial = read_particles(&gpu, &sim);
    let cells: Vec<usize> = initial
        .iter()
        .map(|p| p.pos[1] as usize * size[0] as usize + p.pos[0] as usize)
        .collect();

    let mut last_intensity = vec![0.0f32; cells.len()];
    for frame in 0..5 {
        sim.step(&gpu.device, &gpu.queue, 1.0 / 60.0, &ants, &trail);

        let positions = read_particles(&gpu, &sim);
        for (p, q) in initial.iter().zip(&positions) {
            assert_eq!(p.pos, q.pos, "frame {frame}: ants moved with move_speed 0");
            assert_eq!(p.angle, q.angle, "frame {frame}: ants turned with turn_speed 0");
        }

        let field = read_latest_trail(&gpu, &sim);
        for (i, &cell) in cells.iter().enumerate() {
            assert!(
                field[cell] > last_intensity[i],
                "frame {frame}: trail at ant cell did not increase ({} -> {})",
                last_intensity[i],
                field[cell]
            );
            last_intensity[i] = field[cell];
        }
    }
}

#[test]
fn ants_never_leave_the_surface() {
    let Some(gpu) = gpu() else { return };

    // Large steps on a small field force constant boundary reflections.
    let ants = AntVariables {
        count: 256,
        move_speed: 50.0,
        turn_speed: 0.3,
        ..AntVariables::default()
    };
    let size = [64u32, 48u32];
    let mut sim = Simulation::new(&gpu.device, &gpu.queue, size, &ants, 7);

    for frame in 0..20 {
        sim.step(
            &gpu.device,
            &gpu.queue,
            1.0 / 60.0,
            &ants,
            &TrailVariables::default(),
        );
        let positions = read_particles(&gpu, &sim);
        for p in &positions {
            assert!(
                p.pos[0] >= 0.0 && p.pos[0] < size[0] as f32,
                "frame {frame}: x escaped: {:?}",
                p.pos
            );
            assert!(
                p.pos[1] >= 0.0 && p.pos[1] < size[1] as f32,
                "frame {frame}: y escaped: {:?}",
                p.pos
            );
        }
    }
}

#[test]
fn resize_reallocates_surfaces_and_reseeds_ants() {
    let Some(gpu) = gpu() else { return };

    let ants = AntVariables {
        count: 500,
        ..AntVariables::default()
    };
    let mut sim = Simulation::new(&gpu.device, &gpu.queue, [200, 200], &ants, 7);
    for _ in 0..5 {
        sim.step(
            &gpu.device,
            &gpu.queue,
            1.0 / 60.0,
            &ants,
            &TrailVariables::default(),
        );
    }

    sim.resize(&gpu.device, &gpu.queue, [50, 50], &ants);
    assert_eq!(sim.size(), [50, 50]);
    assert_eq!(sim.particles.surface_size(), [50, 50]);

    let positions = read_particles(&gpu, &sim);
    assert_eq!(positions.len(), 500);
    for p in &positions {
        assert!(p.pos[0] >= 0.0 && p.pos[0] < 50.0);
        assert!(p.pos[1] >= 0.0 && p.pos[1] < 50.0);
    }

    // The resized ring starts from a clean slate.
    let field = read_latest_trail(&gpu, &sim);
    assert!(field.iter().all(|&v| v == 0.0));
}

#[test]
fn live_count_change_reseeds_on_the_next_frame() {
    let Some(gpu) = gpu() else { return };

    let mut ants = AntVariables {
        count: 100,
        ..AntVariables::default()
    };
    let mut sim = Simulation::new(&gpu.device, &gpu.queue, [128, 128], &ants, 7);
    assert_eq!(sim.particles.count(), 100);

    ants.count = 250;
    sim.step(
        &gpu.device,
        &gpu.queue,
        1.0 / 60.0,
        &ants,
        &TrailVariables::default(),
    );
    assert_eq!(sim.particles.count(), 250);
    assert_eq!(read_particles(&gpu, &sim).len(), 250);
}

#[test]
fn decay_never_raises_intensity_without_diffusion() {
    let Some(gpu) = gpu() else { return };
    let pipelines = PassPipelines::new(&gpu.device);

    let size = [64u32, 64u32];
    let ring = TrailRing::new(&gpu.device, &gpu.queue, &pipelines, size);

    // Single hot texel in the surface the decay pass will read.
    let hot = (32u32, 32u32);
    let intensity = 1.0f32;
    let mut data = vec![0.0f32; (size[0] * size[1]) as usize];
    data[(hot.1 * size[0] + hot.0) as usize] = intensity;
    gpu.queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: ring.previous_texture(),
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&data),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(size[0] * 4),
            rows_per_image: Some(size[1]),
        },
        wgpu::Extent3d {
            width: size[0],
            height: size[1],
            depth_or_array_layers: 1,
        },
    );

    let decay_rate = 0.01f32;
    let params = TrailParams {
        diffuse_rate: 0.0,
        decay_rate,
        _pad: [0.0; 2],
    };
    let params_buffer = gpu
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("trail_params_test"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

    let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("decay_test_bind_group"),
        layout: &pipelines.decay_bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(ring.previous()),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(ring.current()),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params_buffer.as_entire_binding(),
            },
        ],
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("decay_test_encoder"),
        });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("decay_test_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.decay_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(
            workgroups_for(size[0], WORKGROUP_2D.0),
            workgroups_for(size[1], WORKGROUP_2D.1),
            1,
        );
    }
    gpu.queue.submit(Some(encoder.finish()));
    gpu.wait();

    let result = read_texture_r32f(&gpu.device, &gpu.queue, ring.current_texture(), size);
    for (i, &v) in result.iter().enumerate() {
        if i == (hot.1 * size[0] + hot.0) as usize {
            assert!(
                v <= intensity && (v - (intensity - decay_rate)).abs() < 1e-5,
                "hot texel decayed to {v}"
            );
        } else {
            assert_eq!(v, 0.0, "texel {i} changed without diffusion");
        }
    }
}
