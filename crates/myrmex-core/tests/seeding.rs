use std::f32::consts::TAU;

use myrmex_core::gpu::{read_buffer, read_texture_r32f, GpuDevice, Particle, ParticleStore, PassPipelines, TrailRing};
use myrmex_params::AntVariables;

fn gpu() -> Option<GpuDevice> {
    let gpu = pollster::block_on(GpuDevice::new());
    if gpu.is_none() {
        eprintln!("skipping: no GPU adapter available");
    }
    gpu
}

#[test]
fn seeded_ants_are_in_bounds_with_valid_headings() {
    let Some(gpu) = gpu() else { return };
    let pipelines = PassPipelines::new(&gpu.device);

    for (count, size) in [(1, [640u32, 480u32]), (64, [100, 100]), (1000, [333, 257])] {
        let store = ParticleStore::seed(&gpu.device, &gpu.queue, &pipelines, count, size, 7);
        gpu.wait();

        let particles: Vec<Particle> =
            read_buffer(&gpu.device, &gpu.queue, &store.buffer, count as usize);
        assert_eq!(particles.len(), count as usize);

        for p in &particles {
            let pos = p.position();
            assert!(
                pos.x >= 0.0 && pos.x < size[0] as f32,
                "x out of bounds: {pos:?} on {size:?}"
            );
            assert!(
                pos.y >= 0.0 && pos.y < size[1] as f32,
                "y out of bounds: {pos:?} on {size:?}"
            );
            assert!(
                p.angle >= 0.0 && p.angle < TAU,
                "heading out of [0, 2pi): {}",
                p.angle
            );
        }
    }
}

#[test]
fn seeded_ants_sit_on_the_spawn_circle() {
    let Some(gpu) = gpu() else { return };
    let pipelines = PassPipelines::new(&gpu.device);

    let size = [640u32, 480u32];
    let store = ParticleStore::seed(&gpu.device, &gpu.queue, &pipelines, 500, size, 7);
    gpu.wait();

    let particles: Vec<Particle> = read_buffer(&gpu.device, &gpu.queue, &store.buffer, 500);
    let center = glam::Vec2::new(size[0] as f32, size[1] as f32) * 0.5;
    let radius = size[1] as f32 * 0.25;
    for p in &particles {
        let r = (p.position() - center).length();
        assert!(
            (r - radius).abs() < 1e-2,
            "expected radius {radius}, got {r}"
        );
        // heading points outward from the center
        let outward = (p.position() - center).normalize();
        let heading = glam::Vec2::new(p.angle.cos(), p.angle.sin());
        assert!(outward.dot(heading) > 0.999);
    }
}

#[test]
fn zero_count_is_a_valid_empty_simulation() {
    let Some(gpu) = gpu() else { return };
    let pipelines = PassPipelines::new(&gpu.device);

    let store = ParticleStore::seed(&gpu.device, &gpu.queue, &pipelines, 0, [64, 64], 7);
    gpu.wait();
    assert_eq!(store.count(), 0);

    // The empty store must still drive a full frame without issue.
    let ants = AntVariables {
        count: 0,
        ..AntVariables::default()
    };
    let mut sim =
        myrmex_core::Simulation::new(&gpu.device, &gpu.queue, [64, 64], &ants, 7);
    for _ in 0..3 {
        sim.step(&gpu.device, &gpu.queue, 1.0 / 60.0, &ants, &Default::default());
    }
    gpu.wait();
}

#[test]
fn trail_allocation_is_idempotent() {
    let Some(gpu) = gpu() else { return };
    let pipelines = PassPipelines::new(&gpu.device);

    let size = [96u32, 80u32];
    let first = TrailRing::new(&gpu.device, &gpu.queue, &pipelines, size);
    let second = TrailRing::new(&gpu.device, &gpu.queue, &pipelines, size);
    gpu.wait();

    assert_eq!(first.size(), second.size());
    for ring in [&first, &second] {
        for texture in [ring.current_texture(), ring.previous_texture()] {
            let data = read_texture_r32f(&gpu.device, &gpu.queue, texture, size);
            assert_eq!(data.len(), (size[0] * size[1]) as usize);
            assert!(data.iter().all(|&v| v == 0.0), "surface not zero-filled");
        }
    }
}
