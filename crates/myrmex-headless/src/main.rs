mod metrics;
mod snapshots;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use metrics::{MetricsWriter, TrailStats};
use myrmex_core::{read_buffer, read_texture_r32f, GpuDevice, Particle, Simulation};
use myrmex_params::{ranges, SimulationConfig};
use snapshots::SnapshotWriter;

#[derive(Parser)]
#[command(name = "myrmex-headless")]
#[command(about = "Headless runner for myrmex trail-simulation experiments")]
struct Cli {
    /// Configuration file path (YAML); defaults apply when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for metrics and snapshots
    #[arg(short, long, value_name = "DIR")]
    out: PathBuf,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 2000)]
    frames: u32,

    /// Write a trail PNG and ant CSV every N frames (0 disables)
    #[arg(long, default_value_t = 500)]
    snapshot_every: u32,

    /// Write a metrics row every N frames
    #[arg(long, default_value_t = 50)]
    metrics_every: u32,

    /// Override the config's seed
    #[arg(long)]
    seed: Option<u32>,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            log::info!("loading configuration from {}", path.display());
            serde_yaml::from_str(&std::fs::read_to_string(path)?)?
        }
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    if config.size[0] == 0 || config.size[1] == 0 {
        anyhow::bail!(
            "surface size {}x{} is degenerate",
            config.size[0],
            config.size[1]
        );
    }
    if cli.frames == 0 {
        anyhow::bail!("frame count must be greater than 0");
    }

    std::fs::create_dir_all(&cli.out)?;

    let gpu = pollster::block_on(GpuDevice::new()).context("no suitable GPU adapter")?;
    log::info!("{}", gpu.info());

    let ants = config.ants;
    let trail = config.trail;
    ranges::log_variables(&ants, &trail);

    let mut sim = Simulation::new(&gpu.device, &gpu.queue, config.size, &ants, config.seed);

    let mut metrics_writer = MetricsWriter::new(&cli.out)?;
    let snapshot_writer = SnapshotWriter::new(&cli.out)?;

    // Fixed timestep: headless runs are deterministic per seed, so wall-clock
    // deltas would only smear results across machines.
    let delta_time = 1.0 / 60.0;
    let metrics_every = cli.metrics_every.max(1);

    log::info!(
        "running {} frames at {}x{} with {} ants",
        cli.frames,
        config.size[0],
        config.size[1],
        ants.count.max(0)
    );
    let start_time = Instant::now();

    for frame in 0..cli.frames {
        let frame_start = Instant::now();
        sim.step(&gpu.device, &gpu.queue, delta_time, &ants, &trail);

        let last_frame = frame + 1 == cli.frames;
        let sample_metrics = frame % metrics_every == 0 || last_frame;
        let sample_snapshot =
            cli.snapshot_every > 0 && (frame % cli.snapshot_every == 0 || last_frame);

        if !(sample_metrics || sample_snapshot) {
            continue;
        }

        // step() already rotated the ring, so the frame's finished trail sits
        // in the previous slot.
        let trail_data =
            read_texture_r32f(&gpu.device, &gpu.queue, sim.ring.previous_texture(), sim.size());

        if sample_metrics {
            let stats = TrailStats::from_trail(&trail_data);
            metrics_writer.write_frame(
                frame,
                sim.current_time,
                sim.particles.count(),
                &stats,
                frame_start.elapsed(),
            )?;
            log::info!(
                "frame {}: mean={:.4} max={:.4} covered={:.1}%",
                frame,
                stats.mean_intensity,
                stats.max_intensity,
                stats.covered_fraction * 100.0
            );
        }

        if sample_snapshot {
            snapshot_writer.write_trail_snapshot(frame, &trail_data, sim.size())?;
            let ants_data: Vec<Particle> = read_buffer(
                &gpu.device,
                &gpu.queue,
                &sim.particles.buffer,
                sim.particles.count().max(1) as usize,
            );
            snapshot_writer.write_ants_snapshot(frame, &ants_data[..sim.particles.count() as usize])?;
            log::info!("snapshot written for frame {}", frame);
        }
    }

    log::info!(
        "simulation completed in {:?}, {} metric rows, results in {}",
        start_time.elapsed(),
        metrics_writer.rows_written(),
        cli.out.display()
    );

    Ok(())
}
