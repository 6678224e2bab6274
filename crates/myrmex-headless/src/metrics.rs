use std::fs::File;
use std::path::Path;
use std::time::Duration;

use csv::Writer;

/// Summary statistics over one trail readback.
pub struct TrailStats {
    pub mean_intensity: f32,
    pub max_intensity: f32,
    pub covered_fraction: f32,
}

impl TrailStats {
    /// Reduce a row-major intensity field to its per-frame metrics. A texel
    /// counts as covered once any deposit survives decay.
    pub fn from_trail(trail: &[f32]) -> Self {
        if trail.is_empty() {
            return Self {
                mean_intensity: 0.0,
                max_intensity: 0.0,
                covered_fraction: 0.0,
            };
        }
        let mut sum = 0.0f64;
        let mut max = 0.0f32;
        let mut covered = 0usize;
        for &v in trail {
            sum += v as f64;
            if v > max {
                max = v;
            }
            if v > 0.0 {
                covered += 1;
            }
        }
        Self {
            mean_intensity: (sum / trail.len() as f64) as f32,
            max_intensity: max,
            covered_fraction: covered as f32 / trail.len() as f32,
        }
    }
}

/// Metrics writer for CSV output and performance logging.
pub struct MetricsWriter {
    csv_writer: Writer<File>,
    rows_written: u32,
}

impl MetricsWriter {
    pub fn new(output_dir: &Path) -> Result<Self, anyhow::Error> {
        let csv_path = output_dir.join("metrics.csv");
        let file = File::create(&csv_path)?;

        let mut csv_writer = Writer::from_writer(file);
        csv_writer.write_record([
            "frame",
            "sim_time",
            "ant_count",
            "mean_intensity",
            "max_intensity",
            "covered_fraction",
            "wall_time_ms",
            "fps_proxy",
        ])?;

        Ok(Self {
            csv_writer,
            rows_written: 0,
        })
    }

    /// Write the metrics row for one sampled frame.
    pub fn write_frame(
        &mut self,
        frame: u32,
        sim_time: f32,
        ant_count: u32,
        stats: &TrailStats,
        frame_time: Duration,
    ) -> Result<(), anyhow::Error> {
        let wall_time_ms = frame_time.as_secs_f64() * 1000.0;
        let fps_proxy = if wall_time_ms > 0.0 {
            1000.0 / wall_time_ms
        } else {
            0.0
        };

        self.csv_writer.write_record([
            frame.to_string(),
            sim_time.to_string(),
            ant_count.to_string(),
            stats.mean_intensity.to_string(),
            stats.max_intensity.to_string(),
            stats.covered_fraction.to_string(),
            wall_time_ms.to_string(),
            fps_proxy.to_string(),
        ])?;
        self.csv_writer.flush()?;
        self.rows_written += 1;

        Ok(())
    }

    pub fn rows_written(&self) -> u32 {
        self.rows_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_over_a_mixed_field() {
        let trail = [0.0, 0.5, 1.5, 0.0];
        let stats = TrailStats::from_trail(&trail);
        assert!((stats.mean_intensity - 0.5).abs() < 1e-6);
        assert_eq!(stats.max_intensity, 1.5);
        assert!((stats.covered_fraction - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stats_over_an_empty_field() {
        let stats = TrailStats::from_trail(&[]);
        assert_eq!(stats.mean_intensity, 0.0);
        assert_eq!(stats.max_intensity, 0.0);
        assert_eq!(stats.covered_fraction, 0.0);
    }
}
