use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;
use image::{GrayImage, ImageBuffer, Luma};

use myrmex_core::Particle;

/// Snapshot writer for trail images and ant position dumps.
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: &Path) -> Result<Self, anyhow::Error> {
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Write the trail intensity field as a grayscale PNG, normalized to the
    /// frame's own min/max so faint early trails stay visible.
    pub fn write_trail_snapshot(
        &self,
        frame: u32,
        trail: &[f32],
        size: [u32; 2],
    ) -> Result<(), anyhow::Error> {
        let filename = format!("trail_{:06}.png", frame);
        let filepath = self.output_dir.join(&filename);

        let mut min_val = f32::INFINITY;
        let mut max_val = f32::NEG_INFINITY;
        for &v in trail {
            min_val = min_val.min(v);
            max_val = max_val.max(v);
        }
        let range = max_val - min_val;
        let range = if range > 0.0 { range } else { 1.0 };

        let mut img: GrayImage = ImageBuffer::new(size[0], size[1]);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let idx = (y * size[0] + x) as usize;
            let normalized = ((trail[idx] - min_val) / range * 255.0) as u8;
            *pixel = Luma([normalized]);
        }

        img.save(&filepath)?;
        Ok(())
    }

    /// Write ant positions and headings to CSV.
    pub fn write_ants_snapshot(&self, frame: u32, ants: &[Particle]) -> Result<(), anyhow::Error> {
        let filename = format!("ants_{:06}.csv", frame);
        let filepath = self.output_dir.join(&filename);

        let file = File::create(&filepath)?;
        let mut csv_writer = Writer::from_writer(file);

        csv_writer.write_record(["id", "x", "y", "angle"])?;
        for (i, ant) in ants.iter().enumerate() {
            csv_writer.write_record([
                i.to_string(),
                ant.pos[0].to_string(),
                ant.pos[1].to_string(),
                ant.angle.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
