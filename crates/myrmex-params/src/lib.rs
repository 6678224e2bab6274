//! Shared parameter types for the myrmex ant-trail simulation
//!
//! This crate contains the parameter structures used by both the headless and
//! viewer front-ends so the two cannot drift apart. The plain structs are what
//! the UI layer mutates; the `#[repr(C)]` mirrors are what gets uploaded to
//! the GPU every frame.

use bytemuck::{Pod, Zeroable};

/// Ant movement and sensing parameters.
///
/// Mutated freely by the host UI between frames; the core snapshots the
/// current values at the top of each frame and uploads them. Negative or
/// out-of-range values are the UI's problem to clamp (see [`ranges`]), with
/// one exception: `count <= 0` is treated by the core as a valid empty
/// simulation rather than an error.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AntVariables {
    /// Number of simulated ants.
    pub count: i32,
    /// Distance moved along the heading each tick.
    pub move_speed: f32,
    /// Maximum heading change per tick, in radians.
    pub turn_speed: f32,
    /// Half-width of the square sensor sampling kernel, in texels.
    pub sensor_size: i32,
    /// How far ahead of the ant each sensor sits, in texels.
    pub sensor_distance: f32,
    /// Angular offset of the left/right sensors from the heading, in radians.
    pub sensor_angle: f32,
    /// Pheromone intensity deposited per ant per tick.
    pub trail_weight: f32,
}

impl Default for AntVariables {
    fn default() -> Self {
        Self {
            count: 100_000,
            move_speed: 2.0,
            turn_speed: 0.1,
            sensor_size: 3,
            sensor_distance: 7.0,
            sensor_angle: 0.7,
            trail_weight: 0.3,
        }
    }
}

/// Trail diffusion and decay parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrailVariables {
    /// Blend factor toward the 3x3 neighbourhood mean, per tick. 0 disables
    /// diffusion entirely.
    pub diffuse_rate: f32,
    /// Intensity subtracted from every texel per tick, clamped at zero.
    pub decay_rate: f32,
}

impl Default for TrailVariables {
    fn default() -> Self {
        Self {
            diffuse_rate: 0.2,
            decay_rate: 0.003,
        }
    }
}

/// Complete simulation configuration, loadable from YAML by the front-ends.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Simulation surface size in texels. Front-ends also use this as the
    /// initial window / output size.
    pub size: [u32; 2],
    /// Seed for the GPU particle placement hash.
    pub seed: u32,
    pub ants: AntVariables,
    pub trail: TrailVariables,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            size: [1024, 768],
            seed: 1337,
            ants: AntVariables::default(),
            trail: TrailVariables::default(),
        }
    }
}

/// GPU-side mirror of [`AntVariables`], bound as a uniform by the
/// update-and-deposit kernel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct AntParams {
    pub count: i32,
    pub move_speed: f32,
    pub turn_speed: f32,
    pub sensor_distance: f32,
    pub sensor_angle: f32,
    pub trail_weight: f32,
    pub sensor_size: i32,
    /// Accumulated simulation time, folded into the kernel hash rng so the
    /// per-tick perturbations differ between frames.
    pub time: f32,
}

/// GPU-side mirror of [`TrailVariables`], bound as a uniform by the decay
/// kernel. Padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TrailParams {
    pub diffuse_rate: f32,
    pub decay_rate: f32,
    pub _pad: [f32; 2],
}

/// Uniform consumed by the particle seeding kernel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SeedParams {
    pub width: f32,
    pub height: f32,
    pub count: u32,
    pub seed: u32,
}

impl From<&AntVariables> for AntParams {
    fn from(vars: &AntVariables) -> Self {
        Self {
            count: vars.count,
            move_speed: vars.move_speed,
            turn_speed: vars.turn_speed,
            sensor_distance: vars.sensor_distance,
            sensor_angle: vars.sensor_angle,
            trail_weight: vars.trail_weight,
            sensor_size: vars.sensor_size,
            time: 0.0,
        }
    }
}

impl From<&TrailVariables> for TrailParams {
    fn from(vars: &TrailVariables) -> Self {
        Self {
            diffuse_rate: vars.diffuse_rate,
            decay_rate: vars.decay_rate,
            _pad: [0.0, 0.0],
        }
    }
}

/// Slider ranges from the original host UI. Front-ends clamp user input to
/// these before handing values to the core; the core itself never validates.
pub mod ranges {
    use std::f32::consts::PI;
    use std::ops::RangeInclusive;

    pub const MOVE_SPEED: RangeInclusive<f32> = 0.0..=15.0;
    pub const TURN_SPEED: RangeInclusive<f32> = 0.0..=PI;
    pub const SENSOR_SIZE: RangeInclusive<i32> = 0..=5;
    pub const SENSOR_DISTANCE: RangeInclusive<f32> = 0.0..=40.0;
    pub const SENSOR_ANGLE: RangeInclusive<f32> = 0.0..=PI;
    pub const TRAIL_WEIGHT: RangeInclusive<f32> = 0.0..=1.0;
    pub const DIFFUSE_RATE: RangeInclusive<f32> = 0.0..=2.0;
    pub const DECAY_RATE: RangeInclusive<f32> = 0.0..=0.01;

    /// Clamp a value into one of the ranges above.
    pub fn clamp_f32(value: f32, range: RangeInclusive<f32>) -> f32 {
        value.clamp(*range.start(), *range.end())
    }

    pub fn clamp_i32(value: i32, range: RangeInclusive<i32>) -> i32 {
        value.clamp(*range.start(), *range.end())
    }

    /// Log effective parameters once at startup for reproducibility.
    pub fn log_variables(ants: &super::AntVariables, trail: &super::TrailVariables) {
        log::info!(
            "ants: count={} move={} turn={} sensor=({}, {:.2}, {:.2}) weight={}",
            ants.count,
            ants.move_speed,
            ants.turn_speed,
            ants.sensor_size,
            ants.sensor_distance,
            ants.sensor_angle,
            ants.trail_weight,
        );
        log::info!(
            "trail: diffuse={} decay={}",
            trail.diffuse_rate,
            trail.decay_rate
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_params_are_uniform_sized() {
        // Uniform bindings want 16-byte multiples; the WGSL structs assume
        // these exact layouts.
        assert_eq!(std::mem::size_of::<AntParams>(), 32);
        assert_eq!(std::mem::size_of::<TrailParams>(), 16);
        assert_eq!(std::mem::size_of::<SeedParams>(), 16);
    }

    #[test]
    fn conversions_preserve_fields() {
        let vars = AntVariables {
            count: 42,
            move_speed: 3.5,
            turn_speed: 0.25,
            sensor_size: 2,
            sensor_distance: 9.0,
            sensor_angle: 0.5,
            trail_weight: 0.8,
        };
        let gpu = AntParams::from(&vars);
        assert_eq!(gpu.count, 42);
        assert_eq!(gpu.move_speed, 3.5);
        assert_eq!(gpu.turn_speed, 0.25);
        assert_eq!(gpu.sensor_size, 2);
        assert_eq!(gpu.sensor_distance, 9.0);
        assert_eq!(gpu.sensor_angle, 0.5);
        assert_eq!(gpu.trail_weight, 0.8);
        assert_eq!(gpu.time, 0.0);

        let trail = TrailVariables {
            diffuse_rate: 1.5,
            decay_rate: 0.004,
        };
        let gpu = TrailParams::from(&trail);
        assert_eq!(gpu.diffuse_rate, 1.5);
        assert_eq!(gpu.decay_rate, 0.004);
    }

    #[test]
    fn clamping_respects_slider_ranges() {
        assert_eq!(ranges::clamp_f32(-1.0, ranges::MOVE_SPEED), 0.0);
        assert_eq!(ranges::clamp_f32(99.0, ranges::MOVE_SPEED), 15.0);
        assert_eq!(ranges::clamp_f32(0.005, ranges::DECAY_RATE), 0.005);
        assert_eq!(ranges::clamp_i32(7, ranges::SENSOR_SIZE), 5);
        assert_eq!(ranges::clamp_i32(-1, ranges::SENSOR_SIZE), 0);
    }

    #[test]
    fn defaults_match_original_host_values() {
        let ants = AntVariables::default();
        assert_eq!(ants.count, 100_000);
        assert_eq!(ants.move_speed, 2.0);
        assert_eq!(ants.sensor_size, 3);
        let trail = TrailVariables::default();
        assert_eq!(trail.diffuse_rate, 0.2);
        assert_eq!(trail.decay_rate, 0.003);
    }
}
