//! Embedded WGSL compute kernels, one per pipeline.
//!
//! The orchestration core treats these as opaque programs; the per-texel and
//! per-ant math lives entirely in the WGSL sources.

/// Clears an R32Float surface to zero.
pub fn reset_ants() -> &'static str {
    include_str!("reset_ants.wgsl")
}

/// Diffusion + decay step over the trail surfaces.
pub fn decay() -> &'static str {
    include_str!("decay.wgsl")
}

/// Per-ant sense / steer / move / deposit step.
pub fn update_ants() -> &'static str {
    include_str!("update_ants.wgsl")
}

/// Composites trail and ants overlay into the display surface.
pub fn combine() -> &'static str {
    include_str!("combine.wgsl")
}

/// Seeds the particle buffer on a circle around the surface center.
pub fn generate_ants() -> &'static str {
    include_str!("generate_ants.wgsl")
}
