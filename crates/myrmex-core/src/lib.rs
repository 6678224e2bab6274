//! Myrmex core engine
//!
//! GPU orchestration for the ant-trail simulation: the trail texture ring,
//! the particle store, the four per-frame compute passes and the frame
//! driver that sequences them.

pub mod gpu;
pub mod shaders;

// Re-export main types
pub use gpu::*;

// Re-export params from myrmex-params
pub use myrmex_params::*;
