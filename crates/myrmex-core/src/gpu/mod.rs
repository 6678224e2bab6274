pub mod device;
pub mod frame;
pub mod particles;
pub mod pipelines;
pub mod textures;

pub use device::*;
pub use frame::*;
pub use particles::*;
pub use pipelines::*;
pub use textures::*;
