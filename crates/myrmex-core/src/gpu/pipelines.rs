use wgpu::{BindGroupLayout, ComputePipeline, Device};

use crate::shaders;

/// Workgroup shape of the 2-D (texture-domain) kernels. Must match the
/// `@workgroup_size` attributes in the WGSL sources.
pub const WORKGROUP_2D: (u32, u32) = (8, 8);
/// Workgroup size of the 1-D (particle-domain) kernels.
pub const WORKGROUP_1D: u32 = 64;

/// Texture format of the trail ring and ants overlay surfaces. `R32Float` is
/// one of the few formats with guaranteed read_write storage support, which
/// the deposit step relies on.
pub const TRAIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
/// Texture format of the composited display surface.
pub const DISPLAY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Number of workgroups needed to cover `domain` elements.
///
/// Kernels bounds-check their invocation id, so rounding up never writes out
/// of range; rounding down would leave elements unprocessed.
pub fn workgroups_for(domain: u32, group: u32) -> u32 {
    (domain + group - 1) / group
}

/// The five compiled compute pipelines of the simulation.
///
/// Four run every frame (reset, decay, update-and-deposit, combine); the
/// fifth seeds the particle buffer on (re)allocation. Holds no simulation
/// state. Any WGSL validation failure here is fatal: there is no simulation
/// without a complete pipeline.
pub struct PassPipelines {
    pub reset_pipeline: ComputePipeline,
    pub reset_bgl: BindGroupLayout,

    pub decay_pipeline: ComputePipeline,
    pub decay_bgl: BindGroupLayout,

    pub update_pipeline: ComputePipeline,
    pub update_bgl: BindGroupLayout,

    pub combine_pipeline: ComputePipeline,
    pub combine_bgl: BindGroupLayout,

    pub generate_pipeline: ComputePipeline,
    pub generate_bgl: BindGroupLayout,
}

impl PassPipelines {
    /// Compile all compute pipelines.
    pub fn new(device: &Device) -> Self {
        let (reset_pipeline, reset_bgl) = Self::create_reset_pipeline(device);
        let (decay_pipeline, decay_bgl) = Self::create_decay_pipeline(device);
        let (update_pipeline, update_bgl) = Self::create_update_pipeline(device);
        let (combine_pipeline, combine_bgl) = Self::create_combine_pipeline(device);
        let (generate_pipeline, generate_bgl) = Self::create_generate_pipeline(device);

        Self {
            reset_pipeline,
            reset_bgl,
            decay_pipeline,
            decay_bgl,
            update_pipeline,
            update_bgl,
            combine_pipeline,
            combine_bgl,
            generate_pipeline,
            generate_bgl,
        }
    }

    fn compute_pipeline(
        device: &Device,
        name: &str,
        source: &str,
        bgl: &BindGroupLayout,
    ) -> ComputePipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(name),
            bind_group_layouts: &[bgl],
            push_constant_ranges: &[],
        });

        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(name),
            layout: Some(&pl),
            module: &shader,
            entry_point: "main",
        })
    }

    fn storage_texture_entry(
        binding: u32,
        access: wgpu::StorageTextureAccess,
        format: wgpu::TextureFormat,
    ) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access,
                format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        }
    }

    fn sampled_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        }
    }

    fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    fn storage_buffer_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    /// Clears an `R32Float` surface to zero. Runs on the ants overlay every
    /// frame and on every ring surface at allocation time.
    fn create_reset_pipeline(device: &Device) -> (ComputePipeline, BindGroupLayout) {
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("reset_bgl"),
            entries: &[
                // @binding(0) target storage texture
                Self::storage_texture_entry(0, wgpu::StorageTextureAccess::WriteOnly, TRAIL_FORMAT),
            ],
        });
        let pipeline = Self::compute_pipeline(device, "reset_ants", shaders::reset_ants(), &bgl);
        (pipeline, bgl)
    }

    /// Reads the previous trail surface, writes the diffused and decayed
    /// result into the current one.
    fn create_decay_pipeline(device: &Device) -> (ComputePipeline, BindGroupLayout) {
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("decay_bgl"),
            entries: &[
                // @binding(0) previous trail (sampled)
                Self::sampled_texture_entry(0),
                // @binding(1) current trail (storage write)
                Self::storage_texture_entry(1, wgpu::StorageTextureAccess::WriteOnly, TRAIL_FORMAT),
                // @binding(2) TrailParams uniform
                Self::uniform_entry(2),
            ],
        });
        let pipeline = Self::compute_pipeline(device, "decay", shaders::decay(), &bgl);
        (pipeline, bgl)
    }

    /// Moves every particle, deposits into the current trail surface and
    /// marks the ants overlay.
    fn create_update_pipeline(device: &Device) -> (ComputePipeline, BindGroupLayout) {
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("update_bgl"),
            entries: &[
                // @binding(0) particles (storage read_write)
                Self::storage_buffer_entry(0, false),
                // @binding(1) previous trail (sampled, sensor input)
                Self::sampled_texture_entry(1),
                // @binding(2) current trail (storage read_write, deposit target)
                Self::storage_texture_entry(2, wgpu::StorageTextureAccess::ReadWrite, TRAIL_FORMAT),
                // @binding(3) ants overlay (storage write)
                Self::storage_texture_entry(3, wgpu::StorageTextureAccess::WriteOnly, TRAIL_FORMAT),
                // @binding(4) AntParams uniform
                Self::uniform_entry(4),
            ],
        });
        let pipeline =
            Self::compute_pipeline(device, "update_ants_and_trail", shaders::update_ants(), &bgl);
        (pipeline, bgl)
    }

    /// Composites trail and overlay into the display surface.
    fn create_combine_pipeline(device: &Device) -> (ComputePipeline, BindGroupLayout) {
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("combine_bgl"),
            entries: &[
                // @binding(0) current trail (sampled)
                Self::sampled_texture_entry(0),
                // @binding(1) ants overlay (sampled)
                Self::sampled_texture_entry(1),
                // @binding(2) display (storage write)
                Self::storage_texture_entry(
                    2,
                    wgpu::StorageTextureAccess::WriteOnly,
                    DISPLAY_FORMAT,
                ),
            ],
        });
        let pipeline = Self::compute_pipeline(device, "combine", shaders::combine(), &bgl);
        (pipeline, bgl)
    }

    /// Seeds the particle buffer: a circle of radius `height / 4` around the
    /// surface center, heading pointing outward.
    fn create_generate_pipeline(device: &Device) -> (ComputePipeline, BindGroupLayout) {
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("generate_bgl"),
            entries: &[
                // @binding(0) particles (storage read_write)
                Self::storage_buffer_entry(0, false),
                // @binding(1) SeedParams uniform
                Self::uniform_entry(1),
            ],
        });
        let pipeline =
            Self::compute_pipeline(device, "generate_ants", shaders::generate_ants(), &bgl);
        (pipeline, bgl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workgroup_counts_cover_the_domain() {
        assert_eq!(workgroups_for(0, 64), 0);
        assert_eq!(workgroups_for(1, 64), 1);
        assert_eq!(workgroups_for(64, 64), 1);
        assert_eq!(workgroups_for(65, 64), 2);
        assert_eq!(workgroups_for(100, 8), 13);
        // never fewer threads than domain elements
        for domain in [1u32, 7, 63, 64, 65, 1023, 100_000] {
            assert!(workgroups_for(domain, WORKGROUP_1D) * WORKGROUP_1D >= domain);
        }
    }
}
