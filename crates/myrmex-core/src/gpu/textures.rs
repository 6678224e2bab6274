use wgpu::{CommandEncoder, Device, Texture, TextureView, TextureViewDescriptor};

use crate::gpu::pipelines::{
    workgroups_for, PassPipelines, DISPLAY_FORMAT, TRAIL_FORMAT, WORKGROUP_2D,
};

/// Number of trail surfaces in the ring. The data dependencies only need two
/// (read previous, write current); three matches the original and leaves one
/// frame of slack. Tunable, must be >= 2.
pub const TRAIL_RING_LEN: usize = 3;

/// Rotation index over a fixed-size ring of surfaces.
///
/// `current` is the slot written this frame, `previous` the slot written last
/// frame. Advances exactly once per completed frame. Pure so the rotation law
/// is testable without a device.
#[derive(Debug, Clone, Copy)]
pub struct RingCursor {
    index: usize,
    len: usize,
}

impl RingCursor {
    pub fn new(len: usize) -> Self {
        debug_assert!(len >= 2);
        // Start at 1 so previous() is valid before the first advance.
        Self { index: 1, len }
    }

    pub fn current(&self) -> usize {
        self.index % self.len
    }

    pub fn previous(&self) -> usize {
        (self.index + self.len - 1) % self.len
    }

    pub fn advance(&mut self) {
        self.index += 1;
    }
}

/// The rotating trail surfaces plus the per-frame overlay and display
/// surfaces.
///
/// Owns every texture the passes touch. All ring surfaces are allocated and
/// zero-cleared together; none is ever resized in place.
pub struct TrailRing {
    trail_textures: Vec<Texture>,
    trail_views: Vec<TextureView>,
    pub ants_texture: Texture,
    pub ants_view: TextureView,
    pub display_texture: Texture,
    pub display_view: TextureView,
    cursor: RingCursor,
    size: [u32; 2],
}

impl TrailRing {
    /// Allocate the ring, overlay and display surfaces at `size` and clear
    /// them to zero via the reset pass.
    ///
    /// Calling this again (via [`Self::new`] on resize) with the same size
    /// yields indistinguishable, all-zero surfaces. The display surface needs
    /// no clear: the combine pass writes every texel each frame before anyone
    /// reads it.
    pub fn new(
        device: &Device,
        queue: &wgpu::Queue,
        pipelines: &PassPipelines,
        size: [u32; 2],
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size[0],
            height: size[1],
            depth_or_array_layers: 1,
        };
        let trail_usage = wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC;

        let mut trail_textures = Vec::with_capacity(TRAIL_RING_LEN);
        let mut trail_views = Vec::with_capacity(TRAIL_RING_LEN);
        for i in 0..TRAIL_RING_LEN {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("trail_{i}")),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TRAIL_FORMAT,
                usage: trail_usage,
                view_formats: &[],
            });
            trail_views.push(texture.create_view(&TextureViewDescriptor::default()));
            trail_textures.push(texture);
        }

        let ants_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ants_overlay"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TRAIL_FORMAT,
            usage: trail_usage,
            view_formats: &[],
        });
        let ants_view = ants_texture.create_view(&TextureViewDescriptor::default());

        let display_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("display"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DISPLAY_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let display_view = display_texture.create_view(&TextureViewDescriptor::default());

        let ring = Self {
            trail_textures,
            trail_views,
            ants_texture,
            ants_view,
            display_texture,
            display_view,
            cursor: RingCursor::new(TRAIL_RING_LEN),
            size,
        };
        ring.clear_all(device, queue, pipelines);
        ring
    }

    /// Zero every trail surface and the overlay with the reset pass.
    fn clear_all(&self, device: &Device, queue: &wgpu::Queue, pipelines: &PassPipelines) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("clear_surfaces_encoder"),
        });
        for view in self.trail_views.iter().chain(Some(&self.ants_view)) {
            self.encode_clear(device, &mut encoder, pipelines, view);
        }
        queue.submit(Some(encoder.finish()));
    }

    /// Encode one reset dispatch over `view`. Also used by the frame driver
    /// to clear the overlay each frame.
    pub fn encode_clear(
        &self,
        device: &Device,
        encoder: &mut CommandEncoder,
        pipelines: &PassPipelines,
        view: &TextureView,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("reset_bind_group"),
            layout: &pipelines.reset_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            }],
        });
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("reset_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipelines.reset_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(
            workgroups_for(self.size[0], WORKGROUP_2D.0),
            workgroups_for(self.size[1], WORKGROUP_2D.1),
            1,
        );
    }

    /// The trail surface written this frame.
    pub fn current(&self) -> &TextureView {
        &self.trail_views[self.cursor.current()]
    }

    /// The trail surface written last frame, read this frame.
    pub fn previous(&self) -> &TextureView {
        &self.trail_views[self.cursor.previous()]
    }

    pub fn current_texture(&self) -> &Texture {
        &self.trail_textures[self.cursor.current()]
    }

    pub fn previous_texture(&self) -> &Texture {
        &self.trail_textures[self.cursor.previous()]
    }

    /// Rotate the ring. Called exactly once per completed frame, after all
    /// passes for that frame have been issued. Never mid-frame.
    pub fn advance(&mut self) {
        self.cursor.advance();
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_current_and_previous_differ_by_one() {
        let mut cursor = RingCursor::new(TRAIL_RING_LEN);
        for _ in 0..32 {
            let written = cursor.current();
            cursor.advance();
            assert_eq!(
                cursor.previous(),
                written,
                "after a frame, previous() must be the slot just written"
            );
            assert_ne!(cursor.current(), cursor.previous());
        }
    }

    #[test]
    fn cursor_returns_to_start_after_ring_len_frames() {
        let mut cursor = RingCursor::new(TRAIL_RING_LEN);
        let start = cursor.current();
        for _ in 0..TRAIL_RING_LEN {
            cursor.advance();
        }
        assert_eq!(cursor.current(), start);
    }

    #[test]
    fn cursor_advances_by_exactly_one_slot() {
        for len in 2..=5 {
            let mut cursor = RingCursor::new(len);
            for _ in 0..3 * len {
                let before = cursor.current();
                cursor.advance();
                assert_eq!(cursor.current(), (before + 1) % len);
            }
        }
    }
}
