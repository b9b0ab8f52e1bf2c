//! Render pipelines.
//!
//! - `basic` draws flat-coloured instanced meshes
//! - `sprite` draws camera-facing textured quads for labels

pub mod basic;
pub mod sprite;

/// Every pipeline the renderer needs, built once per surface format.
#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub sprite: wgpu::RenderPipeline,
    pub sprite_texture_layout: wgpu::BindGroupLayout,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let basic = basic::mk_basic_pipeline(device, format, camera_bind_group_layout);
        let sprite_texture_layout = sprite::mk_texture_bind_group_layout(device);
        let sprite = sprite::mk_sprite_pipeline(
            device,
            format,
            camera_bind_group_layout,
            &sprite_texture_layout,
        );
        Self {
            basic,
            sprite,
            sprite_texture_layout,
        }
    }
}
