//! Camera-facing label quads.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{sprite::Sprite, texture::Texture},
    pipelines::basic::{depth_state, mk_render_pipeline},
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteUniform {
    /// Centre in world space; `w` is the uniform scale.
    pub centre: [f32; 4],
}

impl From<&Sprite> for SpriteUniform {
    fn from(sprite: &Sprite) -> Self {
        let p = sprite.position;
        Self {
            centre: [p.x, p.y, p.z, sprite.scale],
        }
    }
}

pub fn mk_sprite_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("sprite_bind_group_layout"),
    })
}

/// Alpha-blended, depth-tested without writing depth so labels never punch
/// holes into each other.
pub fn mk_sprite_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    frame_layout: &wgpu::BindGroupLayout,
    sprite_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sprite Pipeline Layout"),
        bind_group_layouts: &[frame_layout, sprite_layout],
        ..Default::default()
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Sprite Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("sprite.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        "Sprite Pipeline",
        &layout,
        config.format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(depth_state(false, wgpu::CompareFunction::Less)),
        None,
        &[],
        shader,
    )
}

/// A label texture with its placement, ready to draw.
#[derive(Debug)]
pub struct SpriteResources {
    pub texture: Texture,
    pub uniform: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl SpriteResources {
    pub fn new(
        device: &wgpu::Device,
        texture: Texture,
        sprite: &Sprite,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Sprite {} Buffer", sprite.label)),
            contents: bytemuck::cast_slice(&[SpriteUniform::from(sprite)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
            label: Some("sprite_bind_group"),
        });
        Self {
            texture,
            uniform,
            bind_group,
        }
    }
}
