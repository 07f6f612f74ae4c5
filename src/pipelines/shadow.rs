//! Depth-only pass rendering the shadow casters from the key light.

use cgmath::{InnerSpace, Matrix4, Point3, Vector3};

use crate::{
    camera::OPENGL_TO_WGPU_MATRIX,
    data_structures::{
        instance::InstanceRaw,
        light::{LightKind, WorldLight},
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::depth_state,
};

pub const SHADOW_NEAR: f32 = 0.5;
pub const SHADOW_FAR: f32 = 500.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniform {
    pub light_view_proj: [[f32; 4]; 4],
}

/// The first directional light flagged to cast shadows, with its index among
/// the directional lights.
pub fn key_light(lights: &[WorldLight]) -> Option<(usize, &WorldLight)> {
    lights
        .iter()
        .filter(|world| world.light.kind == LightKind::Directional)
        .enumerate()
        .find(|(_, world)| world.light.cast_shadow)
}

/// Orthographic projection of `±extent` around the light's position, looking
/// along its direction.
pub fn light_view_proj(light: &WorldLight, extent: f32) -> Matrix4<f32> {
    let eye = Point3::new(light.position.x, light.position.y, light.position.z);
    let direction = light.direction.normalize();
    let up = if direction.y.abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    let view = Matrix4::look_to_rh(eye, direction, up);
    let projection = cgmath::ortho(-extent, extent, -extent, extent, SHADOW_NEAR, SHADOW_FAR);
    OPENGL_TO_WGPU_MATRIX * projection * view
}

pub fn mk_shadow_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("shadow_bind_group_layout"),
    })
}

pub fn mk_shadow_pipeline(
    device: &wgpu::Device,
    shadow_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[shadow_layout],
        ..Default::default()
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Shadow Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[ModelVertex::desc(), InstanceRaw::desc()],
            compilation_options: Default::default(),
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_state(true, wgpu::CompareFunction::LessEqual)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

/// Key light depth map and the uniform it is rendered with.
#[derive(Debug)]
pub struct ShadowResources {
    pub map: Texture,
    pub uniform: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub pipeline: wgpu::RenderPipeline,
}

impl ShadowResources {
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        use wgpu::util::DeviceExt;

        let layout = mk_shadow_layout(device);
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Buffer"),
            contents: bytemuck::cast_slice(&[ShadowUniform {
                light_view_proj: OPENGL_TO_WGPU_MATRIX.into(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
            label: Some("shadow_bind_group"),
        });
        Self {
            map: Texture::create_shadow_map(device, size),
            uniform,
            bind_group,
            pipeline: mk_shadow_pipeline(device, &layout),
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector4;

    use super::*;
    use crate::data_structures::light::Light;

    fn sun(cast: bool) -> WorldLight {
        let mut light = Light::new("light_key", LightKind::Directional);
        light.cast_shadow = cast;
        WorldLight {
            light,
            position: Vector3::new(0.0, 10.0, 0.0),
            direction: Vector3::new(0.0, -1.0, 0.0),
        }
    }

    #[test]
    fn key_light_is_the_shadow_caster() {
        let mut point = sun(true);
        point.light.kind = LightKind::Point;
        let lights = [point, sun(false), sun(true)];
        let (index, light) = key_light(&lights).unwrap();
        assert_eq!(index, 1);
        assert!(light.light.cast_shadow);
        assert!(key_light(&[sun(false)]).is_none());
    }

    #[test]
    fn points_below_the_light_land_inside_the_depth_range() {
        let matrix = light_view_proj(&sun(true), 5.0);
        let clip = matrix * Vector4::new(1.0, 0.0, 1.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
        // ten units below a light whose range starts at 0.5 and ends at 500
        let expected = (10.0 - SHADOW_NEAR) / (SHADOW_FAR - SHADOW_NEAR);
        assert!((ndc.z - expected).abs() < 1e-4);
    }
}
