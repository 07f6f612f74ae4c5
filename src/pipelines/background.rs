//! Full-screen vertical gradient drawn behind the scene.

use wgpu::util::DeviceExt;

use crate::{
    pipelines::basic::{depth_state, mk_render_pipeline},
    theme::Gradient,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GradientUniform {
    pub top: [f32; 4],
    pub bottom: [f32; 4],
}

impl From<Gradient> for GradientUniform {
    fn from(gradient: Gradient) -> Self {
        Self {
            top: gradient.top,
            bottom: gradient.bottom,
        }
    }
}

#[derive(Debug)]
pub struct BackgroundResources {
    pub uniform: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub pipeline: wgpu::RenderPipeline,
}

impl BackgroundResources {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, gradient: Gradient) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("background_bind_group_layout"),
        });
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Background Buffer"),
            contents: bytemuck::cast_slice(&[GradientUniform::from(gradient)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
            label: Some("background_bind_group"),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Background Pipeline Layout"),
            bind_group_layouts: &[&layout],
            ..Default::default()
        });
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Background Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
        };
        let pipeline = mk_render_pipeline(
            device,
            "Background Pipeline",
            &pipeline_layout,
            format,
            Some(wgpu::BlendState::REPLACE),
            Some(depth_state(false, wgpu::CompareFunction::Always)),
            None,
            &[],
            shader,
        );
        Self {
            uniform,
            bind_group,
            pipeline,
        }
    }

    pub fn set_gradient(&self, queue: &wgpu::Queue, gradient: Gradient) {
        queue.write_buffer(
            &self.uniform,
            0,
            bytemuck::cast_slice(&[GradientUniform::from(gradient)]),
        );
    }

    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
