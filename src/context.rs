//! GPU and window context.
//!
//! [`Context`] owns the device, the surface and everything that lives as long
//! as the window does: the frame uniforms (camera and lights), the depth
//! buffer, the key light's shadow map and the pipelines. Scene-specific GPU
//! data (meshes, materials, label textures) lives in [`crate::render::GpuScene`].

use std::sync::Arc;

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::CameraUniform,
    config::FogConfig,
    data_structures::texture::Texture,
    pipelines::{
        background::BackgroundResources,
        basic::{material_layout, mk_mesh_pipeline},
        light::LightsUniform,
        shadow::ShadowResources,
        sprite::{mk_sprite_layout, mk_sprite_pipeline},
    },
    theme::Gradient,
};

#[derive(Debug)]
pub struct Pipelines {
    pub mesh: wgpu::RenderPipeline,
    pub sprite: wgpu::RenderPipeline,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera_buffer: wgpu::Buffer,
    pub lights_buffer: wgpu::Buffer,
    /// Group 0 of the mesh and sprite pipelines: camera, lights and the shadow map.
    pub frame_bind_group: wgpu::BindGroup,
    pub material_layout: wgpu::BindGroupLayout,
    pub sprite_layout: wgpu::BindGroupLayout,
    pub shadow: ShadowResources,
    pub background: BackgroundResources,
    pub pipelines: Pipelines,
    /// Only visible where the background pass doesn't reach.
    pub clear_colour: wgpu::Color,
}

fn frame_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let uniform = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            uniform(0),
            uniform(1),
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("frame_bind_group_layout"),
    })
}

impl Context {
    pub async fn new(
        window: Arc<Window>,
        shadow_map_size: u32,
        gradient: Gradient,
    ) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating the render surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .context("requesting the device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders write linear colour and rely on an sRGB surface to encode it.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no texture formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lights = LightsUniform::new([0.0; 4], 0.0, [0.0; 4], &FogConfig::default(), &[]);
        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights Buffer"),
            contents: bytemuck::cast_slice(&[lights]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shadow = ShadowResources::new(&device, shadow_map_size);

        let frame_layout = frame_layout(&device);
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&shadow.map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&shadow.map.sampler),
                },
            ],
            label: Some("frame_bind_group"),
        });

        let material_layout = material_layout(&device);
        let sprite_layout = mk_sprite_layout(&device);
        let pipelines = Pipelines {
            mesh: mk_mesh_pipeline(&device, &config, &frame_layout, &material_layout),
            sprite: mk_sprite_pipeline(&device, &config, &frame_layout, &sprite_layout),
        };
        let background = BackgroundResources::new(&device, config.format, gradient);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera_buffer,
            lights_buffer,
            frame_bind_group,
            material_layout,
            sprite_layout,
            shadow,
            background,
            pipelines,
            clear_colour: wgpu::Color::BLACK,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Reconfigures the surface and depth buffer. Zero-sized requests are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        true
    }

    pub fn write_camera(&self, uniform: &CameraUniform) {
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }

    pub fn write_lights(&self, uniform: &LightsUniform) {
        self.queue
            .write_buffer(&self.lights_buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }
}
