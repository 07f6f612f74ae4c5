//! GPU side of a generated scene and the per-frame render.
//!
//! [`GpuScene`] holds the uploaded meshes, materials and label textures. Each
//! frame it reads the [`SceneState`], refreshes the frame uniforms and records
//! two passes: the key light's shadow map, then the background, the lit meshes
//! and the label sprites.

use std::iter;

use image::RgbaImage;

use crate::{
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{DrawModel, Material, Mesh, Model},
        sprite::Sprite,
        texture::{Texture, create_clamped_sampler},
    },
    pipelines::{
        light::LightsUniform,
        shadow::{self, ShadowUniform},
        sprite::SpriteResources,
    },
    resources::{MaterialData, MeshData},
    state::{DrawItem, SceneState},
    theme::srgb_hex,
};

pub struct GpuScene {
    models: Vec<Model>,
    materials: Vec<Material>,
    /// Used by primitives without a material.
    fallback: Material,
    /// Parallel to [`SceneState::sprites`].
    sprites: Vec<SpriteResources>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
}

fn mk_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity.max(1) * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl GpuScene {
    pub fn new(
        ctx: &Context,
        meshes: &[MeshData],
        materials: &[MaterialData],
        images: &[RgbaImage],
    ) -> Self {
        let device = &ctx.device;
        let textures: Vec<Texture> = images
            .iter()
            .enumerate()
            .map(|(i, image)| {
                Texture::from_rgba(device, &ctx.queue, image, Some(&format!("image {i}")), true)
            })
            .collect();

        let materials = materials
            .iter()
            .map(|material| {
                let texture = match material.texture.and_then(|i| textures.get(i)) {
                    Some(texture) => texture.clone(),
                    None => Texture::white(device, &ctx.queue),
                };
                Material::new(
                    device,
                    &material.name,
                    texture,
                    material.base_colour,
                    &ctx.material_layout,
                )
            })
            .collect();
        let fallback = Material::new(
            device,
            "fallback",
            Texture::white(device, &ctx.queue),
            [1.0, 1.0, 1.0, 1.0],
            &ctx.material_layout,
        );

        let models = meshes
            .iter()
            .map(|mesh| Model {
                meshes: mesh
                    .primitives
                    .iter()
                    .enumerate()
                    .map(|(i, primitive)| {
                        Mesh::new(
                            device,
                            &format!("{} #{i}", mesh.name),
                            &primitive.vertices,
                            &primitive.indices,
                            primitive.material,
                        )
                    })
                    .collect(),
            })
            .collect();

        let instance_capacity = 64;
        Self {
            models,
            materials,
            fallback,
            sprites: Vec::new(),
            instance_buffer: mk_instance_buffer(device, instance_capacity),
            instance_capacity,
        }
    }

    /// Uploads a label canvas for a sprite just added to the scene state.
    pub fn add_sprite(&mut self, ctx: &Context, sprite: &Sprite, image: &RgbaImage) {
        let mut texture = Texture::from_rgba(
            &ctx.device,
            &ctx.queue,
            image,
            Some(&format!("label {}", sprite.label)),
            true,
        );
        texture.sampler = create_clamped_sampler(&ctx.device);
        self.sprites
            .push(SpriteResources::new(&ctx.device, texture, sprite, &ctx.sprite_layout));
    }

    fn upload_instances(&mut self, ctx: &Context, items: &[DrawItem]) {
        if items.is_empty() {
            return;
        }
        if items.len() > self.instance_capacity {
            self.instance_capacity = items.len().next_power_of_two();
            self.instance_buffer = mk_instance_buffer(&ctx.device, self.instance_capacity);
        }
        let raw: Vec<InstanceRaw> = items.iter().map(|item| item.instance).collect();
        ctx.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&raw));
    }

    /// Renders one frame and returns the number of draw calls.
    pub fn render(&mut self, ctx: &Context, state: &SceneState) -> Result<usize, wgpu::SurfaceError> {
        let config = state.config();
        let theme = state.theme();

        ctx.write_camera(&state.camera_uniform());

        let lights = state.world_lights();
        let mut lights_uniform = LightsUniform::new(
            srgb_hex(config.lighting.ambient_colour),
            theme.ambient_intensity(),
            theme.fog_colour(),
            &config.fog,
            &lights,
        );
        let key_light = shadow::key_light(&lights);
        if let Some((index, light)) = key_light {
            let matrix = shadow::light_view_proj(light, config.lighting.shadow_extent);
            lights_uniform.set_shadow(index, matrix, light.light.shadow_bias);
            ctx.queue.write_buffer(
                &ctx.shadow.uniform,
                0,
                bytemuck::cast_slice(&[ShadowUniform {
                    light_view_proj: matrix.into(),
                }]),
            );
        }
        ctx.write_lights(&lights_uniform);
        ctx.background.set_gradient(&ctx.queue, theme.background());

        let items = state.draw_items();
        self.upload_instances(ctx, &items);

        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        let mut draw_calls = 0;

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.shadow.map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            if key_light.is_some() {
                pass.set_pipeline(&ctx.shadow.pipeline);
                pass.set_bind_group(0, &ctx.shadow.bind_group, &[]);
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                for (i, item) in items.iter().enumerate().filter(|(_, item)| item.cast_shadow) {
                    let Some(model) = self.models.get(item.mesh) else {
                        continue;
                    };
                    let instance = i as u32;
                    for mesh in model.meshes.iter() {
                        pass.draw_mesh_depth(mesh, instance..instance + 1);
                        draw_calls += 1;
                    }
                }
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            ctx.background.draw(&mut pass);
            draw_calls += 1;

            pass.set_pipeline(&ctx.pipelines.mesh);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (i, item) in items.iter().enumerate() {
                let Some(model) = self.models.get(item.mesh) else {
                    log::warn!("Node references missing mesh {}", item.mesh);
                    continue;
                };
                let instance = i as u32;
                for mesh in model.meshes.iter() {
                    let material = mesh
                        .material
                        .and_then(|m| self.materials.get(m))
                        .unwrap_or(&self.fallback);
                    pass.draw_mesh_instanced(
                        mesh,
                        material,
                        instance..instance + 1,
                        &ctx.frame_bind_group,
                    );
                    draw_calls += 1;
                }
            }

            pass.set_pipeline(&ctx.pipelines.sprite);
            pass.set_bind_group(0, &ctx.frame_bind_group, &[]);
            for (_, resources) in state
                .sprites()
                .iter()
                .zip(self.sprites.iter())
                .filter(|(sprite, _)| sprite.visible)
            {
                pass.set_bind_group(1, &resources.bind_group, &[]);
                pass.draw(0..6, 0..1);
                draw_calls += 1;
            }
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();

        Ok(draw_calls)
    }
}
