//! Loading the portfolio asset and other external files.
//!
//! [`SceneAsset`] is the CPU-side import of a binary glTF: the named node tree,
//! mesh and material data, decoded images, camera definitions, animation clips
//! and punctual lights. Uploading it to the GPU happens in `render`.

pub mod texture;

use anyhow::Context;
use image::RgbaImage;

use crate::{
    animation::{AnimationClip, Channel, Interpolation, Keyframes},
    camera::CameraDesc,
    data_structures::{
        instance::Instance,
        light::{Light, LightKind},
        model::ModelVertex,
        scene_graph::{SceneGraph, SceneNode},
    },
};

pub use texture::{decode_image, load_binary};

#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub primitives: Vec<PrimitiveData>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub base_colour: [f32; 4],
    /// Index into [`SceneAsset::images`].
    pub texture: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct SceneAsset {
    pub graph: SceneGraph,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub images: Vec<RgbaImage>,
    pub cameras: Vec<CameraDesc>,
    pub clips: Vec<AnimationClip>,
}

/**
 * Node names are normalised the way web 3D engines do it on import: whitespace
 * becomes `_` and the characters `[ ] . : /` are dropped, so Blender's
 * `board.001` is addressed as `board001`.
 */
pub fn sanitize_node_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '[' | ']' | '.' | ':' | '/'))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn to_rgba(image: gltf::image::Data) -> RgbaImage {
    use gltf::image::Format;

    let (width, height) = (image.width, image.height);
    let pixels: Option<Vec<u8>> = match image.format {
        Format::R8G8B8A8 => Some(image.pixels),
        Format::R8G8B8 => Some(
            image
                .pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
        ),
        Format::R8G8 => Some(
            image
                .pixels
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
        ),
        Format::R8 => Some(image.pixels.iter().flat_map(|&p| [p, p, p, 255]).collect()),
        other => {
            log::warn!("Unsupported texture format {:?}, using white instead.", other);
            None
        }
    };
    pixels
        .and_then(|pixels| RgbaImage::from_raw(width, height, pixels))
        .unwrap_or_else(|| RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255])))
}

fn to_light(light: gltf::khr_lights_punctual::Light) -> Light {
    use gltf::khr_lights_punctual::Kind;

    let kind = match light.kind() {
        Kind::Directional => LightKind::Directional,
        Kind::Point => LightKind::Point,
        Kind::Spot { .. } => LightKind::Spot,
    };
    let mut out = Light::new(light.name().unwrap_or_default(), kind);
    out.colour = light.color();
    out.intensity = light.intensity();
    out.distance = light.range().unwrap_or(0.0);
    out
}

fn to_scene_node(node: gltf::Node) -> SceneNode {
    let mut scene_node = SceneNode::new(&sanitize_node_name(node.name().unwrap_or_default()));
    scene_node.source = Some(node.index());
    scene_node.local = Instance::from_decomposed(node.transform().decomposed());
    scene_node.mesh = node.mesh().map(|mesh| mesh.index());
    scene_node.camera = node.camera().map(|camera| camera.index());
    scene_node.light = node.light().map(to_light);
    for child in node.children() {
        scene_node.add_child(to_scene_node(child));
    }
    scene_node
}

fn to_camera(camera: gltf::Camera) -> CameraDesc {
    let name = camera.name().unwrap_or_default().to_string();
    match camera.projection() {
        gltf::camera::Projection::Perspective(perspective) => CameraDesc {
            name,
            yfov: perspective.yfov(),
            aspect: perspective.aspect_ratio(),
            znear: perspective.znear(),
            zfar: perspective.zfar(),
        },
        gltf::camera::Projection::Orthographic(orthographic) => {
            log::warn!("Orthographic camera {name} is rendered with a perspective projection.");
            CameraDesc {
                name,
                yfov: 50f32.to_radians(),
                aspect: None,
                znear: orthographic.znear(),
                zfar: Some(orthographic.zfar()),
            }
        }
    }
}

fn read_meshes(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<MeshData> {
    document
        .meshes()
        .map(|mesh| {
            let primitives = mesh
                .primitives()
                .filter_map(|primitive| {
                    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
                    let Some(positions) = reader.read_positions() else {
                        log::warn!("Primitive without positions in mesh {:?}", mesh.name());
                        return None;
                    };
                    let mut vertices: Vec<ModelVertex> = positions
                        .map(|position| ModelVertex {
                            position,
                            tex_coords: [0.0, 0.0],
                            normal: [0.0, 1.0, 0.0],
                        })
                        .collect();
                    if let Some(normals) = reader.read_normals() {
                        vertices
                            .iter_mut()
                            .zip(normals)
                            .for_each(|(vertex, normal)| vertex.normal = normal);
                    }
                    if let Some(tex_coords) = reader.read_tex_coords(0) {
                        vertices
                            .iter_mut()
                            .zip(tex_coords.into_f32())
                            .for_each(|(vertex, uv)| vertex.tex_coords = uv);
                    }
                    let indices = match reader.read_indices() {
                        Some(indices) => indices.into_u32().collect(),
                        None => (0..vertices.len() as u32).collect(),
                    };
                    Some(PrimitiveData {
                        vertices,
                        indices,
                        material: primitive.material().index(),
                    })
                })
                .collect();
            MeshData {
                name: mesh.name().unwrap_or("unknown_mesh").to_string(),
                primitives,
            }
        })
        .collect()
}

fn read_clips(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<AnimationClip> {
    document
        .animations()
        .map(|animation| {
            let channels = animation
                .channels()
                .map(|channel| {
                    let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
                    let timestamps: Vec<f32> = match reader.read_inputs() {
                        Some(inputs) => inputs.collect(),
                        None => Vec::new(),
                    };
                    let keyframes = match reader.read_outputs() {
                        Some(gltf::animation::util::ReadOutputs::Translations(values)) => {
                            Keyframes::Translation(values.map(Into::into).collect())
                        }
                        Some(gltf::animation::util::ReadOutputs::Rotations(values)) => {
                            Keyframes::Rotation(
                                values
                                    .into_f32()
                                    .map(|q| cgmath::Quaternion::new(q[3], q[0], q[1], q[2]))
                                    .collect(),
                            )
                        }
                        Some(gltf::animation::util::ReadOutputs::Scales(values)) => {
                            Keyframes::Scale(values.map(Into::into).collect())
                        }
                        Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) | None => {
                            Keyframes::Other
                        }
                    };
                    let interpolation = match channel.sampler().interpolation() {
                        gltf::animation::Interpolation::Step => Interpolation::Step,
                        gltf::animation::Interpolation::Linear => Interpolation::Linear,
                        gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
                    };
                    Channel {
                        target: channel.target().node().index(),
                        keyframes,
                        timestamps,
                        interpolation,
                    }
                })
                .collect();
            AnimationClip::new(animation.name().unwrap_or("Default"), channels)
        })
        .collect()
}

impl SceneAsset {
    /// Imports a `.glb` (or self-contained `.gltf`) from memory.
    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        let (document, buffers, images) =
            gltf::import_slice(bytes).context("parsing the glTF asset")?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .context("the asset contains no scene")?;
        let graph = SceneGraph::new(scene.nodes().map(to_scene_node).collect());

        let materials = document
            .materials()
            .map(|material| {
                let pbr = material.pbr_metallic_roughness();
                MaterialData {
                    name: material.name().unwrap_or("material").to_string(),
                    base_colour: pbr.base_color_factor(),
                    texture: pbr
                        .base_color_texture()
                        .map(|info| info.texture().source().index()),
                }
            })
            .collect();

        Ok(Self {
            graph,
            meshes: read_meshes(&document, &buffers),
            materials,
            images: images.into_iter().map(to_rgba).collect(),
            cameras: document.cameras().map(to_camera).collect(),
            clips: read_clips(&document, &buffers),
        })
    }
}

pub async fn load_scene_asset(path: &str) -> anyhow::Result<SceneAsset> {
    let bytes = load_binary(path)
        .await
        .with_context(|| format!("loading {path}"))?;
    SceneAsset::from_slice(&bytes).with_context(|| format!("importing {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A triangle on `base`, a child `board.001`, two cameras, a key light and
    /// one clip sliding the board along z.
    const SCENE: &str = r#"{
        "asset": { "version": "2.0" },
        "extensionsUsed": ["KHR_lights_punctual"],
        "extensions": {
            "KHR_lights_punctual": {
                "lights": [{ "name": "light_key", "type": "directional", "color": [1, 1, 1], "intensity": 3 }]
            }
        },
        "scene": 0,
        "scenes": [{ "nodes": [0, 2, 3, 4] }],
        "nodes": [
            { "name": "base", "mesh": 0, "children": [1] },
            { "name": "board.001", "translation": [1, 0, 0] },
            { "name": "Camera", "camera": 0, "translation": [0, 1, 5] },
            { "name": "Camera.001", "camera": 1, "translation": [0, 2, 8] },
            { "name": "light_key", "rotation": [-0.7071068, 0, 0, 0.7071068],
              "extensions": { "KHR_lights_punctual": { "light": 0 } } }
        ],
        "cameras": [
            { "type": "perspective", "perspective": { "yfov": 0.8, "znear": 0.1, "zfar": 100 } },
            { "type": "perspective", "perspective": { "yfov": 0.6, "znear": 0.1, "aspectRatio": 1.7777778 } }
        ],
        "meshes": [{ "name": "base", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
        "animations": [{
            "name": "scroll",
            "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
            "samplers": [{ "input": 2, "output": 3, "interpolation": "LINEAR" }]
        }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0], "max": [2] },
            { "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 },
            { "buffer": 0, "byteOffset": 44, "byteLength": 8 },
            { "buffer": 0, "byteOffset": 52, "byteLength": 24 }
        ],
        "buffers": [{
            "byteLength": 76,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAAAAAAAAAAAQAAAAAAAAAAAAAAAAAAAAAAAAAAAAACAQA=="
        }]
    }"#;

    #[test]
    fn imports_named_tree() {
        let asset = SceneAsset::from_slice(SCENE.as_bytes()).unwrap();
        let board = asset.graph.find("board001").expect("sanitised board name");
        assert_eq!(board.source, Some(1));
        assert_eq!(board.world.position, cgmath::Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(asset.graph.roots.len(), 4);
        assert_eq!(asset.graph.find("base").and_then(|n| n.mesh), Some(0));
    }

    #[test]
    fn imports_geometry() {
        let asset = SceneAsset::from_slice(SCENE.as_bytes()).unwrap();
        let primitive = &asset.meshes[0].primitives[0];
        assert_eq!(primitive.vertices.len(), 3);
        assert_eq!(primitive.indices, vec![0, 1, 2]);
        assert_eq!(primitive.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(primitive.material, None);
    }

    #[test]
    fn imports_are_deterministic() {
        let first = SceneAsset::from_slice(SCENE.as_bytes()).unwrap();
        let second = SceneAsset::from_slice(SCENE.as_bytes()).unwrap();
        assert_eq!(first.meshes, second.meshes);
        assert_ne!(
            first.meshes[0].primitives[0].vertices[0],
            first.meshes[0].primitives[0].vertices[1]
        );
    }

    #[test]
    fn imports_cameras_lights_and_clips() {
        let asset = SceneAsset::from_slice(SCENE.as_bytes()).unwrap();
        assert_eq!(asset.cameras.len(), 2);
        assert!((asset.cameras[1].aspect.unwrap() - 16.0 / 9.0).abs() < 1e-5);
        assert_eq!(asset.cameras[0].zfar, Some(100.0));
        assert_eq!(asset.graph.cameras().len(), 2);

        let lights = asset.graph.world_lights();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].light.kind, LightKind::Directional);
        // rotated -90° about x, so it shines straight down
        assert!((lights[0].direction.y + 1.0).abs() < 1e-5);

        assert_eq!(asset.clips.len(), 1);
        assert_eq!(asset.clips[0].duration, 2.0);
        assert_eq!(asset.clips[0].channels[0].target, 1);
    }

    #[test]
    fn rejects_garbage() {
        assert!(SceneAsset::from_slice(b"not a gltf").is_err());
    }

    #[test]
    fn node_names_are_sanitised() {
        assert_eq!(sanitize_node_name("board.001"), "board001");
        assert_eq!(sanitize_node_name("stone wall [2]"), "stone_wall_2");
        assert_eq!(sanitize_node_name("kagaribi"), "kagaribi");
    }
}
