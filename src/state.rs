//! GPU-free scene state.
//!
//! [`SceneState`] owns everything the scene decides: the imported node tree,
//! the selected camera and its projection, one mixer per clip, the label
//! sprites, the wheel accumulator and the theme. The renderer only reads from
//! it, which keeps every lifecycle rule testable without a device.

use anyhow::bail;
use cgmath::{Deg, Vector3};

use crate::{
    animation::{AnimationClip, AnimationMixer},
    camera::{CameraDesc, CameraUniform, Projection},
    config::SceneConfig,
    data_structures::{
        instance::{Instance, InstanceRaw},
        light::{LightKind, WorldLight},
        scene_graph::SceneGraph,
        sprite::Sprite,
    },
    theme::Theme,
    viewport::{SizingPass, Viewport, canvas_size, is_mobile},
    wheel::WheelState,
};

/// Everything `install` needs from a loaded asset.
#[derive(Clone, Debug, Default)]
pub struct SceneContent {
    pub graph: SceneGraph,
    pub cameras: Vec<CameraDesc>,
    pub clips: Vec<AnimationClip>,
}

/// One mesh to draw this frame.
#[derive(Clone, Copy, Debug)]
pub struct DrawItem {
    pub mesh: usize,
    pub instance: InstanceRaw,
    pub cast_shadow: bool,
}

pub type WheelListener = Box<dyn FnMut(f64)>;

pub struct SceneState {
    config: SceneConfig,
    graph: SceneGraph,
    /// Index of the camera definition the scene is viewed through.
    camera: Option<usize>,
    projection: Projection,
    mixers: Vec<AnimationMixer>,
    sprites: Vec<Sprite>,
    /// Sprite indices revealed by scrolling, in label order.
    revealed: Vec<usize>,
    wheel: WheelState,
    theme: Theme,
    /// Logical canvas size; `None` until the scene is installed.
    canvas: Option<(f64, f64)>,
    running: bool,
    on_wheel_change: Option<WheelListener>,
}

impl SceneState {
    pub fn new(config: SceneConfig) -> Self {
        let theme = Theme::from_dark(config.dark);
        Self {
            config,
            graph: SceneGraph::default(),
            camera: None,
            projection: Projection::new(16, 9, Deg(50.0), 0.1, crate::camera::DEFAULT_ZFAR),
            mixers: Vec::new(),
            sprites: Vec::new(),
            revealed: Vec::new(),
            wheel: WheelState::new(),
            theme,
            canvas: None,
            running: false,
            on_wheel_change: None,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Takes over a loaded asset: picks the camera, applies shadow flags and
    /// light settings, creates the mixers and sizes the canvas.
    ///
    /// Returns the logical canvas size.
    pub fn install(&mut self, content: SceneContent, viewport: Viewport) -> anyhow::Result<(f64, f64)> {
        let SceneContent {
            graph,
            cameras,
            clips,
        } = content;

        let (width, height) = canvas_size(viewport, SizingPass::Initial, &self.config.viewport);
        let camera_config = self.config.camera;
        let camera = match cameras.get(camera_config.index) {
            Some(_) => camera_config.index,
            None if !cameras.is_empty() => {
                log::warn!(
                    "Camera {} not found in the asset, using camera 0 instead.",
                    camera_config.index
                );
                0
            }
            None => bail!("the asset contains no camera"),
        };

        let mut projection = Projection::from_desc(&cameras[camera], (width / height.max(1.0)) as f32);
        projection.set_fovy(Deg(camera_config.fov_degrees));
        if is_mobile(viewport, &self.config.viewport) {
            projection.set_aspect(camera_config.mobile_aspect);
            projection.set_fovy(Deg(camera_config.mobile_fov_degrees));
        }

        self.graph = graph;
        self.camera = Some(camera);
        self.projection = projection;
        self.mixers = clips.into_iter().map(AnimationMixer::new).collect();
        self.sprites.clear();
        self.revealed.clear();
        self.wheel.reset();
        self.canvas = Some((width, height));

        if !self
            .graph
            .cameras()
            .iter()
            .any(|(index, _)| *index == camera)
        {
            log::warn!("No node carries camera {camera}; viewing from the origin.");
        }

        self.apply_shadow_rules();
        self.setup_lights();
        self.apply_theme();
        self.graph.update_world_transforms();

        Ok((width, height))
    }

    pub fn is_installed(&self) -> bool {
        self.canvas.is_some()
    }

    fn apply_shadow_rules(&mut self) {
        let rules = &self.config.lighting.shadow_rules;
        for root in self.graph.roots.iter_mut() {
            for rule in rules.iter() {
                if rule.matcher.matches(&root.name) {
                    root.set_shadow_flags(rule.cast, rule.receive, rule.include_node);
                }
            }
        }
    }

    /// One-time light setup. The key light casts the only directional shadow;
    /// the point lights under night props are tuned and nudged.
    fn setup_lights(&mut self) {
        let lighting = &self.config.lighting;
        for root in self.graph.roots.iter_mut() {
            if let Some(light) = root.light.as_mut()
                && light.kind == LightKind::Directional
            {
                light.cast_shadow = root.name == lighting.key_light;
                light.shadow_bias = lighting.directional_shadow_bias;
            }
            if !root.name.contains(lighting.night_marker.as_str()) {
                continue;
            }
            for child in root.children.iter_mut() {
                let Some(light) = child.light.as_mut() else {
                    continue;
                };
                if light.kind != LightKind::Point {
                    continue;
                }
                light.intensity = lighting.point_intensity;
                light.distance = lighting.point_distance;
                light.decay = lighting.point_decay;
                light.cast_shadow = true;
                light.shadow_bias = lighting.point_shadow_bias;
                child.local.position += Vector3::from(lighting.point_nudge);
            }
        }
    }

    /// Theme-dependent light intensities and night prop visibility.
    fn apply_theme(&mut self) {
        let theme = self.theme;
        let lighting = &self.config.lighting;
        for root in self.graph.roots.iter_mut() {
            if let Some(light) = root.light.as_mut()
                && light.kind == LightKind::Directional
            {
                light.intensity = if root.name == lighting.key_light {
                    theme.key_light_intensity()
                } else {
                    theme.fill_light_intensity()
                };
            }
            if root.name.contains(lighting.night_marker.as_str()) {
                root.visible = theme.shows_night_props();
            }
        }
    }

    /// Places the sprite of label `label` next to its board.
    ///
    /// Every label but the always-visible one starts hidden and is revealed by
    /// scrolling. Returns the sprite index.
    pub fn add_label_sprite(&mut self, label: usize) -> Option<usize> {
        let Some(board) = self.config.boards.get(label) else {
            log::warn!("Label {label} has no board placement.");
            return None;
        };
        let anchor = match self.graph.roots.iter().find(|root| root.name == board.node) {
            Some(node) => node.world.position,
            None => {
                log::warn!("Board {} not found, placing label {label} at the origin.", board.node);
                Vector3::new(0.0, 0.0, 0.0)
            }
        };
        let mut sprite = Sprite::new(label, board.offsets.apply(anchor), board.scale);
        let index = self.sprites.len();
        if label != self.config.always_visible_label {
            sprite.visible = false;
            self.revealed.push(index);
        }
        self.sprites.push(sprite);
        Some(index)
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn set_on_wheel_change(&mut self, listener: Option<WheelListener>) {
        self.on_wheel_change = listener;
    }

    /// Accumulates a wheel delta, updates the revealed sprites and scrubs
    /// every mixer to the matching time. Returns the accumulated value.
    pub fn handle_wheel(&mut self, delta: f64) -> f64 {
        let wheel_config = self.config.wheel;
        let value = self.wheel.accumulate(delta, &wheel_config);

        let shown = self.wheel.revealed(&wheel_config);
        for (slot, visible) in shown.into_iter().enumerate() {
            if let Some(sprite) = self
                .revealed
                .get(slot)
                .and_then(|&index| self.sprites.get_mut(index))
            {
                sprite.visible = visible;
            }
        }

        let time = self.wheel.mixer_time(&wheel_config);
        for mixer in self.mixers.iter_mut() {
            mixer.set_time(time);
            mixer.apply(&mut self.graph);
        }
        self.graph.update_world_transforms();

        if let Some(listener) = self.on_wheel_change.as_mut() {
            listener(value);
        }
        value
    }

    pub fn wheel_value(&self) -> f64 {
        self.wheel.value()
    }

    pub fn mixers(&self) -> &[AnimationMixer] {
        &self.mixers
    }

    pub fn update_background(&mut self, is_dark: bool) {
        self.theme = Theme::from_dark(is_dark);
        self.apply_theme();
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Resizes the canvas for a new viewport. Does nothing before `install`.
    pub fn resize(&mut self, viewport: Viewport) -> Option<(f64, f64)> {
        self.canvas?;
        let (width, height) = canvas_size(viewport, SizingPass::Resize, &self.config.viewport);
        self.projection.set_aspect((width / height.max(1.0)) as f32);
        self.canvas = Some((width, height));
        Some((width, height))
    }

    pub fn canvas_size(&self) -> Option<(f64, f64)> {
        self.canvas
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// World transform of the viewing camera's node.
    pub fn camera_transform(&self) -> Instance {
        self.camera
            .and_then(|camera| {
                self.graph
                    .cameras()
                    .into_iter()
                    .find(|(index, _)| *index == camera)
            })
            .map(|(_, world)| world)
            .unwrap_or_default()
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&self.camera_transform(), &self.projection);
        uniform
    }

    pub fn world_lights(&self) -> Vec<WorldLight> {
        self.graph.world_lights()
    }

    /// Meshes of visible nodes with their world transforms.
    pub fn draw_items(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        self.graph.traverse_visible(&mut |node| {
            if let Some(mesh) = node.mesh {
                items.push(DrawItem {
                    mesh,
                    instance: node.world.to_raw(node.receive_shadow),
                    cast_shadow: node.cast_shadow,
                });
            }
        });
        items
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stops and forgets the scene. A later `install` starts from scratch.
    pub fn dispose(&mut self) {
        self.stop();
        self.graph.clear();
        self.camera = None;
        self.mixers.clear();
        self.sprites.clear();
        self.revealed.clear();
        self.wheel.reset();
        self.canvas = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{
        light::{Light, LightKind},
        scene_graph::SceneNode,
    };

    fn camera(name: &str) -> CameraDesc {
        CameraDesc {
            name: name.into(),
            yfov: 0.8,
            aspect: Some(1.5),
            znear: 0.1,
            zfar: None,
        }
    }

    fn content() -> SceneContent {
        let mut key = SceneNode::new("light_key");
        key.light = Some(Light::new("light_key", LightKind::Directional));
        let mut fill = SceneNode::new("light_fill");
        fill.light = Some(Light::new("light_fill", LightKind::Directional));
        let mut fire = SceneNode::new("kagaribi");
        let mut flame = SceneNode::new("kagaribi_flame");
        flame.light = Some(Light::new("flame", LightKind::Point));
        fire.add_child(flame);
        let mut eye = SceneNode::new("Camera001");
        eye.camera = Some(1);
        let mut wall = SceneNode::new("wall_east");
        let mut panel = SceneNode::new("wall_east_panel");
        panel.mesh = Some(0);
        wall.add_child(panel);
        SceneContent {
            graph: SceneGraph::new(vec![key, fill, fire, eye, wall]),
            cameras: vec![camera("Camera"), camera("Camera.001")],
            clips: Vec::new(),
        }
    }

    #[test]
    fn wheel_is_ignored_by_missing_sprites() {
        let mut state = SceneState::new(SceneConfig::default());
        state.install(content(), Viewport::new(1600.0, 900.0)).unwrap();
        assert_eq!(state.handle_wheel(1500.0), 1500.0);
        assert!(state.sprites().is_empty());
    }

    #[test]
    fn lights_are_tuned_once() {
        let mut state = SceneState::new(SceneConfig::default());
        state.install(content(), Viewport::new(1600.0, 900.0)).unwrap();
        state.update_background(true);
        state.update_background(false);

        let graph = state.graph();
        let flame = graph.find("kagaribi_flame").unwrap();
        let light = flame.light.as_ref().unwrap();
        assert_eq!((light.distance, light.decay, light.intensity), (5.0, 2.0, 1.0));
        assert!((flame.local.position.y - 0.05).abs() < 1e-6);
        assert!((flame.local.position.z - 0.05).abs() < 1e-6);

        let key = graph.find("light_key").unwrap().light.as_ref().unwrap();
        assert!(key.cast_shadow);
        assert_eq!(key.shadow_bias, -0.0008);
        assert!(!graph.find("light_fill").unwrap().light.as_ref().unwrap().cast_shadow);
    }

    #[test]
    fn wall_rule_flags_the_meshes_below_the_wall() {
        let mut state = SceneState::new(SceneConfig::default());
        state.install(content(), Viewport::new(1600.0, 900.0)).unwrap();
        let panel = state.graph().find("wall_east_panel").unwrap();
        assert!(panel.cast_shadow && panel.receive_shadow);
        let wall = state.graph().find("wall_east").unwrap();
        assert!(!wall.cast_shadow && !wall.receive_shadow);
    }

    #[test]
    fn dispose_forgets_the_scene() {
        let mut state = SceneState::new(SceneConfig::default());
        state.install(content(), Viewport::new(1600.0, 900.0)).unwrap();
        state.start();
        state.dispose();
        assert!(!state.is_running());
        assert!(!state.is_installed());
        assert!(state.graph().is_empty());
        assert_eq!(state.resize(Viewport::new(800.0, 600.0)), None);
    }
}
