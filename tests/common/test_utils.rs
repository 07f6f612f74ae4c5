#![allow(dead_code)]

use cgmath::Vector3;
use portfolio_scene::{
    SceneConfig, SceneContent, SceneState, Viewport,
    animation::{AnimationClip, Channel, Interpolation, Keyframes},
    camera::CameraDesc,
    data_structures::{
        light::{Light, LightKind},
        scene_graph::{SceneGraph, SceneNode},
    },
};

pub const DESKTOP: Viewport = Viewport {
    width: 1600.0,
    height: 900.0,
};
pub const PHONE: Viewport = Viewport {
    width: 360.0,
    height: 800.0,
};

/// Source index of the node the `slide` clip moves.
pub const DOOR_SOURCE: usize = 7;

fn node_at(name: &str, position: [f32; 3]) -> SceneNode {
    let mut node = SceneNode::new(name);
    node.local.position = position.into();
    node
}

fn light(name: &str, kind: LightKind) -> SceneNode {
    let mut node = SceneNode::new(name);
    node.light = Some(Light::new(name, kind));
    node
}

fn camera(name: &str, aspect: Option<f32>) -> CameraDesc {
    CameraDesc {
        name: name.to_string(),
        yfov: 0.6,
        aspect,
        znear: 0.1,
        zfar: Some(100.0),
    }
}

/// Moves the door from x = 0 to x = 2 over two seconds.
pub fn slide_clip() -> AnimationClip {
    AnimationClip::new(
        "slide",
        vec![Channel {
            target: DOOR_SOURCE,
            keyframes: Keyframes::Translation(vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(2.0, 0.0, 0.0),
            ]),
            timestamps: vec![0.0, 2.0],
            interpolation: Interpolation::Linear,
        }],
    )
}

/// A small stand-in for the portfolio asset: the three boards (the first with
/// a mesh below it), a wall whose panel is its mesh, both cameras,
/// the key and fill lights, a bonfire with its point light and a door driven
/// by the `slide` clip.
pub fn portfolio_content() -> SceneContent {
    let mut base = SceneNode::new("base");
    base.mesh = Some(0);

    let mut wall = SceneNode::new("wall_east");
    let mut panel = SceneNode::new("wall_east_panel");
    panel.mesh = Some(1);
    wall.add_child(panel);

    let mut board = node_at("board", [1.0, 2.0, 3.0]);
    let mut face = SceneNode::new("board_face");
    face.mesh = Some(4);
    board.add_child(face);

    let mut fire = node_at("kagaribi", [0.5, 0.0, 0.5]);
    fire.mesh = Some(2);
    fire.add_child(light("kagaribi_flame", LightKind::Point));

    let mut door = SceneNode::new("door");
    door.source = Some(DOOR_SOURCE);
    door.mesh = Some(3);

    let mut eye = node_at("Camera001", [0.0, 2.0, 8.0]);
    eye.camera = Some(1);
    let mut overview = node_at("Camera", [0.0, 10.0, 0.0]);
    overview.camera = Some(0);

    SceneContent {
        graph: SceneGraph::new(vec![
            base,
            wall,
            fire,
            door,
            board,
            node_at("board001", [0.0, 1.0, 0.0]),
            node_at("board_small", [-1.0, 0.0, 2.0]),
            light("light_key", LightKind::Directional),
            light("light_fill", LightKind::Directional),
            overview,
            eye,
        ]),
        cameras: vec![camera("Camera", None), camera("Camera.001", Some(1.5))],
        clips: vec![slide_clip()],
    }
}

/// An installed scene with one sprite per label, added in label order.
pub fn installed(config: SceneConfig, viewport: Viewport) -> SceneState {
    let labels = config.labels.len();
    let mut state = SceneState::new(config);
    state
        .install(portfolio_content(), viewport)
        .expect("the test scene has cameras");
    for label in 0..labels {
        state.add_label_sprite(label);
    }
    state
}

pub fn visible_labels(state: &SceneState) -> Vec<usize> {
    state
        .sprites()
        .iter()
        .filter(|sprite| sprite.visible)
        .map(|sprite| sprite.label)
        .collect()
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-5,
        "expected {expected}, got {actual}"
    );
}
