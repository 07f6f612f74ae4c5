use portfolio_scene::{
    SceneConfig, SceneState,
    data_structures::light::LightKind,
    theme::{Theme, srgb_hex},
};

use crate::common::test_utils::{DESKTOP, assert_close, installed};

mod common;

fn light_intensity(state: &SceneState, name: &str) -> f32 {
    state
        .graph()
        .find(name)
        .and_then(|node| node.light.as_ref())
        .map(|light| light.intensity)
        .unwrap()
}

fn drawn_meshes(state: &SceneState) -> Vec<usize> {
    state.draw_items().iter().map(|item| item.mesh).collect()
}

#[test]
fn the_light_theme_is_the_default() {
    let state = installed(SceneConfig::default(), DESKTOP);
    assert_eq!(state.theme(), Theme::Light);
    assert_close(light_intensity(&state, "light_key"), 2.5);
    assert_close(light_intensity(&state, "light_fill"), 1.0);
    assert!(!state.graph().find("kagaribi").unwrap().visible);
}

#[test]
fn dark_mode_dims_the_sun_and_lights_the_fires() {
    let mut state = installed(SceneConfig::default(), DESKTOP);
    state.update_background(true);

    let theme = state.theme();
    assert!(theme.is_dark());
    assert_close(theme.ambient_intensity(), 0.05);
    assert_eq!(theme.fog_colour(), srgb_hex(0x0a0e27));
    assert_eq!(theme.background().top, srgb_hex(0x0a0e27));
    assert_eq!(theme.background().bottom, srgb_hex(0x2d3748));
    assert_close(light_intensity(&state, "light_key"), 0.1);
    assert_close(light_intensity(&state, "light_fill"), 0.0);
    assert!(state.graph().find("kagaribi").unwrap().visible);
}

#[test]
fn hidden_fires_are_neither_drawn_nor_lit() {
    let mut state = installed(SceneConfig::default(), DESKTOP);
    let points = |state: &SceneState| {
        state
            .world_lights()
            .iter()
            .filter(|light| light.light.kind == LightKind::Point)
            .count()
    };

    assert_eq!(points(&state), 0);
    assert!(!drawn_meshes(&state).contains(&2));

    state.update_background(true);
    assert_eq!(points(&state), 1);
    assert!(drawn_meshes(&state).contains(&2));

    state.update_background(false);
    assert_eq!(points(&state), 0);
}

#[test]
fn toggling_back_restores_the_light_theme() {
    let mut state = installed(SceneConfig::default(), DESKTOP);
    state.update_background(true);
    state.update_background(false);

    let theme = state.theme();
    assert_close(theme.ambient_intensity(), 0.5);
    assert_eq!(theme.fog_colour(), srgb_hex(0xcfd8dc));
    assert_eq!(theme.background().top, srgb_hex(0xa1d2e6));
    assert_eq!(theme.background().bottom, srgb_hex(0xf0f8ff));
    assert_close(light_intensity(&state, "light_key"), 2.5);

    // the fire's point light keeps its one-time nudge
    let flame = state.graph().find("kagaribi_flame").unwrap();
    assert_close(flame.local.position.y, 0.05);
    assert_close(flame.local.position.z, 0.05);
}

#[test]
fn starting_dark_applies_the_dark_theme_on_install() {
    let config = SceneConfig {
        dark: true,
        ..SceneConfig::default()
    };
    let state = installed(config, DESKTOP);
    assert!(state.theme().is_dark());
    assert!(state.graph().find("kagaribi").unwrap().visible);
    assert_close(light_intensity(&state, "light_key"), 0.1);
}
