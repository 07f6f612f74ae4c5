use portfolio_scene::{SceneConfig, SceneState, Viewport};

use crate::common::test_utils::{DESKTOP, PHONE, assert_close, installed, portfolio_content};

mod common;

#[test]
fn resize_before_generate_is_a_no_op() {
    let mut state = SceneState::new(SceneConfig::default());
    assert_eq!(state.resize(DESKTOP), None);
    assert_eq!(state.canvas_size(), None);
}

#[test]
fn desktop_keeps_nine_by_sixteen() {
    let mut state = installed(SceneConfig::default(), DESKTOP);
    assert_eq!(state.canvas_size(), Some((1600.0, 900.0)));
    // the asset's own aspect is kept on desktop
    assert_close(state.projection().aspect(), 1.5);
    assert_close(state.projection().fovy().0, 35.0_f32.to_radians());

    assert_eq!(
        state.resize(Viewport::new(1200.0, 1000.0)),
        Some((1200.0, 675.0))
    );
    assert_close(state.projection().aspect(), 1200.0 / 675.0);
}

#[test]
fn phones_get_a_portrait_canvas_and_a_wider_lens() {
    let mut state = installed(SceneConfig::default(), PHONE);
    let (width, height) = state.canvas_size().unwrap();
    assert_eq!(width, 360.0);
    assert!((height - 640.0).abs() < 1e-9);
    assert_close(state.projection().aspect(), 9.0 / 16.0);
    assert_close(state.projection().fovy().0, 40.0_f32.to_radians());

    // later resizes use the 8:6 portrait ratio
    let (width, height) = state.resize(Viewport::new(390.0, 844.0)).unwrap();
    assert_eq!(width, 390.0);
    assert!((height - 520.0).abs() < 1e-9);
    assert_close(state.projection().aspect(), 0.75);
}

#[test]
fn turning_a_phone_sideways_switches_to_desktop_sizing() {
    let mut state = installed(SceneConfig::default(), PHONE);
    let (width, height) = state.resize(Viewport::new(800.0, 360.0)).unwrap();
    assert_eq!(width, 800.0);
    assert!((height - 450.0).abs() < 1e-9);
}

#[test]
fn a_missing_camera_falls_back_to_the_first() {
    let mut config = SceneConfig::default();
    config.camera.index = 5;
    let mut state = SceneState::new(config);
    state.install(portfolio_content(), DESKTOP).unwrap();
    // camera 0 has no aspect of its own, so the canvas aspect applies
    assert_close(state.projection().aspect(), 1600.0 / 900.0);
    assert_close(state.camera_transform().position.y, 10.0);
}

#[test]
fn the_configured_camera_node_is_the_viewpoint() {
    let state = installed(SceneConfig::default(), DESKTOP);
    let eye = state.camera_transform();
    assert_close(eye.position.y, 2.0);
    assert_close(eye.position.z, 8.0);
}

#[test]
fn an_asset_without_cameras_fails_to_install() {
    let mut content = portfolio_content();
    content.cameras.clear();
    let mut state = SceneState::new(SceneConfig::default());
    let error = state.install(content, DESKTOP).unwrap_err();
    assert!(error.to_string().contains("no camera"));
    assert!(!state.is_installed());
}

#[test]
fn stop_and_dispose() {
    let mut state = installed(SceneConfig::default(), DESKTOP);
    state.start();
    state.stop();
    assert!(!state.is_running());
    assert!(state.is_installed());

    state.dispose();
    assert!(state.sprites().is_empty());
    assert!(state.mixers().is_empty());
    assert_eq!(state.resize(DESKTOP), None);
}
