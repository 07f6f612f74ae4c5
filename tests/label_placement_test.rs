use portfolio_scene::{SceneConfig, config::BoardPlacement};

use crate::common::test_utils::{DESKTOP, assert_close, installed};

mod common;

#[test]
fn labels_sit_next_to_their_boards() {
    let state = installed(SceneConfig::default(), DESKTOP);
    let sprites = state.sprites();

    // "board" at (1, 2, 3) with "-x": -0.1 and +0.2 on x
    assert_close(sprites[0].position.x, 1.1);
    assert_close(sprites[0].position.y, 1.9);
    assert_close(sprites[0].position.z, 3.0);
    assert_close(sprites[0].scale, 1.0);

    // "board001" at (0, 1, 0) with "xz"
    assert_close(sprites[1].position.x, -0.1);
    assert_close(sprites[1].position.y, 0.9);
    assert_close(sprites[1].position.z, 0.05);

    // "board_small" at (-1, 0, 2) with "-x", scaled down
    assert_close(sprites[2].position.x, -0.9);
    assert_close(sprites[2].position.y, -0.1);
    assert_close(sprites[2].position.z, 2.0);
    assert_close(sprites[2].scale, 0.75);
}

#[test]
fn a_missing_board_places_its_label_at_the_origin() {
    let mut config = SceneConfig::default();
    config.boards[0] = BoardPlacement::new("board_gone", "", 1.0);
    let state = installed(config, DESKTOP);

    let sprite = &state.sprites()[0];
    assert_close(sprite.position.x, 0.0);
    assert_close(sprite.position.y, -0.1);
    assert_close(sprite.position.z, 0.0);
}

#[test]
fn a_label_without_placement_gets_no_sprite() {
    let mut config = SceneConfig::default();
    config.boards.truncate(1);
    let mut state = installed(config, DESKTOP);

    assert_eq!(state.sprites().len(), 1);
    assert_eq!(state.add_label_sprite(2), None);
}

#[test]
fn board_shadows_follow_the_rules() {
    let state = installed(SceneConfig::default(), DESKTOP);
    let graph = state.graph();

    // rules flag the meshes below a matched node, except "base" which is
    // flagged itself
    let face = graph.find("board_face").unwrap();
    assert!(face.cast_shadow && !face.receive_shadow);
    assert!(!graph.find("board").unwrap().cast_shadow);
    let base = graph.find("base").unwrap();
    assert!(!base.cast_shadow && base.receive_shadow);
    let panel = graph.find("wall_east_panel").unwrap();
    assert!(panel.cast_shadow && panel.receive_shadow);
    let wall = graph.find("wall_east").unwrap();
    assert!(!wall.cast_shadow && !wall.receive_shadow);

    let casters: Vec<_> = state
        .draw_items()
        .iter()
        .filter(|item| item.cast_shadow)
        .map(|item| item.mesh)
        .collect();
    assert_eq!(casters, vec![1, 4]);
}
