#![cfg(not(target_arch = "wasm32"))]

use std::future::Future;

use image::RgbaImage;
use portfolio_scene::{
    SceneConfig,
    label::{FontSpec, LabelCanvas},
    manager::{PortfolioManager, draw_labels_with, prepare},
};

/// Paints nothing; every label comes out as a 4x4 transparent image.
struct BlankCanvas;

impl LabelCanvas for BlankCanvas {
    type Image = ();

    fn width(&self) -> f64 {
        4.0
    }

    fn set_font(&mut self, _font: &FontSpec) {}

    fn set_fill(&mut self, _colour: &str) {}

    fn measure_text(&mut self, text: &str) -> f64 {
        text.len() as f64
    }

    fn fill_text(&mut self, _text: &str, _x: f64, _y: f64) {}

    fn load_image(&self, _url: &str) -> impl Future<Output = anyhow::Result<()>> {
        async { Ok(()) }
    }

    fn draw_image(&mut self, _image: &(), _x: f64, _y: f64, _width: f64, _height: f64) {}

    fn into_rgba(self) -> anyhow::Result<RgbaImage> {
        Ok(RgbaImage::new(4, 4))
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Runtime::new().unwrap().block_on(future)
}

#[test]
fn a_missing_asset_fails_with_its_path() {
    let config = SceneConfig {
        asset_path: "/nope/missing.glb".to_string(),
        ..SceneConfig::default()
    };
    let err = block_on(prepare(config)).err().expect("the asset does not exist");
    assert!(
        err.to_string().starts_with("loading /nope/missing.glb"),
        "unexpected error: {err}"
    );
}

#[test]
fn a_failed_load_can_be_retried() {
    let mut manager = PortfolioManager::new(SceneConfig::default());
    assert!(manager.begin_loading());
    // a second generate while the first is in flight is ignored
    assert!(!manager.begin_loading());

    let config = SceneConfig {
        asset_path: "/nope/missing.glb".to_string(),
        ..SceneConfig::default()
    };
    let prepared = block_on(prepare(config));
    assert!(manager.settle_loading(prepared).is_err());
    assert!(!manager.is_loading());
    assert!(!manager.is_running());

    assert!(manager.begin_loading());
}

#[test]
fn a_label_that_fails_to_draw_is_left_out() {
    let config = SceneConfig::default();
    assert_eq!(config.labels.len(), 3);

    let mut calls = 0;
    let labels = block_on(draw_labels_with(&config, || {
        calls += 1;
        if calls == 2 {
            anyhow::bail!("no canvas");
        }
        Ok(BlankCanvas)
    }));

    let drawn: Vec<_> = labels.iter().map(|(label, _)| *label).collect();
    assert_eq!(drawn, vec![0, 2]);
    assert_eq!(labels[1].1.dimensions(), (4, 4));
}
