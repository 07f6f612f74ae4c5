//! Canvas sizing from the viewport.

use crate::config::ViewportConfig;

/// Logical viewport size in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Narrow and taller than wide.
pub fn is_mobile(viewport: Viewport, config: &ViewportConfig) -> bool {
    viewport.width <= config.mobile_max_width && viewport.height > viewport.width
}

/// The first sizing on generate uses a different portrait ratio than later resizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizingPass {
    Initial,
    Resize,
}

/// Canvas size `(width, height)` in logical pixels for the given viewport.
pub fn canvas_size(viewport: Viewport, pass: SizingPass, config: &ViewportConfig) -> (f64, f64) {
    let width = viewport.width;
    let ratio = if is_mobile(viewport, config) {
        match pass {
            SizingPass::Initial => config.initial_mobile_ratio,
            SizingPass::Resize => config.resize_mobile_ratio,
        }
    } else {
        config.desktop_ratio
    };
    (width, width * ratio)
}

/// Current viewport of the page.
#[cfg(target_arch = "wasm32")]
pub fn current_viewport(_window: &winit::window::Window) -> Viewport {
    let dimension = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
    };
    match web_sys::window() {
        Some(window) => Viewport::new(
            dimension(window.inner_width()),
            dimension(window.inner_height()),
        ),
        None => Viewport::new(0.0, 0.0),
    }
}

/// Current viewport of the preview window: its logical inner size.
///
/// The preview window is its own canvas, so sizing it from itself settles
/// after one round since the height is derived from the width.
#[cfg(not(target_arch = "wasm32"))]
pub fn current_viewport(window: &winit::window::Window) -> Viewport {
    let size = window.inner_size().to_logical::<f64>(window.scale_factor());
    Viewport::new(size.width, size.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_needs_narrow_and_portrait() {
        let config = ViewportConfig::default();
        assert!(is_mobile(Viewport::new(390.0, 844.0), &config));
        assert!(is_mobile(Viewport::new(768.0, 1024.0), &config));
        assert!(!is_mobile(Viewport::new(769.0, 1024.0), &config));
        assert!(!is_mobile(Viewport::new(700.0, 500.0), &config));
        assert!(!is_mobile(Viewport::new(500.0, 500.0), &config));
    }

    #[test]
    fn desktop_is_nine_by_sixteen() {
        let config = ViewportConfig::default();
        let viewport = Viewport::new(1600.0, 900.0);
        assert_eq!(canvas_size(viewport, SizingPass::Initial, &config), (1600.0, 900.0));
        assert_eq!(canvas_size(viewport, SizingPass::Resize, &config), (1600.0, 900.0));
    }

    #[test]
    fn mobile_ratio_depends_on_the_pass() {
        let config = ViewportConfig::default();
        let viewport = Viewport::new(360.0, 800.0);
        let (w, h) = canvas_size(viewport, SizingPass::Initial, &config);
        assert_eq!(w, 360.0);
        assert!((h - 640.0).abs() < 1e-9);
        let (w, h) = canvas_size(viewport, SizingPass::Resize, &config);
        assert_eq!(w, 360.0);
        assert!((h - 480.0).abs() < 1e-9);
    }
}
