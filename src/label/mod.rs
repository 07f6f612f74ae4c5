//! Label canvases: text lines and an optional logo row drawn onto an
//! offscreen 2D surface, later uploaded as a sprite texture.
//!
//! Drawing goes through [`LabelCanvas`] so the same layout runs on the browser's
//! 2D canvas (`web`) and on the CPU rasteriser used by the native preview
//! (`raster`).

use std::future::Future;

use image::RgbaImage;

use crate::config::LabelDescriptor;

#[cfg(not(target_arch = "wasm32"))]
pub mod raster;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// Side length of the square label canvas in pixels.
pub const CANVAS_SIZE: u32 = 800;
pub const LOGO_SIZE: f64 = 40.0;
pub const LOGO_GAP: f64 = 20.0;
pub const CAPTION: &str = "etc.";
pub const TEXT_COLOUR: &str = "#000000";
pub const CAPTION_COLOUR: &str = "#4b5563";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSpec {
    pub weight: FontWeight,
    pub style: FontStyle,
    pub size: f32,
    pub family: &'static str,
}

impl FontSpec {
    pub const HEADING: FontSpec = FontSpec {
        weight: FontWeight::Bold,
        style: FontStyle::Normal,
        size: 28.0,
        family: "Arial",
    };
    pub const BODY: FontSpec = FontSpec {
        weight: FontWeight::Normal,
        style: FontStyle::Normal,
        size: 20.0,
        family: "Arial",
    };
    pub const CAPTION: FontSpec = FontSpec {
        weight: FontWeight::Normal,
        style: FontStyle::Italic,
        size: 18.0,
        family: "Arial",
    };

    /// CSS shorthand, e.g. `bold 28px Arial`.
    pub fn css(&self) -> String {
        let lead = match (self.style, self.weight) {
            (FontStyle::Italic, _) => "italic",
            (_, FontWeight::Bold) => "bold",
            _ => "normal",
        };
        format!("{} {}px {}", lead, self.size, self.family)
    }
}

/// Parses `#rrggbb` into RGB bytes.
pub fn parse_hex_colour(colour: &str) -> Option<[u8; 3]> {
    let hex = colour.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some([(value >> 16) as u8, (value >> 8) as u8, value as u8])
}

/// A 2D drawing surface with the handful of operations a label needs.
pub trait LabelCanvas {
    type Image;

    fn width(&self) -> f64;

    fn set_font(&mut self, font: &FontSpec);

    /// `colour` is a `#rrggbb` string.
    fn set_fill(&mut self, colour: &str);

    fn measure_text(&mut self, text: &str) -> f64;

    /// Draws `text` with its left edge at `x` and its alphabetic baseline at `y`.
    fn fill_text(&mut self, text: &str, x: f64, y: f64);

    fn load_image(&self, url: &str) -> impl Future<Output = anyhow::Result<Self::Image>>;

    fn draw_image(&mut self, image: &Self::Image, x: f64, y: f64, width: f64, height: f64);

    fn into_rgba(self) -> anyhow::Result<RgbaImage>;
}

/// Baseline of text line `index`; the heading gets extra space below it.
pub fn line_baseline(index: usize) -> f64 {
    180.0 + 40.0 * index as f64 + if index > 0 { 20.0 } else { 0.0 }
}

/// Top edge of the logo row under `line_count` text lines.
pub fn logo_row_top(line_count: usize) -> f64 {
    let lines = line_count as f64;
    150.0 + 40.0 * (lines - 1.0) + if line_count > 1 { 20.0 } else { 0.0 } + 40.0 + 30.0
}

/// Left edge of the first of `count` centred logos.
pub fn logo_row_start(count: usize, canvas_width: f64) -> f64 {
    let total = LOGO_SIZE * count as f64 + LOGO_GAP * count.saturating_sub(1) as f64;
    (canvas_width - total) / 2.0
}

/// Draws one label.
///
/// `logos` are drawn as a centred row followed by a caption. They load
/// concurrently; if any of them fails the row and caption are left out and
/// the text is kept.
pub async fn compose_label<C: LabelCanvas>(
    mut canvas: C,
    label: &LabelDescriptor,
    logos: &[String],
) -> anyhow::Result<RgbaImage> {
    let width = canvas.width();

    canvas.set_fill(TEXT_COLOUR);
    for (index, line) in label.lines.iter().enumerate() {
        let font = if index == 0 {
            FontSpec::HEADING
        } else {
            FontSpec::BODY
        };
        canvas.set_font(&font);
        let text_width = canvas.measure_text(line);
        canvas.fill_text(line, (width - text_width) / 2.0, line_baseline(index));
    }

    if !logos.is_empty() {
        let loaded = futures::future::join_all(logos.iter().map(|url| canvas.load_image(url)))
            .await
            .into_iter()
            .collect::<anyhow::Result<Vec<_>>>();
        match loaded {
            Ok(images) => {
                let top = logo_row_top(label.lines.len());
                let start = logo_row_start(images.len(), width);
                for (index, image) in images.iter().enumerate() {
                    let x = start + index as f64 * (LOGO_SIZE + LOGO_GAP);
                    canvas.draw_image(image, x, top, LOGO_SIZE, LOGO_SIZE);
                }
                canvas.set_font(&FontSpec::CAPTION);
                canvas.set_fill(CAPTION_COLOUR);
                let caption_width = canvas.measure_text(CAPTION);
                canvas.fill_text(
                    CAPTION,
                    width - 250.0 - caption_width,
                    top + LOGO_SIZE + 36.0,
                );
            }
            Err(e) => log::error!("Logo load error: {e:#}"),
        }
    }

    canvas.into_rgba()
}
