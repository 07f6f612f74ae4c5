//! CPU label canvas for the native preview.
//!
//! Text is shaped and rasterised with `cosmic-text` using the fonts installed on
//! the system. Logos are fetched like every other resource; SVGs go through
//! `resvg`, everything else through `image`.

use anyhow::Context;
use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, Style, SwashCache, Weight};
use image::{Rgba, RgbaImage, imageops};

use crate::{
    label::{CANVAS_SIZE, FontSpec, FontStyle, FontWeight, LabelCanvas, parse_hex_colour},
    resources::{decode_image, load_binary},
};

pub struct RasterCanvas {
    image: RgbaImage,
    font_system: FontSystem,
    swash_cache: SwashCache,
    font: FontSpec,
    fill: [u8; 3],
}

impl RasterCanvas {
    pub fn new(size: u32) -> Self {
        Self {
            image: RgbaImage::new(size, size),
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            font: FontSpec::BODY,
            fill: [0, 0, 0],
        }
    }

    /// Shapes `text` in the current font.
    fn shape(&mut self, text: &str) -> Buffer {
        let size = self.font.size;
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size * 1.2));
        buffer.set_size(&mut self.font_system, None, None);
        let attrs = Attrs::new()
            .family(Family::Name(self.font.family))
            .weight(match self.font.weight {
                FontWeight::Normal => Weight::NORMAL,
                FontWeight::Bold => Weight::BOLD,
            })
            .style(match self.font.style {
                FontStyle::Normal => Style::Normal,
                FontStyle::Italic => Style::Italic,
            });
        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    fn blend(&mut self, x: i32, y: i32, colour: [u8; 3], alpha: u8) {
        if x < 0 || y < 0 || x as u32 >= self.image.width() || y as u32 >= self.image.height() {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        let a = alpha as f32 / 255.0;
        let dst_a = pixel[3] as f32 / 255.0;
        let out_a = a + dst_a * (1.0 - a);
        if out_a <= 0.0 {
            return;
        }
        let mix = |src: u8, dst: u8| {
            ((src as f32 * a + dst as f32 * dst_a * (1.0 - a)) / out_a).round() as u8
        };
        *pixel = Rgba([
            mix(colour[0], pixel[0]),
            mix(colour[1], pixel[1]),
            mix(colour[2], pixel[2]),
            (out_a * 255.0).round() as u8,
        ]);
    }
}

impl Default for RasterCanvas {
    fn default() -> Self {
        Self::new(CANVAS_SIZE)
    }
}

/// Rasterises an SVG document at its intrinsic size.
pub fn rasterize_svg(bytes: &[u8]) -> anyhow::Result<RgbaImage> {
    let tree = resvg::usvg::Tree::from_data(bytes, &resvg::usvg::Options::default())?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .context("SVG has an empty canvas")?;
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());
    let pixels = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let c = pixel.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(size.width(), size.height(), pixels).context("SVG pixmap size mismatch")
}

fn is_svg(url: &str, bytes: &[u8]) -> bool {
    url.ends_with(".svg")
        || bytes
            .windows(4)
            .take(1024)
            .any(|window| window == b"<svg")
}

impl LabelCanvas for RasterCanvas {
    type Image = RgbaImage;

    fn width(&self) -> f64 {
        self.image.width() as f64
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.font = *font;
    }

    fn set_fill(&mut self, colour: &str) {
        match parse_hex_colour(colour) {
            Some(rgb) => self.fill = rgb,
            None => log::warn!("Unsupported fill colour {colour}"),
        }
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        let buffer = self.shape(text);
        buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0f32, f32::max) as f64
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let buffer = self.shape(text);
        let Some(baseline) = buffer.layout_runs().next().map(|run| run.line_y) else {
            return;
        };
        let (ox, oy) = (x.round() as i32, (y - baseline as f64).round() as i32);
        let fill = self.fill;
        let mut coverage = Vec::new();
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            Color::rgb(fill[0], fill[1], fill[2]),
            |px, py, w, h, colour| coverage.push((px, py, w, h, colour.a())),
        );
        for (px, py, w, h, alpha) in coverage {
            for dy in 0..h as i32 {
                for dx in 0..w as i32 {
                    self.blend(ox + px + dx, oy + py + dy, fill, alpha);
                }
            }
        }
    }

    async fn load_image(&self, url: &str) -> anyhow::Result<RgbaImage> {
        let bytes = load_binary(url).await?;
        if is_svg(url, &bytes) {
            rasterize_svg(&bytes).with_context(|| format!("rasterising {url}"))
        } else {
            decode_image(&bytes).with_context(|| format!("decoding {url}"))
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, x: f64, y: f64, width: f64, height: f64) {
        let (w, h) = (width.round().max(1.0) as u32, height.round().max(1.0) as u32);
        let scaled = imageops::resize(image, w, h, imageops::FilterType::Triangle);
        imageops::overlay(&mut self.image, &scaled, x.round() as i64, y.round() as i64);
    }

    fn into_rgba(self) -> anyhow::Result<RgbaImage> {
        Ok(self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8" viewBox="0 0 8 8"><rect width="8" height="8" fill="#ff0000"/></svg>"##;

    #[test]
    fn svg_rasterises_at_intrinsic_size() {
        let image = rasterize_svg(SQUARE.as_bytes()).unwrap();
        assert_eq!(image.dimensions(), (8, 8));
        assert_eq!(image.get_pixel(4, 4), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn svg_is_sniffed_from_content() {
        assert!(is_svg("logo", SQUARE.as_bytes()));
        assert!(is_svg("x.svg", b""));
        assert!(!is_svg("x.png", &[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn images_are_scaled_into_place() {
        let mut canvas = RasterCanvas::new(64);
        let logo = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]));
        canvas.draw_image(&logo, 10.0, 20.0, 16.0, 16.0);
        let out = canvas.into_rgba().unwrap();
        assert_eq!(out.get_pixel(18, 28), &Rgba([0, 0, 255, 255]));
        assert_eq!(out.get_pixel(5, 5)[3], 0);
    }

    #[test]
    fn blending_onto_transparent_keeps_the_source_colour() {
        let mut canvas = RasterCanvas::new(4);
        canvas.blend(1, 1, [10, 20, 30], 128);
        canvas.blend(-1, 9, [10, 20, 30], 255);
        let out = canvas.into_rgba().unwrap();
        assert_eq!(out.get_pixel(1, 1), &Rgba([10, 20, 30, 128]));
    }
}
