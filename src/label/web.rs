//! Label canvas backed by a detached DOM `<canvas>`.

use anyhow::{Context, anyhow};
use image::RgbaImage;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::label::{CANVAS_SIZE, FontSpec, LabelCanvas};

fn js_err(value: wasm_bindgen::JsValue) -> anyhow::Error {
    anyhow!("{value:?}")
}

pub struct WebCanvas {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl WebCanvas {
    pub fn new(size: u32) -> anyhow::Result<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .context("no document")?;
        let canvas = document
            .create_element("canvas")
            .map_err(js_err)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| anyhow!("created element is not a canvas"))?;
        canvas.set_width(size);
        canvas.set_height(size);
        let context = canvas
            .get_context("2d")
            .map_err(js_err)?
            .context("2d context unavailable")?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| anyhow!("unexpected 2d context type"))?;
        Ok(Self { canvas, context })
    }

    pub fn with_default_size() -> anyhow::Result<Self> {
        Self::new(CANVAS_SIZE)
    }
}

impl LabelCanvas for WebCanvas {
    type Image = HtmlImageElement;

    fn width(&self) -> f64 {
        self.canvas.width() as f64
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.context.set_font(&font.css());
    }

    fn set_fill(&mut self, colour: &str) {
        self.context.set_fill_style_str(colour);
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        match self.context.measure_text(text) {
            Ok(metrics) => metrics.width(),
            Err(e) => {
                log::warn!("measureText failed: {e:?}");
                0.0
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        if let Err(e) = self.context.fill_text(text, x, y) {
            log::warn!("fillText failed: {e:?}");
        }
    }

    async fn load_image(&self, url: &str) -> anyhow::Result<HtmlImageElement> {
        let image = HtmlImageElement::new().map_err(js_err)?;
        image.set_cross_origin(Some("anonymous"));
        image.set_src(url);
        JsFuture::from(image.decode())
            .await
            .map_err(|e| anyhow!("loading {url}: {e:?}"))?;
        Ok(image)
    }

    fn draw_image(&mut self, image: &HtmlImageElement, x: f64, y: f64, width: f64, height: f64) {
        if let Err(e) = self
            .context
            .draw_image_with_html_image_element_and_dw_and_dh(image, x, y, width, height)
        {
            log::warn!("drawImage failed: {e:?}");
        }
    }

    fn into_rgba(self) -> anyhow::Result<RgbaImage> {
        let (width, height) = (self.canvas.width(), self.canvas.height());
        let data = self
            .context
            .get_image_data(0.0, 0.0, width as f64, height as f64)
            .map_err(js_err)?;
        RgbaImage::from_raw(width, height, data.data().0).context("canvas pixel buffer size mismatch")
    }
}
