//! Scene lifecycle: generate, wheel, theme, resize, stop and dispose.
//!
//! [`PortfolioManager`] ties the GPU-free [`SceneState`] to the [`GpuScene`]
//! uploaded for it. Loading is split in two so it fits both event-loop hosts:
//! [`prepare`] is the async part (asset fetch and label drawing, no GPU), and
//! [`PortfolioManager::finish_loading`] installs the result on the event-loop
//! thread.

use image::RgbaImage;
use instant::Duration;
use winit::dpi::LogicalSize;

use crate::{
    config::SceneConfig,
    context::Context,
    label::{LabelCanvas, compose_label},
    render::GpuScene,
    resources::{MaterialData, MeshData, load_scene_asset},
    state::{SceneContent, SceneState, WheelListener},
    viewport::current_viewport,
};

/// Everything `generate` loads before touching the GPU.
pub struct PreparedScene {
    pub content: SceneContent,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub images: Vec<RgbaImage>,
    /// Label canvases that were drawn successfully, with their label index.
    pub labels: Vec<(usize, RgbaImage)>,
}

/// Draws every label on a canvas from `make_canvas`, in label order. A label
/// whose canvas can't be created or drawn is logged and left out.
pub async fn draw_labels_with<C, F>(
    config: &SceneConfig,
    mut make_canvas: F,
) -> Vec<(usize, RgbaImage)>
where
    C: LabelCanvas,
    F: FnMut() -> anyhow::Result<C>,
{
    let mut labels = Vec::with_capacity(config.labels.len());
    for (index, label) in config.labels.iter().enumerate() {
        let logos: &[String] = if index == config.logo_label {
            &config.logos
        } else {
            &[]
        };
        let drawn = match make_canvas() {
            Ok(canvas) => compose_label(canvas, label, logos).await,
            Err(e) => Err(e),
        };
        match drawn {
            Ok(image) => labels.push((index, image)),
            Err(e) => log::error!("Skipping label {index}: {e:#}"),
        }
    }
    labels
}

/// Loads the asset and draws every label.
pub async fn prepare(config: SceneConfig) -> anyhow::Result<PreparedScene> {
    let asset = load_scene_asset(&config.asset_path).await?;
    log::info!(
        "Loaded {} with {} meshes, {} cameras and {} clips",
        config.asset_path,
        asset.meshes.len(),
        asset.cameras.len(),
        asset.clips.len()
    );

    #[cfg(not(target_arch = "wasm32"))]
    let labels =
        draw_labels_with(&config, || Ok(crate::label::raster::RasterCanvas::default())).await;
    #[cfg(target_arch = "wasm32")]
    let labels = draw_labels_with(&config, crate::label::web::WebCanvas::with_default_size).await;

    Ok(PreparedScene {
        content: SceneContent {
            graph: asset.graph,
            cameras: asset.cameras,
            clips: asset.clips,
        },
        meshes: asset.meshes,
        materials: asset.materials,
        images: asset.images,
        labels,
    })
}

/// Requests a logical canvas size from the window and reconfigures the surface
/// when the platform applies it right away.
fn apply_canvas_size(ctx: &mut Context, width: f64, height: f64) {
    let window = ctx.window().clone();
    let current = window.inner_size().to_logical::<f64>(window.scale_factor());
    if (current.width - width).abs() < 0.5 && (current.height - height).abs() < 0.5 {
        return;
    }
    if let Some(size) = window.request_inner_size(LogicalSize::new(width, height)) {
        ctx.resize(size.width, size.height);
    }
}

pub struct PortfolioManager {
    state: SceneState,
    gpu: Option<GpuScene>,
    loading: bool,
}

impl PortfolioManager {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            state: SceneState::new(config),
            gpu: None,
            loading: false,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        self.state.config()
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Marks a load as started. Returns `false` when one is already running.
    pub fn begin_loading(&mut self) -> bool {
        if self.loading {
            log::warn!("Scene is already loading");
            return false;
        }
        self.loading = true;
        true
    }

    /// Ends the running load, successful or not. A failed load is logged
    /// and handed back.
    pub fn settle_loading(
        &mut self,
        prepared: anyhow::Result<PreparedScene>,
    ) -> anyhow::Result<PreparedScene> {
        self.loading = false;
        if let Err(e) = &prepared {
            log::error!("Failed to generate the scene: {e:#}");
        }
        prepared
    }

    /// Installs a prepared scene, or returns the load error.
    pub fn finish_loading(
        &mut self,
        ctx: &mut Context,
        prepared: anyhow::Result<PreparedScene>,
    ) -> anyhow::Result<()> {
        let prepared = self.settle_loading(prepared)?;
        let result = self.install(ctx, prepared);
        if let Err(e) = &result {
            log::error!("Failed to install the scene: {e:#}");
        }
        result
    }

    fn install(&mut self, ctx: &mut Context, prepared: PreparedScene) -> anyhow::Result<()> {
        let PreparedScene {
            content,
            meshes,
            materials,
            images,
            labels,
        } = prepared;

        let viewport = current_viewport(ctx.window());
        let (width, height) = self.state.install(content, viewport)?;
        apply_canvas_size(ctx, width, height);
        ctx.background
            .set_gradient(&ctx.queue, self.state.theme().background());

        let mut gpu = GpuScene::new(ctx, &meshes, &materials, &images);
        for (label, image) in labels {
            if let Some(index) = self.state.add_label_sprite(label) {
                gpu.add_sprite(ctx, &self.state.sprites()[index], &image);
            }
        }
        self.gpu = Some(gpu);
        self.state.start();
        log::info!("Scene ready at {width}x{height}");
        Ok(())
    }

    /// Draws one frame if a scene is installed.
    pub fn redraw(&mut self, ctx: &mut Context) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        match gpu.render(ctx, &self.state) {
            Ok(draw_calls) => {
                if self.state.config().debug {
                    log::debug!("{draw_calls} draw calls");
                }
            }
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = (ctx.config.width, ctx.config.height);
                ctx.resize(width, height);
            }
            Err(e) => log::error!("Unable to render {e}"),
        }
    }

    /// A frame of the render loop.
    pub fn frame(&mut self, ctx: &mut Context, dt: Duration) {
        if self.state.config().debug {
            log::debug!("Frame time {dt:?}");
        }
        self.redraw(ctx);
    }

    /// Scrubs the scene by a wheel delta and renders once.
    pub fn handle_wheel(&mut self, ctx: &mut Context, delta: f64) -> f64 {
        let value = self.state.handle_wheel(delta);
        self.redraw(ctx);
        value
    }

    pub fn update_background(&mut self, ctx: &mut Context, is_dark: bool) {
        self.state.update_background(is_dark);
        ctx.background
            .set_gradient(&ctx.queue, self.state.theme().background());
        self.redraw(ctx);
    }

    /// Re-fits the canvas to the current viewport. Does nothing before the
    /// scene is generated.
    pub fn resize(&mut self, ctx: &mut Context) {
        let viewport = current_viewport(ctx.window());
        if let Some((width, height)) = self.state.resize(viewport) {
            apply_canvas_size(ctx, width, height);
        }
    }

    pub fn set_on_wheel_change(&mut self, listener: Option<WheelListener>) {
        self.state.set_on_wheel_change(listener);
    }

    pub fn stop(&mut self) {
        self.state.stop();
    }

    /// Stops and drops the scene's GPU resources.
    pub fn dispose(&mut self) {
        self.state.dispose();
        self.gpu = None;
        log::info!("Scene disposed");
    }
}
