//! Event loop host.
//!
//! [`App`] owns the window [`Context`] and the [`PortfolioManager`] and routes
//! winit events to them. Async work (context creation, scene loading) runs on
//! a tokio runtime natively and via `spawn_local` in the browser, where the
//! results come back into the loop as [`SceneEvent`]s. Calls from the
//! embedding page go through the same proxy, so every scene mutation happens
//! inside the event loop.
//!
//! - native: [`run`] opens a preview window. The wheel scrubs, `D` toggles the
//!   dark theme and `Escape` quits.
//! - web: [`PortfolioScene`] is the `wasm_bindgen` surface the page talks to.

use std::{fmt::Debug, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    config::SceneConfig,
    context::Context,
    manager::{PortfolioManager, PreparedScene, prepare},
    state::WheelListener,
    theme::Theme,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Settles a pending `generate` call with `Ok` or the error message.
pub(crate) type GenerateReply = futures::channel::oneshot::Sender<Result<(), String>>;

pub(crate) enum SceneEvent {
    #[allow(dead_code)]
    ContextReady(anyhow::Result<Context>),
    #[allow(dead_code)]
    Generate(Option<GenerateReply>),
    #[allow(dead_code)]
    Prepared(anyhow::Result<PreparedScene>),
    #[allow(dead_code)]
    Wheel(f64),
    #[allow(dead_code)]
    UpdateBackground(bool),
    #[allow(dead_code)]
    Resize,
    #[allow(dead_code)]
    Dispose,
    #[allow(dead_code)]
    SetOnWheelChange(Option<WheelListener>),
}

impl Debug for SceneEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContextReady(result) => f
                .debug_tuple("ContextReady")
                .field(&result.is_ok())
                .finish(),
            Self::Generate(reply) => f.debug_tuple("Generate").field(&reply.is_some()).finish(),
            Self::Prepared(result) => f.debug_tuple("Prepared").field(&result.is_ok()).finish(),
            Self::Wheel(delta) => f.debug_tuple("Wheel").field(delta).finish(),
            Self::UpdateBackground(dark) => f.debug_tuple("UpdateBackground").field(dark).finish(),
            Self::Resize => f.write_str("Resize"),
            Self::Dispose => f.write_str("Dispose"),
            Self::SetOnWheelChange(_) => f.write_str("SetOnWheelChange(|f64| -> {...})"),
        }
    }
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: EventLoopProxy<SceneEvent>,
    #[cfg(target_arch = "wasm32")]
    canvas_id: String,
    context: Option<Context>,
    manager: PortfolioManager,
    /// A generate call arrived before the context was ready.
    generate_requested: bool,
    waiting: Vec<GenerateReply>,
    last_time: Instant,
}

impl App {
    #[cfg(not(target_arch = "wasm32"))]
    fn new(event_loop: &EventLoop<SceneEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            context: None,
            manager: PortfolioManager::new(config),
            // the preview generates as soon as it has a window
            generate_requested: true,
            waiting: Vec::new(),
            last_time: Instant::now(),
        })
    }

    #[cfg(target_arch = "wasm32")]
    fn new(event_loop: &EventLoop<SceneEvent>, config: SceneConfig, canvas_id: String) -> Self {
        Self {
            proxy: event_loop.create_proxy(),
            canvas_id,
            context: None,
            manager: PortfolioManager::new(config),
            generate_requested: false,
            waiting: Vec::new(),
            last_time: Instant::now(),
        }
    }

    fn on_context(&mut self, ctx: Context) {
        ctx.window().request_redraw();
        self.context = Some(ctx);
        if std::mem::take(&mut self.generate_requested) {
            self.start_generate();
        }
    }

    fn start_generate(&mut self) {
        if self.context.is_none() {
            self.generate_requested = true;
            return;
        }
        if !self.manager.begin_loading() {
            return;
        }
        let config = self.manager.config().clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let prepared = self.async_runtime.block_on(prepare(config));
            self.on_prepared(prepared);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let prepared = prepare(config).await;
                if proxy.send_event(SceneEvent::Prepared(prepared)).is_err() {
                    log::warn!("Event loop closed before the scene finished loading");
                }
            });
        }
    }

    fn on_prepared(&mut self, prepared: anyhow::Result<PreparedScene>) {
        let result = match self.context.as_mut() {
            Some(ctx) => {
                let result = self.manager.finish_loading(ctx, prepared);
                if result.is_ok() {
                    ctx.window().request_redraw();
                }
                result
            }
            None => Err(anyhow::anyhow!("the render context is gone")),
        };
        let outcome = result.map_err(|e| format!("{e:#}"));
        for reply in self.waiting.drain(..) {
            // the caller may have stopped waiting
            let _ = reply.send(outcome.clone());
        }
    }

    fn reject_waiting(&mut self, message: &str) {
        for reply in self.waiting.drain(..) {
            let _ = reply.send(Err(message.to_string()));
        }
    }

    fn toggle_theme(&mut self) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        let dark = !self.manager.state().theme().is_dark();
        log::info!("Switching to the {} theme", if dark { "dark" } else { "light" });
        self.manager.update_background(ctx, dark);
    }
}

impl ApplicationHandler<SceneEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.context.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Portfolio");

        #[cfg(not(target_arch = "wasm32"))]
        {
            window_attributes =
                window_attributes.with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0));
        }

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(&self.canvas_id))
                .and_then(|element| element.dyn_into::<web_sys::HtmlCanvasElement>().ok());
            let Some(canvas) = canvas else {
                log::error!("No canvas with id {:?}", self.canvas_id);
                self.reject_waiting("canvas not found");
                event_loop.exit();
                return;
            };
            window_attributes = window_attributes.with_canvas(Some(canvas));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create the window: {e}");
                self.reject_waiting("unable to create the window");
                event_loop.exit();
                return;
            }
        };

        let config = self.manager.config();
        let gradient = Theme::from_dark(config.dark).background();
        let context = Context::new(window, config.lighting.shadow_map_size, gradient);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(context) {
                Ok(ctx) => self.on_context(ctx),
                Err(e) => {
                    log::error!("Unable to set up rendering: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = context.await;
                if proxy.send_event(SceneEvent::ContextReady(result)).is_err() {
                    log::warn!("Event loop closed before rendering was set up");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: SceneEvent) {
        match event {
            SceneEvent::ContextReady(Ok(ctx)) => {
                // This is the message from our wasm `spawn_local`
                self.on_context(ctx);
            }
            SceneEvent::ContextReady(Err(e)) => {
                log::error!("Unable to set up rendering: {e:#}");
                self.reject_waiting(&format!("{e:#}"));
                event_loop.exit();
            }
            SceneEvent::Generate(reply) => {
                self.waiting.extend(reply);
                self.start_generate();
            }
            SceneEvent::Prepared(prepared) => self.on_prepared(prepared),
            SceneEvent::Wheel(delta) => {
                if let Some(ctx) = self.context.as_mut() {
                    self.manager.handle_wheel(ctx, delta);
                }
            }
            SceneEvent::UpdateBackground(dark) => {
                if let Some(ctx) = self.context.as_mut() {
                    self.manager.update_background(ctx, dark);
                }
            }
            SceneEvent::Resize => {
                if let Some(ctx) = self.context.as_mut() {
                    self.manager.resize(ctx);
                }
            }
            SceneEvent::Dispose => self.manager.dispose(),
            SceneEvent::SetOnWheelChange(listener) => self.manager.set_on_wheel_change(listener),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.manager.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ctx) = self.context.as_mut() {
                    ctx.resize(size.width, size.height);
                    // the preview window is its own canvas, so keep its aspect
                    #[cfg(not(target_arch = "wasm32"))]
                    self.manager.resize(ctx);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now - self.last_time;
                self.last_time = now;
                if let Some(ctx) = self.context.as_mut() {
                    self.manager.frame(ctx, dt);
                    if self.manager.is_running() {
                        ctx.window().request_redraw();
                    }
                }
            }
            // In the browser the page forwards wheel events itself.
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::MouseWheel { delta, .. } => {
                use winit::event::MouseScrollDelta;

                // winit reports scrolling down as negative, the DOM as positive
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => {
                        -(y as f64) * self.manager.config().wheel.pixels_per_line
                    }
                    MouseScrollDelta::PixelDelta(position) => -position.y,
                };
                if let Some(ctx) = self.context.as_mut() {
                    let value = self.manager.handle_wheel(ctx, delta);
                    log::debug!("Wheel at {value}");
                }
            }
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                use winit::keyboard::{Key, NamedKey};

                match event.logical_key.as_ref() {
                    Key::Character("d" | "D") => self.toggle_theme(),
                    Key::Named(NamedKey::Escape) => {
                        self.manager.stop();
                        event_loop.exit();
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        // a second scene on the same page finds the logger already set
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

/// Opens the native preview window and runs until it is closed.
#[cfg(not(target_arch = "wasm32"))]
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    init_logging();

    let event_loop: EventLoop<SceneEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

/// The scene as seen from JavaScript.
///
/// ```js
/// const scene = new PortfolioScene("canvas");
/// await scene.generate(() => console.log("ready"));
/// window.addEventListener("wheel", (e) => scene.handleWheel(e));
/// ```
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct PortfolioScene {
    proxy: EventLoopProxy<SceneEvent>,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl PortfolioScene {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<PortfolioScene, JsValue> {
        use winit::platform::web::EventLoopExtWebSys;

        init_logging();
        let event_loop: EventLoop<SceneEvent> = EventLoop::with_user_event()
            .build()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let proxy = event_loop.create_proxy();
        let app = App::new(&event_loop, SceneConfig::default(), canvas_id.to_string());
        event_loop.spawn_app(app);
        Ok(Self { proxy })
    }

    /// Loads the asset and builds the scene. Resolves after `on_complete` has
    /// run; rejects with the error message if loading fails.
    pub fn generate(&self, on_complete: Option<js_sys::Function>) -> js_sys::Promise {
        let (sender, receiver) = futures::channel::oneshot::channel();
        let sent = self.proxy.send_event(SceneEvent::Generate(Some(sender))).is_ok();
        wasm_bindgen_futures::future_to_promise(async move {
            if !sent {
                return Err(JsValue::from_str("the scene has shut down"));
            }
            match receiver.await {
                Ok(Ok(())) => {
                    if let Some(callback) = on_complete {
                        callback.call0(&JsValue::NULL)?;
                    }
                    Ok(JsValue::UNDEFINED)
                }
                Ok(Err(message)) => Err(JsValue::from_str(&message)),
                Err(_) => Err(JsValue::from_str("the scene has shut down")),
            }
        })
    }

    #[wasm_bindgen(js_name = handleWheel)]
    pub fn handle_wheel(&self, event: &web_sys::WheelEvent) {
        self.post(SceneEvent::Wheel(event.delta_y()));
    }

    #[wasm_bindgen(js_name = updateBackground)]
    pub fn update_background(&self, is_dark: bool) {
        self.post(SceneEvent::UpdateBackground(is_dark));
    }

    pub fn resize(&self) {
        self.post(SceneEvent::Resize);
    }

    pub fn dispose(&self) {
        self.post(SceneEvent::Dispose);
    }

    /// `callback` receives the accumulated wheel value after every update.
    #[wasm_bindgen(js_name = setOnWheelChange)]
    pub fn set_on_wheel_change(&self, callback: Option<js_sys::Function>) {
        let listener = callback.map(|callback| {
            Box::new(move |value: f64| {
                if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_f64(value)) {
                    log::error!("Wheel callback failed: {e:?}");
                }
            }) as WheelListener
        });
        self.post(SceneEvent::SetOnWheelChange(listener));
    }
}

#[cfg(target_arch = "wasm32")]
impl PortfolioScene {
    fn post(&self, event: SceneEvent) {
        if let Err(e) = self.proxy.send_event(event) {
            log::warn!("Dropped {:?}: the event loop has exited", e.0);
        }
    }
}
