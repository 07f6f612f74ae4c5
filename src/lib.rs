//! portfolio-scene
//!
//! An interactive 3D portfolio scene rendered with wgpu, in the browser
//! (WebGL2) and in a native preview window. A glTF asset provides the geometry,
//! the camera, the lights and the animation clips; label billboards are drawn
//! onto offscreen canvases and attached to the asset's boards; the mouse wheel
//! scrubs the animation and reveals the labels; a light and a dark theme swap
//! the background, the lighting and the fog.
//!
//! High-level modules
//! - `animation`: keyframe clips and the mixers that sample them
//! - `camera`: projection and view uniforms for the asset's camera
//! - `config`: content tables and every tunable of the scene
//! - `context`: GPU and window context that owns device, queue and pipelines
//! - `data_structures`: scene graph, meshes, lights, sprites and textures
//! - `flow`: the event loop host, native `run` and the web `PortfolioScene`
//! - `label`: label canvas layout and its browser/native backends
//! - `manager`: the scene lifecycle (generate, wheel, theme, resize, dispose)
//! - `pipelines`: mesh, shadow, sprite and background pipelines
//! - `render`: uploaded scene data and the per-frame passes
//! - `resources`: asset and image loading
//! - `state`: GPU-free scene state
//! - `theme`, `viewport`, `wheel`: the small rule sets the state applies
//!

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod label;
pub mod manager;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod state;
pub mod theme;
pub mod viewport;
pub mod wheel;

pub use config::SceneConfig;
pub use state::{SceneContent, SceneState};
pub use viewport::Viewport;
