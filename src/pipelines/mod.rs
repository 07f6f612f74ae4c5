//! Render pipelines.
//!
//! - `background` draws the theme gradient
//! - `basic` holds the pipeline builder and the lit mesh pipeline
//! - `light` packs the per-frame lighting uniform
//! - `shadow` renders the key light's depth map
//! - `sprite` draws the label billboards

pub mod background;
pub mod basic;
pub mod light;
pub mod shadow;
pub mod sprite;
