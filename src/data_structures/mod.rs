//! Scene data structures.
//!
//! - `instance` holds node transforms and their per-instance GPU layout
//! - `light` describes the punctual lights imported from the asset
//! - `model` contains uploaded meshes, materials and draw helpers
//! - `scene_graph` is the named node tree of the loaded asset
//! - `sprite` is a label billboard
//! - `texture` wraps GPU textures

pub mod instance;
pub mod light;
pub mod model;
pub mod scene_graph;
pub mod sprite;
pub mod texture;
