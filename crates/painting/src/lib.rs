//! Layered raster painting core
//!
//! This crate provides the engine behind an interactive painting surface:
//! - [`surface`] - Straight-alpha RGBA8 bitmaps and dab rasterization
//! - [`layers`] - Layer stack with source-over compositing
//! - [`stroke`] - Stroke engine turning pointer input into spaced paint samples
//! - [`dispatch`] - Tool selection, renderer registry and fallback dispatch
//! - [`history`] - Snapshot-based undo/redo with ordered restores
//! - [`export`] - PNG/JPEG/BMP encoding of the composite
//! - [`canvas`] - The canvas wiring all of the above together

pub mod canvas;
pub mod constants;
pub mod dispatch;
pub mod export;
pub mod history;
pub mod layers;
pub mod stroke;
pub mod surface;
pub mod types;

pub use canvas::*;
pub use constants::*;
pub use dispatch::*;
pub use export::{ExportError, ExportFormat};
pub use history::*;
pub use layers::*;
pub use stroke::*;
pub use surface::*;
pub use types::*;

pub use layerpaint_config::CanvasConfig;
