//! The painting canvas
//!
//! Ties the pieces together:
//! - Pointer input goes through the stroke engine
//! - Paint samples go through the tool dispatcher into the layer that was
//!   active at pointer-down
//! - Closed strokes recomposite the layer stack and save a history snapshot
//! - Layer edits, resizes and exports close an open stroke first
//! - Undo/redo restore snapshots through the history's restore queue
//!
//! A canvas is plain owned state; hosts drive it from their event loop.

mod input;
mod undo;

use thiserror::Error;
use tracing::{debug, info};

use layerpaint_config::CanvasConfig;

use crate::dispatch::{RendererRegistry, ToolDispatcher, ToolSelection};
use crate::export::{self, ExportError, ExportFormat};
use crate::history::{History, Snapshot, SnapshotError};
use crate::layers::{LayerError, LayerStack};
use crate::stroke::StrokeEngine;
use crate::surface::Bitmap;
use crate::types::{Color, ColorParseError, LayerId};

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Color(#[from] ColorParseError),
    #[error(transparent)]
    Layer(#[from] LayerError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug)]
pub struct Canvas {
    config: CanvasConfig,
    /// Paintable layers
    pub(crate) layers: LayerStack,
    /// Composite of all layers, what the host displays
    pub(crate) visible: Bitmap,
    pub(crate) dispatcher: ToolDispatcher,
    pub(crate) strokes: StrokeEngine,
    pub(crate) history: History,
    /// Tool used by the next stroke
    pub(crate) selection: ToolSelection,
    pub(crate) color: Color,
    pub(crate) brush_size: f32,
    pub(crate) brush_opacity: f32,
}

impl Canvas {
    /// Create a canvas with a blank background layer and the built-in renderers
    ///
    /// History starts with one snapshot of the blank canvas.
    pub fn new(config: CanvasConfig) -> Result<Self, CanvasError> {
        Self::with_registry(config, RendererRegistry::with_builtins())
    }

    /// Create a canvas that paints through `registry`
    pub fn with_registry(config: CanvasConfig, registry: RendererRegistry) -> Result<Self, CanvasError> {
        let config = config.validated();
        let color: Color = config.brush.color.parse()?;

        let layers = LayerStack::new(config.width, config.height);
        let mut visible = Bitmap::new(config.width, config.height);
        layers.composite(&mut visible);
        let history = History::new(config.history_capacity, Snapshot::capture(&visible, &layers)?);
        let mut strokes = StrokeEngine::new(config.sample_spacing);
        strokes.set_bounds(config.width, config.height);

        info!(
            "Canvas created: {}x{}, history capacity {}, {} renderers",
            config.width,
            config.height,
            config.history_capacity,
            registry.len()
        );

        Ok(Self {
            strokes,
            dispatcher: ToolDispatcher::new(registry),
            selection: ToolSelection::default(),
            color,
            brush_size: config.brush.size,
            brush_opacity: config.brush.opacity,
            layers,
            visible,
            history,
            config,
        })
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.layers.width()
    }

    pub fn height(&self) -> u32 {
        self.layers.height()
    }

    /// The composited surface as of the last composite or restore
    pub fn visible(&self) -> &Bitmap {
        &self.visible
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn registry_mut(&mut self) -> &mut RendererRegistry {
        self.dispatcher.registry_mut()
    }

    // Tool state. Changes apply from the next stroke on.

    pub fn selection(&self) -> &ToolSelection {
        &self.selection
    }

    pub fn select_tool(&mut self, selection: ToolSelection) {
        debug!("Selected {:?}", selection);
        self.selection = selection;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    /// Set the base radius. Negative values clamp to 0, NaN is ignored.
    pub fn set_brush_size(&mut self, size: f32) {
        if !size.is_nan() {
            self.brush_size = size.max(0.0);
        }
    }

    pub fn brush_opacity(&self) -> f32 {
        self.brush_opacity
    }

    /// Set the base opacity, clamped to 0.0-1.0. NaN is ignored.
    pub fn set_brush_opacity(&mut self, opacity: f32) {
        if !opacity.is_nan() {
            self.brush_opacity = opacity.clamp(0.0, 1.0);
        }
    }

    // Layer management. An open stroke is closed and pending restores land
    // first, so edits apply on top of a settled state. Structural and pixel
    // edits are saved to history.

    /// Close the open stroke, if any, and apply pending restores
    fn settle(&mut self) -> Result<(), CanvasError> {
        self.end_stroke()?;
        self.flush_restores()?;
        Ok(())
    }

    /// Add a layer on top and make it active
    pub fn add_layer(&mut self, name: Option<&str>) -> Result<LayerId, CanvasError> {
        self.settle()?;
        let id = self.layers.create_layer(name);
        self.save()?;
        Ok(id)
    }

    pub fn delete_layer(&mut self, id: LayerId) -> Result<(), CanvasError> {
        self.settle()?;
        self.layers.delete_layer(id)?;
        self.save()
    }

    pub fn merge_down(&mut self, id: LayerId) -> Result<(), CanvasError> {
        self.settle()?;
        self.layers.merge_down(id)?;
        self.save()
    }

    pub fn move_layer(&mut self, id: LayerId, index: usize) -> Result<(), CanvasError> {
        self.settle()?;
        self.layers.move_layer(id, index)?;
        self.save()
    }

    pub fn clear_layer(&mut self, id: LayerId) -> Result<(), CanvasError> {
        self.settle()?;
        self.layers.clear_layer(id);
        self.save()
    }

    pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f32) -> Result<(), CanvasError> {
        self.settle()?;
        self.layers.set_opacity(id, opacity);
        self.composite();
        Ok(())
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> Result<(), CanvasError> {
        self.settle()?;
        self.layers.set_visible(id, visible);
        self.composite();
        Ok(())
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> Result<(), CanvasError> {
        self.settle()?;
        self.layers.set_active(id);
        Ok(())
    }

    pub fn rename_layer(&mut self, id: LayerId, name: &str) -> Result<(), CanvasError> {
        self.settle()?;
        self.layers.rename(id, name);
        Ok(())
    }

    /// Resize every layer and the visible surface, keeping pixel coordinates
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CanvasError> {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width(), self.height()) {
            return Ok(());
        }
        self.settle()?;
        self.layers.resize_all(width, height);
        self.visible.resize(width, height);
        self.strokes.set_bounds(width, height);
        self.save()
    }

    /// Composite on demand and encode the result
    pub fn export(&mut self, format: ExportFormat) -> Result<Vec<u8>, CanvasError> {
        self.settle()?;
        self.composite();
        let bytes = export::encode(&self.visible, format)?;
        info!(
            "Exported {}x{} as {} ({} bytes)",
            self.visible.width(),
            self.visible.height(),
            format.name(),
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ToolKind;

    fn canvas() -> Canvas {
        Canvas::new(CanvasConfig::new(32, 32)).unwrap()
    }

    #[test]
    fn test_new_canvas() {
        let canvas = canvas();
        assert_eq!((canvas.width(), canvas.height()), (32, 32));
        assert_eq!(canvas.layers().len(), 1);
        assert_eq!(canvas.history().len(), 1);
        assert_eq!(canvas.history().cursor(), 1);
        assert_eq!(canvas.color(), Color::BLACK);
        assert_eq!(canvas.selection().tool, ToolKind::Brush);
    }

    #[test]
    fn test_bad_config_color_is_rejected() {
        let mut config = CanvasConfig::new(4, 4);
        config.brush.color = "black".into();
        assert!(matches!(Canvas::new(config), Err(CanvasError::Color(_))));
    }

    #[test]
    fn test_red_under_half_blue() {
        let mut canvas = canvas();
        let bottom = canvas.layers().active_id();
        canvas.layers.active_bitmap_mut().clear(Color::rgb(255, 0, 0));
        let top = canvas.add_layer(Some("Blue")).unwrap();
        canvas.layers.active_bitmap_mut().clear(Color::rgb(0, 0, 255));
        canvas.set_layer_opacity(top, 0.5).unwrap();

        assert_eq!(canvas.visible().get_pixel(5, 5), Some(Color::rgb(128, 0, 128)));
        assert_eq!(canvas.layers().index_of(bottom), Some(0));
    }

    #[test]
    fn test_deleting_sole_layer_fails() {
        let mut canvas = canvas();
        let id = canvas.layers().active_id();
        let err = canvas.delete_layer(id).unwrap_err();
        assert!(matches!(err, CanvasError::Layer(LayerError::LastLayer { .. })));
        assert_eq!(canvas.layers().len(), 1);
        assert_eq!(canvas.history().len(), 1);
    }

    #[test]
    fn test_layer_edits_are_saved() {
        let mut canvas = canvas();
        let id = canvas.add_layer(None).unwrap();
        assert_eq!(canvas.history().len(), 2);
        canvas.delete_layer(id).unwrap();
        assert_eq!(canvas.history().len(), 3);
        // Property changes are not
        canvas.set_layer_visible(canvas.layers().active_id(), false).unwrap();
        assert_eq!(canvas.history().len(), 3);
    }

    #[test]
    fn test_brush_setters_clamp() {
        let mut canvas = canvas();
        canvas.set_brush_size(-3.0);
        assert_eq!(canvas.brush_size(), 0.0);
        canvas.set_brush_size(f32::NAN);
        assert_eq!(canvas.brush_size(), 0.0);
        canvas.set_brush_opacity(4.0);
        assert_eq!(canvas.brush_opacity(), 1.0);
    }

    #[test]
    fn test_resize_keeps_pixels() {
        let mut canvas = canvas();
        canvas.layers.active_bitmap_mut().set_pixel(3, 4, Color::WHITE);
        canvas.resize(64, 16).unwrap();

        assert_eq!((canvas.width(), canvas.height()), (64, 16));
        assert_eq!(canvas.visible().width(), 64);
        assert_eq!(canvas.visible().get_pixel(3, 4), Some(Color::WHITE));
        assert_eq!(canvas.history().len(), 2);
    }

    #[test]
    fn test_export_png() {
        let mut canvas = canvas();
        let bytes = canvas.export(ExportFormat::Png).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (32, 32));
    }
}
