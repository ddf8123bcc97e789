//! Layer stack and compositor
//!
//! The stack owns an ordered list of bitmap layers (index 0 is the bottom)
//! and always holds at least one of them. Exactly one layer is active; it is
//! the only layer strokes paint into.

mod composite;
mod ops;

pub use composite::LayerState;

use thiserror::Error;

use crate::constants::BACKGROUND_LAYER_NAME;
use crate::surface::Bitmap;
use crate::types::LayerId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("Cannot delete {id}: it is the only remaining layer")]
    LastLayer { id: LayerId },
    #[error("Unknown layer {id}")]
    UnknownLayer { id: LayerId },
    #[error("Cannot merge {id} down: it is the bottom layer")]
    NothingBelow { id: LayerId },
}

/// One independently paintable bitmap
#[derive(Debug, Clone)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub(crate) name: String,
    pub(crate) bitmap: Bitmap,
    pub(crate) opacity: f32,
    pub(crate) visible: bool,
}

impl Layer {
    pub(crate) fn new(id: LayerId, name: String, width: u32, height: u32) -> Self {
        Self {
            id,
            name,
            bitmap: Bitmap::new(width, height),
            opacity: 1.0,
            visible: true,
        }
    }

    #[inline]
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Whether the compositor draws this layer at all
    #[inline]
    pub fn contributes(&self) -> bool {
        self.visible && self.opacity > 0.0
    }
}

/// Ordered stack of layers sized to the canvas
#[derive(Debug, Clone)]
pub struct LayerStack {
    pub(crate) layers: Vec<Layer>,
    pub(crate) active: usize,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) next_id: u32,
}

impl LayerStack {
    /// Create a stack holding a single transparent "Background" layer
    pub fn new(width: u32, height: u32) -> Self {
        let background = Layer::new(LayerId(0), BACKGROUND_LAYER_NAME.to_string(), width, height);
        Self {
            layers: vec![background],
            active: 0,
            width,
            height,
            next_id: 1,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of layers (always at least 1)
    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Layers in stack order, bottom first
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Stack position of a layer
    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    #[inline]
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_id(&self) -> LayerId {
        self.layers[self.active].id
    }

    pub fn active(&self) -> &Layer {
        &self.layers[self.active]
    }

    #[cfg(test)]
    pub(crate) fn active_bitmap_mut(&mut self) -> &mut Bitmap {
        &mut self.layers[self.active].bitmap
    }

    pub(crate) fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }

    pub(crate) fn allocate_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stack_has_background() {
        let stack = LayerStack::new(64, 32);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.active_index(), 0);
        assert_eq!(stack.active().name(), "Background");
        assert_eq!(stack.active().bitmap().width(), 64);
        assert_eq!(stack.active().bitmap().height(), 32);
        assert!(stack.active().contributes());
    }

    #[test]
    fn test_lookup_by_id() {
        let stack = LayerStack::new(8, 8);
        let id = stack.active_id();
        assert_eq!(stack.index_of(id), Some(0));
        assert!(stack.get(LayerId(99)).is_none());
    }
}
