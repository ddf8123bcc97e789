//! Layer management operations

use tracing::{debug, info, warn};

use super::{Layer, LayerError, LayerStack};
use crate::types::{Color, LayerId};

impl LayerStack {
    /// Append a new transparent layer on top and make it active
    pub fn create_layer(&mut self, name: Option<&str>) -> LayerId {
        let id = self.allocate_id();
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("Layer {}", id.0),
        };
        info!("Creating {} {:?} ({}x{})", id, name, self.width, self.height);
        self.layers.push(Layer::new(id, name, self.width, self.height));
        self.active = self.layers.len() - 1;
        id
    }

    /// Remove a layer
    ///
    /// Deleting the sole remaining layer fails and leaves the stack untouched.
    /// Deleting the active layer activates the new top-most layer.
    pub fn delete_layer(&mut self, id: LayerId) -> Result<(), LayerError> {
        let index = self.index_of(id).ok_or(LayerError::UnknownLayer { id })?;
        if self.layers.len() == 1 {
            warn!("Refusing to delete {}: last layer", id);
            return Err(LayerError::LastLayer { id });
        }

        self.layers.remove(index);
        if index == self.active {
            self.active = self.layers.len() - 1;
        } else if index < self.active {
            self.active -= 1;
        }
        info!("Deleted {} ({} layers left)", id, self.layers.len());
        Ok(())
    }

    /// Set a layer's opacity, clamped to 0.0-1.0. Unknown ids are ignored.
    pub fn set_opacity(&mut self, id: LayerId, value: f32) {
        let Some(layer) = self.get_mut(id) else {
            debug!("set_opacity: unknown {}", id);
            return;
        };
        // NaN would poison every later composite
        layer.opacity = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    }

    /// Make a layer active. Unknown ids are ignored.
    pub fn set_active(&mut self, id: LayerId) {
        match self.index_of(id) {
            Some(index) => self.active = index,
            None => debug!("set_active: unknown {}", id),
        }
    }

    /// Show or hide a layer. Unknown ids are ignored.
    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        if let Some(layer) = self.get_mut(id) {
            layer.visible = visible;
        }
    }

    /// Rename a layer. Unknown ids are ignored.
    pub fn rename(&mut self, id: LayerId, name: impl Into<String>) {
        if let Some(layer) = self.get_mut(id) {
            layer.name = name.into();
        }
    }

    /// Move a layer to a new stack position (clamped); the active layer stays active
    pub fn move_layer(&mut self, id: LayerId, new_index: usize) -> Result<(), LayerError> {
        let from = self.index_of(id).ok_or(LayerError::UnknownLayer { id })?;
        let to = new_index.min(self.layers.len() - 1);
        if from == to {
            return Ok(());
        }

        let active_id = self.active_id();
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        // The active layer is still in the stack
        self.active = self.index_of(active_id).unwrap_or(0);
        debug!("Moved {} from {} to {}", id, from, to);
        Ok(())
    }

    /// Clear a layer to transparent. Unknown ids are ignored.
    pub fn clear_layer(&mut self, id: LayerId) {
        if let Some(layer) = self.get_mut(id) {
            layer.bitmap.clear(Color::TRANSPARENT);
        }
    }

    /// Resize every layer in lockstep, keeping pixels at their prior coordinates
    pub fn resize_all(&mut self, width: u32, height: u32) {
        info!(
            "Resizing {} layers from {}x{} to {}x{}",
            self.layers.len(),
            self.width,
            self.height,
            width,
            height
        );
        for layer in &mut self.layers {
            layer.bitmap.resize(width, height);
        }
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_layer_appends_and_activates() {
        let mut stack = LayerStack::new(16, 16);
        let id = stack.create_layer(Some("Ink"));

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.active_id(), id);
        assert_eq!(stack.active_index(), 1);
        assert_eq!(stack.active().name(), "Ink");
        assert_eq!(stack.active().bitmap().width(), 16);

        let unnamed = stack.create_layer(None);
        assert_eq!(stack.get(unnamed).unwrap().name(), "Layer 2");
    }

    #[test]
    fn test_delete_last_layer_fails_without_mutation() {
        let mut stack = LayerStack::new(16, 16);
        stack.active_bitmap_mut().set_pixel(1, 1, Color::WHITE);
        let id = stack.active_id();

        let err = stack.delete_layer(id).unwrap_err();
        assert_eq!(err, LayerError::LastLayer { id });
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.active_id(), id);
        assert_eq!(stack.active().bitmap().get_pixel(1, 1), Some(Color::WHITE));
    }

    #[test]
    fn test_delete_active_activates_top() {
        let mut stack = LayerStack::new(8, 8);
        let bottom = stack.active_id();
        let middle = stack.create_layer(None);
        let top = stack.create_layer(None);

        stack.set_active(middle);
        stack.delete_layer(middle).unwrap();
        assert_eq!(stack.active_id(), top);

        stack.delete_layer(top).unwrap();
        assert_eq!(stack.active_id(), bottom);
    }

    #[test]
    fn test_delete_below_active_keeps_active_layer() {
        let mut stack = LayerStack::new(8, 8);
        let bottom = stack.active_id();
        let top = stack.create_layer(None);

        stack.delete_layer(bottom).unwrap();
        assert_eq!(stack.active_id(), top);
        assert_eq!(stack.active_index(), 0);
    }

    #[test]
    fn test_delete_unknown_layer() {
        let mut stack = LayerStack::new(8, 8);
        stack.create_layer(None);
        assert_eq!(
            stack.delete_layer(LayerId(42)),
            Err(LayerError::UnknownLayer { id: LayerId(42) })
        );
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_set_opacity_clamps() {
        let mut stack = LayerStack::new(8, 8);
        let id = stack.active_id();

        for (input, expected) in [(-1.0, 0.0), (0.3, 0.3), (1.0, 1.0), (7.5, 1.0), (f32::NAN, 0.0)] {
            stack.set_opacity(id, input);
            assert_eq!(stack.active().opacity(), expected);
        }

        // Unknown id is a no-op
        stack.set_opacity(LayerId(9), 0.5);
        assert_eq!(stack.active().opacity(), 0.0);
    }

    #[test]
    fn test_set_active_unknown_is_noop() {
        let mut stack = LayerStack::new(8, 8);
        let top = stack.create_layer(None);
        stack.set_active(LayerId(77));
        assert_eq!(stack.active_id(), top);
    }

    #[test]
    fn test_move_layer_keeps_active() {
        let mut stack = LayerStack::new(8, 8);
        let a = stack.active_id();
        let b = stack.create_layer(None);
        let c = stack.create_layer(None);
        stack.set_active(b);

        stack.move_layer(c, 0).unwrap();
        let order: Vec<_> = stack.layers().iter().map(|l| l.id()).collect();
        assert_eq!(order, vec![c, a, b]);
        assert_eq!(stack.active_id(), b);

        // Index is clamped to the top
        stack.move_layer(c, 100).unwrap();
        assert_eq!(stack.layers().last().unwrap().id(), c);
    }

    #[test]
    fn test_visibility_rename_clear() {
        let mut stack = LayerStack::new(4, 4);
        let id = stack.active_id();
        stack.active_bitmap_mut().clear(Color::WHITE);

        stack.set_visible(id, false);
        stack.rename(id, "Paper");
        stack.clear_layer(id);

        let layer = stack.get(id).unwrap();
        assert!(!layer.is_visible());
        assert!(!layer.contributes());
        assert_eq!(layer.name(), "Paper");
        assert_eq!(layer.bitmap().get_pixel(0, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_resize_all_in_lockstep() {
        let mut stack = LayerStack::new(10, 10);
        stack.active_bitmap_mut().set_pixel(2, 2, Color::BLACK);
        stack.create_layer(None);

        stack.resize_all(20, 5);
        assert_eq!(stack.width(), 20);
        assert_eq!(stack.height(), 5);
        for layer in stack.layers() {
            assert_eq!(layer.bitmap().width(), 20);
            assert_eq!(layer.bitmap().height(), 5);
        }
        assert_eq!(stack.layers()[0].bitmap().get_pixel(2, 2), Some(Color::BLACK));

        // New layers use the new size
        let id = stack.create_layer(None);
        assert_eq!(stack.get(id).unwrap().bitmap().width(), 20);
    }
}
