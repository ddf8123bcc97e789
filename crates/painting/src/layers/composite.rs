//! Compositing and whole-stack capture

use tracing::{debug, info};

use super::{Layer, LayerError, LayerStack};
use crate::surface::Bitmap;
use crate::types::{Color, LayerId};

/// Properties and pixels of one layer, detached from its stack
#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub id: LayerId,
    pub name: String,
    pub opacity: f32,
    pub visible: bool,
    pub bitmap: Bitmap,
}

impl LayerStack {
    /// Merge all layers into `dest`
    ///
    /// Clears `dest`, then draws every contributing layer in ascending stack
    /// order with source-over blending at the layer's opacity. The result
    /// depends only on the layer states at call time.
    pub fn composite(&self, dest: &mut Bitmap) {
        dest.clear(Color::TRANSPARENT);
        let mut drawn = 0;
        for layer in self.layers.iter().filter(|layer| layer.contributes()) {
            dest.draw_over(&layer.bitmap, layer.opacity);
            drawn += 1;
        }
        debug!("Composited {}/{} layers", drawn, self.layers.len());
    }

    /// Draw a layer onto the one directly below it, then remove it
    ///
    /// Hidden layers merge as nothing. The lower layer becomes active if the
    /// merged layer was.
    pub fn merge_down(&mut self, id: LayerId) -> Result<(), LayerError> {
        let index = self.index_of(id).ok_or(LayerError::UnknownLayer { id })?;
        if index == 0 {
            return Err(LayerError::NothingBelow { id });
        }

        let upper = self.layers.remove(index);
        if upper.contributes() {
            self.layers[index - 1].bitmap.draw_over(&upper.bitmap, upper.opacity);
        }
        if self.active >= index {
            self.active -= 1;
        }
        info!("Merged {} into {}", id, self.layers[index - 1].id);
        Ok(())
    }

    /// Detach a copy of every layer, bottom first
    pub fn capture(&self) -> Vec<LayerState> {
        self.layers
            .iter()
            .map(|layer| LayerState {
                id: layer.id,
                name: layer.name.clone(),
                opacity: layer.opacity,
                visible: layer.visible,
                bitmap: layer.bitmap.clone(),
            })
            .collect()
    }

    /// Replace the whole stack with previously captured layers
    ///
    /// Bitmaps are fitted to the current stack size without scaling. An empty
    /// capture resets to a single blank background. `active` falls back to the
    /// top layer when it is not part of the capture.
    pub fn restore(&mut self, states: Vec<LayerState>, active: LayerId) {
        if states.is_empty() {
            *self = LayerStack::new(self.width, self.height);
            return;
        }

        let (width, height) = (self.width, self.height);
        self.layers = states
            .into_iter()
            .map(|state| {
                let mut bitmap = state.bitmap;
                bitmap.resize(width, height);
                Layer {
                    id: state.id,
                    name: state.name,
                    bitmap,
                    opacity: state.opacity.clamp(0.0, 1.0),
                    visible: state.visible,
                }
            })
            .collect();

        let max_id = self.layers.iter().map(|layer| layer.id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);
        self.active = self.index_of(active).unwrap_or(self.layers.len() - 1);
    }
}
