//! Encoded whole-canvas captures

use std::io::Cursor;
use std::sync::Arc;

use image::ImageFormat;
use thiserror::Error;

use crate::layers::{LayerStack, LayerState};
use crate::surface::Bitmap;
use crate::types::LayerId;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] image::ImageError),
    #[error("Failed to decode snapshot: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Snapshot image is {found:?}, expected {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
}

/// One layer's properties plus its PNG-encoded raster
#[derive(Debug, Clone)]
pub struct EncodedLayer {
    pub id: LayerId,
    pub name: String,
    pub opacity: f32,
    pub visible: bool,
    png: Arc<[u8]>,
}

/// An immutable capture of the composited canvas and the layers behind it
///
/// Clones share the encoded bytes.
#[derive(Debug, Clone)]
pub struct Snapshot {
    width: u32,
    height: u32,
    composite: Arc<[u8]>,
    layers: Arc<[EncodedLayer]>,
    active: LayerId,
}

/// Pixels recovered from a [`Snapshot`]
#[derive(Debug, Clone)]
pub struct DecodedSnapshot {
    pub composite: Bitmap,
    pub layers: Vec<LayerState>,
    pub active: LayerId,
}

impl Snapshot {
    /// Encode the visible surface and every layer of the stack
    pub fn capture(visible: &Bitmap, stack: &LayerStack) -> Result<Self, SnapshotError> {
        let composite = encode_png(visible)?;
        let layers = stack
            .layers()
            .iter()
            .map(|layer| {
                Ok(EncodedLayer {
                    id: layer.id(),
                    name: layer.name().to_string(),
                    opacity: layer.opacity(),
                    visible: layer.is_visible(),
                    png: encode_png(layer.bitmap())?,
                })
            })
            .collect::<Result<Vec<_>, SnapshotError>>()?;

        Ok(Self {
            width: visible.width(),
            height: visible.height(),
            composite,
            layers: layers.into(),
            active: stack.active_id(),
        })
    }

    /// Decode every raster in the snapshot
    pub fn decode(&self) -> Result<DecodedSnapshot, SnapshotError> {
        let composite = decode_png(&self.composite, self.width, self.height)?;
        let layers = self
            .layers
            .iter()
            .map(|layer| {
                Ok(LayerState {
                    id: layer.id,
                    name: layer.name.clone(),
                    opacity: layer.opacity,
                    visible: layer.visible,
                    bitmap: decode_png(&layer.png, self.width, self.height)?,
                })
            })
            .collect::<Result<Vec<_>, SnapshotError>>()?;

        Ok(DecodedSnapshot {
            composite,
            layers,
            active: self.active,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn active(&self) -> LayerId {
        self.active
    }

    pub fn layers(&self) -> &[EncodedLayer] {
        &self.layers
    }

    /// Encoded size in bytes, all rasters included
    pub fn encoded_len(&self) -> usize {
        self.composite.len() + self.layers.iter().map(|layer| layer.png.len()).sum::<usize>()
    }
}

fn encode_png(bitmap: &Bitmap) -> Result<Arc<[u8]>, SnapshotError> {
    let mut bytes = Vec::new();
    bitmap
        .to_rgba_image()
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(SnapshotError::Encode)?;
    Ok(bytes.into())
}

fn decode_png(bytes: &[u8], width: u32, height: u32) -> Result<Bitmap, SnapshotError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(SnapshotError::Decode)?
        .into_rgba8();
    if img.dimensions() != (width, height) {
        return Err(SnapshotError::SizeMismatch {
            expected: (width, height),
            found: img.dimensions(),
        });
    }
    Ok(Bitmap::from_rgba_image(&img))
}
