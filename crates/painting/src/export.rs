//! Encoding the composite for export

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_JPEG_QUALITY;
use crate::surface::{blend_over, Bitmap};
use crate::types::Color;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to encode {format}: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
}

/// Raster formats the composite can be exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    /// Lossy, no alpha: flattened onto white
    Jpeg {
        #[serde(default = "default_jpeg_quality")]
        quality: u8,
    },
    Bmp,
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl ExportFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpeg",
            ExportFormat::Bmp => "bmp",
        }
    }
}

/// Encode a bitmap into the requested format
pub fn encode(bitmap: &Bitmap, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    let err = |source| ExportError::Encode {
        format: format.name(),
        source,
    };
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => bitmap
            .to_rgba_image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(err)?,
        ExportFormat::Bmp => bitmap
            .to_rgba_image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Bmp)
            .map_err(err)?,
        ExportFormat::Jpeg { quality } => {
            let rgb = flatten_rgb(bitmap, Color::WHITE);
            JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
                .write_image(&rgb, bitmap.width(), bitmap.height(), ExtendedColorType::Rgb8)
                .map_err(err)?
        }
    }
    Ok(bytes)
}

/// Opaque RGB8 bytes of `bitmap` drawn over a solid background
fn flatten_rgb(bitmap: &Bitmap, background: Color) -> Vec<u8> {
    bitmap
        .pixels()
        .iter()
        .flat_map(|px| {
            let out = blend_over(background, *px, 1.0);
            [out.r, out.g, out.b]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bitmap() -> Bitmap {
        let mut bitmap = Bitmap::new(8, 8);
        bitmap.set_pixel(3, 3, Color::rgba(255, 0, 0, 128));
        bitmap
    }

    #[test]
    fn test_png_export_is_lossless() {
        let bitmap = sample_bitmap();
        let bytes = encode(&bitmap, ExportFormat::Png).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().into_rgba8();
        assert_eq!(Bitmap::from_rgba_image(&decoded), bitmap);
    }

    #[test]
    fn test_jpeg_export() {
        let bytes = encode(&sample_bitmap(), ExportFormat::Jpeg { quality: 80 }).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_bmp_export() {
        let bytes = encode(&sample_bitmap(), ExportFormat::Bmp).unwrap();
        assert_eq!(&bytes[..2], b"BM");
    }

    #[test]
    fn test_flatten_onto_white() {
        let rgb = flatten_rgb(&sample_bitmap(), Color::WHITE);
        assert_eq!(&rgb[..3], &[255, 255, 255]);
        let i = (3 * 8 + 3) * 3;
        assert_eq!(&rgb[i..i + 3], &[255, 127, 127]);
    }

    #[test]
    fn test_format_serde() {
        let format: ExportFormat = serde_json::from_str(r#"{"type":"jpeg"}"#).unwrap();
        assert_eq!(format, ExportFormat::Jpeg { quality: DEFAULT_JPEG_QUALITY });
        let json = serde_json::to_string(&ExportFormat::Bmp).unwrap();
        assert_eq!(json, r#"{"type":"bmp"}"#);
    }
}
