//! Dab application for brush strokes

use tracing::debug;

use super::{Bitmap, Rect};
use crate::types::{BlendMode, Color};

impl Bitmap {
    /// Apply a circular dab to the bitmap
    ///
    /// Returns the bounding box of the affected region, or None if the dab is
    /// completely outside the bitmap.
    pub fn apply_dab(
        &mut self,
        center_x: f32,
        center_y: f32,
        radius: f32,
        color: Color,
        opacity: f32,
        hardness: f32,
        blend_mode: BlendMode,
    ) -> Option<Rect> {
        if radius <= 0.0 || opacity <= 0.0 {
            debug!("apply_dab skipped: radius={:.1}, opacity={:.2}", radius, opacity);
            return None;
        }

        let rect = self.clipped_bounds(center_x, center_y, radius)?;

        for py in rect.y..rect.bottom() {
            for px in rect.x..rect.right() {
                // Distance from the pixel center
                let dx = (px as f32 + 0.5) - center_x;
                let dy = (py as f32 + 0.5) - center_y;
                let distance_normalized = (dx * dx + dy * dy).sqrt() / radius;

                if distance_normalized > 1.0 {
                    continue;
                }

                let falloff = calculate_hardness_falloff(distance_normalized, hardness);
                if falloff <= 0.0 {
                    continue;
                }

                let effective_opacity = opacity * falloff;
                match blend_mode {
                    BlendMode::Normal => self.blend_pixel(px, py, color, effective_opacity),
                    BlendMode::Erase => self.erase_pixel(px, py, effective_opacity),
                }
            }
        }

        Some(rect)
    }

    /// Fill an axis-aligned square of half-size `radius` centered on a point
    pub fn fill_square(
        &mut self,
        center_x: f32,
        center_y: f32,
        radius: f32,
        color: Color,
        opacity: f32,
    ) -> Option<Rect> {
        let rect = self.clipped_bounds(center_x, center_y, radius)?;
        for py in rect.y..rect.bottom() {
            for px in rect.x..rect.right() {
                self.blend_pixel(px, py, color, opacity);
            }
        }
        Some(rect)
    }
}

/// Calculate falloff based on hardness
/// distance_normalized is 0 at center, 1 at edge
/// hardness is 0.0 (soft) to 1.0 (hard)
#[inline]
pub fn calculate_hardness_falloff(distance_normalized: f32, hardness: f32) -> f32 {
    if distance_normalized > 1.0 {
        return 0.0;
    }
    if hardness >= 1.0 {
        return 1.0;
    }
    let t = distance_normalized.clamp(0.0, 1.0);
    let soft = 1.0 - t;
    // Interpolate between linear falloff and a hard edge
    soft * (1.0 - hardness) + hardness
}
