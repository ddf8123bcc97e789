//! Rectangular regions and bounds checks

use super::Bitmap;
use crate::types::Color;

/// Pixel rectangle (x, y, width, height)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

impl Bitmap {
    /// Bounding box of a circle clipped to the bitmap
    ///
    /// Returns None when the circle misses the bitmap entirely.
    pub fn clipped_bounds(&self, center_x: f32, center_y: f32, radius: f32) -> Option<Rect> {
        if radius <= 0.0 || !center_x.is_finite() || !center_y.is_finite() {
            return None;
        }
        let x_min = ((center_x - radius).floor().max(0.0) as u32).min(self.width());
        let y_min = ((center_y - radius).floor().max(0.0) as u32).min(self.height());
        let x_max = ((center_x + radius).ceil().max(0.0) as u32).min(self.width());
        let y_max = ((center_y + radius).ceil().max(0.0) as u32).min(self.height());

        if x_min >= x_max || y_min >= y_max {
            return None;
        }
        Some(Rect::new(x_min, y_min, x_max - x_min, y_max - y_min))
    }

    /// Bounding box of a circle that must lie fully inside the bitmap
    ///
    /// Region tools (blur, smudge) read neighbours around the dab, so a box
    /// crossing an edge is rejected instead of clipped.
    pub fn contained_bounds(&self, center_x: f32, center_y: f32, radius: f32) -> Option<Rect> {
        if radius <= 0.0 || !center_x.is_finite() || !center_y.is_finite() {
            return None;
        }
        let x_min = (center_x - radius).floor() as i64;
        let y_min = (center_y - radius).floor() as i64;
        let x_max = (center_x + radius).ceil() as i64;
        let y_max = (center_y + radius).ceil() as i64;

        if x_min < 0 || y_min < 0 || x_max > self.width() as i64 || y_max > self.height() as i64 {
            return None;
        }
        Some(Rect::new(
            x_min as u32,
            y_min as u32,
            (x_max - x_min) as u32,
            (y_max - y_min) as u32,
        ))
    }

    /// Get pixel data for a rectangular region
    ///
    /// Returns pixels in row-major order. The region is clamped to bitmap bounds.
    pub fn read_region(&self, rect: Rect) -> Vec<Color> {
        let x_end = rect.right().min(self.width());
        let y_end = rect.bottom().min(self.height());
        let mut data = Vec::with_capacity(rect.area());
        for y in rect.y..y_end {
            for x in rect.x..x_end {
                if let Some(pixel) = self.get_pixel(x, y) {
                    data.push(pixel);
                }
            }
        }
        data
    }
}
