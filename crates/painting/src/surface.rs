//! CPU raster surface - straight-alpha RGBA8 storage

mod dab;
mod region;

pub use dab::calculate_hardness_falloff;
pub use region::Rect;

use crate::types::Color;

/// An RGBA8 CPU bitmap
///
/// Every layer owns one exclusively; the canvas owns one more as the visible
/// composite. Pixels are row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Bitmap {
    /// Create a new bitmap with the given dimensions, initialized to transparent
    pub fn new(width: u32, height: u32) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; pixel_count],
        }
    }

    /// Build a bitmap from row-major pixels. Returns None if the length does not match.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
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

    /// Clear the bitmap to a solid color
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Whether signed pixel coordinates fall inside the bitmap
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Get a pixel at the given coordinates
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Set a pixel at the given coordinates
    /// Does nothing if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Blend a color onto an existing pixel with source-over compositing
    #[inline]
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Color, opacity: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        self.pixels[index] = blend_over(self.pixels[index], color, opacity);
    }

    /// Erase a pixel by reducing its alpha (destination-out)
    /// The erase_amount (0-1) determines how much alpha is removed
    #[inline]
    pub fn erase_pixel(&mut self, x: u32, y: u32, erase_amount: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        let dst = self.pixels[index];
        let remaining = (1.0 - erase_amount.clamp(0.0, 1.0)) * dst.alpha();
        let a = to_channel(remaining * 255.0);
        self.pixels[index] = if a == 0 {
            Color::TRANSPARENT
        } else {
            Color { a, ..dst }
        };
    }

    /// Draw `src` over this bitmap at the origin using per-call opacity
    ///
    /// Both bitmaps are expected to have the same size; the overlap is used otherwise.
    pub fn draw_over(&mut self, src: &Bitmap, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        let width = self.width.min(src.width) as usize;
        let height = self.height.min(src.height) as usize;
        for y in 0..height {
            let dst_row = y * self.width as usize;
            let src_row = y * src.width as usize;
            for x in 0..width {
                let dst = &mut self.pixels[dst_row + x];
                *dst = blend_over(*dst, src.pixels[src_row + x], opacity);
            }
        }
    }

    /// Replace this bitmap's content with `src` at the origin
    ///
    /// The area `src` does not cover becomes transparent.
    pub fn copy_from(&mut self, src: &Bitmap) {
        self.clear(Color::TRANSPARENT);
        let width = self.width.min(src.width) as usize;
        let height = self.height.min(src.height) as usize;
        for y in 0..height {
            let dst_row = y * self.width as usize;
            let src_row = y * src.width as usize;
            self.pixels[dst_row..dst_row + width]
                .copy_from_slice(&src.pixels[src_row..src_row + width]);
        }
    }

    /// Resize in place keeping every pixel at its prior coordinates
    ///
    /// Growth is transparent, shrinkage clips. Content is never scaled.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        let mut resized = Bitmap::new(width, height);
        resized.copy_from(self);
        *self = resized;
    }

    /// Get raw pixel data as RGBA8 bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Get the total number of pixels
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Get direct access to pixel data (for advanced operations)
    #[inline]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Get mutable access to pixel data (for advanced operations)
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Copy into an `image` buffer for encoding
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut img = image::RgbaImage::new(self.width, self.height);
        img.copy_from_slice(self.as_bytes());
        img
    }

    /// Build a bitmap from a decoded `image` buffer
    pub fn from_rgba_image(img: &image::RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            pixels: bytemuck::cast_slice(img.as_raw()).to_vec(),
        }
    }
}

#[inline]
fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Source-over blend of straight-alpha colors
///
/// `opacity` scales the source alpha. Fully transparent sources leave `dst` untouched.
#[inline]
pub fn blend_over(dst: Color, src: Color, opacity: f32) -> Color {
    let src_alpha = src.alpha() * opacity.clamp(0.0, 1.0);
    if src_alpha <= 0.0 {
        return dst;
    }
    let dst_alpha = dst.alpha();
    let dst_weight = dst_alpha * (1.0 - src_alpha);
    let out_alpha = src_alpha + dst_weight;

    let channel = |s: u8, d: u8| to_channel((s as f32 * src_alpha + d as f32 * dst_weight) / out_alpha);

    Color {
        r: channel(src.r, dst.r),
        g: channel(src.g, dst.g),
        b: channel(src.b, dst.b),
        a: to_channel(out_alpha * 255.0),
    }
}
