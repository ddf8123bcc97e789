//! Built-in renderer set and the fallback brush
//!
//! Hosts usually bring their own brushes; these keep a bare canvas usable.

use crate::constants::{FALLBACK_HARDNESS, SMUDGE_STRENGTH, TONE_STRENGTH};
use crate::surface::{Bitmap, Rect};
use crate::types::{BlendMode, Color, Point};

use super::registry::{Dab, Renderer, RendererFailure, RendererKey, RendererRegistry, Segment};
use super::selection::ToolKind;

impl RendererRegistry {
    /// A registry pre-filled with the built-in brushes, stamps and tools
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(RendererKey::brush("Circle"), RoundBrush { hardness: 1.0 });
        registry.register(RendererKey::brush("Soft"), RoundBrush { hardness: 0.0 });
        registry.register(RendererKey::stamp("Square"), SquareStamp);
        registry.register(RendererKey::stamp("Ring"), RingStamp);
        registry.register(RendererKey::Tool(ToolKind::Eraser), Eraser);
        registry.register(RendererKey::Tool(ToolKind::Blur), Blur);
        registry.register(RendererKey::Tool(ToolKind::Smudge), Smudge);
        registry.register(RendererKey::Tool(ToolKind::Fill), FloodFill);
        registry.register(RendererKey::Tool(ToolKind::Line), Line);
        registry.register(RendererKey::Tool(ToolKind::Gradient), Gradient);
        registry.register(
            RendererKey::Tool(ToolKind::Shadow),
            Tone {
                color: Color::BLACK,
            },
        );
        registry.register(
            RendererKey::Tool(ToolKind::Highlight),
            Tone {
                color: Color::WHITE,
            },
        );
        registry
    }
}

/// Flat circular fill used whenever a renderer is missing or fails
pub fn paint_fallback(target: &mut Bitmap, dab: &Dab) -> Option<Rect> {
    target.apply_dab(
        dab.x,
        dab.y,
        dab.radius,
        dab.color,
        dab.opacity,
        FALLBACK_HARDNESS,
        BlendMode::Normal,
    )
}

/// Round dab with a hardness falloff
#[derive(Debug, Clone, Copy)]
pub struct RoundBrush {
    pub hardness: f32,
}

impl Renderer for RoundBrush {
    fn paint_point(&self, target: &mut Bitmap, dab: &Dab) -> Result<(), RendererFailure> {
        target.apply_dab(
            dab.x,
            dab.y,
            dab.radius,
            dab.color,
            dab.opacity,
            self.hardness,
            BlendMode::Normal,
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SquareStamp;

impl Renderer for SquareStamp {
    fn paint_point(&self, target: &mut Bitmap, dab: &Dab) -> Result<(), RendererFailure> {
        target.fill_square(dab.x, dab.y, dab.radius, dab.color, dab.opacity);
        Ok(())
    }
}

/// Annulus between 70% and 100% of the radius
#[derive(Debug, Clone, Copy)]
pub struct RingStamp;

impl Renderer for RingStamp {
    fn paint_point(&self, target: &mut Bitmap, dab: &Dab) -> Result<(), RendererFailure> {
        let Some(rect) = target.clipped_bounds(dab.x, dab.y, dab.radius) else {
            return Ok(());
        };
        let inner = dab.radius * 0.7;
        for (px, py) in pixels(rect) {
            let distance = pixel_center(px, py).distance_to(Point::new(dab.x, dab.y));
            if distance >= inner && distance <= dab.radius {
                target.blend_pixel(px, py, dab.color, dab.opacity);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Eraser;

impl Renderer for Eraser {
    fn paint_point(&self, target: &mut Bitmap, dab: &Dab) -> Result<(), RendererFailure> {
        target.apply_dab(
            dab.x,
            dab.y,
            dab.radius,
            dab.color,
            dab.opacity,
            1.0,
            BlendMode::Erase,
        );
        Ok(())
    }
}

/// Soft darken (shadow) or lighten (highlight)
#[derive(Debug, Clone, Copy)]
pub struct Tone {
    pub color: Color,
}

impl Renderer for Tone {
    fn paint_point(&self, target: &mut Bitmap, dab: &Dab) -> Result<(), RendererFailure> {
        target.apply_dab(
            dab.x,
            dab.y,
            dab.radius,
            self.color,
            dab.opacity * TONE_STRENGTH,
            0.0,
            BlendMode::Normal,
        );
        Ok(())
    }
}

/// 3x3 box blur inside the dab circle
#[derive(Debug, Clone, Copy)]
pub struct Blur;

impl Renderer for Blur {
    fn paint_point(&self, target: &mut Bitmap, dab: &Dab) -> Result<(), RendererFailure> {
        let rect = target
            .contained_bounds(dab.x, dab.y, dab.radius)
            .ok_or(RendererFailure::OutOfBounds { x: dab.x, y: dab.y })?;
        let source = target.read_region(rect);
        let center = Point::new(dab.x, dab.y);
        let at = |x: u32, y: u32| source[((y - rect.y) * rect.width + (x - rect.x)) as usize];

        for (px, py) in pixels(rect) {
            if pixel_center(px, py).distance_to(center) > dab.radius {
                continue;
            }
            let mut sum = [0u32; 4];
            let mut count = 0u32;
            for ny in py.saturating_sub(1)..=(py + 1).min(rect.bottom() - 1) {
                for nx in px.saturating_sub(1)..=(px + 1).min(rect.right() - 1) {
                    if nx < rect.x || ny < rect.y {
                        continue;
                    }
                    let c = at(nx, ny);
                    sum[0] += c.r as u32;
                    sum[1] += c.g as u32;
                    sum[2] += c.b as u32;
                    sum[3] += c.a as u32;
                    count += 1;
                }
            }
            let average = Color::rgba(
                ((sum[0] + count / 2) / count) as u8,
                ((sum[1] + count / 2) / count) as u8,
                ((sum[2] + count / 2) / count) as u8,
                ((sum[3] + count / 2) / count) as u8,
            );
            target.set_pixel(px, py, mix(at(px, py), average, dab.opacity));
        }
        Ok(())
    }
}

/// Drags pixels from the previous sample towards the current one
#[derive(Debug, Clone, Copy)]
pub struct Smudge;

impl Renderer for Smudge {
    fn paint_point(&self, _target: &mut Bitmap, _dab: &Dab) -> Result<(), RendererFailure> {
        Err(RendererFailure::Unsupported("point"))
    }

    fn paint_segment(&self, target: &mut Bitmap, segment: &Segment) -> Result<(), RendererFailure> {
        let out_of_bounds = |p: Point| RendererFailure::OutOfBounds { x: p.x, y: p.y };
        let from_rect = target
            .contained_bounds(segment.from.x, segment.from.y, segment.radius)
            .ok_or_else(|| out_of_bounds(segment.from))?;
        let to_rect = target
            .contained_bounds(segment.to.x, segment.to.y, segment.radius)
            .ok_or_else(|| out_of_bounds(segment.to))?;
        if from_rect == to_rect {
            return Ok(());
        }

        let source = target.read_region(from_rect);
        let strength = segment.opacity * SMUDGE_STRENGTH;
        let width = from_rect.width.min(to_rect.width);
        let height = from_rect.height.min(to_rect.height);
        for dy in 0..height {
            for dx in 0..width {
                let (px, py) = (to_rect.x + dx, to_rect.y + dy);
                if pixel_center(px, py).distance_to(segment.to) > segment.radius {
                    continue;
                }
                let carried = source[(dy * from_rect.width + dx) as usize];
                target.blend_pixel(px, py, carried, strength);
            }
        }
        Ok(())
    }
}

/// 4-connected flood fill of the region matching the seed pixel
#[derive(Debug, Clone, Copy)]
pub struct FloodFill;

impl Renderer for FloodFill {
    fn paint_point(&self, target: &mut Bitmap, dab: &Dab) -> Result<(), RendererFailure> {
        if !dab.x.is_finite() || !dab.y.is_finite() {
            return Err(RendererFailure::OutOfBounds { x: dab.x, y: dab.y });
        }
        let (sx, sy) = (dab.x.floor() as i64, dab.y.floor() as i64);
        if !target.contains(sx, sy) {
            return Err(RendererFailure::OutOfBounds { x: dab.x, y: dab.y });
        }
        let (width, height) = (target.width() as usize, target.height() as usize);
        let seed_index = sy as usize * width + sx as usize;
        let seed = target.pixels()[seed_index];

        let mut visited = vec![false; width * height];
        let mut pending = vec![seed_index];
        visited[seed_index] = true;

        while let Some(index) = pending.pop() {
            let pixel = &mut target.pixels_mut()[index];
            *pixel = crate::surface::blend_over(*pixel, dab.color, dab.opacity);

            let (x, y) = (index % width, index / width);
            let neighbours = [
                (x > 0).then(|| index - 1),
                (x + 1 < width).then(|| index + 1),
                (y > 0).then(|| index - width),
                (y + 1 < height).then(|| index + width),
            ];
            for next in neighbours.into_iter().flatten() {
                if !visited[next] && target.pixels()[next] == seed {
                    visited[next] = true;
                    pending.push(next);
                }
            }
        }
        Ok(())
    }
}

/// Hard-edged line between two samples
#[derive(Debug, Clone, Copy)]
pub struct Line;

impl Renderer for Line {
    fn paint_point(&self, target: &mut Bitmap, dab: &Dab) -> Result<(), RendererFailure> {
        let point = Point::new(dab.x, dab.y);
        self.paint_segment(
            target,
            &Segment {
                from: point,
                to: point,
                radius: dab.radius,
                color: dab.color,
                opacity: dab.opacity,
            },
        )
    }

    fn paint_segment(&self, target: &mut Bitmap, segment: &Segment) -> Result<(), RendererFailure> {
        let half_width = segment.radius.max(0.5);
        let Some(rect) = segment_bounds(target, segment.from, segment.to, half_width) else {
            return Ok(());
        };
        for (px, py) in pixels(rect) {
            let (distance, _) = distance_to_segment(pixel_center(px, py), segment.from, segment.to);
            if distance <= half_width {
                target.blend_pixel(px, py, segment.color, segment.opacity);
            }
        }
        Ok(())
    }
}

/// Linear ramp from full color at the start to transparent at the end
#[derive(Debug, Clone, Copy)]
pub struct Gradient;

impl Renderer for Gradient {
    fn paint_point(&self, _target: &mut Bitmap, _dab: &Dab) -> Result<(), RendererFailure> {
        Err(RendererFailure::Unsupported("point"))
    }

    fn paint_segment(&self, target: &mut Bitmap, segment: &Segment) -> Result<(), RendererFailure> {
        let Some(rect) = segment_bounds(target, segment.from, segment.to, segment.radius) else {
            return Ok(());
        };
        for (px, py) in pixels(rect) {
            let (distance, t) = distance_to_segment(pixel_center(px, py), segment.from, segment.to);
            if distance <= segment.radius {
                target.blend_pixel(px, py, segment.color, segment.opacity * (1.0 - t));
            }
        }
        Ok(())
    }
}

fn pixels(rect: Rect) -> impl Iterator<Item = (u32, u32)> {
    (rect.y..rect.bottom()).flat_map(move |y| (rect.x..rect.right()).map(move |x| (x, y)))
}

#[inline]
fn pixel_center(x: u32, y: u32) -> Point {
    Point::new(x as f32 + 0.5, y as f32 + 0.5)
}

fn mix(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color::rgba(
        channel(a.r, b.r),
        channel(a.g, b.g),
        channel(a.b, b.b),
        channel(a.a, b.a),
    )
}

/// Distance from `p` to segment `ab`, and the projection parameter in 0..=1
fn distance_to_segment(p: Point, a: Point, b: Point) -> (f32, f32) {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let length_sq = abx * abx + aby * aby;
    let t = if length_sq > 0.0 {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / length_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p.distance_to(a.lerp(b, t)), t)
}

/// Bounding box of a thick segment, clipped to the bitmap
fn segment_bounds(target: &Bitmap, from: Point, to: Point, radius: f32) -> Option<Rect> {
    if !(radius > 0.0) {
        return None;
    }
    let x_min = (from.x.min(to.x) - radius).floor().max(0.0);
    let y_min = (from.y.min(to.y) - radius).floor().max(0.0);
    let x_max = (from.x.max(to.x) + radius).ceil().min(target.width() as f32);
    let y_max = (from.y.max(to.y) + radius).ceil().min(target.height() as f32);
    // Also rejects NaN coordinates
    if !(x_min < x_max && y_min < y_max) {
        return None;
    }
    Some(Rect::new(
        x_min as u32,
        y_min as u32,
        (x_max - x_min) as u32,
        (y_max - y_min) as u32,
    ))
}
