//! Stroke engine: pointer samples to paint samples
//!
//! The engine is a two-state machine (idle, active). Pointer-down opens a
//! stroke and yields one sample at the anchor; every pointer-move yields
//! `max(1, floor(d / spacing))` evenly spaced samples up to and including the
//! new point, so fast pointer motion never leaves gaps. Pointer-up and
//! pointer-leave both close the stroke.
//!
//! With bounds set, only samples within the bounds grown by the brush radius
//! are emitted; the rest could not touch a pixel. Non-finite pointer
//! positions are dropped.

use tracing::{debug, warn};

use layerpaint_config::DEFAULT_SAMPLE_SPACING;

use crate::constants::MAX_SAMPLES_PER_MOVE;
use crate::dispatch::ToolSelection;
use crate::types::{Color, LayerId, Point, PointerSample};

/// Everything a stroke freezes at pointer-down
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeBinding {
    /// Layer the stroke paints into
    pub layer: LayerId,
    pub selection: ToolSelection,
    pub color: Color,
    /// Radius at pressure 1
    pub base_size: f32,
    /// Opacity at pressure 1
    pub base_opacity: f32,
}

/// One paint call produced by the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintSample {
    /// Where to paint
    pub point: Point,
    /// The sample before this one (equal to `point` for the first sample)
    pub previous: Point,
    pub pressure: f32,
    /// `base_size * pressure`
    pub radius: f32,
    /// `base_opacity * pressure`
    pub opacity: f32,
}

/// An open stroke
#[derive(Debug, Clone)]
pub struct Stroke {
    binding: StrokeBinding,
    anchor: Point,
    last_point: Point,
    last_pressure: f32,
    samples_emitted: usize,
}

impl Stroke {
    pub fn binding(&self) -> &StrokeBinding {
        &self.binding
    }

    /// Pointer-down position
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn last_point(&self) -> Point {
        self.last_point
    }

    pub fn samples_emitted(&self) -> usize {
        self.samples_emitted
    }

    fn sample(&self, point: Point, previous: Point, pressure: f32) -> PaintSample {
        PaintSample {
            point,
            previous,
            pressure,
            radius: self.binding.base_size * pressure,
            opacity: (self.binding.base_opacity * pressure).clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    Active(Stroke),
}

/// Converts raw pointer samples into a dense sequence of paint samples
#[derive(Debug, Clone)]
pub struct StrokeEngine {
    spacing: f32,
    /// Surface size (width, height) samples are clipped against
    bounds: Option<(f32, f32)>,
    state: StrokeState,
}

impl Default for StrokeEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SPACING)
    }
}

impl StrokeEngine {
    /// Create an engine emitting one sample per `spacing` pixels of movement
    pub fn new(spacing: f32) -> Self {
        let spacing = if spacing > 0.0 && spacing.is_finite() {
            spacing
        } else {
            DEFAULT_SAMPLE_SPACING
        };
        Self {
            spacing,
            bounds: None,
            state: StrokeState::Idle,
        }
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Clip future samples to a `width` x `height` surface
    pub fn set_bounds(&mut self, width: u32, height: u32) {
        self.bounds = Some((width as f32, height as f32));
    }

    pub fn state(&self) -> &StrokeState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, StrokeState::Active(_))
    }

    /// The open stroke, if any
    pub fn stroke(&self) -> Option<&Stroke> {
        match &self.state {
            StrokeState::Active(stroke) => Some(stroke),
            StrokeState::Idle => None,
        }
    }

    /// Open a stroke at the sample and return the anchor paint sample
    ///
    /// An already open stroke is discarded; callers close it first.
    pub fn begin(&mut self, input: &PointerSample, binding: StrokeBinding) -> PaintSample {
        let point = input.point();
        let pressure = input.effective_pressure();
        let stroke = Stroke {
            binding,
            anchor: point,
            last_point: point,
            last_pressure: pressure,
            samples_emitted: 1,
        };
        let sample = stroke.sample(point, point, pressure);
        debug!(
            "StrokeEngine::begin at ({:.1}, {:.1}), radius={:.1}",
            point.x, point.y, sample.radius
        );
        self.state = StrokeState::Active(stroke);
        sample
    }

    /// Continue the open stroke to a new pointer position
    ///
    /// Returns the interpolated samples, ending exactly at the new point when
    /// it lies within the bounds. Returns nothing when no stroke is open or
    /// the position is not finite.
    pub fn stroke_to(&mut self, input: &PointerSample) -> Vec<PaintSample> {
        let spacing = f64::from(self.spacing);
        let bounds = self.bounds;
        let StrokeState::Active(stroke) = &mut self.state else {
            debug!("stroke_to: no active stroke, ignoring");
            return Vec::new();
        };

        let to = input.point();
        if !to.x.is_finite() || !to.y.is_finite() {
            debug!("stroke_to: non-finite point ({}, {}), ignoring", to.x, to.y);
            return Vec::new();
        }
        let from = stroke.last_point;
        let start_pressure = stroke.last_pressure;
        let end_pressure = input.effective_pressure();

        // Sample i of `steps` sits at t = i / steps along the segment.
        // f64 keeps far-off points from overflowing.
        let (dx, dy) = (f64::from(to.x) - f64::from(from.x), f64::from(to.y) - f64::from(from.y));
        let steps = (dx.hypot(dy) / spacing).floor().max(1.0);
        let (t_min, t_max) = match bounds {
            Some((width, height)) => {
                let reach = stroke.binding.base_size.max(0.0) * start_pressure.max(end_pressure);
                clip_segment(from, to, width, height, reach).unwrap_or((1.0, 0.0))
            }
            None => (0.0, 1.0),
        };
        let first = (t_min * steps).ceil().max(1.0);
        let mut last = (t_max * steps).floor().min(steps);
        if last - first + 1.0 > MAX_SAMPLES_PER_MOVE as f64 {
            warn!(
                "stroke_to: {} samples requested, keeping the first {}",
                last - first + 1.0,
                MAX_SAMPLES_PER_MOVE
            );
            last = first + (MAX_SAMPLES_PER_MOVE - 1) as f64;
        }
        let count = if last >= first { (last - first) as usize + 1 } else { 0 };

        let at = |i: f64| -> Point {
            if i >= steps {
                to
            } else if i <= 0.0 {
                from
            } else {
                let t = i / steps;
                Point::new((f64::from(from.x) + dx * t) as f32, (f64::from(from.y) + dy * t) as f32)
            }
        };
        let mut samples = Vec::with_capacity(count);
        let mut previous = at(first - 1.0);
        for k in 0..count {
            let i = first + k as f64;
            let t = (i / steps) as f32;
            let point = at(i);
            let pressure = start_pressure + (end_pressure - start_pressure) * t;
            samples.push(stroke.sample(point, previous, pressure));
            previous = point;
        }

        stroke.last_point = to;
        stroke.last_pressure = end_pressure;
        stroke.samples_emitted += samples.len();

        debug!(
            "StrokeEngine::stroke_to: {} samples from ({:.1}, {:.1}) to ({:.1}, {:.1})",
            samples.len(),
            from.x,
            from.y,
            to.x,
            to.y
        );
        samples
    }

    /// Close the stroke (pointer-up or pointer-leave), returning it if one was open
    pub fn end(&mut self) -> Option<Stroke> {
        match std::mem::take(&mut self.state) {
            StrokeState::Active(stroke) => Some(stroke),
            StrokeState::Idle => None,
        }
    }
}

/// Parameter range of the segment inside `[-reach, size + reach]` on both axes
///
/// Liang-Barsky clipping; None when the segment misses the region.
fn clip_segment(from: Point, to: Point, width: f32, height: f32, reach: f32) -> Option<(f64, f64)> {
    let (x0, y0) = (f64::from(from.x), f64::from(from.y));
    let (dx, dy) = (f64::from(to.x) - x0, f64::from(to.y) - y0);
    let reach = f64::from(reach);
    let (min_x, max_x) = (-reach, f64::from(width) + reach);
    let (min_y, max_y) = (-reach, f64::from(height) + reach);

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [(-dx, x0 - min_x), (dx, max_x - x0), (-dy, y0 - min_y), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((t0, t1))
}
