//! Pointer input handling for the canvas

use tracing::{debug, info};

use super::{Canvas, CanvasError};
use crate::dispatch::{DispatchOutcome, RendererKey};
use crate::stroke::{PaintSample, StrokeBinding};
use crate::types::PointerSample;

impl Canvas {
    /// Open a stroke and paint at the pointer-down position
    ///
    /// The active layer and the current tool, color, size and opacity are
    /// bound to the stroke. One-shot tools (stamps, fill) close the stroke
    /// right away, so a single press places exactly one instance. Ignored
    /// while a restore is pending or when the position is not finite.
    ///
    /// Returns whether a stroke was opened.
    pub fn pointer_down(&mut self, input: PointerSample) -> Result<bool, CanvasError> {
        if self.history.is_restoring() {
            debug!("pointer_down: restore pending, ignoring");
            return Ok(false);
        }
        if !input.x.is_finite() || !input.y.is_finite() {
            debug!("pointer_down: non-finite point ({}, {}), ignoring", input.x, input.y);
            return Ok(false);
        }
        if self.strokes.is_active() {
            // Missed pointer-up; close the previous stroke first
            self.end_stroke()?;
        }

        let binding = StrokeBinding {
            layer: self.layers.active_id(),
            selection: self.selection.clone(),
            color: self.color,
            base_size: self.brush_size,
            base_opacity: self.brush_opacity,
        };
        let one_shot = binding.selection.tool.is_one_shot();
        info!(
            "Stroke opened: {} on {} at ({:.1}, {:.1})",
            RendererKey::for_selection(&binding.selection),
            binding.layer,
            input.x,
            input.y
        );

        let sample = self.strokes.begin(&input, binding);
        self.paint(&[sample]);

        if one_shot {
            self.end_stroke()?;
        }
        Ok(true)
    }

    /// Continue the open stroke to the pointer position
    ///
    /// Returns the number of samples painted (0 when no stroke is open).
    pub fn pointer_move(&mut self, input: PointerSample) -> usize {
        let samples = self.strokes.stroke_to(&input);
        let skipped = self.paint(&samples);
        if skipped > 0 {
            debug!("pointer_move: {}/{} samples skipped", skipped, samples.len());
        }
        samples.len() - skipped
    }

    /// Close the open stroke, recomposite and save a snapshot
    pub fn pointer_up(&mut self, _input: PointerSample) -> Result<(), CanvasError> {
        self.end_stroke()
    }

    /// Pointer left the surface; closes the stroke like pointer-up
    pub fn pointer_leave(&mut self) -> Result<(), CanvasError> {
        self.end_stroke()
    }

    /// Whether a stroke is open
    pub fn is_stroking(&self) -> bool {
        self.strokes.is_active()
    }

    /// Paint into the layer the open stroke is bound to; returns how many
    /// samples were skipped
    fn paint(&mut self, samples: &[PaintSample]) -> usize {
        let Some(stroke) = self.strokes.stroke() else {
            return samples.len();
        };
        let binding = stroke.binding();
        let Some(layer) = self.layers.get_mut(binding.layer) else {
            debug!("paint: {} is gone, skipping {} samples", binding.layer, samples.len());
            return samples.len();
        };

        let mut skipped = 0;
        for sample in samples {
            if self.dispatcher.paint_at(&mut layer.bitmap, binding, sample) == DispatchOutcome::Skipped {
                skipped += 1;
            }
        }
        skipped
    }

    pub(super) fn end_stroke(&mut self) -> Result<(), CanvasError> {
        let Some(stroke) = self.strokes.end() else {
            return Ok(());
        };
        info!(
            "Stroke closed after {} samples at ({:.1}, {:.1})",
            stroke.samples_emitted(),
            stroke.last_point().x,
            stroke.last_point().y
        );
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use layerpaint_config::CanvasConfig;

    use super::*;
    use crate::dispatch::{Dab, RendererFailure, ToolKind, ToolSelection};
    use crate::surface::Bitmap;
    use crate::types::Color;

    type Calls = Rc<RefCell<Vec<Dab>>>;

    fn recording(canvas: &mut Canvas, key: RendererKey) -> Calls {
        let calls: Calls = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&calls);
        canvas.registry_mut().register(
            key,
            move |_: &mut Bitmap, dab: &Dab| -> Result<(), RendererFailure> {
                recorded.borrow_mut().push(*dab);
                Ok(())
            },
        );
        calls
    }

    fn canvas() -> Canvas {
        Canvas::new(CanvasConfig::new(64, 64)).unwrap()
    }

    #[test]
    fn test_tap_paints_once() {
        let mut canvas = canvas();
        let calls = recording(&mut canvas, RendererKey::brush("Circle"));
        canvas.select_tool(ToolSelection::brush("Circle"));
        canvas.set_brush_size(20.0);

        assert!(canvas.pointer_down(PointerSample::new(10.0, 10.0)).unwrap());
        canvas.pointer_up(PointerSample::new(10.0, 10.0)).unwrap();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!((calls[0].x, calls[0].y), (10.0, 10.0));
        assert_eq!(calls[0].radius, 20.0);
        assert_eq!(calls[0].color, Color::BLACK);
        assert_eq!(canvas.history().len(), 2);
    }

    #[test]
    fn test_drag_is_gap_free() {
        let mut canvas = canvas();
        let calls = recording(&mut canvas, RendererKey::brush("Circle"));

        canvas.pointer_down(PointerSample::new(0.0, 5.0)).unwrap();
        assert_eq!(canvas.pointer_move(PointerSample::new(40.0, 5.0)), 20);
        canvas.pointer_up(PointerSample::new(40.0, 5.0)).unwrap();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 21);
        assert!(calls.windows(2).all(|w| w[1].x - w[0].x <= 2.0 + f32::EPSILON));
    }

    #[test]
    fn test_stamp_places_one_instance() {
        let mut canvas = canvas();
        let calls = recording(&mut canvas, RendererKey::stamp("Square"));
        canvas.select_tool(ToolSelection::stamp("Square"));

        canvas.pointer_down(PointerSample::new(20.0, 20.0)).unwrap();
        assert!(!canvas.is_stroking());
        assert_eq!(canvas.pointer_move(PointerSample::new(30.0, 20.0)), 0);
        canvas.pointer_up(PointerSample::new(30.0, 20.0)).unwrap();

        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(canvas.history().len(), 2);
    }

    #[test]
    fn test_selection_is_bound_at_pointer_down() {
        let mut canvas = canvas();
        let brush = recording(&mut canvas, RendererKey::brush("Circle"));
        let eraser = recording(&mut canvas, RendererKey::Tool(ToolKind::Eraser));

        canvas.pointer_down(PointerSample::new(0.0, 0.0)).unwrap();
        canvas.select_tool(ToolSelection::tool(ToolKind::Eraser));
        canvas.pointer_move(PointerSample::new(4.0, 0.0));
        canvas.pointer_leave().unwrap();

        assert_eq!(brush.borrow().len(), 3);
        assert!(eraser.borrow().is_empty());
    }

    #[test]
    fn test_stroke_paints_active_layer_only() {
        let mut canvas = canvas();
        let bottom = canvas.layers().active_id();
        let top = canvas.add_layer(None).unwrap();

        canvas.pointer_down(PointerSample::new(30.0, 30.0)).unwrap();
        canvas.pointer_up(PointerSample::new(30.0, 30.0)).unwrap();

        let layers = canvas.layers();
        assert_eq!(layers.get(top).unwrap().bitmap().get_pixel(30, 30), Some(Color::BLACK));
        assert_eq!(
            layers.get(bottom).unwrap().bitmap().get_pixel(30, 30),
            Some(Color::TRANSPARENT)
        );
        assert_eq!(canvas.visible().get_pixel(30, 30), Some(Color::BLACK));
    }

    #[test]
    fn test_failing_brush_falls_back() {
        let mut canvas = canvas();
        canvas.registry_mut().register(
            RendererKey::brush("Circle"),
            |_: &mut Bitmap, _: &Dab| -> Result<(), RendererFailure> {
                Err(RendererFailure::Failed("broken".into()))
            },
        );

        canvas.pointer_down(PointerSample::new(12.0, 12.0)).unwrap();
        canvas.pointer_move(PointerSample::new(20.0, 12.0));
        canvas.pointer_up(PointerSample::new(20.0, 12.0)).unwrap();

        assert_eq!(canvas.visible().get_pixel(16, 12), Some(Color::BLACK));
    }

    #[test]
    fn test_layer_edit_closes_open_stroke() {
        let mut canvas = canvas();
        let bottom = canvas.layers().active_id();
        canvas.pointer_down(PointerSample::new(5.0, 5.0)).unwrap();
        let top = canvas.add_layer(None).unwrap();

        assert!(!canvas.is_stroking());
        assert_eq!(canvas.pointer_move(PointerSample::new(40.0, 5.0)), 0);
        canvas.pointer_up(PointerSample::new(40.0, 5.0)).unwrap();

        let layers = canvas.layers();
        assert_eq!(layers.get(bottom).unwrap().bitmap().get_pixel(5, 5), Some(Color::BLACK));
        assert_eq!(
            layers.get(top).unwrap().bitmap().get_pixel(40, 5),
            Some(Color::TRANSPARENT)
        );
        // Stroke, then the new layer
        assert_eq!(canvas.history().len(), 3);
    }

    #[test]
    fn test_stroke_stays_on_its_layer() {
        let mut canvas = canvas();
        let bottom = canvas.layers().active_id();
        let top = canvas.add_layer(None).unwrap();
        canvas.set_active_layer(bottom).unwrap();

        canvas.pointer_down(PointerSample::new(10.0, 10.0)).unwrap();
        canvas.layers.set_active(top);
        canvas.pointer_move(PointerSample::new(30.0, 10.0));
        canvas.pointer_up(PointerSample::new(30.0, 10.0)).unwrap();

        let layers = canvas.layers();
        assert_eq!(layers.get(bottom).unwrap().bitmap().get_pixel(30, 10), Some(Color::BLACK));
        assert!(
            layers
                .get(top)
                .unwrap()
                .bitmap()
                .pixels()
                .iter()
                .all(|p| *p == Color::TRANSPARENT)
        );
    }

    #[test]
    fn test_far_pointer_move_stays_bounded() {
        let mut canvas = canvas();
        let calls = recording(&mut canvas, RendererKey::brush("Circle"));

        canvas.pointer_down(PointerSample::new(0.0, 0.0)).unwrap();
        let painted = canvas.pointer_move(PointerSample::new(1e30, 0.0));
        canvas.pointer_leave().unwrap();

        // Default brush radius 10 on a 64 wide canvas
        assert!(painted > 0 && painted <= 40);
        assert!(calls.borrow().iter().all(|dab| dab.x <= 75.0));
        assert_eq!(canvas.history().len(), 2);
    }

    #[test]
    fn test_non_finite_pointer_is_ignored() {
        let mut canvas = canvas();
        assert!(!canvas.pointer_down(PointerSample::new(f32::NAN, 4.0)).unwrap());
        assert!(!canvas.is_stroking());

        canvas.pointer_down(PointerSample::new(4.0, 4.0)).unwrap();
        assert_eq!(canvas.pointer_move(PointerSample::new(f32::INFINITY, 4.0)), 0);
        assert!(canvas.is_stroking());
    }

    #[test]
    fn test_pointer_down_ignored_while_restoring() {
        let mut canvas = canvas();
        canvas.pointer_down(PointerSample::new(5.0, 5.0)).unwrap();
        canvas.pointer_up(PointerSample::new(5.0, 5.0)).unwrap();
        assert!(canvas.undo());

        assert!(!canvas.pointer_down(PointerSample::new(9.0, 9.0)).unwrap());
        assert!(!canvas.is_stroking());
        canvas.flush_restores().unwrap();
        assert!(canvas.pointer_down(PointerSample::new(9.0, 9.0)).unwrap());
    }
}
