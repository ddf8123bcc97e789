//! Tool dispatch
//!
//! Resolves the stroke's tool selection to a registered renderer and invokes
//! it for one paint sample. The dispatcher never draws by itself except for
//! the fallback brush, which replaces any renderer that is missing or fails.
//! Region tools that reach past an edge skip the sample instead.

mod builtin;
mod registry;
mod selection;

pub use builtin::{
    paint_fallback, Blur, Eraser, FloodFill, Gradient, Line, RingStamp, RoundBrush, Smudge,
    SquareStamp, Tone,
};
pub use registry::{Dab, Renderer, RendererFailure, RendererKey, RendererRegistry, Segment};
pub use selection::{Geometry, ToolKind, ToolParseError, ToolSelection};

use tracing::{debug, warn};

use crate::stroke::{PaintSample, StrokeBinding};
use crate::surface::Bitmap;

/// What happened to one paint sample
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The resolved renderer painted
    Painted,
    /// The renderer was missing or failed; the fallback brush painted instead
    Fallback(RendererFailure),
    /// The sample reached outside the bitmap and was dropped
    Skipped,
}

/// Routes paint samples to renderers
#[derive(Debug)]
pub struct ToolDispatcher {
    registry: RendererRegistry,
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new(RendererRegistry::with_builtins())
    }
}

impl ToolDispatcher {
    pub fn new(registry: RendererRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RendererRegistry {
        &mut self.registry
    }

    /// Look up the renderer a selection resolves to
    pub fn resolve(&self, selection: &ToolSelection) -> Option<&dyn Renderer> {
        self.registry.get(&RendererKey::for_selection(selection))
    }

    /// Paint one sample onto `target` with the stroke's bound tool
    pub fn paint_at(
        &self,
        target: &mut Bitmap,
        binding: &StrokeBinding,
        sample: &PaintSample,
    ) -> DispatchOutcome {
        let key = RendererKey::for_selection(&binding.selection);
        let dab = Dab {
            x: sample.point.x,
            y: sample.point.y,
            radius: sample.radius,
            color: binding.color,
            opacity: sample.opacity,
        };

        let result = match self.registry.get(&key) {
            None => Err(RendererFailure::Missing(key.clone())),
            Some(renderer) => match binding.selection.tool.geometry() {
                Geometry::Point => renderer.paint_point(target, &dab),
                Geometry::Segment => renderer.paint_segment(
                    target,
                    &Segment {
                        from: sample.previous,
                        to: sample.point,
                        radius: sample.radius,
                        color: binding.color,
                        opacity: sample.opacity,
                    },
                ),
            },
        };

        match result {
            Ok(()) => {
                debug!(
                    "paint_at: {} at ({:.1}, {:.1}), radius={:.1}",
                    key, dab.x, dab.y, dab.radius
                );
                DispatchOutcome::Painted
            }
            Err(RendererFailure::OutOfBounds { x, y }) => {
                debug!("paint_at: {} skipped at ({:.1}, {:.1}): out of bounds", key, x, y);
                DispatchOutcome::Skipped
            }
            Err(failure) => {
                warn!("{}; painting fallback brush at ({:.1}, {:.1})", failure, dab.x, dab.y);
                paint_fallback(target, &dab);
                DispatchOutcome::Fallback(failure)
            }
        }
    }
}
