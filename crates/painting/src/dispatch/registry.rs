//! Renderer registry: tool kinds to drawing routines

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use super::selection::{ToolKind, ToolSelection};
use crate::surface::Bitmap;
use crate::types::{Color, Point};

/// Parameters of a single point placement: `(x, y, size, color, opacity)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dab {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Color,
    pub opacity: f32,
}

/// Parameters of a point-pair placement: `(x1, y1, x2, y2, color, opacity)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    /// Half the stroke width
    pub radius: f32,
    pub color: Color,
    pub opacity: f32,
}

/// Why a renderer did not paint
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RendererFailure {
    #[error("No renderer registered for {0}")]
    Missing(RendererKey),
    #[error("Renderer failed: {0}")]
    Failed(String),
    #[error("Region at ({x:.1}, {y:.1}) reaches outside the bitmap")]
    OutOfBounds { x: f32, y: f32 },
    #[error("Renderer does not support {0} placement")]
    Unsupported(&'static str),
}

/// A drawing routine
///
/// Renderers draw straight into the given bitmap and must not keep it beyond
/// the call. Point tools implement `paint_point`; line-like tools implement
/// `paint_segment`.
pub trait Renderer {
    fn paint_point(&self, target: &mut Bitmap, dab: &Dab) -> Result<(), RendererFailure>;

    fn paint_segment(&self, _target: &mut Bitmap, _segment: &Segment) -> Result<(), RendererFailure> {
        Err(RendererFailure::Unsupported("segment"))
    }
}

impl<F> Renderer for F
where
    F: Fn(&mut Bitmap, &Dab) -> Result<(), RendererFailure>,
{
    fn paint_point(&self, target: &mut Bitmap, dab: &Dab) -> Result<(), RendererFailure> {
        self(target, dab)
    }
}

/// Registry lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RendererKey {
    /// Freehand brush by name
    Brush(String),
    /// Stamp by shape name
    Stamp(String),
    /// Parametrized tool
    Tool(ToolKind),
}

impl RendererKey {
    pub fn brush(name: impl Into<String>) -> Self {
        RendererKey::Brush(name.into())
    }

    pub fn stamp(name: impl Into<String>) -> Self {
        RendererKey::Stamp(name.into())
    }

    /// The key a selection resolves to
    pub fn for_selection(selection: &ToolSelection) -> Self {
        match selection.tool {
            ToolKind::Brush => RendererKey::Brush(selection.brush.clone()),
            ToolKind::Stamp => RendererKey::Stamp(selection.shape.clone()),
            tool => RendererKey::Tool(tool),
        }
    }
}

impl fmt::Display for RendererKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererKey::Brush(name) => write!(f, "brush {:?}", name),
            RendererKey::Stamp(name) => write!(f, "stamp {:?}", name),
            RendererKey::Tool(tool) => write!(f, "tool {}", tool),
        }
    }
}

/// Name to renderer map
#[derive(Default)]
pub struct RendererRegistry {
    renderers: HashMap<RendererKey, Box<dyn Renderer>>,
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("keys", &self.renderers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RendererRegistry {
    /// An empty registry; every lookup misses
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer, returning the one it replaces
    pub fn register(
        &mut self,
        key: RendererKey,
        renderer: impl Renderer + 'static,
    ) -> Option<Box<dyn Renderer>> {
        self.renderers.insert(key, Box::new(renderer))
    }

    pub fn unregister(&mut self, key: &RendererKey) -> Option<Box<dyn Renderer>> {
        self.renderers.remove(key)
    }

    pub fn get(&self, key: &RendererKey) -> Option<&dyn Renderer> {
        self.renderers.get(key).map(|renderer| renderer.as_ref())
    }

    pub fn contains(&self, key: &RendererKey) -> bool {
        self.renderers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_for_selection() {
        assert_eq!(
            RendererKey::for_selection(&ToolSelection::brush("Soft")),
            RendererKey::brush("Soft")
        );
        assert_eq!(
            RendererKey::for_selection(&ToolSelection::stamp("Ring")),
            RendererKey::stamp("Ring")
        );
        assert_eq!(
            RendererKey::for_selection(&ToolSelection::tool(ToolKind::Blur)),
            RendererKey::Tool(ToolKind::Blur)
        );
    }

    #[test]
    fn test_register_closure_and_lookup() {
        let mut registry = RendererRegistry::new();
        assert!(registry.get(&RendererKey::brush("Dot")).is_none());

        registry.register(
            RendererKey::brush("Dot"),
            |target: &mut Bitmap, dab: &Dab| -> Result<(), RendererFailure> {
                target.set_pixel(dab.x as u32, dab.y as u32, dab.color);
                Ok(())
            },
        );
        assert_eq!(registry.len(), 1);

        let mut bitmap = Bitmap::new(4, 4);
        let dab = Dab {
            x: 1.0,
            y: 2.0,
            radius: 1.0,
            color: Color::WHITE,
            opacity: 1.0,
        };
        let renderer = registry.get(&RendererKey::brush("Dot")).unwrap();
        renderer.paint_point(&mut bitmap, &dab).unwrap();
        assert_eq!(bitmap.get_pixel(1, 2), Some(Color::WHITE));

        // Closures have no segment form
        let segment = Segment {
            from: Point::new(0.0, 0.0),
            to: Point::new(1.0, 1.0),
            radius: 1.0,
            color: Color::WHITE,
            opacity: 1.0,
        };
        assert_eq!(
            renderer.paint_segment(&mut bitmap, &segment),
            Err(RendererFailure::Unsupported("segment"))
        );

        assert!(registry.unregister(&RendererKey::brush("Dot")).is_some());
        assert!(registry.is_empty());
    }
}
