//! Tool selection state

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of tool driving a stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Freehand brush, resolved by brush name
    #[default]
    Brush,
    /// Single placement, resolved by shape name
    Stamp,
    Eraser,
    Smudge,
    Blur,
    Fill,
    Gradient,
    Line,
    Shadow,
    Highlight,
}

/// Whether a renderer takes a single point or a point pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Point,
    Segment,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::Brush,
        ToolKind::Stamp,
        ToolKind::Eraser,
        ToolKind::Smudge,
        ToolKind::Blur,
        ToolKind::Fill,
        ToolKind::Gradient,
        ToolKind::Line,
        ToolKind::Shadow,
        ToolKind::Highlight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Brush => "brush",
            ToolKind::Stamp => "stamp",
            ToolKind::Eraser => "eraser",
            ToolKind::Smudge => "smudge",
            ToolKind::Blur => "blur",
            ToolKind::Fill => "fill",
            ToolKind::Gradient => "gradient",
            ToolKind::Line => "line",
            ToolKind::Shadow => "shadow",
            ToolKind::Highlight => "highlight",
        }
    }

    pub fn geometry(self) -> Geometry {
        match self {
            ToolKind::Line | ToolKind::Gradient | ToolKind::Smudge => Geometry::Segment,
            _ => Geometry::Point,
        }
    }

    /// Tools that place once per pointer-down and end the stroke immediately
    pub fn is_one_shot(self) -> bool {
        matches!(self, ToolKind::Stamp | ToolKind::Fill)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tool {0:?}")]
pub struct ToolParseError(pub String);

impl FromStr for ToolKind {
    type Err = ToolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or_else(|| ToolParseError(s.to_string()))
    }
}

/// Current tool, brush and shape picked by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSelection {
    pub tool: ToolKind,
    pub brush: String,
    pub shape: String,
}

impl Default for ToolSelection {
    fn default() -> Self {
        Self {
            tool: ToolKind::Brush,
            brush: "Circle".to_string(),
            shape: "Square".to_string(),
        }
    }
}

impl ToolSelection {
    pub fn brush(name: impl Into<String>) -> Self {
        Self {
            tool: ToolKind::Brush,
            brush: name.into(),
            ..Default::default()
        }
    }

    pub fn stamp(shape: impl Into<String>) -> Self {
        Self {
            tool: ToolKind::Stamp,
            shape: shape.into(),
            ..Default::default()
        }
    }

    pub fn tool(tool: ToolKind) -> Self {
        Self {
            tool,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_kind() {
        assert_eq!("Eraser".parse::<ToolKind>(), Ok(ToolKind::Eraser));
        assert_eq!(" line ".parse::<ToolKind>(), Ok(ToolKind::Line));
        assert_eq!(
            "lasso".parse::<ToolKind>(),
            Err(ToolParseError("lasso".to_string()))
        );
        for kind in ToolKind::ALL {
            assert_eq!(kind.to_string().parse::<ToolKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_geometry_and_one_shot() {
        assert_eq!(ToolKind::Line.geometry(), Geometry::Segment);
        assert_eq!(ToolKind::Blur.geometry(), Geometry::Point);
        assert!(ToolKind::Stamp.is_one_shot());
        assert!(ToolKind::Fill.is_one_shot());
        assert!(!ToolKind::Brush.is_one_shot());
    }
}
