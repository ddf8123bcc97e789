//! Shared configuration for layerpaint
//!
//! This crate provides the single source of truth for canvas dimensions,
//! history capacity, stroke sampling and brush defaults shared by the
//! painting core and the session player.

use serde::{Deserialize, Serialize};

/// Default canvas width in pixels
pub const DEFAULT_WIDTH: u32 = 800;

/// Default canvas height in pixels
pub const DEFAULT_HEIGHT: u32 = 600;

/// Maximum number of snapshots kept for undo/redo
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Distance in pixels covered by one interpolated paint sample
pub const DEFAULT_SAMPLE_SPACING: f32 = 2.0;

/// Default brush radius in pixels
pub const DEFAULT_BRUSH_SIZE: f32 = 10.0;

/// Default brush color
pub const DEFAULT_BRUSH_COLOR: &str = "#000000";

/// Brush settings applied when a canvas is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushDefaults {
    /// Base radius before pressure scaling
    pub size: f32,
    /// Base opacity before pressure scaling (0.0-1.0)
    pub opacity: f32,
    /// Color as `#rrggbb` or `#rrggbbaa`
    pub color: String,
}

impl Default for BrushDefaults {
    fn default() -> Self {
        Self {
            size: DEFAULT_BRUSH_SIZE,
            opacity: 1.0,
            color: DEFAULT_BRUSH_COLOR.to_string(),
        }
    }
}

/// Canvas configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Snapshot cap for the undo history
    pub history_capacity: usize,
    /// Pixels per interpolated sample along a pointer move
    pub sample_spacing: f32,
    /// Initial brush settings
    pub brush: BrushDefaults,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            sample_spacing: DEFAULT_SAMPLE_SPACING,
            brush: BrushDefaults::default(),
        }
    }
}

impl CanvasConfig {
    /// Create a config with the given dimensions and default everything else
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Return a copy with out-of-range values replaced by usable ones
    pub fn validated(mut self) -> Self {
        self.width = self.width.max(1);
        self.height = self.height.max(1);
        self.history_capacity = self.history_capacity.max(1);
        if !(self.sample_spacing > 0.0) || !self.sample_spacing.is_finite() {
            self.sample_spacing = DEFAULT_SAMPLE_SPACING;
        }
        self.brush.size = self.brush.size.max(0.0);
        self.brush.opacity = self.brush.opacity.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CanvasConfig::default();
        assert_eq!(config.width, DEFAULT_WIDTH);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.history_capacity, 30);
        assert_eq!(config.sample_spacing, 2.0);
        assert_eq!(config.brush.color, "#000000");
    }

    #[test]
    fn test_validated_fixes_degenerate_values() {
        let config = CanvasConfig {
            width: 0,
            height: 0,
            history_capacity: 0,
            sample_spacing: -1.0,
            brush: BrushDefaults {
                size: -3.0,
                opacity: 4.0,
                color: "#ffffff".into(),
            },
        }
        .validated();

        assert_eq!(config.width, 1);
        assert_eq!(config.height, 1);
        assert_eq!(config.history_capacity, 1);
        assert_eq!(config.sample_spacing, DEFAULT_SAMPLE_SPACING);
        assert_eq!(config.brush.size, 0.0);
        assert_eq!(config.brush.opacity, 1.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CanvasConfig = serde_json::from_str(r#"{"width": 64}"#).unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.brush, BrushDefaults::default());
    }
}
