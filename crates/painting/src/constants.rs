/// Name given to the layer every stack starts with.
pub const BACKGROUND_LAYER_NAME: &str = "Background";

/// Hardness used by the fallback brush (flat circular fill).
pub const FALLBACK_HARDNESS: f32 = 1.0;

/// Strength multiplier for the shadow and highlight tools.
pub const TONE_STRENGTH: f32 = 0.25;

/// Fraction of the source pixel carried along by one smudge sample.
pub const SMUDGE_STRENGTH: f32 = 0.5;

/// JPEG quality used when an export request does not specify one.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Upper bound on samples produced by a single pointer move.
pub const MAX_SAMPLES_PER_MOVE: usize = 1 << 16;
