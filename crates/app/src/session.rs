//! Session scripts: a canvas config plus a list of recorded input events

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use layerpaint_config::CanvasConfig;
use painting::{Canvas, CanvasError, Color, ExportFormat, LayerId, PointerSample, ToolKind, ToolSelection};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid session script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// A complete session to replay
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub config: CanvasConfig,
    pub events: Vec<SessionEvent>,
    /// Where the exported image is written
    pub output: PathBuf,
    #[serde(default)]
    pub format: ExportFormat,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let text = fs::read_to_string(path).map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// One recorded input or UI event
///
/// Layer events address layers by stack index, bottom first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Down(PointerSample),
    Move(PointerSample),
    Up(PointerSample),
    Leave(PointerSample),
    Select {
        tool: String,
        #[serde(default)]
        brush: Option<String>,
        #[serde(default)]
        shape: Option<String>,
    },
    Color {
        hex: String,
    },
    Size {
        value: f32,
    },
    Opacity {
        value: f32,
    },
    AddLayer {
        #[serde(default)]
        name: Option<String>,
    },
    DeleteLayer {
        index: usize,
    },
    LayerOpacity {
        index: usize,
        value: f32,
    },
    LayerVisible {
        index: usize,
        visible: bool,
    },
    Activate {
        index: usize,
    },
    Undo,
    Redo,
    Resize {
        width: u32,
        height: u32,
    },
}

/// Counters reported after a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub events: usize,
    pub strokes: usize,
    pub samples: usize,
    /// Events that were rejected and skipped
    pub rejected: usize,
}

/// Replay `events` against `canvas`
///
/// Restores queued by undo/redo are completed before the next non-history
/// event, the way a host would deliver the decode callback. Rejected events
/// (bad colors, unknown tools, out-of-range layers, deleting the last layer)
/// are logged and skipped.
pub fn play(canvas: &mut Canvas, events: &[SessionEvent]) -> Result<PlaybackStats, SessionError> {
    let mut stats = PlaybackStats::default();
    for event in events {
        if !matches!(event, SessionEvent::Undo | SessionEvent::Redo) {
            canvas.flush_restores()?;
        }
        if !apply(canvas, event, &mut stats)? {
            stats.rejected += 1;
        }
        stats.events += 1;
    }
    canvas.flush_restores()?;
    info!(
        "Replayed {} events: {} strokes, {} samples, {} rejected",
        stats.events, stats.strokes, stats.samples, stats.rejected
    );
    Ok(stats)
}

fn layer_at(canvas: &Canvas, index: usize) -> Option<LayerId> {
    let id = canvas.layers().layers().get(index).map(|layer| layer.id());
    if id.is_none() {
        warn!("No layer at index {} ({} layers)", index, canvas.layers().len());
    }
    id
}

/// Apply one event; returns false if it was rejected
fn apply(canvas: &mut Canvas, event: &SessionEvent, stats: &mut PlaybackStats) -> Result<bool, CanvasError> {
    debug!("Event: {:?}", event);
    match event {
        SessionEvent::Down(sample) => {
            if canvas.pointer_down(*sample)? {
                stats.strokes += 1;
                stats.samples += 1;
            }
        }
        SessionEvent::Move(sample) => stats.samples += canvas.pointer_move(*sample),
        SessionEvent::Up(sample) => canvas.pointer_up(*sample)?,
        SessionEvent::Leave(_) => canvas.pointer_leave()?,
        SessionEvent::Select { tool, brush, shape } => {
            let kind = match tool.parse::<ToolKind>() {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("{}; keeping {:?}", e, canvas.selection().tool);
                    return Ok(false);
                }
            };
            let current = canvas.selection().clone();
            canvas.select_tool(ToolSelection {
                tool: kind,
                brush: brush.clone().unwrap_or(current.brush),
                shape: shape.clone().unwrap_or(current.shape),
            });
        }
        SessionEvent::Color { hex } => match hex.parse::<Color>() {
            Ok(color) => canvas.set_color(color),
            Err(e) => {
                warn!("{}", e);
                return Ok(false);
            }
        },
        SessionEvent::Size { value } => canvas.set_brush_size(*value),
        SessionEvent::Opacity { value } => canvas.set_brush_opacity(*value),
        SessionEvent::AddLayer { name } => {
            canvas.add_layer(name.as_deref())?;
        }
        SessionEvent::DeleteLayer { index } => {
            let Some(id) = layer_at(canvas, *index) else {
                return Ok(false);
            };
            match canvas.delete_layer(id) {
                Ok(()) => {}
                Err(CanvasError::Layer(e)) => {
                    warn!("{}", e);
                    return Ok(false);
                }
                Err(e) => return Err(e),
            }
        }
        SessionEvent::LayerOpacity { index, value } => {
            let Some(id) = layer_at(canvas, *index) else {
                return Ok(false);
            };
            canvas.set_layer_opacity(id, *value)?;
        }
        SessionEvent::LayerVisible { index, visible } => {
            let Some(id) = layer_at(canvas, *index) else {
                return Ok(false);
            };
            canvas.set_layer_visible(id, *visible)?;
        }
        SessionEvent::Activate { index } => {
            let Some(id) = layer_at(canvas, *index) else {
                return Ok(false);
            };
            canvas.set_active_layer(id)?;
        }
        SessionEvent::Undo => return Ok(canvas.undo()),
        SessionEvent::Redo => return Ok(canvas.redo()),
        SessionEvent::Resize { width, height } => canvas.resize(*width, *height)?,
    }
    Ok(true)
}
