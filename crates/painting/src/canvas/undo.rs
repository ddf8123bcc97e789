//! Compositing, snapshots and undo/redo for the canvas

use tracing::{debug, info, warn};

use super::{Canvas, CanvasError};
use crate::history::Snapshot;
use crate::surface::Bitmap;

impl Canvas {
    /// Recomposite the layer stack into the visible surface
    ///
    /// Skipped while a restore is pending, so a restore is never interleaved
    /// with other writes to the visible surface, and while a stroke is open.
    /// Returns whether it ran.
    pub fn composite(&mut self) -> bool {
        if self.history.is_restoring() {
            debug!("composite: restore pending, skipping");
            return false;
        }
        if self.strokes.is_active() {
            debug!("composite: stroke in progress, skipping");
            return false;
        }
        self.layers.composite(&mut self.visible);
        true
    }

    /// Recomposite and push a snapshot, abandoning the redo branch
    ///
    /// With a stroke open this closes the stroke, which saves once.
    pub fn save(&mut self) -> Result<(), CanvasError> {
        if self.strokes.is_active() {
            return self.end_stroke();
        }
        self.flush_restores()?;
        self.composite();
        let snapshot = Snapshot::capture(&self.visible, &self.layers)?;
        info!(
            "Saved snapshot {} ({} bytes, {} layers)",
            self.history.cursor() + 1,
            snapshot.encoded_len(),
            snapshot.layers().len()
        );
        self.history.push(snapshot);
        Ok(())
    }

    /// Step back one snapshot
    ///
    /// The cursor moves now; the pixels change once the restore completes.
    /// Ignored during an active stroke. Returns whether a restore was queued.
    pub fn undo(&mut self) -> bool {
        if self.strokes.is_active() {
            debug!("undo: stroke in progress, ignoring");
            return false;
        }
        self.history.undo()
    }

    /// Step forward one snapshot. Same rules as [`undo`](Self::undo).
    pub fn redo(&mut self) -> bool {
        if self.strokes.is_active() {
            debug!("redo: stroke in progress, ignoring");
            return false;
        }
        self.history.redo()
    }

    /// Whether an undo/redo is waiting to be applied
    pub fn is_restoring(&self) -> bool {
        self.history.is_restoring()
    }

    /// Decode and apply the in-flight restore
    ///
    /// The visible surface is cleared and the decoded composite drawn at the
    /// origin; the layer stack is replaced by the captured layers. Returns
    /// false when nothing was pending.
    pub fn complete_restore(&mut self) -> Result<bool, CanvasError> {
        let Some((request, decoded)) = self.history.complete_restore() else {
            return Ok(false);
        };
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Restore #{} failed: {}", request.ticket(), e);
                return Err(e.into());
            }
        };

        let (width, height) = (decoded.composite.width(), decoded.composite.height());
        if (width, height) != (self.visible.width(), self.visible.height()) {
            debug!("Restore #{} changes canvas size to {}x{}", request.ticket(), width, height);
            self.visible = Bitmap::new(width, height);
            self.layers.resize_all(width, height);
            self.strokes.set_bounds(width, height);
        }
        self.visible.copy_from(&decoded.composite);
        self.layers.restore(decoded.layers, decoded.active);

        info!(
            "Restored snapshot {} of {} (request #{})",
            request.cursor(),
            self.history.len(),
            request.ticket()
        );
        Ok(true)
    }

    /// Apply every pending restore in order; returns how many were applied
    pub fn flush_restores(&mut self) -> Result<usize, CanvasError> {
        let mut applied = 0;
        while self.complete_restore()? {
            applied += 1;
        }
        Ok(applied)
    }
}
