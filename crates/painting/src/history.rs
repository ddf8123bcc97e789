//! Linear undo/redo over whole-canvas snapshots
//!
//! `snapshots[cursor - 1]` is the state currently on screen. Saving abandons
//! the redo branch; the oldest snapshot is dropped once the capacity is
//! exceeded.
//!
//! Undo and redo move the cursor immediately but apply the target snapshot
//! later, when the host calls [`History::complete_restore`]. At most one
//! request is in flight and at most one waits behind it, so restores always
//! land in the order they were issued and a burst of undos collapses to the
//! last one.

mod snapshot;

pub use snapshot::{DecodedSnapshot, EncodedLayer, Snapshot, SnapshotError};

use tracing::debug;

/// A pending restore of one snapshot
#[derive(Debug, Clone)]
pub struct RestoreRequest {
    ticket: u64,
    cursor: usize,
    snapshot: Snapshot,
}

impl RestoreRequest {
    /// Issue order; later requests have larger tickets
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// History cursor the request was issued for
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

#[derive(Debug)]
pub struct History {
    snapshots: Vec<Snapshot>,
    cursor: usize,
    capacity: usize,
    in_flight: Option<RestoreRequest>,
    queued: Option<RestoreRequest>,
    next_ticket: u64,
}

impl History {
    /// Start a history holding only `initial`, with `cursor = 1`
    pub fn new(capacity: usize, initial: Snapshot) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 1,
            capacity: capacity.max(1),
            in_flight: None,
            queued: None,
            next_ticket: 0,
        }
    }

    /// Record a new state, discarding anything redoable
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.truncate(self.cursor);
        self.snapshots.push(snapshot);

        // Drop oldest if over limit
        if self.snapshots.len() > self.capacity {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len();
        debug!("History::push: {} snapshots, cursor={}", self.snapshots.len(), self.cursor);
    }

    /// Step back one snapshot and queue its restore
    ///
    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.cursor <= 1 {
            debug!("Undo: no entries available");
            return false;
        }
        self.cursor -= 1;
        self.request_restore();
        true
    }

    /// Step forward one snapshot and queue its restore
    ///
    /// Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        if self.cursor >= self.snapshots.len() {
            debug!("Redo: no entries available");
            return false;
        }
        self.cursor += 1;
        self.request_restore();
        true
    }

    fn request_restore(&mut self) {
        let request = RestoreRequest {
            ticket: self.next_ticket,
            cursor: self.cursor,
            snapshot: self.snapshots[self.cursor - 1].clone(),
        };
        self.next_ticket += 1;
        debug!("Restore #{} requested, cursor={}", request.ticket, request.cursor);

        if self.in_flight.is_none() {
            self.in_flight = Some(request);
        } else if let Some(stale) = self.queued.replace(request) {
            debug!("Restore #{} superseded before it started", stale.ticket);
        }
    }

    /// The restore that the next [`complete_restore`](Self::complete_restore) will apply
    pub fn in_flight(&self) -> Option<&RestoreRequest> {
        self.in_flight.as_ref()
    }

    pub fn is_restoring(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Finish the in-flight restore and promote the queued one
    ///
    /// Returns the decoded snapshot to apply, or None when nothing is pending.
    pub fn complete_restore(&mut self) -> Option<(RestoreRequest, Result<DecodedSnapshot, SnapshotError>)> {
        let request = self.in_flight.take()?;
        self.in_flight = self.queued.take();
        let decoded = request.snapshot.decode();
        debug!(
            "Restore #{} decoded ({} pending)",
            request.ticket,
            usize::from(self.in_flight.is_some())
        );
        Some((request, decoded))
    }

    /// Number of stored snapshots
    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 1
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.snapshots.len()
    }

    /// The snapshot matching the current cursor
    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.cursor - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerStack;
    use crate::surface::Bitmap;
    use crate::types::Color;

    /// A 1x1 snapshot whose single pixel encodes `n`
    fn marked(n: u8) -> Snapshot {
        let mut stack = LayerStack::new(1, 1);
        stack.active_bitmap_mut().clear(Color::rgb(n, 0, 0));
        let mut visible = Bitmap::new(1, 1);
        stack.composite(&mut visible);
        Snapshot::capture(&visible, &stack).unwrap()
    }

    fn mark_of(decoded: &DecodedSnapshot) -> u8 {
        decoded.composite.get_pixel(0, 0).unwrap().r
    }

    fn history_with(count: u8, capacity: usize) -> History {
        let mut history = History::new(capacity, marked(0));
        for n in 1..=count {
            history.push(marked(n));
        }
        history
    }

    #[test]
    fn test_initial_state() {
        let history = History::new(30, marked(0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(!history.is_restoring());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        // 35 saves on top of the blank snapshot with a cap of 30
        let mut history = history_with(35, 30);
        assert_eq!(history.len(), 30);
        assert_eq!(history.cursor(), 30);

        while history.undo() {}
        assert_eq!(history.cursor(), 1);
        let mut oldest = None;
        while let Some((_, decoded)) = history.complete_restore() {
            oldest = Some(mark_of(&decoded.unwrap()));
        }
        // Snapshots 0..=5 are gone
        assert_eq!(oldest, Some(6));
    }

    #[test]
    fn test_undo_redo_cursor_bounds() {
        let mut history = history_with(2, 30);
        assert!(history.undo());
        assert!(history.undo());
        assert!(!history.undo());
        assert_eq!(history.cursor(), 1);

        assert!(history.redo());
        assert!(history.redo());
        assert!(!history.redo());
        assert_eq!(history.cursor(), 3);
    }

    #[test]
    fn test_push_abandons_redo_branch() {
        let mut history = history_with(3, 30);
        history.undo();
        history.undo();
        history.push(marked(9));

        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 3);
        assert!(!history.can_redo());
        let decoded = history.current().decode().unwrap();
        assert_eq!(mark_of(&decoded), 9);
    }

    #[test]
    fn test_restores_complete_in_issue_order() {
        let mut history = history_with(4, 30);
        history.undo(); // -> 3, in flight
        history.undo(); // -> 2, queued
        history.undo(); // -> 1, replaces 2

        let (first, decoded) = history.complete_restore().unwrap();
        assert_eq!(first.cursor(), 4);
        assert_eq!(mark_of(&decoded.unwrap()), 3);

        let (second, decoded) = history.complete_restore().unwrap();
        assert!(second.ticket() > first.ticket());
        assert_eq!(mark_of(&decoded.unwrap()), 1);

        assert!(history.complete_restore().is_none());
        assert!(!history.is_restoring());
    }

    #[test]
    fn test_in_flight_is_never_replaced() {
        let mut history = history_with(2, 30);
        history.undo();
        let ticket = history.in_flight().unwrap().ticket();
        history.redo();
        history.undo();
        assert_eq!(history.in_flight().unwrap().ticket(), ticket);
    }
}
