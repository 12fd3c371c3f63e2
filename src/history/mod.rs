//! Bounded undo history of surface snapshots.

mod snapshot;

use std::collections::VecDeque;

use thiserror::Error;

pub use snapshot::{EncodedSnapshot, PendingSnapshot};

use crate::editor::scale::Rotation;
use crate::editor::surface::{ImageSurface, RestoredState};
use crate::geometry::Size;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to encode history snapshot: {0}")]
    Encode(#[source] image::ImageError),
    #[error("failed to decode history snapshot: {0}")]
    Decode(#[source] image::ImageError),
    #[error("snapshot worker exited before sending a result")]
    WorkerDisconnected,
}

pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

/// Surface state captured right before a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub snapshot: EncodedSnapshot,
    pub rotation: Rotation,
    /// Stage size at capture time; already swapped on odd rotations.
    pub stage_size: Size,
    pub sprite_size: Size,
}

impl HistoryEntry {
    fn to_restored(&self) -> HistoryResult<RestoredState> {
        Ok(RestoredState {
            bitmap: self.snapshot.decode()?,
            rotation: self.rotation,
            stage_size: self.stage_size,
            sprite_size: self.sprite_size,
        })
    }
}

#[derive(Debug)]
pub struct HistoryStack {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStack {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Appends an entry, evicting the oldest ones first when full.
    pub fn push(&mut self, entry: HistoryEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
            tracing::debug!(capacity = self.capacity, "oldest history entry evicted");
        }
        self.entries.push_back(entry);
    }

    /// Snapshots the composited surface on a worker and waits for it.
    pub fn capture(surface: &ImageSurface) -> HistoryResult<HistoryEntry> {
        let snapshot = PendingSnapshot::spawn(surface.composite()).wait()?;
        Ok(HistoryEntry {
            snapshot,
            rotation: surface.rotation(),
            stage_size: surface.display_size(),
            sprite_size: surface.sprite_size(),
        })
    }

    /// Records the surface, then runs `operation` on it. The operation never
    /// runs when the capture fails.
    pub fn wrap<T>(
        &mut self,
        surface: &mut ImageSurface,
        operation: impl FnOnce(&mut ImageSurface) -> T,
    ) -> HistoryResult<T> {
        let entry = Self::capture(surface)?;
        self.push(entry);
        Ok(operation(surface))
    }

    /// Pops the newest entry and hands it to `on_restore`. Returns `false`
    /// when there was nothing to undo. An entry that fails to decode stays
    /// on the stack.
    pub fn restore(&mut self, on_restore: impl FnOnce(RestoredState)) -> HistoryResult<bool> {
        let Some(entry) = self.entries.back() else {
            return Ok(false);
        };
        let state = entry.to_restored()?;
        self.entries.pop_back();
        on_restore(state);
        Ok(true)
    }
}
