//! Queue state persistence contract
//!
//! The queue does not know how its state is encoded. It hands a
//! [`QueueSnapshot`] to a [`StatePersistence`] implementation after each
//! change and asks for one when hydrating at startup.

use crate::error::Result;
use crate::track::Track;
use crate::types::{FinishAction, ShuffleMode};
use std::sync::Arc;

/// Logical queue state that must survive a restart
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    /// Tracks in playback order
    pub tracks: Vec<Arc<Track>>,

    /// Index of the current track
    pub cursor: usize,

    pub shuffle_mode: ShuffleMode,

    pub finish_action: FinishAction,
}

impl QueueSnapshot {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<&Arc<Track>> {
        self.tracks.get(self.cursor)
    }
}

/// Storage for queue state
///
/// Implementations recover from malformed content on their own: a broken
/// track entry is dropped, a broken container loads as an empty queue.
/// Errors are reserved for failures the caller can act on (I/O).
#[cfg_attr(test, mockall::automock)]
pub trait StatePersistence: Send + Sync {
    /// Load the last saved state
    fn load(&self) -> Result<QueueSnapshot>;

    /// Save the given state, replacing what was stored before
    fn save(&self, snapshot: &QueueSnapshot) -> Result<()>;
}
