//! Queue change notification
//!
//! Every mutating queue operation captures the active window (previous,
//! current and next track plus cursor and length) before and after the
//! mutation. The difference becomes a [`ChangeSet`], which is delivered to a
//! [`ChangeNotifier`] once the queue lock has been released.

use crate::persistence::QueueSnapshot;
use crate::track::{same_slot, Track};
use crate::types::ActiveOffset;
use std::sync::{Arc, Mutex, PoisonError};

/// Receiver of queue change callbacks
///
/// Callbacks run on the thread that completed the operation, without the
/// queue lock held, so they may call back into the queue.
#[cfg_attr(test, mockall::automock)]
pub trait ChangeNotifier: Send + Sync {
    /// A slot of the active window now holds a different track
    fn active_song_replaced(&self, offset: ActiveOffset, track: Option<Arc<Track>>);

    /// The queue changed and should be saved
    fn timeline_changed(&self);

    /// Cursor or queue length changed
    fn position_info_changed(&self);
}

/// Previous/current/next tracks with cursor and length, captured around a mutation
#[derive(Debug, Clone, Default)]
pub(crate) struct ActiveWindow {
    pub previous: Option<Arc<Track>>,
    pub current: Option<Arc<Track>>,
    pub next: Option<Arc<Track>>,
    pub cursor: usize,
    pub len: usize,
}

impl ActiveWindow {
    fn slot(&self, offset: ActiveOffset) -> &Option<Arc<Track>> {
        match offset {
            ActiveOffset::Previous => &self.previous,
            ActiveOffset::Current => &self.current,
            ActiveOffset::Next => &self.next,
        }
    }

    /// Difference between this (older) window and `after`
    pub fn diff(&self, after: &ActiveWindow) -> ChangeSet {
        let replaced = ActiveOffset::ALL
            .into_iter()
            .filter(|&offset| {
                !same_slot(self.slot(offset).as_deref(), after.slot(offset).as_deref())
            })
            .map(|offset| (offset, after.slot(offset).clone()))
            .collect();

        ChangeSet {
            replaced,
            position_changed: self.cursor != after.cursor || self.len != after.len,
            snapshot: None,
        }
    }
}

/// Notifications produced by one committed operation
#[derive(Debug, Clone, Default)]
pub(crate) struct ChangeSet {
    /// Window slots whose track identity changed, in -1, 0, +1 order
    pub replaced: Vec<(ActiveOffset, Option<Arc<Track>>)>,

    pub position_changed: bool,

    /// State to persist after notifying
    pub snapshot: Option<QueueSnapshot>,
}

impl ChangeSet {
    pub fn deliver(&self, notifier: &dyn ChangeNotifier) {
        for (offset, track) in &self.replaced {
            notifier.active_song_replaced(*offset, track.clone());
        }
        if self.position_changed {
            notifier.position_info_changed();
        }
        notifier.timeline_changed();
    }
}

/// Queue change, as recorded by [`EventCollector`]
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    ActiveSongReplaced {
        offset: ActiveOffset,
        track: Option<Arc<Track>>,
    },
    TimelineChanged,
    PositionInfoChanged,
}

/// Notifier that buffers events until drained
///
/// Useful for UIs that poll and for tests.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Mutex<Vec<QueueEvent>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all buffered events, oldest first
    pub fn drain_events(&self) -> Vec<QueueEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn has_pending_events(&self) -> bool {
        !self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    fn push(&self, event: QueueEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ChangeNotifier for EventCollector {
    fn active_song_replaced(&self, offset: ActiveOffset, track: Option<Arc<Track>>) {
        self.push(QueueEvent::ActiveSongReplaced { offset, track });
    }

    fn timeline_changed(&self) {
        self.push(QueueEvent::TimelineChanged);
    }

    fn position_info_changed(&self) {
        self.push(QueueEvent::PositionInfoChanged);
    }
}
