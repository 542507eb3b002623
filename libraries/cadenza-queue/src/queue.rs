//! Thread-safe playback queue
//!
//! [`QueueStore`] wraps a [`Timeline`] in a mutex. Each mutating operation
//! runs under the lock, captures the active window before and after, and
//! queues the resulting change set in an outbox. Change sets are delivered
//! to the notifier (and then to persistence) after the lock is released, in
//! the order the operations committed.
//!
//! # Example
//!
//! ```rust
//! use cadenza_queue::{Direction, IngestHint, IngestMode, QueueConfig, QueueStore, Track};
//!
//! let queue = QueueStore::new(QueueConfig::default());
//! let tracks = (1..=3)
//!     .map(|id| Track::local(id, format!("/music/{id}.flac"), format!("Track {id}")))
//!     .collect();
//!
//! queue.ingest(tracks, IngestMode::Play, IngestHint::None).unwrap();
//! queue.advance(Direction::Forward).unwrap();
//! assert_eq!(queue.position(), 1);
//! ```

use crate::error::Result;
use crate::events::{ChangeNotifier, ChangeSet};
use crate::persistence::{QueueSnapshot, StatePersistence};
use crate::timeline::Timeline;
use crate::track::{Track, TrackIdentity};
use crate::types::{
    ActiveOffset, Direction, FinishAction, IngestHint, IngestMode, QueueConfig, Shift, ShuffleMode,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Result of running an operation against the timeline
enum Applied<T> {
    /// State changed, notify and persist
    Changed(T),

    /// State changed, and slot +1 plus position info are reported even when
    /// the window diff is empty
    ChangedWithNext(T),

    /// Nothing changed, stay silent
    Unchanged(T),
}

impl<T> Applied<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Applied<U> {
        match self {
            Self::Changed(value) => Applied::Changed(f(value)),
            Self::ChangedWithNext(value) => Applied::ChangedWithNext(f(value)),
            Self::Unchanged(value) => Applied::Unchanged(f(value)),
        }
    }
}

/// Change sets waiting for delivery
#[derive(Default)]
struct Outbox {
    pending: VecDeque<ChangeSet>,

    /// Some thread is delivering; others only enqueue
    draining: bool,
}

/// Resets the draining flag if a callback panics mid-delivery
struct DrainGuard<'a>(&'a Mutex<Outbox>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .draining = false;
        }
    }
}

/// Playback queue shared between the player, the UI and background producers
pub struct QueueStore {
    timeline: Mutex<Timeline>,
    outbox: Mutex<Outbox>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    persistence: Option<Arc<dyn StatePersistence>>,
    persist_on_change: bool,
}

impl QueueStore {
    /// Create an empty queue
    pub fn new(config: QueueConfig) -> Self {
        Self {
            timeline: Mutex::new(Timeline::new(
                config.shuffle,
                config.finish_action,
                StdRng::from_entropy(),
            )),
            outbox: Mutex::new(Outbox::default()),
            notifier: None,
            persistence: None,
            persist_on_change: config.persist_on_change,
        }
    }

    /// Deliver change callbacks to `notifier`
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Load from and save to `persistence`
    #[must_use]
    pub fn with_persistence(mut self, persistence: Arc<dyn StatePersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Use a specific random generator (seeded for reproducible shuffles)
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.timeline
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .set_rng(rng);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Timeline> {
        self.timeline.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the lock and queue the resulting notifications
    fn apply<R>(
        &self,
        operation: &'static str,
        persist: bool,
        f: impl FnOnce(&mut Timeline) -> Applied<R>,
    ) -> R {
        let value = 'commit: {
            let mut timeline = self.lock();
            let before = timeline.window();

            let (value, report_next) = match f(&mut *timeline) {
                Applied::Unchanged(value) => break 'commit value,
                Applied::Changed(value) => (value, false),
                Applied::ChangedWithNext(value) => (value, true),
            };

            let after = timeline.window();
            let mut changes = before.diff(&after);

            if report_next {
                // Next sorts last, so appending keeps slot order
                if !changes.replaced.iter().any(|(offset, _)| *offset == ActiveOffset::Next) {
                    changes.replaced.push((ActiveOffset::Next, after.next.clone()));
                }
                changes.position_changed = true;
            }

            if persist && self.persist_on_change && self.persistence.is_some() {
                changes.snapshot = Some(timeline.snapshot());
            }

            debug!(
                operation,
                cursor = after.cursor,
                len = after.len,
                replaced = changes.replaced.len(),
                "Queue updated"
            );

            // Enqueued before the timeline lock drops: outbox order is commit order
            self.lock_outbox().pending.push_back(changes);
            value
        };

        self.flush();
        value
    }

    fn try_apply<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Timeline) -> Result<Applied<R>>,
    ) -> Result<R> {
        self.apply(operation, true, |timeline| match f(timeline) {
            Ok(applied) => applied.map(Ok),
            Err(e) => Applied::Unchanged(Err(e)),
        })
    }

    /// Deliver queued change sets unless another thread already is
    ///
    /// Callbacks that mutate the queue enqueue their own change set and
    /// return; the loop below picks it up after the current one.
    fn flush(&self) {
        {
            let mut outbox = self.lock_outbox();
            if outbox.draining || outbox.pending.is_empty() {
                return;
            }
            outbox.draining = true;
        }

        let _guard = DrainGuard(&self.outbox);
        loop {
            let changes = {
                let mut outbox = self.lock_outbox();
                match outbox.pending.pop_front() {
                    Some(changes) => changes,
                    None => {
                        outbox.draining = false;
                        return;
                    }
                }
            };
            self.deliver(&changes);
        }
    }

    fn deliver(&self, changes: &ChangeSet) {
        if let Some(notifier) = &self.notifier {
            changes.deliver(notifier.as_ref());
        }

        if let (Some(persistence), Some(snapshot)) = (&self.persistence, &changes.snapshot) {
            if let Err(e) = persistence.save(snapshot) {
                warn!(error = %e, "Failed to persist queue state");
            }
        }
    }

    /// Replace the in-memory state with the persisted one
    ///
    /// Notifies like any other change but does not write the state back.
    pub fn hydrate(&self) -> Result<()> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };

        let snapshot = persistence.load()?;
        debug!(
            len = snapshot.len(),
            cursor = snapshot.cursor,
            shuffle = ?snapshot.shuffle_mode,
            finish = ?snapshot.finish_action,
            "Hydrating queue"
        );

        self.apply("hydrate", false, |timeline| {
            timeline.restore(snapshot);
            Applied::Changed(())
        });
        Ok(())
    }

    /// Track at `offset` from the cursor, as it would be displayed
    pub fn get_relative(&self, offset: ActiveOffset) -> Option<Arc<Track>> {
        self.lock().get_relative(offset)
    }

    pub fn current(&self) -> Option<Arc<Track>> {
        self.get_relative(ActiveOffset::Current)
    }

    /// Track at an absolute position
    pub fn get(&self, index: usize) -> Option<Arc<Track>> {
        self.lock().get(index)
    }

    /// Move one track in `direction`, returning the new current track
    pub fn advance(&self, direction: Direction) -> Result<Option<Arc<Track>>> {
        self.try_apply("advance", |timeline| {
            timeline.advance(direction)?;
            Ok(Applied::Changed(timeline.current()))
        })
    }

    /// Move to the first track of the next or previous album
    pub fn advance_by_album(&self, direction: Direction) -> Result<Option<Arc<Track>>> {
        self.try_apply("advance_by_album", |timeline| {
            timeline.advance_by_album(direction)?;
            Ok(Applied::Changed(timeline.current()))
        })
    }

    /// Song or album move
    pub fn shift(&self, shift: Shift) -> Result<Option<Arc<Track>>> {
        match shift {
            Shift::PreviousAlbum => self.advance_by_album(Direction::Backward),
            Shift::PreviousSong => self.advance(Direction::Backward),
            Shift::NextSong => self.advance(Direction::Forward),
            Shift::NextAlbum => self.advance_by_album(Direction::Forward),
        }
    }

    /// Jump to an absolute position
    pub fn set_position(&self, index: usize) -> Result<Option<Arc<Track>>> {
        self.try_apply("set_position", |timeline| {
            timeline.set_position(index)?;
            Ok(Applied::Changed(timeline.current()))
        })
    }

    /// Merge a batch of tracks according to `mode`; returns how many were added
    pub fn ingest(&self, tracks: Vec<Track>, mode: IngestMode, hint: IngestHint) -> Result<usize> {
        self.try_apply("ingest", |timeline| {
            let count = timeline.ingest(tracks, mode, &hint)?;
            Ok(if count == 0 {
                Applied::Unchanged(0)
            } else {
                Applied::Changed(count)
            })
        })
    }

    /// Remove every entry with this identity; returns how many were removed
    pub fn remove(&self, identity: &TrackIdentity) -> usize {
        self.apply("remove", true, |timeline| Applied::Changed(timeline.remove(identity)))
    }

    /// Drop every track after the current one, and with `reset_to_zero` also
    /// every track before it
    pub fn truncate_queue_forward(&self, reset_to_zero: bool) {
        self.apply("truncate", true, |timeline| {
            timeline.truncate_forward(reset_to_zero);
            Applied::ChangedWithNext(())
        });
    }

    /// Current track first, everything else in random order after it
    pub fn shuffle_remainder(&self) {
        self.apply("shuffle_remainder", true, |timeline| {
            if timeline.shuffle_remainder() {
                Applied::Changed(())
            } else {
                Applied::Unchanged(())
            }
        });
    }

    pub fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()> {
        self.try_apply("set_shuffle_mode", |timeline| {
            Ok(if timeline.set_shuffle_mode(mode)? {
                Applied::Changed(())
            } else {
                Applied::Unchanged(())
            })
        })
    }

    pub fn set_finish_action(&self, action: FinishAction) {
        self.apply("set_finish_action", true, |timeline| {
            timeline.set_finish_action(action);
            Applied::Changed(())
        });
    }

    /// Whether playback should stop after the current track
    pub fn is_end_of_queue(&self) -> bool {
        self.lock().is_end_of_queue()
    }

    /// Whether random-fill mode wants more tracks
    pub fn wants_random_fill(&self) -> bool {
        self.lock().wants_random_fill()
    }

    pub fn position(&self) -> usize {
        self.lock().cursor()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.lock().shuffle_mode()
    }

    pub fn finish_action(&self) -> FinishAction {
        self.lock().finish_action()
    }

    /// Consistent copy of the whole state
    pub fn snapshot(&self) -> QueueSnapshot {
        self.lock().snapshot()
    }
}
