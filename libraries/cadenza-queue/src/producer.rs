//! Track producers feeding the queue
//!
//! A producer turns a [`Selection`] into a batch of tracks, typically by
//! querying the media index or a remote listing. Producing may be slow, so it
//! is async and happens without the queue lock; only the final merge locks.

use crate::error::Result;
use crate::queue::QueueStore;
use crate::track::{OriginFlags, Track};
use crate::types::{IngestHint, IngestMode};
use async_trait::async_trait;
use tracing::{debug, info};

/// What to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Tracks matching a free-form query
    Query(String),

    /// A handful of random tracks for the random-fill finish action
    Random,
}

/// Source of track batches
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackProducer: Send + Sync {
    /// Produce tracks for `selection`, in their natural order
    async fn produce(&self, selection: &Selection) -> Result<Vec<Track>>;
}

/// A deferred request to fill the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTask {
    pub selection: Selection,
    pub mode: IngestMode,
    pub hint: IngestHint,
}

impl QueryTask {
    pub fn new(selection: Selection, mode: IngestMode) -> Self {
        Self {
            selection,
            mode,
            hint: IngestHint::None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: IngestHint) -> Self {
        self.hint = hint;
        self
    }
}

/// Produce the task's tracks and merge them into the queue
///
/// Returns the number of tracks added. An empty batch leaves the queue as
/// it was.
pub async fn run_query(
    queue: &QueueStore,
    producer: &dyn TrackProducer,
    task: QueryTask,
) -> Result<usize> {
    let QueryTask {
        selection,
        mode,
        hint,
    } = task;

    let tracks = producer.produce(&selection).await?;
    debug!(?selection, ?mode, produced = tracks.len(), "Query produced tracks");

    queue.ingest(tracks, mode, hint)
}

/// Append random tracks if the queue is in random-fill mode and has run out
///
/// Added tracks carry [`OriginFlags::RANDOM`].
pub async fn fill_random(queue: &QueueStore, producer: &dyn TrackProducer) -> Result<usize> {
    if !queue.wants_random_fill() {
        return Ok(0);
    }

    let tracks: Vec<Track> = producer
        .produce(&Selection::Random)
        .await?
        .into_iter()
        .map(|mut track| {
            track.flags.insert(OriginFlags::RANDOM);
            track
        })
        .collect();

    let added = queue.ingest(tracks, IngestMode::Enqueue, IngestHint::None)?;
    if added > 0 {
        info!(added, "Random fill appended tracks");
    }
    Ok(added)
}
