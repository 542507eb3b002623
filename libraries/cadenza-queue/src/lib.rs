//! Cadenza - Playback Queue
//!
//! Platform-agnostic playback queue for Cadenza.
//!
//! This crate provides:
//! - Ordered queue of local and remote tracks with a cursor
//! - Previous/current/next lookups with wrap-around for display
//! - Song and album navigation
//! - Batch ingestion (play, play next, enqueue, play-this-one-first)
//! - Song and album shuffle with a cached wrap-around order
//! - Finish actions (stop, repeat, repeat current, stop current, random fill)
//! - Change notifications and pluggable state persistence
//!
//! # Architecture
//!
//! `cadenza-queue` knows nothing about decoding, output or storage formats:
//! - Change callbacks go to a [`ChangeNotifier`]
//! - State is saved through a [`StatePersistence`] (see `cadenza-storage`)
//! - Tracks come from a [`TrackProducer`]
//!
//! All operations take `&self`; a [`QueueStore`] can be shared behind an
//! `Arc` between the player thread, the UI and background producers.
//!
//! # Example: Basic Queue
//!
//! ```rust
//! use cadenza_queue::{
//!     ActiveOffset, IngestHint, IngestMode, QueueConfig, QueueStore, Shift, Track, TrackIdentity,
//! };
//!
//! let queue = QueueStore::new(QueueConfig::default());
//!
//! let album = (1..=3)
//!     .map(|id| Track::local(id, format!("/music/{id}.flac"), format!("Track {id}")).in_album(7, "Album"))
//!     .collect();
//!
//! // Replace the queue and start from the second track
//! queue
//!     .ingest(album, IngestMode::PlayIdFirst, IngestHint::Id(TrackIdentity::Local(2)))
//!     .unwrap();
//!
//! let current = queue.get_relative(ActiveOffset::Current).unwrap();
//! assert_eq!(current.identity, TrackIdentity::Local(2));
//!
//! queue.shift(Shift::NextSong).unwrap();
//! assert_eq!(queue.position(), 1);
//! ```
//!
//! # Example: Shuffle and Finish Action
//!
//! ```rust
//! use cadenza_queue::{FinishAction, QueueConfig, QueueStore, ShuffleMode};
//!
//! let queue = QueueStore::new(QueueConfig::default());
//!
//! // Keep albums together
//! queue.set_shuffle_mode(ShuffleMode::Albums).unwrap();
//!
//! // Start over when the queue runs out
//! queue.set_finish_action(FinishAction::Repeat);
//! assert!(!queue.is_end_of_queue());
//! ```

mod error;
mod events;
mod persistence;
mod producer;
mod queue;
pub mod shuffle;
mod timeline;
mod track;
pub mod types;

// Public exports
pub use error::{QueueError, Result};
pub use events::{ChangeNotifier, EventCollector, QueueEvent};
pub use persistence::{QueueSnapshot, StatePersistence};
pub use producer::{fill_random, run_query, QueryTask, Selection, TrackProducer};
pub use queue::QueueStore;
pub use track::{OriginFlags, ReplayGain, SourceKind, Track, TrackIdentity};
pub use types::{
    ActiveOffset, Direction, FinishAction, IngestHint, IngestMode, QueueConfig, Shift, ShuffleMode,
};
