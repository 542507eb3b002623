//! Cadenza Storage
//!
//! File-backed persistence for the Cadenza playback queue.
//!
//! The queue state is kept in a single JSON document. Loading is tolerant:
//! a missing file or an unreadable document yields an empty queue, and a
//! malformed track entry is skipped without losing the rest.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadenza_queue::{QueueConfig, QueueStore};
//! use cadenza_storage::JsonStateStore;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(JsonStateStore::new("./data/queue.json"));
//! let queue = QueueStore::new(QueueConfig::default()).with_persistence(store);
//!
//! // Restore the last session; every later change is saved automatically
//! queue.hydrate()?;
//! # Ok(())
//! # }
//! ```

mod error;

// Queue state document
pub mod queue_state;

pub use error::{Result, StorageError};
pub use queue_state::{JsonStateStore, TrackRecord};
