//! Queue state stored as a JSON document
//!
//! ```json
//! {
//!   "version": 1,
//!   "cursor": 2,
//!   "shuffle_mode": 0,
//!   "finish_action": 1,
//!   "tracks": [{ "source": "local", "id": 12, "path": "/music/12.flac", ... }]
//! }
//! ```
//!
//! Modes are stored as their numeric codes. A header field of the wrong
//! shape falls back to its default without affecting the rest.

mod record;

pub use record::TrackRecord;

use crate::error::Result;
use cadenza_queue::{FinishAction, QueueSnapshot, ShuffleMode, StatePersistence, Track};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct StateDocument {
    version: u32,
    cursor: usize,
    shuffle_mode: i64,
    finish_action: i64,
    tracks: Vec<TrackRecord>,
}

/// Document as read back, with track entries left undecoded so one bad
/// entry does not spoil the others
#[derive(Debug, Deserialize)]
struct RawStateDocument {
    #[serde(default, deserialize_with = "lenient")]
    version: u32,
    #[serde(default, deserialize_with = "lenient")]
    cursor: usize,
    #[serde(default, deserialize_with = "lenient")]
    shuffle_mode: i64,
    #[serde(default, deserialize_with = "lenient")]
    finish_action: i64,
    #[serde(default, deserialize_with = "lenient")]
    tracks: Vec<serde_json::Value>,
}

/// Accept any JSON value, using the default when it has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        warn!(%value, error = %e, "Ignoring malformed queue state field");
        T::default()
    }))
}

/// Queue persistence in a single JSON file
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored state
    ///
    /// Returns an empty state if the file does not exist or is not a state
    /// document. Only I/O failures are errors.
    pub fn read(&self) -> Result<QueueSnapshot> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved queue state");
                return Ok(QueueSnapshot::default());
            }
            Err(e) => return Err(e.into()),
        };

        let document: RawStateDocument = match serde_json::from_str(&contents) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable queue state");
                return Ok(QueueSnapshot::default());
            }
        };

        Ok(decode(document))
    }

    /// Write the state, replacing the file atomically
    pub fn write(&self, snapshot: &QueueSnapshot) -> Result<()> {
        let document = StateDocument {
            version: DOCUMENT_VERSION,
            cursor: snapshot.cursor,
            shuffle_mode: snapshot.shuffle_mode.code(),
            finish_action: snapshot.finish_action.code(),
            tracks: snapshot
                .tracks
                .iter()
                .map(|track| TrackRecord::from(track.as_ref()))
                .collect(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &self.path)?;

        debug!(
            path = %self.path.display(),
            tracks = snapshot.len(),
            cursor = snapshot.cursor,
            "Saved queue state"
        );
        Ok(())
    }
}

impl StatePersistence for JsonStateStore {
    fn load(&self) -> cadenza_queue::Result<QueueSnapshot> {
        Ok(self.read()?)
    }

    fn save(&self, snapshot: &QueueSnapshot) -> cadenza_queue::Result<()> {
        Ok(self.write(snapshot)?)
    }
}

fn decode(document: RawStateDocument) -> QueueSnapshot {
    if document.version > DOCUMENT_VERSION {
        warn!(version = document.version, "Queue state written by a newer version");
    }

    let mut cursor = document.cursor;
    let mut tracks = Vec::with_capacity(document.tracks.len());

    for (index, value) in document.tracks.into_iter().enumerate() {
        let decoded = serde_json::from_value::<TrackRecord>(value)
            .map_err(Into::into)
            .and_then(Track::try_from);

        match decoded {
            Ok(track) => tracks.push(Arc::new(track)),
            Err(e) => {
                warn!(index, error = %e, "Dropping malformed queue entry");
                // Keep pointing at the same entry
                if index < document.cursor {
                    cursor = cursor.saturating_sub(1);
                }
            }
        }
    }

    let shuffle_mode = ShuffleMode::try_from(document.shuffle_mode).unwrap_or_else(|_| {
        warn!(code = document.shuffle_mode, "Unknown shuffle mode, using default");
        ShuffleMode::default()
    });
    let finish_action = FinishAction::try_from(document.finish_action).unwrap_or_else(|_| {
        warn!(code = document.finish_action, "Unknown finish action, using default");
        FinishAction::default()
    });

    QueueSnapshot {
        cursor: cursor.min(tracks.len().saturating_sub(1)),
        tracks,
        shuffle_mode,
        finish_action,
    }
}
