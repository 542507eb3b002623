//! Track library backed by a JSON file
//!
//! The library is a JSON array of the same track records the queue state
//! uses. Queries match case-insensitively against title, artist and album.

use crate::error::{CliError, Result};
use async_trait::async_trait;
use cadenza_queue::{Selection, Track, TrackProducer};
use cadenza_storage::TrackRecord;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// [`TrackProducer`] reading a library file on every request
#[derive(Debug, Clone)]
pub struct LibraryProducer {
    path: PathBuf,
    random_batch: usize,
}

impl LibraryProducer {
    pub fn new(path: impl Into<PathBuf>, random_batch: usize) -> Self {
        Self {
            path: path.into(),
            random_batch,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every valid track in the library, in file order
    pub async fn tracks(&self) -> Result<Vec<Track>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CliError::Library(format!("cannot read {}: {e}", self.path.display()))
        })?;

        let records: Vec<serde_json::Value> = serde_json::from_str(&contents)
            .map_err(|e| CliError::Library(format!("{}: {e}", self.path.display())))?;

        let tracks: Vec<Track> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                let track = serde_json::from_value::<TrackRecord>(value)
                    .map_err(cadenza_storage::StorageError::from)
                    .and_then(Track::try_from);
                match track {
                    Ok(track) => Some(track),
                    Err(e) => {
                        warn!(index, error = %e, "Skipping library entry");
                        None
                    }
                }
            })
            .collect();

        debug!(path = %self.path.display(), tracks = tracks.len(), "Library loaded");
        Ok(tracks)
    }

    fn matches(track: &Track, needle: &str) -> bool {
        [&track.title, &track.artist, &track.album]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[async_trait]
impl TrackProducer for LibraryProducer {
    async fn produce(&self, selection: &Selection) -> cadenza_queue::Result<Vec<Track>> {
        let tracks = self.tracks().await?;

        Ok(match selection {
            Selection::Query(query) => {
                let needle = query.to_lowercase();
                tracks
                    .into_iter()
                    .filter(|track| Self::matches(track, &needle))
                    .collect()
            }
            Selection::Random => {
                let mut rng = rand::thread_rng();
                tracks
                    .choose_multiple(&mut rng, self.random_batch)
                    .cloned()
                    .collect()
            }
        })
    }
}
