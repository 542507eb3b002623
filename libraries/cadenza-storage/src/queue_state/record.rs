//! On-disk track records

use crate::error::{Result, StorageError};
use cadenza_queue::{OriginFlags, ReplayGain, SourceKind, Track, TrackIdentity};
use serde::{Deserialize, Serialize};

/// One queue entry as stored in the state document
///
/// Local entries carry their media `id`; remote entries carry the
/// `remote_path` key instead, plus the pre-fetched `ReplayGain` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub source: SourceKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<i64>,

    pub path: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub album: String,

    #[serde(default)]
    pub artist: String,

    #[serde(default = "default_track_number")]
    pub track_number: u32,

    #[serde(default)]
    pub flags: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rg_track: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rg_album: Option<f32>,
}

fn default_track_number() -> u32 {
    1
}

impl From<&Track> for TrackRecord {
    fn from(track: &Track) -> Self {
        Self {
            source: track.source_kind(),
            id: track.identity.local_id(),
            album_id: track.album_id,
            artist_id: track.artist_id,
            path: track.path.clone(),
            title: track.title.clone(),
            album: track.album.clone(),
            artist: track.artist.clone(),
            track_number: track.track_number,
            flags: track.flags.bits(),
            remote_path: track.identity.remote_path().map(str::to_owned),
            rg_track: track.replay_gain.track_db,
            rg_album: track.replay_gain.album_db,
        }
    }
}

impl TryFrom<TrackRecord> for Track {
    type Error = StorageError;

    fn try_from(record: TrackRecord) -> Result<Self> {
        let identity = match record.source {
            SourceKind::Local => TrackIdentity::Local(
                record
                    .id
                    .ok_or_else(|| StorageError::invalid_record("local track without id"))?,
            ),
            SourceKind::Remote => TrackIdentity::Remote(
                record
                    .remote_path
                    .filter(|path| !path.is_empty())
                    .ok_or_else(|| StorageError::invalid_record("remote track without remote path"))?,
            ),
        };

        if record.path.is_empty() {
            return Err(StorageError::invalid_record(format!(
                "{identity} has an empty path"
            )));
        }

        Ok(Self {
            identity,
            album_id: record.album_id,
            artist_id: record.artist_id,
            path: record.path,
            title: record.title,
            album: record.album,
            artist: record.artist,
            track_number: record.track_number,
            flags: OriginFlags::from_bits(record.flags),
            replay_gain: ReplayGain {
                track_db: record.rg_track,
                album_db: record.rg_album,
            },
        })
    }
}
