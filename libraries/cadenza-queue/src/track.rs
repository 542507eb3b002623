//! Track records held by the queue

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a playable item
///
/// Local tracks are identified by their media index id. Remote tracks have
/// no local id and are identified by the key of their path on the remote
/// storage instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackIdentity {
    /// Track from the local media index
    Local(i64),

    /// Track on remote storage, keyed by its remote path
    Remote(String),
}

impl TrackIdentity {
    /// Local media id, if this is a local track
    pub fn local_id(&self) -> Option<i64> {
        match self {
            Self::Local(id) => Some(*id),
            Self::Remote(_) => None,
        }
    }

    /// Remote path key, if this is a remote track
    pub fn remote_path(&self) -> Option<&str> {
        match self {
            Self::Local(_) => None,
            Self::Remote(path) => Some(path),
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::Local(_) => SourceKind::Local,
            Self::Remote(_) => SourceKind::Remote,
        }
    }
}

impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(id) => write!(f, "local:{id}"),
            Self::Remote(path) => write!(f, "remote:{path}"),
        }
    }
}

/// Where a track is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Remote,
}

/// Bitset describing how a track came to be in the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OriginFlags(u8);

impl OriginFlags {
    /// Added by the random-fill finish action
    pub const RANDOM: Self = Self(0x1);

    /// Known to have no cover art
    pub const NO_COVER: Self = Self(0x2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for OriginFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Pre-fetched `ReplayGain` values (dB), carried for remote tracks
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayGain {
    pub track_db: Option<f32>,
    pub album_db: Option<f32>,
}

/// One playable item in the queue
///
/// Tracks are never deduplicated: the same media may be queued several times,
/// each entry being its own instance. Equality through [`Track::same_identity`]
/// compares media identity only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub identity: TrackIdentity,

    /// Album id from the media index (`None` for remote tracks)
    pub album_id: Option<i64>,

    /// Artist id from the media index (`None` for remote tracks)
    pub artist_id: Option<i64>,

    /// File path or remote URL used by the decoder
    pub path: String,

    pub title: String,
    pub album: String,
    pub artist: String,

    /// Position within its album
    pub track_number: u32,

    pub flags: OriginFlags,

    pub replay_gain: ReplayGain,
}

impl Track {
    /// Create a track from the local media index
    pub fn local(id: i64, path: impl Into<String>, title: impl Into<String>) -> Self {
        Self::with_identity(TrackIdentity::Local(id), path, title)
    }

    /// Create a track stored remotely under `remote_path`
    pub fn remote(
        remote_path: impl Into<String>,
        path: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self::with_identity(TrackIdentity::Remote(remote_path.into()), path, title)
    }

    fn with_identity(
        identity: TrackIdentity,
        path: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            album_id: None,
            artist_id: None,
            path: path.into(),
            title: title.into(),
            album: String::new(),
            artist: String::new(),
            track_number: 1,
            flags: OriginFlags::empty(),
            replay_gain: ReplayGain::default(),
        }
    }

    /// Set album id and name
    #[must_use]
    pub fn in_album(mut self, album_id: i64, album: impl Into<String>) -> Self {
        self.album_id = Some(album_id);
        self.album = album.into();
        self
    }

    /// Set artist id and name
    #[must_use]
    pub fn by_artist(mut self, artist_id: i64, artist: impl Into<String>) -> Self {
        self.artist_id = Some(artist_id);
        self.artist = artist.into();
        self
    }

    #[must_use]
    pub fn with_track_number(mut self, track_number: u32) -> Self {
        self.track_number = track_number;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: OriginFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_replay_gain(mut self, replay_gain: ReplayGain) -> Self {
        self.replay_gain = replay_gain;
        self
    }

    pub fn source_kind(&self) -> SourceKind {
        self.identity.source_kind()
    }

    /// Whether both tracks refer to the same media
    pub fn same_identity(&self, other: &Track) -> bool {
        self.identity == other.identity
    }

    /// Whether this track matches the given identity
    pub fn matches(&self, identity: &TrackIdentity) -> bool {
        &self.identity == identity
    }
}

impl AsRef<Track> for Track {
    fn as_ref(&self) -> &Track {
        self
    }
}

/// Compare two optional window slots by media identity
pub(crate) fn same_slot(a: Option<&Track>, b: Option<&Track>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same_identity(b),
        _ => false,
    }
}
