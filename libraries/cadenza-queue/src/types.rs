//! Core types for queue management

use crate::error::QueueError;
use crate::track::TrackIdentity;
use serde::{Deserialize, Serialize};

/// Shuffle mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    /// Play in queue order
    #[default]
    None,

    /// Randomize the order of songs
    Songs,

    /// Randomize the order of albums, keeping track order inside each album
    Albums,
}

impl ShuffleMode {
    /// Next mode in toggle order (None -> Songs -> Albums -> None)
    pub fn cycle(self) -> Self {
        match self {
            Self::None => Self::Songs,
            Self::Songs => Self::Albums,
            Self::Albums => Self::None,
        }
    }

    pub fn is_shuffling(self) -> bool {
        self != Self::None
    }

    /// Stable integer code used in persisted state
    pub fn code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Songs => 1,
            Self::Albums => 2,
        }
    }
}

impl TryFrom<i64> for ShuffleMode {
    type Error = QueueError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Songs),
            2 => Ok(Self::Albums),
            other => Err(QueueError::invalid_argument(format!(
                "unknown shuffle mode {other}"
            ))),
        }
    }
}

/// What happens when playback reaches the end of the queue
///
/// Only `Stop` changes queue behavior directly (through
/// [`QueueStore::is_end_of_queue`](crate::QueueStore::is_end_of_queue)).
/// `RepeatCurrent` and `StopCurrent` are honored by the playback engine when
/// a track completes naturally; `Random` asks for more tracks to be appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishAction {
    /// Stop playback
    #[default]
    Stop,

    /// Repeat from the beginning
    Repeat,

    /// Repeat the current song
    RepeatCurrent,

    /// Stop after the current song
    StopCurrent,

    /// Append random songs
    Random,
}

impl FinishAction {
    /// Next action in toggle order
    pub fn cycle(self) -> Self {
        match self {
            Self::Stop => Self::Repeat,
            Self::Repeat => Self::RepeatCurrent,
            Self::RepeatCurrent => Self::StopCurrent,
            Self::StopCurrent => Self::Random,
            Self::Random => Self::Stop,
        }
    }

    /// Stable integer code used in persisted state
    pub fn code(self) -> i64 {
        match self {
            Self::Stop => 0,
            Self::Repeat => 1,
            Self::RepeatCurrent => 2,
            Self::StopCurrent => 3,
            Self::Random => 4,
        }
    }
}

impl TryFrom<i64> for FinishAction {
    type Error = QueueError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Stop),
            1 => Ok(Self::Repeat),
            2 => Ok(Self::RepeatCurrent),
            3 => Ok(Self::StopCurrent),
            4 => Ok(Self::Random),
            other => Err(QueueError::invalid_argument(format!(
                "unknown finish action {other}"
            ))),
        }
    }
}

/// How a freshly produced batch is merged into the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Clear the queue and play only the new tracks
    Play,

    /// Drop everything after the current track, then append
    PlayNext,

    /// Append at the end
    Enqueue,

    /// Like `Play`, with the hinted batch position moved to the front
    PlayPosFirst,

    /// Like `Play`, with the first track matching the hinted id moved to the front
    PlayIdFirst,

    /// Like `Enqueue`, with the first track matching the hinted id moved to the front of the batch
    EnqueueIdFirst,

    /// Like `Enqueue`, with the hinted batch position moved to the front of the batch
    EnqueuePosFirst,
}

impl IngestMode {
    /// Whether the queue is cleared before appending
    pub fn replaces_queue(self) -> bool {
        matches!(self, Self::Play | Self::PlayPosFirst | Self::PlayIdFirst)
    }

    pub fn wants_position(self) -> bool {
        matches!(self, Self::PlayPosFirst | Self::EnqueuePosFirst)
    }

    pub fn wants_id(self) -> bool {
        matches!(self, Self::PlayIdFirst | Self::EnqueueIdFirst)
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Play => 0,
            Self::PlayNext => 1,
            Self::Enqueue => 2,
            Self::PlayPosFirst => 3,
            Self::PlayIdFirst => 4,
            Self::EnqueueIdFirst => 5,
            Self::EnqueuePosFirst => 6,
        }
    }
}

impl TryFrom<i64> for IngestMode {
    type Error = QueueError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Play),
            1 => Ok(Self::PlayNext),
            2 => Ok(Self::Enqueue),
            3 => Ok(Self::PlayPosFirst),
            4 => Ok(Self::PlayIdFirst),
            5 => Ok(Self::EnqueueIdFirst),
            6 => Ok(Self::EnqueuePosFirst),
            other => Err(QueueError::InvalidMode(other)),
        }
    }
}

/// Which entry of an ingested batch should play first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IngestHint {
    #[default]
    None,

    /// Position within the produced batch (before any shuffling)
    Position(usize),

    /// First track in the batch with this identity
    Id(TrackIdentity),
}

/// Slot of the active window, relative to the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveOffset {
    Previous,
    Current,
    Next,
}

impl ActiveOffset {
    pub const ALL: [ActiveOffset; 3] = [Self::Previous, Self::Current, Self::Next];

    pub fn delta(self) -> i64 {
        match self {
            Self::Previous => -1,
            Self::Current => 0,
            Self::Next => 1,
        }
    }
}

impl TryFrom<i64> for ActiveOffset {
    type Error = QueueError;

    fn try_from(delta: i64) -> Result<Self, Self::Error> {
        match delta {
            -1 => Ok(Self::Previous),
            0 => Ok(Self::Current),
            1 => Ok(Self::Next),
            other => Err(QueueError::InvalidDelta(other)),
        }
    }
}

/// Direction of a committed cursor move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    pub fn delta(self) -> i64 {
        match self {
            Self::Backward => -1,
            Self::Forward => 1,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = QueueError;

    fn try_from(delta: i64) -> Result<Self, Self::Error> {
        match delta {
            -1 => Ok(Self::Backward),
            1 => Ok(Self::Forward),
            other => Err(QueueError::InvalidDelta(other)),
        }
    }
}

/// Song or album move, as issued by transport buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    PreviousAlbum,
    PreviousSong,
    NextSong,
    NextAlbum,
}

impl TryFrom<i64> for Shift {
    type Error = QueueError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            -2 => Ok(Self::PreviousAlbum),
            -1 => Ok(Self::PreviousSong),
            1 => Ok(Self::NextSong),
            2 => Ok(Self::NextAlbum),
            other => Err(QueueError::InvalidDelta(other)),
        }
    }
}

/// Configuration for a queue store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Shuffle mode for a queue with no persisted state (default: None)
    #[serde(default)]
    pub shuffle: ShuffleMode,

    /// Finish action for a queue with no persisted state (default: Stop)
    #[serde(default)]
    pub finish_action: FinishAction,

    /// Save state after every change (default: true)
    #[serde(default = "default_persist_on_change")]
    pub persist_on_change: bool,
}

fn default_persist_on_change() -> bool {
    true
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            shuffle: ShuffleMode::default(),
            finish_action: FinishAction::default(),
            persist_on_change: default_persist_on_change(),
        }
    }
}
