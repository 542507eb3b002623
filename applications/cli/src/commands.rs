//! Queue commands
//!
//! Each command maps onto one queue operation. Output goes to stdout; queue
//! changes are persisted by the queue itself.

use crate::error::{CliError, Result};
use crate::library::LibraryProducer;
use cadenza_queue::{
    fill_random, run_query, Direction, FinishAction, IngestHint, IngestMode, QueryTask,
    QueueSnapshot, QueueStore, Selection, Shift, ShuffleMode, TrackIdentity,
};
use clap::{Subcommand, ValueEnum};
use std::fmt::Write;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the queue
    Show,
    /// Skip to the next track
    Next,
    /// Go back to the previous track
    Prev,
    /// Skip to the first track of the next album
    NextAlbum,
    /// Go back to the previous album
    PrevAlbum,
    /// Jump to a queue position (0-based)
    Jump { index: usize },
    /// Set the shuffle mode, or cycle it when no mode is given
    Shuffle {
        #[arg(value_enum)]
        mode: Option<ShuffleArg>,
    },
    /// Set the finish action, or cycle it when no action is given
    Finish {
        #[arg(value_enum)]
        action: Option<FinishArg>,
    },
    /// Add library tracks matching a query
    Add {
        /// Text matched against title, artist and album
        query: String,
        /// How the tracks are merged into the queue
        #[arg(short, long, value_enum, default_value_t = AddMode::Enqueue)]
        mode: AddMode,
        /// Start with the match at this position
        #[arg(long, conflicts_with = "id")]
        pos: Option<usize>,
        /// Start with the match with this id (number for local, path for remote)
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove every entry of a track (number for local, path for remote)
    Remove { id: String },
    /// Drop everything after the current track
    Clear {
        /// Also drop everything before it
        #[arg(long)]
        all: bool,
    },
    /// Shuffle everything except the current track, which moves to the top
    ShuffleRest,
    /// Append random tracks if the finish action asks for them
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShuffleArg {
    None,
    Songs,
    Albums,
}

impl From<ShuffleArg> for ShuffleMode {
    fn from(arg: ShuffleArg) -> Self {
        match arg {
            ShuffleArg::None => ShuffleMode::None,
            ShuffleArg::Songs => ShuffleMode::Songs,
            ShuffleArg::Albums => ShuffleMode::Albums,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FinishArg {
    Stop,
    Repeat,
    RepeatCurrent,
    StopCurrent,
    Random,
}

impl From<FinishArg> for FinishAction {
    fn from(arg: FinishArg) -> Self {
        match arg {
            FinishArg::Stop => FinishAction::Stop,
            FinishArg::Repeat => FinishAction::Repeat,
            FinishArg::RepeatCurrent => FinishAction::RepeatCurrent,
            FinishArg::StopCurrent => FinishAction::StopCurrent,
            FinishArg::Random => FinishAction::Random,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AddMode {
    Play,
    PlayNext,
    Enqueue,
}

/// Parse a track id as given on the command line
pub fn parse_identity(raw: &str) -> TrackIdentity {
    raw.parse::<i64>()
        .map_or_else(|_| TrackIdentity::Remote(raw.to_string()), TrackIdentity::Local)
}

/// Combine the add mode with the start-with hint
pub fn ingest_mode(mode: AddMode, hint: &IngestHint) -> Result<IngestMode> {
    match (mode, hint) {
        (AddMode::Play, IngestHint::None) => Ok(IngestMode::Play),
        (AddMode::Play, IngestHint::Position(_)) => Ok(IngestMode::PlayPosFirst),
        (AddMode::Play, IngestHint::Id(_)) => Ok(IngestMode::PlayIdFirst),
        (AddMode::Enqueue, IngestHint::None) => Ok(IngestMode::Enqueue),
        (AddMode::Enqueue, IngestHint::Position(_)) => Ok(IngestMode::EnqueuePosFirst),
        (AddMode::Enqueue, IngestHint::Id(_)) => Ok(IngestMode::EnqueueIdFirst),
        (AddMode::PlayNext, IngestHint::None) => Ok(IngestMode::PlayNext),
        (AddMode::PlayNext, _) => Err(CliError::InvalidCommand(
            "--pos and --id cannot be used with play-next".to_string(),
        )),
    }
}

/// Human-readable queue listing
pub fn render(snapshot: &QueueSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "shuffle: {:?}, finish: {:?}, {} tracks",
        snapshot.shuffle_mode,
        snapshot.finish_action,
        snapshot.len()
    );

    for (index, track) in snapshot.tracks.iter().enumerate() {
        let marker = if index == snapshot.cursor { '>' } else { ' ' };
        let _ = write!(out, "{marker} {index:>3}  {}", track.title);
        if !track.artist.is_empty() {
            let _ = write!(out, " - {}", track.artist);
        }
        let _ = writeln!(out, "  [{}]", track.identity);
    }

    out
}

/// Apply `command` to the queue
pub async fn run(queue: &QueueStore, library: &LibraryProducer, command: Command) -> Result<()> {
    match command {
        Command::Show => {
            print!("{}", render(&queue.snapshot()));
            return Ok(());
        }
        Command::Next => {
            queue.shift(Shift::NextSong)?;
        }
        Command::Prev => {
            queue.shift(Shift::PreviousSong)?;
        }
        Command::NextAlbum => {
            queue.shift(Shift::NextAlbum)?;
        }
        Command::PrevAlbum => {
            queue.shift(Shift::PreviousAlbum)?;
        }
        Command::Jump { index } => {
            queue.set_position(index)?;
        }
        Command::Shuffle { mode } => {
            let mode = mode.map_or_else(|| queue.shuffle_mode().cycle(), ShuffleMode::from);
            queue.set_shuffle_mode(mode)?;
        }
        Command::Finish { action } => {
            let action = action.map_or_else(|| queue.finish_action().cycle(), FinishAction::from);
            queue.set_finish_action(action);
        }
        Command::Add {
            query,
            mode,
            pos,
            id,
        } => {
            let hint = match (pos, id) {
                (Some(pos), _) => IngestHint::Position(pos),
                (None, Some(id)) => IngestHint::Id(parse_identity(&id)),
                (None, None) => IngestHint::None,
            };
            let mode = ingest_mode(mode, &hint)?;
            let task = QueryTask::new(Selection::Query(query), mode).with_hint(hint);

            let added = run_query(queue, library, task).await?;
            println!("Added {added} tracks");
        }
        Command::Remove { id } => {
            let removed = queue.remove(&parse_identity(&id));
            println!("Removed {removed} entries");
        }
        Command::Clear { all } => {
            queue.truncate_queue_forward(all);
        }
        Command::ShuffleRest => {
            queue.shuffle_remainder();
        }
        Command::Fill => {
            let added = fill_random(queue, library).await?;
            println!("Added {added} random tracks");
        }
    }

    if let Some(current) = queue.current() {
        println!("Now at {}: {}", queue.position(), current.title);
    }
    if queue.is_end_of_queue() {
        println!("End of queue");
    }
    Ok(())
}
