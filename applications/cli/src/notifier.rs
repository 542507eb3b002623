//! Change notifier that writes to the log

use cadenza_queue::{ActiveOffset, ChangeNotifier, Track};
use std::sync::Arc;

/// Logs every queue callback at `info` level
#[derive(Debug, Default)]
pub struct LogNotifier;

impl ChangeNotifier for LogNotifier {
    fn active_song_replaced(&self, offset: ActiveOffset, track: Option<Arc<Track>>) {
        match track {
            Some(track) => tracing::info!(?offset, id = %track.identity, title = %track.title, "Active song replaced"),
            None => tracing::info!(?offset, "Active song cleared"),
        }
    }

    fn timeline_changed(&self) {
        tracing::debug!("Timeline changed");
    }

    fn position_info_changed(&self) {
        tracing::debug!("Position info changed");
    }
}
