//! Queue state machine
//!
//! [`Timeline`] owns the track sequence, the cursor, the shuffle and finish
//! settings and the cached wrap-around permutation. It is plain data driven
//! through `&mut self`; locking and notification live in
//! [`QueueStore`](crate::QueueStore).

use crate::error::{QueueError, Result};
use crate::events::ActiveWindow;
use crate::persistence::QueueSnapshot;
use crate::shuffle::{shuffle, shuffle_in_place};
use crate::track::{Track, TrackIdentity};
use crate::types::{ActiveOffset, Direction, FinishAction, IngestHint, IngestMode, ShuffleMode};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;

pub(crate) struct Timeline {
    tracks: Vec<Arc<Track>>,
    cursor: usize,
    shuffle_mode: ShuffleMode,
    finish_action: FinishAction,

    /// Full shuffled order used when playback wraps past the end.
    /// Only valid for the current `tracks` and `shuffle_mode`.
    shuffle_cache: Option<Vec<Arc<Track>>>,

    rng: StdRng,
}

impl Timeline {
    pub fn new(shuffle_mode: ShuffleMode, finish_action: FinishAction, rng: StdRng) -> Self {
        Self {
            tracks: Vec::new(),
            cursor: 0,
            shuffle_mode,
            finish_action,
            shuffle_cache: None,
            rng,
        }
    }

    pub fn set_rng(&mut self, rng: StdRng) {
        self.rng = rng;
    }

    /// Every write to the sequence goes through here, which drops the cached
    /// permutation exactly once per structural change.
    fn restructure<R>(&mut self, f: impl FnOnce(&mut Vec<Arc<Track>>, &mut StdRng) -> R) -> R {
        self.shuffle_cache = None;
        f(&mut self.tracks, &mut self.rng)
    }

    fn groups_albums(&self) -> bool {
        self.shuffle_mode == ShuffleMode::Albums
    }

    /// Cached wrap-around order, computed on first use
    fn shuffled_order(&mut self) -> Result<&[Arc<Track>]> {
        if self.shuffle_cache.is_none() {
            let order = shuffle(&self.tracks, self.groups_albums(), &mut self.rng)?;
            self.shuffle_cache = Some(order);
        }
        Ok(self.shuffle_cache.as_deref().unwrap_or_default())
    }

    fn take_shuffled_order(&mut self) -> Result<Vec<Arc<Track>>> {
        match self.shuffle_cache.take() {
            Some(order) => Ok(order),
            None => shuffle(&self.tracks, self.groups_albums(), &mut self.rng),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.shuffle_mode
    }

    pub fn finish_action(&self) -> FinishAction {
        self.finish_action
    }

    pub fn get(&self, index: usize) -> Option<Arc<Track>> {
        self.tracks.get(index).cloned()
    }

    pub fn current(&self) -> Option<Arc<Track>> {
        self.get(self.cursor)
    }

    /// Track `offset` places from the cursor, without committing a move
    ///
    /// Looking back from the first track wraps to the last one. Looking one
    /// past the end previews what a wrap would deliver: the first track of
    /// the (cached) shuffled order when shuffling, the first track otherwise.
    pub fn get_relative(&mut self, offset: ActiveOffset) -> Option<Arc<Track>> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }

        let pos = self.cursor as i64 + offset.delta();
        if pos < 0 {
            self.tracks.last().cloned()
        } else if pos as usize > len {
            None
        } else if pos as usize == len {
            if self.shuffle_mode.is_shuffling() {
                self.shuffled_order()
                    .ok()
                    .and_then(|order| order.first().cloned())
            } else {
                self.tracks.first().cloned()
            }
        } else {
            self.tracks.get(pos as usize).cloned()
        }
    }

    pub fn window(&mut self) -> ActiveWindow {
        ActiveWindow {
            previous: self.get_relative(ActiveOffset::Previous),
            current: self.get_relative(ActiveOffset::Current),
            next: self.get_relative(ActiveOffset::Next),
            cursor: self.cursor,
            len: self.tracks.len(),
        }
    }

    /// Commit a one-track move
    ///
    /// Running off the end wraps to the start, first replacing the sequence
    /// with the shuffled order when shuffling. Moving back from the start
    /// wraps to the last track. Stopping at the end is decided by the
    /// playback layer through [`Timeline::is_end_of_queue`].
    pub fn advance(&mut self, direction: Direction) -> Result<()> {
        // A move consumes the wrap preview, whether or not it wraps
        let cached = self.shuffle_cache.take();

        let len = self.tracks.len();
        if len == 0 {
            self.cursor = 0;
            return Ok(());
        }

        let pos = self.cursor as i64 + direction.delta();
        self.cursor = if pos == len as i64 {
            if self.shuffle_mode.is_shuffling() {
                let order = match cached {
                    Some(order) => order,
                    None => shuffle(&self.tracks, self.groups_albums(), &mut self.rng)?,
                };
                self.restructure(|tracks, _| *tracks = order);
            }
            0
        } else if pos < 0 {
            len - 1
        } else {
            pos as usize
        };

        Ok(())
    }

    /// Move until the album changes, or until the starting track comes back
    /// around (single-album queue)
    pub fn advance_by_album(&mut self, direction: Direction) -> Result<()> {
        let Some(start) = self.current() else {
            return Ok(());
        };

        loop {
            self.advance(direction)?;
            let Some(now) = self.current() else {
                return Ok(());
            };
            if now.album_id != start.album_id || now.same_identity(&start) {
                return Ok(());
            }
        }
    }

    /// Hard jump to an absolute position
    pub fn set_position(&mut self, index: usize) -> Result<()> {
        let len = self.tracks.len();
        if index >= len {
            return Err(QueueError::IndexOutOfBounds { index, len });
        }
        self.cursor = index;
        Ok(())
    }

    /// Merge a produced batch into the queue
    ///
    /// Returns the number of ingested tracks. The hint must match the mode:
    /// a position for `*PosFirst`, an id for `*IdFirst`, nothing otherwise.
    pub fn ingest(&mut self, batch: Vec<Track>, mode: IngestMode, hint: &IngestHint) -> Result<usize> {
        match hint {
            IngestHint::Position(_) if !mode.wants_position() => {
                return Err(QueueError::invalid_argument(format!(
                    "position hint given for {mode:?}"
                )));
            }
            IngestHint::Id(_) if !mode.wants_id() => {
                return Err(QueueError::invalid_argument(format!(
                    "id hint given for {mode:?}"
                )));
            }
            _ => {}
        }

        let count = batch.len();
        if count == 0 {
            return Ok(0);
        }

        let batch: Vec<Arc<Track>> = batch.into_iter().map(Arc::new).collect();
        let jump = match hint {
            IngestHint::None => None,
            IngestHint::Position(pos) => batch.get(*pos).cloned(),
            IngestHint::Id(id) => batch.iter().find(|t| t.matches(id)).cloned(),
        };

        let cursor = self.cursor;
        if mode.replaces_queue() {
            self.cursor = 0;
        }
        let shuffle_block = self.shuffle_mode.is_shuffling().then(|| self.groups_albums());

        self.restructure(|tracks, rng| {
            if mode.replaces_queue() {
                tracks.clear();
            } else if mode == IngestMode::PlayNext {
                tracks.truncate(cursor + 1);
            }

            let start = tracks.len();
            tracks.extend(batch);

            if let Some(group_by_album) = shuffle_block {
                shuffle_in_place(&mut tracks[start..], group_by_album, rng);
            }

            if let Some(jump) = jump {
                if let Some(offset) = tracks[start..].iter().position(|t| Arc::ptr_eq(t, &jump)) {
                    let entry = tracks.remove(start + offset);
                    tracks.insert(start, entry);
                }
            }
        });

        Ok(count)
    }

    /// Remove every entry with the given identity
    ///
    /// Entries removed before the cursor shift it back so it keeps pointing
    /// at the same track. If the current track itself is removed the cursor
    /// keeps its index (clamped to the new length) and now refers to the
    /// track that moved into that slot.
    pub fn remove(&mut self, identity: &TrackIdentity) -> usize {
        if !self.tracks.iter().any(|t| t.matches(identity)) {
            return 0;
        }

        let cursor = self.cursor;
        let mut new_cursor = cursor;
        let mut removed = 0;

        self.restructure(|tracks, _| {
            let mut index = 0;
            tracks.retain(|t| {
                let keep = !t.matches(identity);
                if !keep {
                    removed += 1;
                    if index < cursor {
                        new_cursor -= 1;
                    }
                }
                index += 1;
                keep
            });
        });

        self.cursor = new_cursor.min(self.tracks.len().saturating_sub(1));
        removed
    }

    /// Drop everything after the cursor, and with `reset_to_zero` everything
    /// before it too
    pub fn truncate_forward(&mut self, reset_to_zero: bool) {
        if self.tracks.is_empty() {
            return;
        }

        let cursor = self.cursor;
        self.restructure(|tracks, _| {
            tracks.truncate(cursor + 1);
            if reset_to_zero {
                tracks.drain(..cursor);
            }
        });
        if reset_to_zero {
            self.cursor = 0;
        }
    }

    /// Put the current track first and every other track after it in random
    /// order. Returns false (and changes nothing) with fewer than two other
    /// tracks.
    pub fn shuffle_remainder(&mut self) -> bool {
        if self.tracks.len() < 3 {
            return false;
        }

        let cursor = self.cursor;
        self.restructure(|tracks, rng| {
            let current = tracks.remove(cursor);
            let mut rest: Vec<Arc<Track>> = tracks.drain(cursor..).collect();
            rest.append(tracks);
            rest.shuffle(rng);

            tracks.push(current);
            tracks.append(&mut rest);
        });
        self.cursor = 0;
        true
    }

    /// Change the shuffle mode; returns false if it was already set
    ///
    /// Turning shuffle on (outside of random-fill mode) reshuffles the whole
    /// queue and moves the cursor to wherever the current entry landed, so
    /// the playing track is not interrupted.
    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) -> Result<bool> {
        if mode == self.shuffle_mode {
            return Ok(false);
        }

        self.shuffle_cache = None;
        self.shuffle_mode = mode;

        if mode.is_shuffling() && self.finish_action != FinishAction::Random && !self.tracks.is_empty() {
            let current = self.current();
            let order = self.take_shuffled_order()?;
            let cursor = current
                .and_then(|current| order.iter().position(|t| Arc::ptr_eq(t, &current)))
                .unwrap_or(0);
            self.restructure(|tracks, _| *tracks = order);
            self.cursor = cursor;
        }

        Ok(true)
    }

    pub fn set_finish_action(&mut self, action: FinishAction) {
        self.finish_action = action;
    }

    /// Whether playback should stop after the current track
    pub fn is_end_of_queue(&self) -> bool {
        self.finish_action == FinishAction::Stop
            && !self.tracks.is_empty()
            && self.cursor == self.tracks.len() - 1
    }

    /// Whether random-fill mode wants more tracks appended
    pub fn wants_random_fill(&self) -> bool {
        self.finish_action == FinishAction::Random && self.cursor + 1 >= self.tracks.len()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            tracks: self.tracks.clone(),
            cursor: self.cursor,
            shuffle_mode: self.shuffle_mode,
            finish_action: self.finish_action,
        }
    }

    /// Replace the whole state, clamping the cursor into range
    pub fn restore(&mut self, snapshot: QueueSnapshot) {
        let QueueSnapshot {
            tracks,
            cursor,
            shuffle_mode,
            finish_action,
        } = snapshot;

        self.shuffle_mode = shuffle_mode;
        self.finish_action = finish_action;
        self.cursor = cursor.min(tracks.len().saturating_sub(1));
        self.restructure(|current, _| *current = tracks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn track(id: i64, album_id: i64) -> Track {
        Track::local(id, format!("/music/{}.mp3", id), format!("Track {}", id))
            .in_album(album_id, format!("Album {}", album_id))
    }

    fn timeline_with(tracks: &[(i64, i64)]) -> Timeline {
        let mut timeline = Timeline::new(
            ShuffleMode::None,
            FinishAction::Stop,
            StdRng::seed_from_u64(17),
        );
        let batch = tracks.iter().map(|&(id, album)| track(id, album)).collect();
        timeline
            .ingest(batch, IngestMode::Enqueue, &IngestHint::None)
            .unwrap();
        timeline
    }

    fn ids(timeline: &Timeline) -> Vec<i64> {
        timeline
            .tracks
            .iter()
            .filter_map(|t| t.identity.local_id())
            .collect()
    }

    fn current_id(timeline: &Timeline) -> Option<i64> {
        timeline.current().and_then(|t| t.identity.local_id())
    }

    #[test]
    fn relative_lookups_wrap_for_display() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1), (3, 2)]);

        let prev = timeline.get_relative(ActiveOffset::Previous).unwrap();
        assert_eq!(prev.identity.local_id(), Some(3));

        timeline.set_position(2).unwrap();
        let next = timeline.get_relative(ActiveOffset::Next).unwrap();
        assert_eq!(next.identity.local_id(), Some(1));
    }

    #[test]
    fn relative_lookups_on_empty_queue_are_none() {
        let mut timeline = timeline_with(&[]);
        for offset in ActiveOffset::ALL {
            assert!(timeline.get_relative(offset).is_none());
        }
    }

    #[test]
    fn shuffled_wrap_preview_matches_committed_wrap() {
        let mut timeline = timeline_with(&[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]);
        timeline.shuffle_mode = ShuffleMode::Songs;
        timeline.cursor = 4;

        let preview = timeline.get_relative(ActiveOffset::Next).unwrap();
        timeline.advance(Direction::Forward).unwrap();

        assert_eq!(timeline.cursor(), 0);
        assert!(Arc::ptr_eq(&timeline.current().unwrap(), &preview));
        assert!(timeline.shuffle_cache.is_none());
    }

    #[test]
    fn advance_backward_from_start_wraps_to_last() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1), (3, 1)]);
        timeline.advance(Direction::Backward).unwrap();
        assert_eq!(timeline.cursor(), 2);
    }

    #[test]
    fn advance_forward_off_end_wraps_without_shuffle() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1)]);
        timeline.set_position(1).unwrap();
        timeline.advance(Direction::Forward).unwrap();
        assert_eq!(timeline.cursor(), 0);
        assert_eq!(ids(&timeline), vec![1, 2]);
    }

    #[test]
    fn advance_on_empty_queue_keeps_cursor_at_zero() {
        let mut timeline = timeline_with(&[]);
        timeline.advance(Direction::Forward).unwrap();
        timeline.advance(Direction::Backward).unwrap();
        assert_eq!(timeline.cursor(), 0);
    }

    #[test]
    fn album_advance_stops_on_single_album_queue() {
        let mut timeline = timeline_with(&[(1, 7), (2, 7), (3, 7)]);
        timeline.set_position(1).unwrap();
        timeline.advance_by_album(Direction::Forward).unwrap();
        assert_eq!(current_id(&timeline), Some(2));
    }

    #[test]
    fn album_advance_backward() {
        let mut timeline = timeline_with(&[(1, 1), (2, 2), (3, 2)]);
        timeline.set_position(2).unwrap();
        timeline.advance_by_album(Direction::Backward).unwrap();
        assert_eq!(current_id(&timeline), Some(1));
    }

    #[test]
    fn set_position_rejects_out_of_range() {
        let mut timeline = timeline_with(&[(1, 1)]);
        assert!(matches!(
            timeline.set_position(1),
            Err(QueueError::IndexOutOfBounds { index: 1, len: 1 })
        ));
    }

    #[test]
    fn play_next_truncates_after_cursor() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1), (3, 1), (4, 1)]);
        timeline.set_position(1).unwrap();

        let count = timeline
            .ingest(vec![track(9, 9)], IngestMode::PlayNext, &IngestHint::None)
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(ids(&timeline), vec![1, 2, 9]);
        assert_eq!(timeline.cursor(), 1);
    }

    #[test]
    fn play_replaces_queue_and_resets_cursor() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1)]);
        timeline.set_position(1).unwrap();

        timeline
            .ingest(vec![track(5, 1), track(6, 1)], IngestMode::Play, &IngestHint::None)
            .unwrap();

        assert_eq!(ids(&timeline), vec![5, 6]);
        assert_eq!(timeline.cursor(), 0);
    }

    #[test]
    fn enqueue_id_first_moves_match_to_front_of_block() {
        let mut timeline = timeline_with(&[(1, 1)]);
        timeline
            .ingest(
                vec![track(5, 1), track(6, 1), track(7, 1), track(6, 1)],
                IngestMode::EnqueueIdFirst,
                &IngestHint::Id(TrackIdentity::Local(6)),
            )
            .unwrap();

        assert_eq!(ids(&timeline), vec![1, 6, 5, 7, 6]);
    }

    #[test]
    fn unresolved_hint_leaves_block_in_order() {
        let mut timeline = timeline_with(&[]);
        timeline
            .ingest(
                vec![track(5, 1), track(6, 1)],
                IngestMode::PlayPosFirst,
                &IngestHint::Position(10),
            )
            .unwrap();
        assert_eq!(ids(&timeline), vec![5, 6]);
    }

    #[test]
    fn mismatched_hint_is_rejected_without_mutation() {
        let mut timeline = timeline_with(&[(1, 1)]);
        let result = timeline.ingest(
            vec![track(5, 1)],
            IngestMode::Enqueue,
            &IngestHint::Position(0),
        );
        assert!(matches!(result, Err(QueueError::InvalidArgument(_))));
        assert_eq!(ids(&timeline), vec![1]);

        let result = timeline.ingest(
            vec![track(5, 1)],
            IngestMode::PlayPosFirst,
            &IngestHint::Id(TrackIdentity::Local(5)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn shuffled_ingest_only_touches_new_block() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1), (3, 1)]);
        timeline.shuffle_mode = ShuffleMode::Songs;

        let batch = (10..20).map(|id| track(id, id)).collect();
        timeline
            .ingest(batch, IngestMode::EnqueuePosFirst, &IngestHint::Position(4))
            .unwrap();

        let ids = ids(&timeline);
        assert_eq!(&ids[..3], &[1, 2, 3]);
        assert_eq!(ids[3], 14);
        let mut block = ids[3..].to_vec();
        block.sort_unstable();
        assert_eq!(block, (10..20).collect::<Vec<_>>());
    }

    #[test]
    fn remove_every_matching_entry() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1), (3, 1), (2, 1), (4, 1)]);
        timeline.set_position(4).unwrap();

        let removed = timeline.remove(&TrackIdentity::Local(2));

        assert_eq!(removed, 2);
        assert_eq!(ids(&timeline), vec![1, 3, 4]);
        assert_eq!(current_id(&timeline), Some(4));
    }

    #[test]
    fn removing_current_keeps_index() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1), (3, 1)]);
        timeline.set_position(1).unwrap();

        timeline.remove(&TrackIdentity::Local(2));
        assert_eq!(timeline.cursor(), 1);
        assert_eq!(current_id(&timeline), Some(3));
    }

    #[test]
    fn removing_current_last_track_clamps_cursor() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1), (3, 1)]);
        timeline.set_position(2).unwrap();

        timeline.remove(&TrackIdentity::Local(3));
        assert_eq!(timeline.cursor(), 1);

        timeline.remove(&TrackIdentity::Local(1));
        timeline.remove(&TrackIdentity::Local(2));
        assert_eq!(timeline.len(), 0);
        assert_eq!(timeline.cursor(), 0);
    }

    #[test]
    fn remove_missing_id_changes_nothing() {
        let mut timeline = timeline_with(&[(1, 1)]);
        assert_eq!(timeline.remove(&TrackIdentity::Remote("/x".into())), 0);
        assert_eq!(ids(&timeline), vec![1]);
    }

    #[test]
    fn truncate_forward_variants() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1), (3, 1), (4, 1)]);
        timeline.set_position(1).unwrap();
        timeline.truncate_forward(false);
        assert_eq!(ids(&timeline), vec![1, 2]);
        assert_eq!(timeline.cursor(), 1);

        timeline.truncate_forward(true);
        assert_eq!(ids(&timeline), vec![2]);
        assert_eq!(timeline.cursor(), 0);
    }

    #[test]
    fn shuffle_remainder_puts_current_first() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1), (3, 1), (4, 1), (5, 1)]);
        timeline.set_position(2).unwrap();

        assert!(timeline.shuffle_remainder());

        assert_eq!(timeline.cursor(), 0);
        assert_eq!(current_id(&timeline), Some(3));
        let mut all = ids(&timeline);
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn shuffle_remainder_needs_two_other_tracks() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1)]);
        timeline.set_position(1).unwrap();
        assert!(!timeline.shuffle_remainder());
        assert_eq!(ids(&timeline), vec![1, 2]);
        assert_eq!(timeline.cursor(), 1);
    }

    #[test]
    fn enabling_shuffle_keeps_current_entry() {
        let mut timeline = timeline_with(&[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6)]);
        timeline.set_position(3).unwrap();
        let before = timeline.current().unwrap();

        assert!(timeline.set_shuffle_mode(ShuffleMode::Albums).unwrap());

        assert!(Arc::ptr_eq(&timeline.current().unwrap(), &before));
        assert!(!timeline.set_shuffle_mode(ShuffleMode::Albums).unwrap());
    }

    #[test]
    fn enabling_shuffle_in_random_fill_mode_keeps_order() {
        let mut timeline = timeline_with(&[(1, 1), (2, 2), (3, 3), (4, 4)]);
        timeline.set_finish_action(FinishAction::Random);

        timeline.set_shuffle_mode(ShuffleMode::Songs).unwrap();
        assert_eq!(ids(&timeline), vec![1, 2, 3, 4]);
    }

    #[test]
    fn end_of_queue_only_when_stopping_on_last_track() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1)]);
        assert!(!timeline.is_end_of_queue());

        timeline.set_position(1).unwrap();
        assert!(timeline.is_end_of_queue());

        timeline.set_finish_action(FinishAction::Repeat);
        assert!(!timeline.is_end_of_queue());

        assert!(!timeline_with(&[]).is_end_of_queue());
    }

    #[test]
    fn random_fill_wanted_on_last_track() {
        let mut timeline = timeline_with(&[(1, 1), (2, 1)]);
        timeline.set_finish_action(FinishAction::Random);
        assert!(!timeline.wants_random_fill());
        timeline.set_position(1).unwrap();
        assert!(timeline.wants_random_fill());
    }

    #[test]
    fn restore_clamps_cursor() {
        let mut timeline = timeline_with(&[]);
        timeline.restore(QueueSnapshot {
            tracks: vec![Arc::new(track(1, 1)), Arc::new(track(2, 1))],
            cursor: 9,
            shuffle_mode: ShuffleMode::Songs,
            finish_action: FinishAction::Repeat,
        });

        assert_eq!(timeline.cursor(), 1);
        assert_eq!(timeline.shuffle_mode(), ShuffleMode::Songs);
        assert_eq!(timeline.finish_action(), FinishAction::Repeat);
    }
}
