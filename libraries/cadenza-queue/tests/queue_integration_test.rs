//! Integration tests for queue navigation, ingestion and notifications
//!
//! Exercises `QueueStore` through its public API only, the way a player or
//! UI would drive it.

use cadenza_queue::{
    ActiveOffset, Direction, EventCollector, FinishAction, IngestHint, IngestMode, QueueConfig,
    QueueEvent, QueueStore, Shift, ShuffleMode, Track, TrackIdentity,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::thread;

// ===== Helpers =====

fn song(id: i64, album_id: i64) -> Track {
    Track::local(id, format!("/music/{}.flac", id), format!("Song {}", id))
        .in_album(album_id, format!("Album {}", album_id))
}

fn queue_with(tracks: Vec<Track>) -> (QueueStore, Arc<EventCollector>) {
    let events = Arc::new(EventCollector::new());
    let queue = QueueStore::new(QueueConfig::default())
        .with_notifier(events.clone())
        .with_rng(StdRng::seed_from_u64(1234));
    queue
        .ingest(tracks, IngestMode::Play, IngestHint::None)
        .unwrap();
    events.drain_events();
    (queue, events)
}

fn ids(queue: &QueueStore) -> Vec<i64> {
    queue
        .snapshot()
        .tracks
        .iter()
        .filter_map(|t| t.identity.local_id())
        .collect()
}

fn current_id(queue: &QueueStore) -> Option<i64> {
    queue.current().and_then(|t| t.identity.local_id())
}

fn replaced_offsets(events: &[QueueEvent]) -> Vec<ActiveOffset> {
    events
        .iter()
        .filter_map(|e| match e {
            QueueEvent::ActiveSongReplaced { offset, .. } => Some(*offset),
            _ => None,
        })
        .collect()
}

// ===== Navigation =====

#[test]
fn advancing_to_last_track_reaches_end_of_queue() {
    let (queue, _events) = queue_with(vec![song(1, 1), song(2, 1), song(3, 2)]);
    assert_eq!(queue.finish_action(), FinishAction::Stop);

    queue.advance(Direction::Forward).unwrap();
    let current = queue.advance(Direction::Forward).unwrap();

    assert_eq!(queue.position(), 2);
    assert_eq!(current.unwrap().identity, TrackIdentity::Local(3));
    assert!(queue.is_end_of_queue());
}

#[test]
fn album_advance_skips_rest_of_album() {
    let (queue, _events) = queue_with(vec![song(1, 1), song(2, 1), song(3, 2)]);

    queue.advance_by_album(Direction::Forward).unwrap();

    assert_eq!(queue.position(), 2);
    assert_eq!(current_id(&queue), Some(3));
}

#[test]
fn advance_notifies_every_slot_that_moved() {
    let (queue, events) = queue_with(vec![song(1, 1), song(2, 1), song(3, 1), song(4, 1)]);

    queue.advance(Direction::Forward).unwrap();

    let events = events.drain_events();
    assert_eq!(
        replaced_offsets(&events),
        vec![ActiveOffset::Previous, ActiveOffset::Current, ActiveOffset::Next]
    );
    assert!(events.contains(&QueueEvent::PositionInfoChanged));
    assert_eq!(events.last(), Some(&QueueEvent::TimelineChanged));
}

#[test]
fn repeat_wraps_to_start() {
    let (queue, _events) = queue_with(vec![song(1, 1), song(2, 1)]);
    queue.set_finish_action(FinishAction::Repeat);
    queue.set_position(1).unwrap();
    assert!(!queue.is_end_of_queue());

    queue.shift(Shift::NextSong).unwrap();
    assert_eq!(queue.position(), 0);
    assert_eq!(ids(&queue), vec![1, 2]);
}

#[test]
fn shuffled_wrap_delivers_previewed_track() {
    let tracks = (1..=8).map(|id| song(id, id)).collect();
    let (queue, _events) = queue_with(tracks);
    queue.set_finish_action(FinishAction::Repeat);
    queue.set_shuffle_mode(ShuffleMode::Songs).unwrap();

    let last = queue.len() - 1;
    queue.set_position(last).unwrap();
    let preview = queue.get_relative(ActiveOffset::Next).unwrap();

    let next = queue.advance(Direction::Forward).unwrap().unwrap();

    assert_eq!(queue.position(), 0);
    assert!(Arc::ptr_eq(&preview, &next));
    assert_eq!(queue.len(), 8);
}

// ===== Ingestion =====

#[test]
fn play_position_first_moves_hinted_track_to_front() {
    let queue = QueueStore::new(QueueConfig::default());

    queue
        .ingest(
            vec![song(1, 1), song(2, 1), song(3, 1)],
            IngestMode::PlayPosFirst,
            IngestHint::Position(1),
        )
        .unwrap();

    assert_eq!(ids(&queue), vec![2, 1, 3]);
    assert_eq!(queue.position(), 0);
}

#[test]
fn play_next_replaces_everything_after_current() {
    let (queue, _events) = queue_with(vec![song(1, 1), song(2, 1), song(3, 1)]);

    queue
        .ingest(vec![song(8, 2), song(9, 2)], IngestMode::PlayNext, IngestHint::None)
        .unwrap();

    assert_eq!(ids(&queue), vec![1, 8, 9]);
    assert_eq!(queue.position(), 0);
}

#[test]
fn play_next_on_empty_queue_starts_it() {
    let queue = QueueStore::new(QueueConfig::default());
    queue
        .ingest(vec![song(1, 1)], IngestMode::PlayNext, IngestHint::None)
        .unwrap();
    assert_eq!(ids(&queue), vec![1]);
    assert_eq!(queue.position(), 0);
}

#[test]
fn enqueue_keeps_current_window_slots() {
    let (queue, events) = queue_with(vec![song(1, 1), song(2, 1), song(3, 1)]);
    queue.set_position(1).unwrap();
    events.drain_events();

    queue
        .ingest(vec![song(4, 1)], IngestMode::Enqueue, IngestHint::None)
        .unwrap();

    let events = events.drain_events();
    assert!(replaced_offsets(&events).is_empty());
    assert_eq!(
        events,
        vec![QueueEvent::PositionInfoChanged, QueueEvent::TimelineChanged]
    );
}

#[test]
fn duplicate_media_is_kept() {
    let (queue, _events) = queue_with(vec![song(1, 1)]);
    queue
        .ingest(vec![song(1, 1), song(1, 1)], IngestMode::Enqueue, IngestHint::None)
        .unwrap();
    assert_eq!(ids(&queue), vec![1, 1, 1]);
}

#[test]
fn remote_tracks_mix_with_local_ones() {
    let (queue, _events) = queue_with(vec![song(1, 1)]);
    queue
        .ingest(
            vec![
                Track::remote("/Music/a.mp3", "https://dl/a", "A"),
                Track::remote("/Music/b.mp3", "https://dl/b", "B"),
            ],
            IngestMode::EnqueueIdFirst,
            IngestHint::Id(TrackIdentity::Remote("/Music/b.mp3".into())),
        )
        .unwrap();

    let second = queue.get(1).unwrap();
    assert_eq!(second.identity.remote_path(), Some("/Music/b.mp3"));

    assert_eq!(queue.remove(&TrackIdentity::Remote("/Music/a.mp3".into())), 1);
    assert_eq!(queue.len(), 2);
}

// ===== Removal and truncation =====

#[test]
fn removal_before_cursor_keeps_current_track() {
    let (queue, _events) = queue_with(vec![song(1, 1), song(2, 1), song(3, 1)]);
    queue.set_position(2).unwrap();

    queue.remove(&TrackIdentity::Local(2));

    assert_eq!(ids(&queue), vec![1, 3]);
    assert_eq!(queue.position(), 1);
    assert_eq!(current_id(&queue), Some(3));
}

#[test]
fn removing_unknown_track_still_notifies_timeline() {
    let (queue, events) = queue_with(vec![song(1, 1)]);
    assert_eq!(queue.remove(&TrackIdentity::Local(99)), 0);
    assert_eq!(ids(&queue), vec![1]);
    assert_eq!(events.drain_events(), vec![QueueEvent::TimelineChanged]);
}

#[test]
fn clearing_with_reset_leaves_only_current() {
    let (queue, _events) = queue_with((1..=5).map(|id| song(id, 1)).collect());
    queue.set_position(3).unwrap();

    queue.truncate_queue_forward(true);

    assert_eq!(ids(&queue), vec![4]);
    assert_eq!(queue.position(), 0);
}

// ===== Shuffle =====

#[test]
fn enabling_shuffle_keeps_playing_track() {
    let (queue, events) = queue_with(vec![song(1, 1), song(2, 2), song(3, 3)]);
    queue.set_position(1).unwrap();
    let playing = queue.current().unwrap();
    let before = queue.snapshot();
    events.drain_events();

    queue.set_shuffle_mode(ShuffleMode::Songs).unwrap();

    let now = queue.current().unwrap();
    assert!(Arc::ptr_eq(&playing, &now));
    assert_eq!(queue.shuffle_mode(), ShuffleMode::Songs);

    // Only neighbours that actually changed are reported, never the current slot
    let events = events.drain_events();
    let offsets = replaced_offsets(&events);
    assert!(!offsets.contains(&ActiveOffset::Current));
    let after = queue.snapshot();
    let neighbour = |snapshot: &cadenza_queue::QueueSnapshot, delta: i64| {
        let len = snapshot.len() as i64;
        let index = (snapshot.cursor as i64 + delta).rem_euclid(len) as usize;
        snapshot.tracks[index].identity.clone()
    };
    assert_eq!(
        offsets.contains(&ActiveOffset::Previous),
        neighbour(&before, -1) != neighbour(&after, -1)
    );
    assert_eq!(events.last(), Some(&QueueEvent::TimelineChanged));
}

#[test]
fn shuffle_remainder_with_too_few_tracks_is_silent() {
    let (queue, events) = queue_with(vec![song(1, 1), song(2, 1)]);
    queue.shuffle_remainder();
    assert_eq!(ids(&queue), vec![1, 2]);
    assert!(!events.has_pending_events());
}

#[test]
fn shuffled_enqueue_keeps_albums_together() {
    let (queue, _events) = queue_with(vec![song(1, 1)]);
    queue.set_shuffle_mode(ShuffleMode::Albums).unwrap();

    let batch = vec![
        song(10, 10),
        song(11, 10),
        song(20, 20),
        song(21, 20),
        song(30, 30),
    ];
    queue
        .ingest(batch, IngestMode::Enqueue, IngestHint::None)
        .unwrap();

    let ids = ids(&queue);
    assert_eq!(ids[0], 1);
    let pos = |id: i64| ids.iter().position(|&x| x == id).unwrap();
    assert_eq!(pos(11), pos(10) + 1);
    assert_eq!(pos(21), pos(20) + 1);
}

// ===== Concurrency =====

#[test]
fn concurrent_mutations_keep_queue_consistent() {
    let events = Arc::new(EventCollector::new());
    let queue = Arc::new(QueueStore::new(QueueConfig::default()).with_notifier(events.clone()));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..50 {
                    let id = worker * 1000 + i;
                    queue
                        .ingest(vec![song(id, worker)], IngestMode::Enqueue, IngestHint::None)
                        .unwrap();
                    queue.advance(Direction::Forward).unwrap();
                    let _ = queue.get_relative(ActiveOffset::Next);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(queue.len(), 200);
    assert!(queue.position() < queue.len());

    // One timeline change per committed ingest and advance
    let timeline_changes = events
        .drain_events()
        .into_iter()
        .filter(|e| *e == QueueEvent::TimelineChanged)
        .count();
    assert_eq!(timeline_changes, 400);
}
