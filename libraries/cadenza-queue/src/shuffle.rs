//! Shuffle algorithms for queue randomization
//!
//! Implements both a uniform song shuffle (Fisher-Yates) and an album shuffle
//! that randomizes album order while keeping each album's tracks together.

use crate::error::{QueueError, Result};
use crate::track::Track;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Produce a shuffled copy of `tracks`
///
/// With `group_by_album` unset every permutation is equally likely. With it
/// set, entries are grouped by album id (regardless of where they appear),
/// the groups are put in random order and each group keeps the relative order
/// its entries had in the input. Tracks without an album id form one group.
///
/// The result only depends on `rng`, so a seeded generator gives a
/// reproducible order.
pub fn shuffle<T, R>(tracks: &[T], group_by_album: bool, rng: &mut R) -> Result<Vec<T>>
where
    T: AsRef<Track> + Clone,
    R: Rng + ?Sized,
{
    if tracks.is_empty() {
        return Err(QueueError::invalid_argument("cannot shuffle an empty queue"));
    }

    if group_by_album {
        Ok(shuffle_albums(tracks, rng))
    } else {
        let mut shuffled = tracks.to_vec();
        shuffled.shuffle(rng);
        Ok(shuffled)
    }
}

/// Shuffle `tracks` in place, leaving an empty slice untouched
pub fn shuffle_in_place<T, R>(tracks: &mut [T], group_by_album: bool, rng: &mut R)
where
    T: AsRef<Track> + Clone,
    R: Rng + ?Sized,
{
    if tracks.is_empty() {
        return;
    }

    if group_by_album {
        let shuffled = shuffle_albums(tracks, rng);
        tracks.clone_from_slice(&shuffled);
    } else {
        tracks.shuffle(rng);
    }
}

fn shuffle_albums<T, R>(tracks: &[T], rng: &mut R) -> Vec<T>
where
    T: AsRef<Track> + Clone,
    R: Rng + ?Sized,
{
    // Groups in order of first appearance so the outcome is a function of the rng alone
    let mut group_index: HashMap<Option<i64>, usize> = HashMap::new();
    let mut groups: Vec<Vec<T>> = Vec::new();

    for track in tracks {
        let key = track.as_ref().album_id;
        let index = *group_index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[index].push(track.clone());
    }

    groups.shuffle(rng);
    groups.into_iter().flatten().collect()
}
