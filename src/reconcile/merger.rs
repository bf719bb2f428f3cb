use crate::candidate::{ThumbnailCandidate, TitleCandidate, VideoId};
use crate::storage::{DraftChange, DraftStore, VideoDraft};

use super::builder::CandidateLists;

/// Drafts that are not already represented in the main lists, shown after
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overflow {
    pub titles: Vec<TitleCandidate>,
    pub thumbnails: Vec<ThumbnailCandidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftWrite {
    Appended,
    Replaced { position: usize },
    AlreadyPresent,
}

pub fn derive_overflow(lists: &CandidateLists, draft: Option<&VideoDraft>) -> Overflow {
    let Some(draft) = draft else {
        return Overflow::default();
    };

    let mut titles: Vec<TitleCandidate> = Vec::new();
    for title in &draft.titles {
        if lists.titles.contains(title) || titles.contains(title) {
            continue;
        }
        titles.push(TitleCandidate::new(title.text.clone()));
    }

    let mut thumbnails: Vec<ThumbnailCandidate> = Vec::new();
    for thumbnail in &draft.thumbnails {
        // built-in variants always collide with positions 0 and 1
        let Some(timestamp) = thumbnail.timestamp() else {
            continue;
        };
        let candidate = ThumbnailCandidate::at(timestamp);
        if lists.thumbnails.contains(&candidate) || thumbnails.contains(&candidate) {
            continue;
        }
        thumbnails.push(candidate);
    }

    Overflow { titles, thumbnails }
}

/// Reads the draft for `video_id` and derives the overflow lists from it.
/// The store itself is left untouched.
pub fn import<S: DraftStore>(store: &S, video_id: &VideoId, lists: &CandidateLists) -> Overflow {
    match store.get(video_id) {
        Some(draft) => {
            let overflow = derive_overflow(lists, Some(&draft));
            store.force_update(video_id, DraftChange::Read);
            overflow
        }
        None => Overflow::default(),
    }
}

/// Inserts `value` over the entry equal to `previous`, or appends it.
///
/// Replacing keeps the entry's position; any other copy of `value` is
/// dropped so the list never holds the same key twice.
pub fn upsert<T: PartialEq + Clone>(
    entries: &mut Vec<T>,
    value: T,
    previous: Option<&T>,
) -> DraftWrite {
    let existing = previous.and_then(|prev| entries.iter().position(|entry| entry == prev));
    match existing {
        Some(position) => {
            entries[position] = value.clone();
            let mut index = 0;
            entries.retain(|entry| {
                let keep = index == position || *entry != value;
                index += 1;
                keep
            });
            let position = entries
                .iter()
                .position(|entry| *entry == value)
                .unwrap_or(position);
            DraftWrite::Replaced { position }
        }
        None if entries.contains(&value) => DraftWrite::AlreadyPresent,
        None => {
            entries.push(value);
            DraftWrite::Appended
        }
    }
}

pub fn record_title<S: DraftStore>(
    store: &S,
    video_id: &VideoId,
    text: &str,
    previous: Option<&str>,
) -> DraftWrite {
    let previous = previous.map(TitleCandidate::new);
    let write = store.update(video_id, |draft| {
        upsert(&mut draft.titles, TitleCandidate::new(text), previous.as_ref())
    });
    store.force_update(video_id, DraftChange::Written);
    tracing::debug!(%video_id, ?write, "recorded draft title");
    write
}

pub fn record_thumbnail<S: DraftStore>(
    store: &S,
    video_id: &VideoId,
    timestamp: f64,
    previous: Option<f64>,
) -> DraftWrite {
    let previous = previous.map(ThumbnailCandidate::at);
    let write = store.update(video_id, |draft| {
        upsert(
            &mut draft.thumbnails,
            ThumbnailCandidate::at(timestamp),
            previous.as_ref(),
        )
    });
    store.force_update(video_id, DraftChange::Written);
    tracing::debug!(%video_id, timestamp, ?write, "recorded draft thumbnail");
    write
}
