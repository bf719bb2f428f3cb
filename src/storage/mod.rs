use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::candidate::{ThumbnailCandidate, TitleCandidate, VideoId};

mod database;
mod schema;

pub use database::{init, DraftDatabase, DraftSummary};

/// Titles and thumbnails a user entered for one video but has not submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDraft {
    pub titles: Vec<TitleCandidate>,
    pub thumbnails: Vec<ThumbnailCandidate>,
}

impl VideoDraft {
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.thumbnails.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftChange {
    Read,
    Written,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEvent {
    pub video_id: VideoId,
    pub change: DraftChange,
}

/// Per-video draft storage the reconciler writes through.
///
/// Implementations are synchronous caches; durable persistence, if any,
/// happens behind `force_update` observers.
pub trait DraftStore {
    fn get(&self, video_id: &VideoId) -> Option<VideoDraft>;

    fn set(&self, video_id: &VideoId, draft: VideoDraft);

    /// Lazily creates the draft for `video_id` and applies `edit` to it as a
    /// single step.
    fn update<F, T>(&self, video_id: &VideoId, edit: F) -> T
    where
        Self: Sized,
        F: FnOnce(&mut VideoDraft) -> T,
    {
        let mut draft = self.get(video_id).unwrap_or_default();
        let out = edit(&mut draft);
        self.set(video_id, draft);
        out
    }

    fn force_update(&self, video_id: &VideoId, change: DraftChange);
}

/// In-memory draft store shared by clones, with change subscribers.
#[derive(Debug, Clone, Default)]
pub struct DraftCache {
    drafts: Arc<Mutex<IndexMap<VideoId, VideoDraft>>>,
    subscribers: Arc<Mutex<Vec<Sender<DraftEvent>>>>,
}

impl DraftCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<DraftEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Replaces cache contents with previously persisted drafts. Does not
    /// notify subscribers.
    pub fn hydrate(&self, entries: impl IntoIterator<Item = (VideoId, VideoDraft)>) {
        let mut drafts = self.drafts.lock();
        drafts.clear();
        drafts.extend(entries);
    }

    pub fn snapshot(&self) -> Vec<(VideoId, VideoDraft)> {
        self.drafts
            .lock()
            .iter()
            .map(|(id, draft)| (id.clone(), draft.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.drafts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DraftStore for DraftCache {
    fn get(&self, video_id: &VideoId) -> Option<VideoDraft> {
        self.drafts.lock().get(video_id).cloned()
    }

    fn set(&self, video_id: &VideoId, draft: VideoDraft) {
        self.drafts.lock().insert(video_id.clone(), draft);
    }

    fn update<F, T>(&self, video_id: &VideoId, edit: F) -> T
    where
        F: FnOnce(&mut VideoDraft) -> T,
    {
        let mut drafts = self.drafts.lock();
        let draft = drafts.entry(video_id.clone()).or_default();
        edit(draft)
    }

    fn force_update(&self, video_id: &VideoId, change: DraftChange) {
        let event = DraftEvent {
            video_id: video_id.clone(),
            change,
        };
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        tracing::trace!(%video_id, ?change, listeners = subscribers.len(), "draft store notified");
    }
}
