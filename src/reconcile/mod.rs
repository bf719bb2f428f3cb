//! Title and thumbnail candidate reconciliation for one video at a time.
//!
//! A video change runs a fixed chain: build the main lists, pick the default
//! selection, then import leftover local drafts. After that the session is
//! interactive and every edit is written back to the [`DraftStore`].

use strum::Display;
use thiserror::Error;

use crate::candidate::{BrandingResult, ThumbnailCandidate, TitleCandidate, VideoId};
use crate::config::messages::{Localizer, MessageCatalog, MessageKey};
use crate::sources::{PageTitleSource, RankingSource};
use crate::storage::DraftStore;

pub mod builder;
pub mod merger;
pub mod selector;
pub mod submit;

pub use builder::{CandidateLists, BUILT_IN_COUNT};
pub use merger::{DraftWrite, Overflow};
pub use submit::{JsonSubmitSink, SubmitSink, Submission, SubmittedTitle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum SessionPhase {
    Uninitialized,
    ListsBuilt,
    DefaultSelected,
    DraftImported,
    Interactive,
}

/// Identifies one video session. Completions carrying an older ticket are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTicket {
    generation: u64,
    video_id: VideoId,
}

impl SessionTicket {
    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("no video session has been started")]
    NoSession,
    #[error("session step expects phase {expected} but the session is {found}")]
    OutOfOrder {
        expected: SessionPhase,
        found: SessionPhase,
    },
    #[error("session for {video_id} is not ready yet ({phase})")]
    NotReady {
        video_id: VideoId,
        phase: SessionPhase,
    },
    #[error("no {list} tile at index {index} ({len} displayed)")]
    NoSuchTile {
        list: &'static str,
        index: usize,
        len: usize,
    },
    #[error("thumbnail timestamp {0} is not a non-negative number of seconds")]
    InvalidTimestamp(f64),
    #[error("selected {0} is not among the displayed tiles")]
    SelectionNotDisplayed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TileOrigin {
    BuiltIn,
    Remote,
    Draft,
}

#[derive(Debug, Clone, Copy)]
pub struct Tile<'a, T> {
    pub index: usize,
    pub candidate: &'a T,
    pub origin: TileOrigin,
    pub selected: bool,
}

/// Strings shown around the candidate lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub instructions: String,
    pub vote_label: String,
}

#[derive(Debug, Clone)]
struct Session {
    ticket: SessionTicket,
    phase: SessionPhase,
    branding: BrandingResult,
    original_title: String,
    placeholder_title: String,
    lists: CandidateLists,
    overflow: Overflow,
    selected_title: TitleCandidate,
    selected_thumbnail: ThumbnailCandidate,
}

impl Session {
    fn new(ticket: SessionTicket) -> Self {
        Self {
            ticket,
            phase: SessionPhase::Uninitialized,
            branding: BrandingResult::default(),
            original_title: String::new(),
            placeholder_title: String::new(),
            lists: CandidateLists::default(),
            overflow: Overflow::default(),
            selected_title: TitleCandidate::original(String::new()),
            selected_thumbnail: ThumbnailCandidate::Original,
        }
    }

    fn is_built_in_title(&self, text: &str) -> bool {
        text == self.original_title || text == self.placeholder_title
    }

    fn displayed_titles(&self) -> impl Iterator<Item = &TitleCandidate> {
        self.lists.titles.iter().chain(self.overflow.titles.iter())
    }

    fn displayed_thumbnails(&self) -> impl Iterator<Item = &ThumbnailCandidate> {
        self.lists
            .thumbnails
            .iter()
            .chain(self.overflow.thumbnails.iter())
    }

    fn title_index(&self) -> Option<usize> {
        self.displayed_titles()
            .position(|title| *title == self.selected_title)
    }

    fn thumbnail_index(&self) -> Option<usize> {
        self.displayed_thumbnails()
            .position(|thumbnail| *thumbnail == self.selected_thumbnail)
    }

    fn origin(index: usize, main_len: usize) -> TileOrigin {
        if index < BUILT_IN_COUNT {
            TileOrigin::BuiltIn
        } else if index < main_len {
            TileOrigin::Remote
        } else {
            TileOrigin::Draft
        }
    }
}

/// Owns the session for the current video and writes drafts through `S`.
pub struct Reconciler<S, L = MessageCatalog> {
    store: S,
    localizer: L,
    generation: u64,
    session: Option<Session>,
}

impl<S: DraftStore, L: Localizer> Reconciler<S, L> {
    pub fn new(store: S, localizer: L) -> Self {
        Self {
            store,
            localizer,
            generation: 0,
            session: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_video(&self) -> Option<&VideoId> {
        self.session.as_ref().map(|s| &s.ticket.video_id)
    }

    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map(|s| s.phase)
            .unwrap_or(SessionPhase::Uninitialized)
    }

    pub fn is_current(&self, ticket: &SessionTicket) -> bool {
        self.session
            .as_ref()
            .map(|s| s.ticket == *ticket)
            .unwrap_or(false)
    }

    /// Starts a fresh session for `video_id`, discarding the previous one.
    pub fn begin(&mut self, video_id: VideoId) -> SessionTicket {
        self.generation += 1;
        let ticket = SessionTicket {
            generation: self.generation,
            video_id,
        };
        tracing::debug!(
            video_id = %ticket.video_id,
            generation = ticket.generation,
            "video session started"
        );
        self.session = Some(Session::new(ticket.clone()));
        ticket
    }

    pub fn build_lists(
        &mut self,
        ticket: &SessionTicket,
        branding: BrandingResult,
        page_title: Option<String>,
    ) -> Result<StepOutcome, ReconcileError> {
        let original_title =
            page_title.unwrap_or_else(|| self.localizer.message(MessageKey::OriginalTitle));
        let placeholder_title = self.localizer.message(MessageKey::TypeYourOwnTitleHere);
        let Some(session) = step_session(&mut self.session, ticket, SessionPhase::Uninitialized)?
        else {
            return Ok(StepOutcome::Stale);
        };

        session.lists = builder::build_lists(&branding, &original_title, &placeholder_title);
        session.selected_title = TitleCandidate::original(original_title.clone());
        session.selected_thumbnail = ThumbnailCandidate::Original;
        session.branding = branding;
        session.original_title = original_title;
        session.placeholder_title = placeholder_title;
        session.phase = SessionPhase::ListsBuilt;
        tracing::debug!(
            video_id = %ticket.video_id,
            titles = session.lists.titles.len(),
            thumbnails = session.lists.thumbnails.len(),
            "candidate lists built"
        );
        Ok(StepOutcome::Applied)
    }

    pub fn select_defaults(
        &mut self,
        ticket: &SessionTicket,
    ) -> Result<StepOutcome, ReconcileError> {
        let Some(session) = step_session(&mut self.session, ticket, SessionPhase::ListsBuilt)?
        else {
            return Ok(StepOutcome::Stale);
        };

        let title = selector::default_title(&session.branding.titles, &session.original_title);
        let title_index = session
            .lists
            .titles
            .iter()
            .position(|candidate| *candidate == title)
            .expect("default title must come from the built title list");

        let thumbnail = selector::default_thumbnail(&session.branding.thumbnails);
        let thumbnail_index = session
            .lists
            .thumbnails
            .iter()
            .position(|candidate| *candidate == thumbnail)
            .expect("default thumbnail must come from the built thumbnail list");

        session.selected_title = title;
        session.selected_thumbnail = thumbnail;
        session.phase = SessionPhase::DefaultSelected;
        tracing::debug!(
            video_id = %ticket.video_id,
            title_index,
            thumbnail_index,
            "default selection chosen"
        );
        Ok(StepOutcome::Applied)
    }

    pub fn import_drafts(
        &mut self,
        ticket: &SessionTicket,
    ) -> Result<StepOutcome, ReconcileError> {
        let Some(session) =
            step_session(&mut self.session, ticket, SessionPhase::DefaultSelected)?
        else {
            return Ok(StepOutcome::Stale);
        };

        session.overflow = merger::import(&self.store, &ticket.video_id, &session.lists);
        session.phase = SessionPhase::DraftImported;
        tracing::debug!(
            video_id = %ticket.video_id,
            titles = session.overflow.titles.len(),
            thumbnails = session.overflow.thumbnails.len(),
            "local drafts imported"
        );
        Ok(StepOutcome::Applied)
    }

    /// Runs the whole video-change chain synchronously.
    pub fn load_video(
        &mut self,
        video_id: VideoId,
        branding: BrandingResult,
        page_title: Option<String>,
    ) -> Result<SessionTicket, ReconcileError> {
        let ticket = self.begin(video_id);
        self.build_lists(&ticket, branding, page_title)?;
        self.select_defaults(&ticket)?;
        self.import_drafts(&ticket)?;
        Ok(ticket)
    }

    /// Fetches branding and the page title, then runs [`Self::load_video`].
    pub fn load_from<R, P>(
        &mut self,
        video_id: VideoId,
        ranking: &R,
        page: &P,
    ) -> anyhow::Result<SessionTicket>
    where
        R: RankingSource,
        P: PageTitleSource,
    {
        let branding = ranking.fetch(&video_id)?;
        let ticket = self.load_video(video_id, branding, page.page_title())?;
        Ok(ticket)
    }

    /// Selects the title shown at `index`, recording it as a draft unless it
    /// is a built-in.
    pub fn select_title(&mut self, index: usize) -> Result<usize, ReconcileError> {
        let session = ready_session(&self.session)?;
        let text = session
            .displayed_titles()
            .nth(index)
            .map(|title| title.text.clone())
            .ok_or_else(|| ReconcileError::NoSuchTile {
                list: "title",
                index,
                len: session.displayed_titles().count(),
            })?;
        self.select_or_update_title(&text, Some(&text))
    }

    /// Selects `text`, which replaces the draft entry equal to `previous` when
    /// the user edited an existing tile. Returns the new display index.
    pub fn select_or_update_title(
        &mut self,
        text: &str,
        previous: Option<&str>,
    ) -> Result<usize, ReconcileError> {
        let session = ready_session_mut(&mut self.session)?;
        let video_id = session.ticket.video_id.clone();

        if !session.is_built_in_title(text) {
            merger::record_title(&self.store, &video_id, text, previous);
            session.overflow =
                merger::derive_overflow(&session.lists, self.store.get(&video_id).as_ref());
        }
        session.selected_title = TitleCandidate {
            text: text.to_string(),
            is_original: text == session.original_title,
        };
        session.phase = SessionPhase::Interactive;
        session
            .title_index()
            .ok_or(ReconcileError::SelectionNotDisplayed("title"))
    }

    pub fn select_thumbnail(&mut self, index: usize) -> Result<usize, ReconcileError> {
        let session = ready_session(&self.session)?;
        let thumbnail = session
            .displayed_thumbnails()
            .nth(index)
            .copied()
            .ok_or_else(|| ReconcileError::NoSuchTile {
                list: "thumbnail",
                index,
                len: session.displayed_thumbnails().count(),
            })?;
        self.select_or_update_thumbnail(thumbnail, thumbnail.timestamp())
    }

    /// Selects `thumbnail`. Only concrete timestamps are drafts; picking the
    /// original or the live frame changes the selection alone.
    pub fn select_or_update_thumbnail(
        &mut self,
        thumbnail: ThumbnailCandidate,
        previous_timestamp: Option<f64>,
    ) -> Result<usize, ReconcileError> {
        validate_thumbnail(&thumbnail)?;
        let session = ready_session_mut(&mut self.session)?;
        let video_id = session.ticket.video_id.clone();

        if let Some(timestamp) = thumbnail.timestamp() {
            merger::record_thumbnail(&self.store, &video_id, timestamp, previous_timestamp);
            session.overflow =
                merger::derive_overflow(&session.lists, self.store.get(&video_id).as_ref());
        }
        session.selected_thumbnail = thumbnail;
        session.phase = SessionPhase::Interactive;
        session
            .thumbnail_index()
            .ok_or(ReconcileError::SelectionNotDisplayed("thumbnail"))
    }

    pub fn title_tiles(&self) -> Result<Vec<Tile<'_, TitleCandidate>>, ReconcileError> {
        let session = ready_session(&self.session)?;
        let selected = session.title_index();
        let main_len = session.lists.titles.len();
        Ok(session
            .displayed_titles()
            .enumerate()
            .map(|(index, candidate)| Tile {
                index,
                candidate,
                origin: Session::origin(index, main_len),
                selected: Some(index) == selected,
            })
            .collect())
    }

    pub fn thumbnail_tiles(&self) -> Result<Vec<Tile<'_, ThumbnailCandidate>>, ReconcileError> {
        let session = ready_session(&self.session)?;
        let selected = session.thumbnail_index();
        let main_len = session.lists.thumbnails.len();
        Ok(session
            .displayed_thumbnails()
            .enumerate()
            .map(|(index, candidate)| Tile {
                index,
                candidate,
                origin: Session::origin(index, main_len),
                selected: Some(index) == selected,
            })
            .collect())
    }

    pub fn selected_title_index(&self) -> Result<usize, ReconcileError> {
        ready_session(&self.session)?
            .title_index()
            .ok_or(ReconcileError::SelectionNotDisplayed("title"))
    }

    pub fn selected_thumbnail_index(&self) -> Result<usize, ReconcileError> {
        ready_session(&self.session)?
            .thumbnail_index()
            .ok_or(ReconcileError::SelectionNotDisplayed("thumbnail"))
    }

    pub fn overflow(&self) -> Result<&Overflow, ReconcileError> {
        Ok(&ready_session(&self.session)?.overflow)
    }

    pub fn prompt(&self) -> Prompt {
        Prompt {
            instructions: self.localizer.message(MessageKey::ChooseDescriptive),
            vote_label: self.localizer.message(MessageKey::Vote),
        }
    }

    /// Hands the current selection to `sink` exactly once.
    pub fn submit<K: SubmitSink + ?Sized>(
        &self,
        sink: &mut K,
    ) -> Result<Submission, ReconcileError> {
        let session = ready_session(&self.session)?;
        let title = SubmittedTitle {
            text: session.selected_title.text.clone(),
            is_original: session.selected_title.text == session.original_title,
        };
        let thumbnail = session.selected_thumbnail;
        sink.submit(&title, &thumbnail);
        tracing::info!(
            video_id = %session.ticket.video_id,
            original_title = title.is_original,
            %thumbnail,
            "submission emitted"
        );
        Ok(Submission {
            video_id: session.ticket.video_id.clone(),
            title,
            thumbnail,
        })
    }
}

/// Timestamps must be finite and non-negative.
pub fn validate_thumbnail(thumbnail: &ThumbnailCandidate) -> Result<(), ReconcileError> {
    match thumbnail.timestamp() {
        Some(ts) if !ts.is_finite() || ts < 0.0 => Err(ReconcileError::InvalidTimestamp(ts)),
        _ => Ok(()),
    }
}

fn step_session<'a>(
    slot: &'a mut Option<Session>,
    ticket: &SessionTicket,
    expected: SessionPhase,
) -> Result<Option<&'a mut Session>, ReconcileError> {
    let session = slot.as_mut().ok_or(ReconcileError::NoSession)?;
    if session.ticket != *ticket {
        tracing::warn!(
            stale = %ticket.video_id,
            current = %session.ticket.video_id,
            "ignoring completion for a superseded video session"
        );
        return Ok(None);
    }
    if session.phase != expected {
        return Err(ReconcileError::OutOfOrder {
            expected,
            found: session.phase,
        });
    }
    Ok(Some(session))
}

fn ready_session(slot: &Option<Session>) -> Result<&Session, ReconcileError> {
    let session = slot.as_ref().ok_or(ReconcileError::NoSession)?;
    if session.phase < SessionPhase::DraftImported {
        return Err(ReconcileError::NotReady {
            video_id: session.ticket.video_id.clone(),
            phase: session.phase,
        });
    }
    Ok(session)
}

fn ready_session_mut(slot: &mut Option<Session>) -> Result<&mut Session, ReconcileError> {
    let session = slot.as_mut().ok_or(ReconcileError::NoSession)?;
    if session.phase < SessionPhase::DraftImported {
        return Err(ReconcileError::NotReady {
            video_id: session.ticket.video_id.clone(),
            phase: session.phase,
        });
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Ranked;
    use crate::storage::{DraftCache, VideoDraft};
    use assert_matches::assert_matches;

    fn reconciler() -> Reconciler<DraftCache> {
        Reconciler::new(DraftCache::new(), MessageCatalog::default())
    }

    fn ranked_titles(entries: &[(&str, i64, bool)]) -> BrandingResult {
        BrandingResult {
            titles: entries
                .iter()
                .map(|(text, votes, locked)| Ranked::new(TitleCandidate::new(*text), *votes, *locked))
                .collect(),
            thumbnails: Vec::new(),
        }
    }

    fn title_texts(reconciler: &Reconciler<DraftCache>) -> Vec<String> {
        reconciler
            .title_tiles()
            .expect("session ready")
            .into_iter()
            .map(|tile| tile.candidate.text.clone())
            .collect()
    }

    fn assert_unique<T: PartialEq + std::fmt::Debug>(items: &[&T]) {
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                assert_ne!(a, b, "duplicate tile {a:?}");
            }
        }
    }

    #[test]
    fn highest_votes_are_preselected() -> anyhow::Result<()> {
        let mut r = reconciler();
        r.load_video(
            VideoId::from("v1"),
            ranked_titles(&[("A", 5, false), ("B", 5, true), ("C", 9, false)]),
            Some("Page".into()),
        )?;

        let index = r.selected_title_index()?;
        assert_eq!(title_texts(&r)[index], "C");
        assert_eq!(r.phase(), SessionPhase::DraftImported);
        Ok(())
    }

    #[test]
    fn locked_candidate_wins_a_vote_tie() -> anyhow::Result<()> {
        let mut r = reconciler();
        r.load_video(
            VideoId::from("v1"),
            ranked_titles(&[("A", 5, false), ("B", 5, true)]),
            Some("Page".into()),
        )?;
        assert_eq!(title_texts(&r)[r.selected_title_index()?], "B");
        Ok(())
    }

    #[test]
    fn downvoted_candidates_leave_the_original_selected() -> anyhow::Result<()> {
        let mut r = reconciler();
        r.load_video(
            VideoId::from("v1"),
            ranked_titles(&[("A", -1, true), ("B", -3, false)]),
            Some("Page".into()),
        )?;
        assert_eq!(r.selected_title_index()?, 0);
        assert_eq!(r.selected_thumbnail_index()?, 0);
        Ok(())
    }

    #[test]
    fn remote_copy_of_the_page_title_stays_a_built_in() -> anyhow::Result<()> {
        let mut r = reconciler();
        r.load_video(
            VideoId::from("v1"),
            ranked_titles(&[("Page", 12, false), ("Other", 1, false)]),
            Some("Page".into()),
        )?;

        assert_eq!(title_texts(&r), ["Page", "Type your own title here", "Other"]);
        assert_eq!(r.selected_title_index()?, 0);
        let tiles = r.title_tiles()?;
        assert!(tiles[0].candidate.is_original);
        assert_eq!(tiles[0].origin, TileOrigin::BuiltIn);
        Ok(())
    }

    #[test]
    fn missing_page_title_uses_the_localized_fallback() -> anyhow::Result<()> {
        let mut r = reconciler();
        r.load_video(VideoId::from("v1"), BrandingResult::default(), None)?;
        assert_eq!(title_texts(&r)[0], "Original Title");
        Ok(())
    }

    #[test]
    fn winning_thumbnail_maps_to_its_timestamp_tile() -> anyhow::Result<()> {
        let mut r = reconciler();
        let branding = BrandingResult {
            titles: Vec::new(),
            thumbnails: vec![
                Ranked::new(ThumbnailCandidate::Original, 1, false),
                Ranked::new(ThumbnailCandidate::at(30.0), 4, false),
                Ranked::new(ThumbnailCandidate::at(45.5), 4, true),
            ],
        };
        r.load_video(VideoId::from("v1"), branding, Some("Page".into()))?;

        let tiles = r.thumbnail_tiles()?;
        assert_eq!(tiles.len(), 4);
        let selected = tiles.iter().find(|tile| tile.selected).expect("one selected");
        assert_eq!(*selected.candidate, ThumbnailCandidate::at(45.5));
        assert_eq!(selected.index, 3);
        Ok(())
    }

    #[test]
    fn thumbnail_draft_survives_a_video_round_trip() -> anyhow::Result<()> {
        let mut r = reconciler();
        r.load_video(VideoId::from("v1"), BrandingResult::default(), Some("One".into()))?;
        let index = r.select_or_update_thumbnail(ThumbnailCandidate::at(12.5), None)?;
        assert_eq!(index, BUILT_IN_COUNT);

        r.load_video(VideoId::from("v2"), BrandingResult::default(), Some("Two".into()))?;
        assert!(r.overflow()?.thumbnails.is_empty());

        r.load_video(VideoId::from("v1"), BrandingResult::default(), Some("One".into()))?;
        assert_eq!(r.overflow()?.thumbnails, vec![ThumbnailCandidate::at(12.5)]);
        assert_eq!(r.selected_thumbnail_index()?, 0);
        Ok(())
    }

    #[test]
    fn editing_a_draft_title_replaces_it() -> anyhow::Result<()> {
        let mut r = reconciler();
        let video = VideoId::from("v1");
        r.load_video(video.clone(), BrandingResult::default(), Some("Page".into()))?;

        r.select_or_update_title("Old", None)?;
        let index = r.select_or_update_title("New", Some("Old"))?;

        assert_eq!(title_texts(&r)[index], "New");
        let draft = r.store().get(&video).expect("draft created");
        assert_eq!(draft.titles, vec![TitleCandidate::new("New")]);
        assert_eq!(r.overflow()?.titles, vec![TitleCandidate::new("New")]);
        Ok(())
    }

    #[test]
    fn selecting_the_original_title_writes_nothing() -> anyhow::Result<()> {
        let mut r = reconciler();
        let video = VideoId::from("v1");
        r.load_video(video.clone(), BrandingResult::default(), Some("Page".into()))?;
        let events = r.store().subscribe();

        assert_eq!(r.select_title(0)?, 0);
        assert_eq!(r.select_or_update_title("Page", Some("Something"))?, 0);

        assert!(r.store().get(&video).is_none());
        assert!(events.try_recv().is_err());
        assert_eq!(r.phase(), SessionPhase::Interactive);
        Ok(())
    }

    #[test]
    fn original_thumbnail_selection_is_not_a_draft() -> anyhow::Result<()> {
        let mut r = reconciler();
        let video = VideoId::from("v1");
        r.load_video(video.clone(), BrandingResult::default(), Some("Page".into()))?;

        assert_eq!(r.select_thumbnail(1)?, 1);
        assert_eq!(r.select_thumbnail(0)?, 0);
        assert!(r.store().get(&video).is_none());
        Ok(())
    }

    #[test]
    fn drafts_stay_with_their_video() -> anyhow::Result<()> {
        let mut r = reconciler();
        r.load_video(VideoId::from("v1"), BrandingResult::default(), Some("Page".into()))?;
        r.select_or_update_title("Only for v1", None)?;
        r.select_or_update_thumbnail(ThumbnailCandidate::at(3.0), None)?;

        r.load_video(VideoId::from("v2"), BrandingResult::default(), Some("Page".into()))?;

        assert_eq!(r.overflow()?, &Overflow::default());
        assert_eq!(title_texts(&r).len(), BUILT_IN_COUNT);
        Ok(())
    }

    #[test]
    fn drafts_matching_remote_candidates_are_not_repeated() -> anyhow::Result<()> {
        let store = DraftCache::new();
        let video = VideoId::from("v1");
        store.set(
            &video,
            VideoDraft {
                titles: vec![
                    TitleCandidate::new("Remote"),
                    TitleCandidate::new("Type your own title here"),
                    TitleCandidate::new("Mine"),
                ],
                thumbnails: vec![ThumbnailCandidate::at(8.0), ThumbnailCandidate::at(9.0)],
            },
        );
        let mut r = Reconciler::new(store, MessageCatalog::default());
        let branding = BrandingResult {
            titles: vec![Ranked::new(TitleCandidate::new("Remote"), 1, false)],
            thumbnails: vec![Ranked::new(ThumbnailCandidate::at(8.0), 1, false)],
        };
        r.load_video(video, branding, Some("Page".into()))?;

        assert_eq!(
            title_texts(&r),
            ["Page", "Type your own title here", "Remote", "Mine"]
        );
        let titles = r.title_tiles()?;
        assert_unique(&titles.iter().map(|t| t.candidate).collect::<Vec<_>>());
        assert_eq!(titles[3].origin, TileOrigin::Draft);
        let thumbnails = r.thumbnail_tiles()?;
        assert_unique(&thumbnails.iter().map(|t| t.candidate).collect::<Vec<_>>());
        assert_eq!(thumbnails.len(), 4);
        Ok(())
    }

    #[test]
    fn selecting_a_remote_title_keeps_the_list_unique() -> anyhow::Result<()> {
        let mut r = reconciler();
        let video = VideoId::from("v1");
        r.load_video(
            video.clone(),
            ranked_titles(&[("Remote", 1, false)]),
            Some("Page".into()),
        )?;

        assert_eq!(r.select_title(2)?, 2);
        assert_eq!(title_texts(&r).len(), 3);
        assert_eq!(
            r.store().get(&video).expect("draft").titles,
            vec![TitleCandidate::new("Remote")]
        );
        Ok(())
    }

    #[test]
    fn stale_steps_are_ignored() -> anyhow::Result<()> {
        let mut r = reconciler();
        let first = r.begin(VideoId::from("v1"));
        let second = r.begin(VideoId::from("v2"));

        let outcome = r.build_lists(&first, BrandingResult::default(), Some("One".into()))?;
        assert_eq!(outcome, StepOutcome::Stale);
        assert!(!r.is_current(&first));
        assert_eq!(r.phase(), SessionPhase::Uninitialized);

        r.build_lists(&second, BrandingResult::default(), Some("Two".into()))?;
        assert_eq!(r.phase(), SessionPhase::ListsBuilt);
        assert_eq!(r.current_video(), Some(&VideoId::from("v2")));
        Ok(())
    }

    #[test]
    fn steps_must_run_in_order() {
        let mut r = reconciler();
        assert_matches!(r.select_title(0), Err(ReconcileError::NoSession));

        let ticket = r.begin(VideoId::from("v1"));
        assert_matches!(
            r.import_drafts(&ticket),
            Err(ReconcileError::OutOfOrder {
                expected: SessionPhase::DefaultSelected,
                found: SessionPhase::Uninitialized,
            })
        );
        assert_matches!(r.title_tiles(), Err(ReconcileError::NotReady { .. }));
    }

    #[test]
    fn invalid_timestamps_leave_drafts_and_selection_alone() -> anyhow::Result<()> {
        let mut r = reconciler();
        let video = VideoId::from("v1");
        r.load_video(video.clone(), BrandingResult::default(), Some("Page".into()))?;

        for _ in 0..2 {
            assert_matches!(
                r.select_or_update_thumbnail(ThumbnailCandidate::at(f64::NAN), None),
                Err(ReconcileError::InvalidTimestamp(ts)) if ts.is_nan()
            );
        }
        assert_matches!(
            r.select_or_update_thumbnail(ThumbnailCandidate::at(-5.0), None),
            Err(ReconcileError::InvalidTimestamp(_))
        );

        assert_eq!(r.store().get(&video), None);
        assert!(r.overflow()?.thumbnails.is_empty());
        assert_eq!(r.selected_thumbnail_index()?, 0);
        Ok(())
    }

    #[test]
    fn out_of_range_tiles_are_rejected() -> anyhow::Result<()> {
        let mut r = reconciler();
        r.load_video(VideoId::from("v1"), BrandingResult::default(), Some("Page".into()))?;
        assert_matches!(
            r.select_thumbnail(7),
            Err(ReconcileError::NoSuchTile { list: "thumbnail", index: 7, len: 2 })
        );
        Ok(())
    }

    #[test]
    fn submit_emits_the_current_selection_once() -> anyhow::Result<()> {
        let mut r = reconciler();
        r.load_video(
            VideoId::from("v1"),
            ranked_titles(&[("Remote", 2, false)]),
            Some("Page".into()),
        )?;
        r.select_or_update_title("Typed", None)?;
        r.select_or_update_thumbnail(ThumbnailCandidate::at(42.0), None)?;

        let mut calls = Vec::new();
        let mut sink = |title: &SubmittedTitle, thumbnail: &ThumbnailCandidate| {
            calls.push((title.clone(), *thumbnail));
        };
        let submission = r.submit(&mut sink)?;

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.text, "Typed");
        assert!(!calls[0].0.is_original);
        assert_eq!(calls[0].1, ThumbnailCandidate::at(42.0));
        assert_eq!(submission.video_id, VideoId::from("v1"));
        Ok(())
    }

    #[test]
    fn prompt_uses_localized_strings() {
        let r = reconciler();
        let prompt = r.prompt();
        assert_eq!(prompt.vote_label, "Vote");
        assert!(prompt.instructions.starts_with("Choose"));
    }
}
