use std::cmp::Ordering;

use crate::candidate::{
    Ranked, RankedThumbnailCandidate, RankedTitleCandidate, ThumbnailCandidate, TitleCandidate,
};

/// Most votes first; among equal votes, locked candidates first.
fn rank_order<T>(a: &Ranked<T>, b: &Ranked<T>) -> Ordering {
    b.votes
        .cmp(&a.votes)
        .then_with(|| b.locked.cmp(&a.locked))
}

/// Picks the remote candidate to pre-select, or `None` when no candidate
/// has a non-negative vote total. Equal-ranked candidates resolve to the
/// one listed first.
pub fn pick_winner<T>(ranked: &[Ranked<T>]) -> Option<&Ranked<T>> {
    if !ranked.iter().any(|r| r.votes >= 0) {
        return None;
    }
    let mut order: Vec<&Ranked<T>> = ranked.iter().collect();
    // sort_by is stable
    order.sort_by(|a, b| rank_order(a, b));
    order.into_iter().next()
}

pub fn default_title(remote: &[RankedTitleCandidate], original_title: &str) -> TitleCandidate {
    match pick_winner(remote) {
        Some(winner) => TitleCandidate {
            text: winner.candidate.text.clone(),
            is_original: winner.candidate.text == original_title,
        },
        None => TitleCandidate::original(original_title),
    }
}

pub fn default_thumbnail(remote: &[RankedThumbnailCandidate]) -> ThumbnailCandidate {
    pick_winner(remote)
        .map(|winner| winner.candidate)
        .unwrap_or(ThumbnailCandidate::Original)
}
