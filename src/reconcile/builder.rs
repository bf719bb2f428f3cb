use std::collections::HashSet;

use crate::candidate::{BrandingResult, ThumbnailCandidate, TitleCandidate};

/// The main (non-draft) candidate lists of a video, built-ins first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateLists {
    pub titles: Vec<TitleCandidate>,
    pub thumbnails: Vec<ThumbnailCandidate>,
}

/// Positions 0 and 1 of both lists are always built-ins.
pub const BUILT_IN_COUNT: usize = 2;

/// Builds both lists. Remote candidates keep their received order; any that
/// repeat a built-in or an earlier entry are skipped.
pub fn build_lists(
    branding: &BrandingResult,
    original_title: &str,
    placeholder_title: &str,
) -> CandidateLists {
    let mut titles = Vec::with_capacity(BUILT_IN_COUNT + branding.titles.len());
    titles.push(TitleCandidate::original(original_title));
    titles.push(TitleCandidate::new(placeholder_title));
    let mut seen: HashSet<&str> = HashSet::from([original_title, placeholder_title]);
    for ranked in &branding.titles {
        let text = ranked.candidate.text.as_str();
        if seen.insert(text) {
            titles.push(TitleCandidate::new(text));
        }
    }

    let mut thumbnails = Vec::with_capacity(BUILT_IN_COUNT + branding.thumbnails.len());
    thumbnails.push(ThumbnailCandidate::Original);
    thumbnails.push(ThumbnailCandidate::CurrentFrame);
    for timestamp in branding
        .thumbnails
        .iter()
        .filter_map(|ranked| ranked.candidate.timestamp())
    {
        let candidate = ThumbnailCandidate::at(timestamp);
        if !thumbnails.contains(&candidate) {
            thumbnails.push(candidate);
        }
    }

    CandidateLists { titles, thumbnails }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Ranked;

    fn branding() -> BrandingResult {
        BrandingResult {
            titles: vec![
                Ranked::new(TitleCandidate::new("Remote one"), 3, false),
                Ranked::new(TitleCandidate::new("Page title"), 10, true),
                Ranked::new(TitleCandidate::new("Remote two"), -1, false),
            ],
            thumbnails: vec![
                Ranked::new(ThumbnailCandidate::at(4.0), 1, false),
                Ranked::new(ThumbnailCandidate::Original, 7, false),
                Ranked::new(ThumbnailCandidate::at(90.25), 0, true),
            ],
        }
    }

    #[test]
    fn built_ins_lead_both_lists() {
        let lists = build_lists(&branding(), "Page title", "Type here");

        assert!(lists.titles[0].is_original);
        assert_eq!(lists.titles[0].text, "Page title");
        assert_eq!(lists.titles[1].text, "Type here");
        assert!(!lists.titles[1].is_original);
        assert_eq!(lists.thumbnails[0], ThumbnailCandidate::Original);
        assert_eq!(lists.thumbnails[1], ThumbnailCandidate::CurrentFrame);
    }

    #[test]
    fn remote_candidates_keep_source_order_without_originals() {
        let lists = build_lists(&branding(), "Page title", "Type here");

        let titles: Vec<_> = lists.titles.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(titles, ["Page title", "Type here", "Remote one", "Remote two"]);
        assert_eq!(
            lists.thumbnails,
            vec![
                ThumbnailCandidate::Original,
                ThumbnailCandidate::CurrentFrame,
                ThumbnailCandidate::at(4.0),
                ThumbnailCandidate::at(90.25),
            ]
        );
    }

    #[test]
    fn empty_branding_yields_only_built_ins() {
        let lists = build_lists(&BrandingResult::default(), "Page title", "Type here");
        assert_eq!(lists.titles.len(), BUILT_IN_COUNT);
        assert_eq!(lists.thumbnails.len(), BUILT_IN_COUNT);
    }

    #[test]
    fn remote_titles_matching_a_built_in_are_not_repeated() {
        let branding = BrandingResult {
            titles: vec![
                Ranked::new(TitleCandidate::new("Type here"), 3, false),
                Ranked::new(TitleCandidate::new("Remote"), 1, false),
                Ranked::new(TitleCandidate::new("Remote"), 0, false),
            ],
            thumbnails: vec![
                Ranked::new(ThumbnailCandidate::at(4.0), 2, false),
                Ranked::new(ThumbnailCandidate::at(4.0), 1, false),
            ],
        };

        let lists = build_lists(&branding, "Page", "Type here");

        let titles: Vec<_> = lists.titles.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(titles, ["Page", "Type here", "Remote"]);
        assert_eq!(lists.thumbnails.len(), BUILT_IN_COUNT + 1);
    }
}
