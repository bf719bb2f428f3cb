use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::candidate::{BrandingResult, Ranked, ThumbnailCandidate, TitleCandidate, VideoId};

/// Supplies community-ranked candidates for a video.
pub trait RankingSource {
    fn fetch(&self, video_id: &VideoId) -> Result<BrandingResult>;
}

/// Supplies the title currently shown by the page hosting the video.
pub trait PageTitleSource {
    fn page_title(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticPageTitle(pub Option<String>);

impl PageTitleSource for StaticPageTitle {
    fn page_title(&self) -> Option<String> {
        self.0
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RemoteTitle {
    title: String,
    #[serde(default)]
    votes: i64,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    original: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct RemoteThumbnail {
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    original: bool,
    #[serde(default)]
    votes: i64,
    #[serde(default)]
    locked: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RemoteBranding {
    titles: Vec<RemoteTitle>,
    thumbnails: Vec<RemoteThumbnail>,
}

impl RemoteBranding {
    fn into_result(self, video_id: &VideoId) -> BrandingResult {
        let titles = self
            .titles
            .into_iter()
            .map(|t| {
                let candidate = TitleCandidate {
                    text: t.title,
                    is_original: t.original,
                };
                Ranked::new(candidate, t.votes, t.locked)
            })
            .collect();
        let thumbnails = self
            .thumbnails
            .into_iter()
            .filter_map(|t| {
                let candidate = match (t.original, t.timestamp) {
                    (true, _) => ThumbnailCandidate::Original,
                    (false, Some(timestamp)) => ThumbnailCandidate::at(timestamp),
                    (false, None) => {
                        tracing::warn!(%video_id, "skipping remote thumbnail without timestamp");
                        return None;
                    }
                };
                Some(Ranked::new(candidate, t.votes, t.locked))
            })
            .collect();
        BrandingResult { titles, thumbnails }
    }
}

/// Branding data read from a JSON document keyed by video id.
#[derive(Debug, Clone, Default)]
pub struct BrandingFile {
    videos: HashMap<String, RemoteBranding>,
}

impl BrandingFile {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("reading branding file {}", path.display()))?;
        Self::from_slice(&raw)
            .with_context(|| format!("parsing branding file {}", path.display()))
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let videos: HashMap<String, RemoteBranding> =
            serde_json::from_slice(raw).context("decoding branding json")?;
        Ok(Self { videos })
    }
}

impl RankingSource for BrandingFile {
    fn fetch(&self, video_id: &VideoId) -> Result<BrandingResult> {
        let branding = self
            .videos
            .get(video_id.as_str())
            .cloned()
            .unwrap_or_default()
            .into_result(video_id);
        tracing::debug!(
            %video_id,
            titles = branding.titles.len(),
            thumbnails = branding.thumbnails.len(),
            "fetched branding"
        );
        Ok(branding)
    }
}
