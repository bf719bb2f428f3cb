use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for VideoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A selectable title. Two titles are the same candidate when their text
/// matches exactly; `is_original` is presentation only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleCandidate {
    pub text: String,
    #[serde(default)]
    pub is_original: bool,
}

impl TitleCandidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_original: false,
        }
    }

    pub fn original(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_original: true,
        }
    }

    pub fn same_key(&self, other: &TitleCandidate) -> bool {
        self.text == other.text
    }
}

impl PartialEq for TitleCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.same_key(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ThumbnailCandidate {
    Original,
    CurrentFrame,
    AtTimestamp { timestamp: f64 },
}

impl ThumbnailCandidate {
    pub fn at(timestamp: f64) -> Self {
        ThumbnailCandidate::AtTimestamp { timestamp }
    }

    pub fn kind(&self) -> ThumbnailKind {
        match self {
            ThumbnailCandidate::Original => ThumbnailKind::Original,
            ThumbnailCandidate::CurrentFrame => ThumbnailKind::CurrentFrame,
            ThumbnailCandidate::AtTimestamp { .. } => ThumbnailKind::AtTimestamp,
        }
    }

    pub fn timestamp(&self) -> Option<f64> {
        match self {
            ThumbnailCandidate::AtTimestamp { timestamp } => Some(*timestamp),
            _ => None,
        }
    }

    pub fn is_original(&self) -> bool {
        matches!(self, ThumbnailCandidate::Original)
    }
}

impl fmt::Display for ThumbnailCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThumbnailCandidate::Original => f.write_str("original"),
            ThumbnailCandidate::CurrentFrame => f.write_str("current frame"),
            ThumbnailCandidate::AtTimestamp { timestamp } => write!(f, "@{timestamp}s"),
        }
    }
}

/// Variant tag of a thumbnail, used as the persisted discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ThumbnailKind {
    Original,
    CurrentFrame,
    AtTimestamp,
}

/// A remote candidate together with its community ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub candidate: T,
    pub votes: i64,
    pub locked: bool,
}

impl<T> Ranked<T> {
    pub fn new(candidate: T, votes: i64, locked: bool) -> Self {
        Self {
            candidate,
            votes,
            locked,
        }
    }
}

pub type RankedTitleCandidate = Ranked<TitleCandidate>;
pub type RankedThumbnailCandidate = Ranked<ThumbnailCandidate>;

/// Everything the remote ranking source knows about one video.
#[derive(Debug, Clone, Default)]
pub struct BrandingResult {
    pub titles: Vec<RankedTitleCandidate>,
    pub thumbnails: Vec<RankedThumbnailCandidate>,
}

impl BrandingResult {
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.thumbnails.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn title_equality_ignores_original_flag() {
        assert_eq!(TitleCandidate::original("Hello"), TitleCandidate::new("Hello"));
        assert_ne!(TitleCandidate::new("Hello"), TitleCandidate::new("hello"));
    }

    #[test]
    fn thumbnail_equality_uses_variant_and_timestamp() {
        assert_eq!(ThumbnailCandidate::at(12.5), ThumbnailCandidate::at(12.5));
        assert_ne!(ThumbnailCandidate::at(12.5), ThumbnailCandidate::at(12.0));
        assert_ne!(ThumbnailCandidate::Original, ThumbnailCandidate::CurrentFrame);
    }

    #[test]
    fn thumbnail_kind_round_trips_through_its_tag() {
        let tag: &'static str = ThumbnailKind::AtTimestamp.into();
        assert_eq!(tag, "at-timestamp");
        assert_eq!(
            ThumbnailKind::from_str("current-frame").ok(),
            Some(ThumbnailKind::CurrentFrame)
        );
    }
}
