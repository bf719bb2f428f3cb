use std::str::FromStr;

use indexmap::IndexMap;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

/// Message keys the picker needs resolved for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, EnumIter)]
pub enum MessageKey {
    OriginalTitle,
    TypeYourOwnTitleHere,
    #[strum(serialize = "chooseDescriptive")]
    ChooseDescriptive,
    Vote,
}

impl MessageKey {
    fn default_text(self) -> &'static str {
        match self {
            MessageKey::OriginalTitle => "Original Title",
            MessageKey::TypeYourOwnTitleHere => "Type your own title here",
            MessageKey::ChooseDescriptive => {
                "Choose the title and thumbnail that best describe the video"
            }
            MessageKey::Vote => "Vote",
        }
    }
}

pub trait Localizer {
    fn message(&self, key: MessageKey) -> String;
}

#[derive(Debug, Clone)]
pub struct MessageCatalog {
    entries: IndexMap<MessageKey, String>,
}

impl MessageCatalog {
    /// Builds a catalog from config overrides. Unknown keys are dropped with
    /// a warning so a stale config never prevents startup.
    pub fn with_overrides(overrides: &IndexMap<String, String>) -> Self {
        let mut catalog = Self::default();
        for (raw_key, text) in overrides {
            match MessageKey::from_str(raw_key) {
                Ok(key) => {
                    catalog.entries.insert(key, text.clone());
                }
                Err(_) => {
                    tracing::warn!(key = %raw_key, "unknown message key in config, ignoring");
                }
            }
        }
        catalog
    }

    pub fn keys(&self) -> impl Iterator<Item = &MessageKey> {
        self.entries.keys()
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let entries = MessageKey::iter()
            .map(|key| (key, key.default_text().to_string()))
            .collect();
        Self { entries }
    }
}

impl Localizer for MessageCatalog {
    fn message(&self, key: MessageKey) -> String {
        self.entries
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.default_text().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_defaults_and_skip_unknown_keys() {
        let mut overrides = IndexMap::new();
        overrides.insert("Vote".to_string(), "Submit".to_string());
        overrides.insert("NoSuchKey".to_string(), "ignored".to_string());

        let catalog = MessageCatalog::with_overrides(&overrides);
        assert_eq!(catalog.message(MessageKey::Vote), "Submit");
        assert_eq!(
            catalog.message(MessageKey::OriginalTitle),
            "Original Title"
        );
        assert_eq!(catalog.keys().count(), 4);
    }

    #[test]
    fn keys_parse_from_their_message_names() {
        assert_eq!(
            MessageKey::from_str("chooseDescriptive").ok(),
            Some(MessageKey::ChooseDescriptive)
        );
        assert_eq!(MessageKey::TypeYourOwnTitleHere.as_ref(), "TypeYourOwnTitleHere");
    }
}
