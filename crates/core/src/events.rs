//! # Pipeline Events
//!
//! Artifact keys, stream events, and the collected result bundle.
//!
//! An [`Artifact`](ArtifactKey) is a named output of one pipeline run,
//! produced at most once. A [`StreamEvent`] republishes an artifact (or
//! a terminal marker) to a streaming consumer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of artifacts a pipeline run can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKey {
    ConversationLog,
    RawSearchResults,
    DirectGenOutline,
    StormGenOutline,
    UrlToInfo,
    StormGenArticle,
    StormGenArticlePolished,
}

impl ArtifactKey {
    /// All keys, in the order the pipeline produces them.
    pub const ALL: [ArtifactKey; 7] = [
        ArtifactKey::ConversationLog,
        ArtifactKey::RawSearchResults,
        ArtifactKey::DirectGenOutline,
        ArtifactKey::StormGenOutline,
        ArtifactKey::UrlToInfo,
        ArtifactKey::StormGenArticle,
        ArtifactKey::StormGenArticlePolished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKey::ConversationLog => "conversation_log",
            ArtifactKey::RawSearchResults => "raw_search_results",
            ArtifactKey::DirectGenOutline => "direct_gen_outline",
            ArtifactKey::StormGenOutline => "storm_gen_outline",
            ArtifactKey::UrlToInfo => "url_to_info",
            ArtifactKey::StormGenArticle => "storm_gen_article",
            ArtifactKey::StormGenArticlePolished => "storm_gen_article_polished",
        }
    }
}

/// Phase tag of a [`StreamEvent`]: an artifact key, or a terminal marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    ConversationLog,
    RawSearchResults,
    DirectGenOutline,
    StormGenOutline,
    UrlToInfo,
    StormGenArticle,
    StormGenArticlePolished,
    Complete,
    Error,
}

impl Phase {
    /// Whether this phase terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Complete | Phase::Error)
    }
}

impl From<ArtifactKey> for Phase {
    fn from(key: ArtifactKey) -> Self {
        match key {
            ArtifactKey::ConversationLog => Phase::ConversationLog,
            ArtifactKey::RawSearchResults => Phase::RawSearchResults,
            ArtifactKey::DirectGenOutline => Phase::DirectGenOutline,
            ArtifactKey::StormGenOutline => Phase::StormGenOutline,
            ArtifactKey::UrlToInfo => Phase::UrlToInfo,
            ArtifactKey::StormGenArticle => Phase::StormGenArticle,
            ArtifactKey::StormGenArticlePolished => Phase::StormGenArticlePolished,
        }
    }
}

/// A tagged update emitted during a streaming run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEvent {
    /// What this update carries.
    pub phase: Phase,
    /// Payload: the artifact value, `true` for complete, or an error message.
    pub content: Value,
}

impl StreamEvent {
    /// An artifact update.
    pub fn artifact(key: ArtifactKey, content: Value) -> Self {
        Self {
            phase: key.into(),
            content,
        }
    }

    /// The success terminator.
    pub fn complete() -> Self {
        Self {
            phase: Phase::Complete,
            content: Value::Bool(true),
        }
    }

    /// The failure terminator, carrying the failure description.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Error,
            content: Value::String(message.into()),
        }
    }
}

/// Everything one pipeline run produced.
///
/// Every field is optional: an artifact whose stage was skipped by the
/// request flags is absent from the serialized bundle, never a null or
/// empty-string placeholder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_log: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_search_results: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_gen_outline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storm_gen_outline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_to_info: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storm_gen_article: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storm_gen_article_polished: Option<String>,
}

impl ResultBundle {
    /// Store an artifact under its key. Textual artifacts keep their
    /// string form; structured ones keep the JSON value.
    pub fn insert(&mut self, key: ArtifactKey, content: Value) {
        match key {
            ArtifactKey::ConversationLog => self.conversation_log = Some(content),
            ArtifactKey::RawSearchResults => self.raw_search_results = Some(content),
            ArtifactKey::UrlToInfo => self.url_to_info = Some(content),
            ArtifactKey::DirectGenOutline => self.direct_gen_outline = Some(as_text(content)),
            ArtifactKey::StormGenOutline => self.storm_gen_outline = Some(as_text(content)),
            ArtifactKey::StormGenArticle => self.storm_gen_article = Some(as_text(content)),
            ArtifactKey::StormGenArticlePolished => {
                self.storm_gen_article_polished = Some(as_text(content))
            }
        }
    }

    /// The article to stream: polished if present and non-empty,
    /// otherwise the unpolished article.
    pub fn streamable_article(&self) -> Option<&str> {
        self.storm_gen_article_polished
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.storm_gen_article.as_deref())
    }
}

fn as_text(content: Value) -> String {
    match content {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phase_serializes_snake_case() {
        let event = StreamEvent::artifact(ArtifactKey::StormGenOutline, json!("## Outline"));
        let encoded = serde_json::to_value(&event).unwrap();
        assert_eq!(encoded["phase"], "storm_gen_outline");
        assert_eq!(encoded["content"], "## Outline");
    }

    #[test]
    fn test_key_names_agree_with_wire_format() {
        for key in ArtifactKey::ALL {
            let encoded = serde_json::to_value(key).unwrap();
            assert_eq!(encoded, key.as_str());
            assert!(!Phase::from(key).is_terminal());
        }
    }

    #[test]
    fn test_bundle_accepts_every_key() {
        let mut bundle = ResultBundle::default();
        for key in ArtifactKey::ALL {
            bundle.insert(key, json!("x"));
        }
        let encoded = serde_json::to_value(&bundle).unwrap();
        let map = encoded.as_object().unwrap();
        for key in ArtifactKey::ALL {
            assert!(map.contains_key(key.as_str()), "missing {}", key.as_str());
        }
    }

    #[test]
    fn test_terminal_phases() {
        assert!(StreamEvent::complete().phase.is_terminal());
        assert!(StreamEvent::error("boom").phase.is_terminal());
        assert!(!Phase::UrlToInfo.is_terminal());
    }

    #[test]
    fn test_skipped_stage_is_absent_not_null() {
        let mut bundle = ResultBundle::default();
        bundle.insert(ArtifactKey::StormGenArticle, json!("body"));
        let encoded = serde_json::to_value(&bundle).unwrap();
        let map = encoded.as_object().unwrap();
        assert!(map.contains_key("storm_gen_article"));
        assert!(!map.contains_key("storm_gen_article_polished"));
    }

    #[test]
    fn test_streamable_article_falls_back_on_empty_polish() {
        let mut bundle = ResultBundle::default();
        bundle.insert(ArtifactKey::StormGenArticle, json!("draft"));
        bundle.insert(ArtifactKey::StormGenArticlePolished, json!(""));
        assert_eq!(bundle.streamable_article(), Some("draft"));
    }
}
