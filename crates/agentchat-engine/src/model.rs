//! Conversation and message types shared by every backend.
//!
//! These mirror the records the agent service hands back. Fields the client
//! does not understand are carried along untouched so that a round trip
//! through `update_conversation` never loses data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name shown for conversations that have not been titled yet.
pub const DEFAULT_CONVERSATION_NAME: &str = "New Chat";

/// Number of characters of the first message used as a conversation title.
pub const TITLE_PREVIEW_CHARS: usize = 50;

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the person at the keyboard.
    User,
    /// Reply produced by the agent.
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message. Its position in the conversation is its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Free-form conversation metadata. Only `name` has meaning to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationMetadata {
    /// Metadata carrying only a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            extra: Map::new(),
        }
    }

    /// Overlay `other` onto `self`: its name wins when set and its extra
    /// keys replace ours.
    pub fn merge(&mut self, other: ConversationMetadata) {
        if other.name.is_some() {
            self.name = other.name;
        }
        self.extra.extend(other.extra);
    }
}

/// A named thread of messages persisted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub metadata: ConversationMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation record.
    pub fn new(id: impl Into<String>, metadata: ConversationMetadata) -> Self {
        Self {
            id: id.into(),
            agent_name: None,
            metadata,
            created_date: Some(Utc::now()),
            messages: Vec::new(),
        }
    }

    /// Name to show in lists and headers. Missing or empty names fall back
    /// to [`DEFAULT_CONVERSATION_NAME`].
    pub fn display_name(&self) -> &str {
        match self.metadata.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_CONVERSATION_NAME,
        }
    }

    /// Creation date formatted like `Mar 5, 2024`, or empty when unknown.
    pub fn created_label(&self) -> String {
        self.created_date
            .map(|date| date.format("%b %-d, %Y").to_string())
            .unwrap_or_default()
    }
}

/// A live-update push: the full message list of one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationUpdate {
    pub conversation_id: String,
    pub messages: Vec<Message>,
}

/// Build a conversation title from its first message.
///
/// Messages longer than [`TITLE_PREVIEW_CHARS`] characters are cut and get
/// a trailing `...`.
pub fn title_from_message(message: &str) -> String {
    if message.chars().count() > TITLE_PREVIEW_CHARS {
        let mut title: String = message.chars().take(TITLE_PREVIEW_CHARS).collect();
        title.push_str("...");
        title
    } else {
        message.to_string()
    }
}

/// Case-insensitive substring filter over conversation display names.
pub fn filter_conversations<'a>(
    conversations: &'a [Conversation],
    query: &str,
) -> Vec<&'a Conversation> {
    let needle = query.to_lowercase();
    conversations
        .iter()
        .filter(|conv| conv.display_name().to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn conv(id: &str, name: Option<&str>) -> Conversation {
        let metadata = ConversationMetadata {
            name: name.map(String::from),
            extra: Map::new(),
        };
        Conversation::new(id, metadata)
    }

    #[test]
    fn test_display_name_defaults() {
        assert_eq!(conv("a", None).display_name(), "New Chat");
        assert_eq!(conv("b", Some("")).display_name(), "New Chat");
        assert_eq!(conv("c", Some("Trip plans")).display_name(), "Trip plans");
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let convs = vec![
            conv("1", Some("Rust Lifetimes")),
            conv("2", Some("Dinner ideas")),
            conv("3", Some("rusty bikes")),
        ];
        let ids: Vec<&str> = filter_conversations(&convs, "RUST")
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_filter_matches_unnamed_as_new_chat() {
        let convs = vec![conv("1", None), conv("2", Some("Budget"))];
        let hits = filter_conversations(&convs, "new ch");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn test_filter_empty_query_keeps_order() {
        let convs = vec![conv("1", Some("b")), conv("2", Some("a"))];
        let ids: Vec<&str> = filter_conversations(&convs, "")
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_title_from_short_message() {
        assert_eq!(title_from_message("Hello there"), "Hello there");
        let exact = "x".repeat(TITLE_PREVIEW_CHARS);
        assert_eq!(title_from_message(&exact), exact);
    }

    #[test]
    fn test_title_from_long_message() {
        let long = "a".repeat(80);
        let title = title_from_message(&long);
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let long = "é".repeat(60);
        let title = title_from_message(&long);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_created_label() {
        let mut c = conv("1", None);
        c.created_date = Some(Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap());
        assert_eq!(c.created_label(), "Mar 5, 2024");
        c.created_date = None;
        assert_eq!(c.created_label(), "");
    }

    #[test]
    fn test_metadata_merge_keeps_extra_keys() {
        let mut meta: ConversationMetadata =
            serde_json::from_str(r#"{"name":"Old","pinned":true}"#).unwrap();
        meta.merge(ConversationMetadata::named("New"));
        assert_eq!(meta.name.as_deref(), Some("New"));
        assert_eq!(meta.extra.get("pinned"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_conversation_deserializes_backend_shape() {
        let json = r#"{
            "id": "c1",
            "agent_name": "ai_chat_assistant",
            "metadata": {"name": "Hello"},
            "created_date": "2024-01-02T03:04:05Z",
            "messages": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "**hey**"}
            ]
        }"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conv.display_name(), "Hello");
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_conversation_without_messages_field() {
        let conv: Conversation = serde_json::from_str(r#"{"id":"c2"}"#).unwrap();
        assert!(conv.messages.is_empty());
        assert_eq!(conv.display_name(), "New Chat");
    }
}
