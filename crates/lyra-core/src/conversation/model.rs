//! Conversation domain models.
//!
//! The backend owns conversation data; the client holds an ordered list view
//! of summaries plus, for the loaded conversation, the full message history.

use super::message::ChatMessage;
use serde::{Deserialize, Serialize};

/// Placeholder shown for conversations without a title.
pub const DEFAULT_CONVERSATION_TITLE: &str = "Conversa";

/// A conversation as it appears in the sidebar list (no messages).
///
/// Ordering is server-defined; the client never re-sorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Backend-assigned identifier. Id equality (not reference identity)
    /// determines which conversation is active.
    pub id: i64,
    /// Human-readable title; may be absent.
    #[serde(default)]
    pub title: Option<String>,
    /// Creation timestamp (RFC 3339, as sent by the backend).
    pub created_at: String,
    /// Last-update timestamp (RFC 3339); falls back to `created_at`.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ConversationSummary {
    /// Title to display, falling back to the placeholder.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => DEFAULT_CONVERSATION_TITLE,
        }
    }

    /// Timestamp to display: last update when known, creation otherwise.
    pub fn display_timestamp(&self) -> &str {
        self.updated_at.as_deref().unwrap_or(&self.created_at)
    }
}

/// A fully loaded conversation: summary fields plus the ordered message
/// history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Append-only message history, oldest first.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    /// The list-view summary of this conversation.
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_title_falls_back_to_placeholder() {
        let mut summary = ConversationSummary {
            id: 1,
            title: None,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: None,
        };
        assert_eq!(summary.display_title(), DEFAULT_CONVERSATION_TITLE);

        summary.title = Some(String::new());
        assert_eq!(summary.display_title(), DEFAULT_CONVERSATION_TITLE);

        summary.title = Some("Plano de estudos".to_string());
        assert_eq!(summary.display_title(), "Plano de estudos");
    }

    #[test]
    fn conversation_deserializes_without_messages() {
        let conv: Conversation = serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Revisão",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-02T00:00:00Z"
        }))
        .unwrap();
        assert!(conv.messages.is_empty());
        assert_eq!(conv.summary().display_title(), "Revisão");
    }
}
