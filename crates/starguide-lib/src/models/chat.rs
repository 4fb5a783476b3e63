// Chat data models
// Feature: Chart Chat Assistant (014-chart-chat)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a chat message
///
/// `system` entries returned by the backend are filtered out during
/// ingestion and never reach this enum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// User feedback on an assistant message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Like,
    Dislike,
}

/// Chat surface mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// On-demand chart interpretation
    Analysis,
    /// Transit-based daily forecast chat
    Daily,
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatMode::Analysis => write!(f, "analysis"),
            ChatMode::Daily => write!(f, "daily"),
        }
    }
}

/// Topic filter sent with analysis-mode messages to bias response content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FocusMode {
    #[default]
    General,
    Career,
    Relationships,
    Wealth,
    Health,
    Timing,
}

impl FocusMode {
    /// Wire value sent as `focus_mode` with analysis messages
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusMode::General => "general",
            FocusMode::Career => "career",
            FocusMode::Relationships => "relationships",
            FocusMode::Wealth => "wealth",
            FocusMode::Health => "health",
            FocusMode::Timing => "timing",
        }
    }
}

/// A single message in a session's log
///
/// `id` is backend-assigned once the message is persisted; optimistic local
/// messages carry none until the backend acknowledges them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    /// Normalized display text (post-cleaning)
    pub content: String,
    /// Raw reasoning text from an `<analysis>` wrapper, shown on request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    /// Follow-up question suggestions, deduplicated in first-seen order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Create an optimistic user message (no id until persisted)
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::User,
            content: content.into(),
            analysis: None,
            suggestions: None,
            feedback: None,
            timestamp: Some(Utc::now()),
        }
    }

    /// Create an assistant message from normalized reply parts
    pub fn assistant(
        id: Option<String>,
        content: impl Into<String>,
        analysis: Option<String>,
        suggestions: Option<Vec<String>>,
    ) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: content.into(),
            analysis,
            suggestions,
            feedback: None,
            timestamp: Some(Utc::now()),
        }
    }

    /// Record feedback; only the first call takes effect (unset -> set)
    pub fn set_feedback(&mut self, feedback: Feedback) -> bool {
        if self.feedback.is_some() {
            return false;
        }
        self.feedback = Some(feedback);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_has_no_id() {
        let msg = ChatMessage::user("What does my chart say about career?");
        assert!(msg.id.is_none());
        assert_eq!(msg.role, Role::User);
        assert!(msg.timestamp.is_some());
    }

    #[test]
    fn test_feedback_set_once() {
        let mut msg = ChatMessage::assistant(Some("m1".to_string()), "Hi", None, None);
        assert!(msg.set_feedback(Feedback::Like));
        assert!(!msg.set_feedback(Feedback::Dislike));
        assert_eq!(msg.feedback, Some(Feedback::Like));
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_chat_mode_display() {
        assert_eq!(ChatMode::Analysis.to_string(), "analysis");
        assert_eq!(ChatMode::Daily.to_string(), "daily");
    }

    #[test]
    fn test_focus_mode_default() {
        assert_eq!(FocusMode::default(), FocusMode::General);
        let json = serde_json::to_string(&FocusMode::Career).unwrap();
        assert_eq!(json, "\"career\"");
    }
}
