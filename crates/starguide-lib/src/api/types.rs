// Backend wire types
// Feature: Chart Chat Assistant (014-chart-chat)
//
// Request/response shapes of the StarGuide REST backend. The backend speaks
// snake_case JSON; optional fields are omitted when absent.

use serde::{Deserialize, Serialize};

/// Response to creating an analysis chat session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
}

/// One raw history entry as returned by the backend, before role filtering
/// and content normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
}

/// A page of session history
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HistoryPage {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Request body for an analysis-mode chat message
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub focus_mode: String,
}

/// Token usage reported by the backend alongside a reply
#[derive(Debug, Clone, Deserialize)]
pub struct UsageInfo {
    #[serde(default)]
    pub used: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Reply to an analysis-mode chat message
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisReply {
    pub response: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub usage: Option<UsageInfo>,
}

/// Request body for the daily (transit) chat endpoint
#[derive(Debug, Clone, Serialize)]
pub struct DailyChatRequest {
    pub chart_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// ISO date (YYYY-MM-DD) seeding the day's session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// IANA timezone name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Suppress auto-generation of a greeting on session creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_intro: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Reply from the daily chat endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DailyReply {
    pub moon_sign: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
}

/// A geocoded city from the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct City {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Error body shape the backend uses for non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct BackendError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub retry_after: Option<u64>,
}
