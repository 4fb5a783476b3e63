// Backend API module
// Feature: Chart Chat Assistant (014-chart-chat)

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorCode, ApiResult};
pub use types::{
    AnalysisReply, City, DailyChatRequest, DailyReply, HistoryEntry, HistoryPage,
    SendMessageRequest, SessionCreated, UsageInfo,
};

/// Trait for the chat backend
/// The production implementation is `ApiClient`; tests substitute mocks.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Create an analysis session for a chart; required before analysis sends
    async fn create_analysis_session(&self, chart_id: &str) -> ApiResult<SessionCreated>;

    /// Fetch a page of session history
    async fn get_session_history(
        &self,
        session_id: &str,
        offset: usize,
        limit: usize,
    ) -> ApiResult<HistoryPage>;

    /// Send an analysis-mode chat message
    async fn send_analysis_message(&self, request: SendMessageRequest)
        -> ApiResult<AnalysisReply>;

    /// Fetch or create the day's transit chat session, optionally sending
    /// a message in the same call
    async fn daily_chat(&self, request: DailyChatRequest) -> ApiResult<DailyReply>;

    /// Geocode a city name prefix
    async fn search_cities(&self, query: &str) -> ApiResult<Vec<City>>;
}
