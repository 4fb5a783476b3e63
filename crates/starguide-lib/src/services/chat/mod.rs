// Chat pipeline services
// Feature: Chart Chat Assistant (014-chart-chat)

pub mod normalizer;
pub mod rate_limit;
pub mod session;
pub mod suggestions;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::api::types::{DailyChatRequest, SendMessageRequest, UsageInfo};
use crate::api::{ApiError, ApiResult, ChatBackend};
use crate::models::chat::{ChatMessage, ChatMode, Feedback, FocusMode};

use super::notification::{NotificationCenter, NotificationKind};
use super::quota::QuotaTracker;

pub use rate_limit::{RateLimitGate, RATE_LIMIT_WINDOW_SECS};
pub use session::{Generation, SessionLog, SessionPhase, PAGE_SIZE};

/// Gate key for the chat send affordance
const CHAT_FEATURE: &str = "chat";

/// One chat surface: owns the session log and composes the backend,
/// cooldown gate, notifications, and quota tracking
///
/// All awaits happen outside the log lock; results are committed through
/// the generation-guarded methods so a chart/mode switch mid-flight makes
/// the late result a no-op.
pub struct ChatService {
    backend: Arc<dyn ChatBackend>,
    log: RwLock<SessionLog>,
    gate: RateLimitGate,
    notifications: NotificationCenter,
    quota: Option<Arc<QuotaTracker>>,
    timezone: String,
}

impl ChatService {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            log: RwLock::new(SessionLog::new()),
            gate: RateLimitGate::new(),
            notifications: NotificationCenter::new(),
            quota: None,
            timezone: "UTC".to_string(),
        }
    }

    /// IANA timezone seeding daily sessions
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_quota(mut self, quota: Arc<QuotaTracker>) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn gate(&self) -> &RateLimitGate {
        &self.gate
    }

    // =========================================================================
    // State accessors
    // =========================================================================

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.log.read().await.messages().to_vec()
    }

    pub async fn session_id(&self) -> Option<String> {
        self.log.read().await.session_id().map(|s| s.to_string())
    }

    pub async fn phase(&self) -> SessionPhase {
        self.log.read().await.phase()
    }

    pub async fn moon_sign(&self) -> Option<String> {
        self.log.read().await.moon_sign().map(|s| s.to_string())
    }

    pub async fn has_more(&self) -> bool {
        self.log.read().await.has_more()
    }

    pub async fn can_send(&self) -> bool {
        self.log.read().await.can_send()
    }

    /// Suggested questions rendered immediately, before history arrives
    pub fn starter_suggestions() -> Vec<String> {
        suggestions::extract("", "")
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Switch surface to a (chart, mode) pair; clears state synchronously
    /// and returns the generation to pass into `initialize`
    pub async fn select_chart(&self, chart_id: &str, mode: ChatMode) -> Generation {
        self.log.write().await.select(chart_id, mode)
    }

    /// Clear history and session identity on user request
    pub async fn clear_history(&self) {
        self.log.write().await.clear();
    }

    /// Initialize the selected surface
    pub async fn initialize(&self, generation: Generation) -> ApiResult<()> {
        let (chart_id, mode) = {
            let log = self.log.read().await;
            if !log.is_current(generation) {
                return Ok(());
            }
            match log.chart_id() {
                Some(id) => (id.to_string(), log.mode()),
                None => return Err(ApiError::InvalidConfig("no chart selected".to_string())),
            }
        };

        log::debug!("[chat] initializing {} session for chart {}", mode, chart_id);
        match mode {
            ChatMode::Daily => self.initialize_daily(generation, chart_id).await,
            ChatMode::Analysis => self.initialize_analysis(generation, chart_id).await,
        }
    }

    /// Daily mode: one idempotent call fetches or creates the day's session
    async fn initialize_daily(&self, generation: Generation, chart_id: String) -> ApiResult<()> {
        let request = DailyChatRequest {
            chart_id,
            message: None,
            date: Some(Utc::now().format("%Y-%m-%d").to_string()),
            timezone: Some(self.timezone.clone()),
            skip_intro: Some(true),
            session_id: None,
        };

        match self.backend.daily_chat(request).await {
            Ok(reply) => {
                let mut log = self.log.write().await;
                if !log.is_current(generation) {
                    return Ok(());
                }
                log.commit_moon_sign(generation, reply.moon_sign);
                if let Some(session_id) = reply.session_id {
                    log.commit_session(generation, session_id);
                }
                match reply.history {
                    Some(history) if !history.is_empty() => {
                        log.commit_history(generation, history);
                    }
                    _ => {
                        // fresh day session: seed the one-shot response if any
                        if let Some(response) = reply.response {
                            let message = assistant_from_reply(
                                &response,
                                None,
                                reply.analysis,
                                reply.suggestions,
                            );
                            log.commit_assistant(generation, message);
                        } else {
                            log.finish_initialize(generation);
                        }
                    }
                }
                Ok(())
            }
            Err(err) => self.fail_initialize(generation, err).await,
        }
    }

    /// Analysis mode: session creation is required before any send; history
    /// loads afterwards without blocking the surface
    async fn initialize_analysis(
        &self,
        generation: Generation,
        chart_id: String,
    ) -> ApiResult<()> {
        let created = match self.backend.create_analysis_session(&chart_id).await {
            Ok(created) => created,
            Err(err) => return self.fail_initialize(generation, err).await,
        };

        let session_id = {
            let mut log = self.log.write().await;
            if !log.commit_session(generation, created.session_id.clone()) {
                return Ok(());
            }
            created.session_id
        };

        // A history failure keeps the session usable; it only surfaces a
        // notice and the user can keep chatting.
        match self
            .backend
            .get_session_history(&session_id, 0, PAGE_SIZE)
            .await
        {
            Ok(page) => {
                self.log.write().await.commit_history(generation, page.history);
                Ok(())
            }
            Err(err) => {
                self.notifications
                    .publish(NotificationKind::InitializationFailed, err.to_string());
                Ok(())
            }
        }
    }

    async fn fail_initialize(&self, generation: Generation, err: ApiError) -> ApiResult<()> {
        self.log.write().await.fail_initialize(generation);
        if let Some(secs) = err.retry_after() {
            self.gate.trigger(CHAT_FEATURE, secs);
        } else {
            self.notifications
                .publish(NotificationKind::InitializationFailed, err.to_string());
        }
        Err(err)
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Send a chat message
    ///
    /// The user message is appended optimistically before dispatch and stays
    /// in the log on failure; a rate-limit reply starts the cooldown gate
    /// instead of a notification.
    pub async fn send_message(&self, text: &str, focus: FocusMode) -> ApiResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::InvalidConfig("message is empty".to_string()));
        }
        if self.gate.is_limited(CHAT_FEATURE) {
            return Err(ApiError::RateLimited {
                retry_after_secs: self.gate.remaining_secs(CHAT_FEATURE),
            });
        }

        let (generation, mode, chart_id, session_id) = {
            let mut log = self.log.write().await;
            if !log.can_send() {
                return Err(ApiError::InvalidConfig(
                    "chat surface is not ready".to_string(),
                ));
            }
            let mode = log.mode();
            let chart_id = log.chart_id().map(|s| s.to_string());
            let session_id = log.session_id().map(|s| s.to_string());
            let generation = log.begin_send(text);
            (generation, mode, chart_id, session_id)
        };

        let outcome = match mode {
            ChatMode::Analysis => self
                .backend
                .send_analysis_message(SendMessageRequest {
                    message: text.to_string(),
                    session_id,
                    focus_mode: focus.as_str().to_string(),
                })
                .await
                .map(|reply| ReplyParts {
                    raw: reply.response,
                    message_id: reply.message_id,
                    session_id: reply.session_id,
                    analysis: reply.analysis,
                    suggestions: reply.suggestions,
                    usage: reply.usage,
                    moon_sign: None,
                }),
            ChatMode::Daily => self
                .backend
                .daily_chat(DailyChatRequest {
                    // can_send guarantees a chart in daily mode
                    chart_id: chart_id.unwrap_or_default(),
                    message: Some(text.to_string()),
                    date: None,
                    timezone: None,
                    skip_intro: Some(true),
                    session_id,
                })
                .await
                .and_then(|reply| {
                    let raw = reply.response.ok_or_else(|| {
                        ApiError::ParseError("daily reply missing response".to_string())
                    })?;
                    Ok(ReplyParts {
                        raw,
                        message_id: None,
                        session_id: reply.session_id,
                        analysis: reply.analysis,
                        suggestions: reply.suggestions,
                        usage: None,
                        moon_sign: Some(reply.moon_sign),
                    })
                }),
        };

        match outcome {
            Ok(parts) => {
                let message = assistant_from_reply(
                    &parts.raw,
                    parts.message_id,
                    parts.analysis,
                    parts.suggestions,
                );
                {
                    let mut log = self.log.write().await;
                    if let Some(session_id) = parts.session_id {
                        log.commit_session(generation, session_id);
                    }
                    if let Some(moon_sign) = parts.moon_sign {
                        log.commit_moon_sign(generation, moon_sign);
                    }
                    log.commit_assistant(generation, message);
                }
                if let (Some(quota), Some(usage)) = (self.quota.as_ref(), parts.usage.as_ref()) {
                    if let Err(err) = quota.apply_usage(usage) {
                        log::warn!("[chat] failed to persist usage snapshot: {}", err);
                    }
                }
                Ok(())
            }
            Err(err) => {
                self.log.write().await.finish_send(generation);
                if let Some(secs) = err.retry_after() {
                    self.gate.trigger(CHAT_FEATURE, secs);
                } else {
                    self.notifications
                        .publish(NotificationKind::SendFailed, err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Record feedback on the message at `index`; first call wins
    pub async fn set_feedback(&self, index: usize, feedback: Feedback) -> bool {
        self.log.write().await.set_feedback(index, feedback)
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Load the next older history page; no-op when not applicable
    pub async fn load_older(&self) -> ApiResult<()> {
        let params = self.log.write().await.begin_load_older();
        let Some((generation, session_id, offset)) = params else {
            return Ok(());
        };

        match self
            .backend
            .get_session_history(&session_id, offset, PAGE_SIZE)
            .await
        {
            Ok(page) => {
                self.log.write().await.commit_older(generation, page.history);
                Ok(())
            }
            Err(err) => {
                self.log.write().await.fail_load_older(generation);
                if let Some(secs) = err.retry_after() {
                    self.gate.trigger(CHAT_FEATURE, secs);
                } else {
                    self.notifications
                        .publish(NotificationKind::PaginationFailed, err.to_string());
                }
                Err(err)
            }
        }
    }
}

struct ReplyParts {
    raw: String,
    message_id: Option<String>,
    session_id: Option<String>,
    analysis: Option<String>,
    suggestions: Option<Vec<String>>,
    usage: Option<UsageInfo>,
    moon_sign: Option<String>,
}

/// Assemble a display message from a raw reply: analysis and suggestions
/// are extracted against the raw text before normalization discards them
fn assistant_from_reply(
    raw: &str,
    message_id: Option<String>,
    analysis: Option<String>,
    suggestions_field: Option<Vec<String>>,
) -> ChatMessage {
    let analysis = analysis
        .filter(|a| !a.trim().is_empty())
        .or_else(|| normalizer::extract_analysis(raw));
    let content = normalizer::normalize(raw);
    let suggestions = match suggestions_field {
        Some(list) if !list.is_empty() => suggestions::dedup_truncate(list),
        _ => suggestions::extract(raw, &content),
    };
    ChatMessage::assistant(message_id, content, analysis, Some(suggestions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    use crate::api::types::{
        AnalysisReply, City, DailyChatRequest, DailyReply, HistoryEntry, HistoryPage,
        SendMessageRequest, SessionCreated,
    };
    use crate::models::chat::Role;

    struct MockBackend {
        fail_create: bool,
        send_error: Mutex<Option<ApiError>>,
        daily_gate: Option<Arc<Notify>>,
        history: Mutex<Vec<HistoryEntry>>,
        reply: String,
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self {
                fail_create: false,
                send_error: Mutex::new(None),
                daily_gate: None,
                history: Mutex::new(Vec::new()),
                reply: "<response>All is well</response>".to_string(),
            }
        }
    }

    impl MockBackend {
        fn with_reply(mut self, reply: &str) -> Self {
            self.reply = reply.to_string();
            self
        }

        fn with_send_error(self, err: ApiError) -> Self {
            *self.send_error.lock().unwrap() = Some(err);
            self
        }

        fn with_history(self, entries: Vec<HistoryEntry>) -> Self {
            *self.history.lock().unwrap() = entries;
            self
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn create_analysis_session(&self, _chart_id: &str) -> ApiResult<SessionCreated> {
            if self.fail_create {
                return Err(ApiError::ApiError("backend down".to_string()));
            }
            Ok(SessionCreated {
                session_id: "sess-1".to_string(),
            })
        }

        async fn get_session_history(
            &self,
            _session_id: &str,
            _offset: usize,
            _limit: usize,
        ) -> ApiResult<HistoryPage> {
            Ok(HistoryPage {
                history: self.history.lock().unwrap().clone(),
            })
        }

        async fn send_analysis_message(
            &self,
            _request: SendMessageRequest,
        ) -> ApiResult<AnalysisReply> {
            if let Some(err) = self.send_error.lock().unwrap().take() {
                return Err(err);
            }
            Ok(AnalysisReply {
                response: self.reply.clone(),
                session_id: Some("sess-1".to_string()),
                message_id: Some("m-1".to_string()),
                analysis: None,
                suggestions: None,
                usage: Some(UsageInfo {
                    used: Some(1),
                    limit: Some(50),
                }),
            })
        }

        async fn daily_chat(&self, _request: DailyChatRequest) -> ApiResult<DailyReply> {
            if let Some(gate) = &self.daily_gate {
                gate.notified().await;
            }
            Ok(DailyReply {
                moon_sign: "Cancer".to_string(),
                session_id: Some("daily-1".to_string()),
                history: None,
                response: Some("A calm day for reflection.".to_string()),
                analysis: None,
                suggestions: None,
            })
        }

        async fn search_cities(&self, _query: &str) -> ApiResult<Vec<City>> {
            Ok(Vec::new())
        }
    }

    fn history_entries(range: std::ops::Range<usize>) -> Vec<HistoryEntry> {
        range
            .map(|i| HistoryEntry {
                id: Some(format!("h{}", i)),
                role: "assistant".to_string(),
                content: format!("entry {}", i),
                analysis: None,
                suggestions: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_analysis_initialize_and_send() {
        let backend = Arc::new(MockBackend::default().with_reply(
            "<response>Mars favors bold moves <analysis>mars in aries</analysis></response>",
        ));
        let service = ChatService::new(backend);

        let generation = service.select_chart("chart-1", ChatMode::Analysis).await;
        service.initialize(generation).await.unwrap();
        assert_eq!(service.session_id().await.as_deref(), Some("sess-1"));
        assert!(service.can_send().await);

        service
            .send_message("What about my career?", FocusMode::Career)
            .await
            .unwrap();

        let messages = service.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What about my career?");

        let reply = &messages[1];
        assert_eq!(reply.content, "Mars favors bold moves");
        assert_eq!(reply.analysis.as_deref(), Some("mars in aries"));
        assert_eq!(reply.id.as_deref(), Some("m-1"));
        assert_eq!(reply.suggestions.as_ref().map(|s| s.len()), Some(3));
    }

    #[tokio::test]
    async fn test_session_creation_failure_disables_sending() {
        let backend = Arc::new(MockBackend {
            fail_create: true,
            ..Default::default()
        });
        let service = ChatService::new(backend);
        let mut rx = service.notifications().subscribe();

        let generation = service.select_chart("chart-1", ChatMode::Analysis).await;
        assert!(service.initialize(generation).await.is_err());
        assert_eq!(service.phase().await, SessionPhase::Uninitialized);
        assert!(!service.can_send().await);

        let err = service
            .send_message("hello", FocusMode::General)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfig(_)));

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.kind, NotificationKind::InitializationFailed);
    }

    #[tokio::test]
    async fn test_rate_limited_send_starts_gate() {
        let backend = Arc::new(MockBackend::default().with_send_error(ApiError::RateLimited {
            retry_after_secs: 42,
        }));
        let service = ChatService::new(backend);
        let mut rx = service.notifications().subscribe();

        let generation = service.select_chart("chart-1", ChatMode::Analysis).await;
        service.initialize(generation).await.unwrap();

        let err = service
            .send_message("hello", FocusMode::General)
            .await
            .unwrap_err();
        assert!(err.is_rate_limit());

        assert!(service.gate().is_limited("chat"));
        // routed to the gate, not the toast channel
        assert!(rx.try_recv().is_err());
        // optimistic message stays, surface is retryable
        assert_eq!(service.messages().await.len(), 1);
        assert_eq!(service.phase().await, SessionPhase::Ready);

        // while gated, sends are refused before hitting the network
        let err = service
            .send_message("again", FocusMode::General)
            .await
            .unwrap_err();
        assert!(err.is_rate_limit());
        assert_eq!(service.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_keeps_optimistic_and_notifies() {
        let backend = Arc::new(MockBackend::default().with_send_error(ApiError::Timeout));
        let service = ChatService::new(backend);
        let mut rx = service.notifications().subscribe();

        let generation = service.select_chart("chart-1", ChatMode::Analysis).await;
        service.initialize(generation).await.unwrap();
        assert!(service.send_message("hello", FocusMode::General).await.is_err());

        let messages = service.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.kind, NotificationKind::SendFailed);
    }

    #[tokio::test]
    async fn test_daily_initialize_seeds_one_shot() {
        let backend = Arc::new(MockBackend::default());
        let service = ChatService::new(backend).with_timezone("Asia/Kolkata");

        let generation = service.select_chart("chart-1", ChatMode::Daily).await;
        service.initialize(generation).await.unwrap();

        assert_eq!(service.moon_sign().await.as_deref(), Some("Cancer"));
        assert_eq!(service.session_id().await.as_deref(), Some("daily-1"));
        let messages = service.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "A calm day for reflection.");
        assert!(service.can_send().await);
    }

    #[tokio::test]
    async fn test_stale_initialize_discarded_after_switch() {
        let notify = Arc::new(Notify::new());
        let backend = Arc::new(MockBackend {
            daily_gate: Some(notify.clone()),
            ..Default::default()
        });
        let service = Arc::new(ChatService::new(backend));

        let first_generation = service.select_chart("chart-1", ChatMode::Daily).await;
        let task = {
            let service = service.clone();
            tokio::spawn(async move { service.initialize(first_generation).await })
        };
        tokio::task::yield_now().await;

        // switch while the first initialization is in flight
        service.select_chart("chart-2", ChatMode::Daily).await;
        notify.notify_one();
        task.await.unwrap().unwrap();

        // the late result never lands
        assert!(service.session_id().await.is_none());
        assert!(service.messages().await.is_empty());
        assert!(service.moon_sign().await.is_none());
        assert_eq!(service.phase().await, SessionPhase::Initializing);
    }

    #[tokio::test]
    async fn test_load_older_grows_log() {
        let backend =
            Arc::new(MockBackend::default().with_history(history_entries(0..PAGE_SIZE)));
        let service = ChatService::new(backend);

        let generation = service.select_chart("chart-1", ChatMode::Analysis).await;
        service.initialize(generation).await.unwrap();
        assert_eq!(service.messages().await.len(), PAGE_SIZE);
        assert!(service.has_more().await);

        service.load_older().await.unwrap();
        assert_eq!(service.messages().await.len(), 2 * PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_starter_suggestions_available_immediately() {
        let starters = ChatService::starter_suggestions();
        assert_eq!(starters.len(), 3);
    }
}
