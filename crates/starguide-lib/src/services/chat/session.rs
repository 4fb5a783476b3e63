// Chat session state machine
// Feature: Chart Chat Assistant (014-chart-chat)
//
// Owns the per-(chart, mode) message log, session identity, and pagination
// state. Every asynchronous operation captures the generation counter up
// front and commits through the `commit_*` methods, which discard results
// from a superseded context; switching chart or mode clears state
// synchronously and bumps the generation before any new fetch starts.

use crate::api::types::HistoryEntry;
use crate::models::chat::{ChatMessage, ChatMode, Feedback, Role};

use super::normalizer;
use super::suggestions;

/// History page size for incremental loading
pub const PAGE_SIZE: usize = 20;

/// Liveness token for asynchronous commits
pub type Generation = u64;

/// Lifecycle phase of the chat surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Initializing,
    Ready,
    Sending,
}

/// Per-surface session state
pub struct SessionLog {
    chart_id: Option<String>,
    mode: ChatMode,
    session_id: Option<String>,
    messages: Vec<ChatMessage>,
    phase: SessionPhase,
    moon_sign: Option<String>,
    has_more: bool,
    loading_more: bool,
    generation: Generation,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            chart_id: None,
            mode: ChatMode::Analysis,
            session_id: None,
            messages: Vec::new(),
            phase: SessionPhase::Uninitialized,
            moon_sign: None,
            has_more: false,
            loading_more: false,
            generation: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn chart_id(&self) -> Option<&str> {
        self.chart_id.as_deref()
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn moon_sign(&self) -> Option<&str> {
        self.moon_sign.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    /// Sends are allowed only with a live session in Ready phase
    pub fn can_send(&self) -> bool {
        self.phase == SessionPhase::Ready
            && match self.mode {
                ChatMode::Analysis => self.session_id.is_some(),
                ChatMode::Daily => self.chart_id.is_some(),
            }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Switch to a new (chart, mode) pair
    ///
    /// Clears the message log, session id, and moon-sign cache synchronously
    /// and bumps the generation so in-flight results from the previous
    /// context are discarded at commit time.
    pub fn select(&mut self, chart_id: impl Into<String>, mode: ChatMode) -> Generation {
        self.chart_id = Some(chart_id.into());
        self.mode = mode;
        self.session_id = None;
        self.messages.clear();
        self.moon_sign = None;
        self.has_more = false;
        self.loading_more = false;
        self.phase = SessionPhase::Initializing;
        self.generation += 1;
        self.generation
    }

    /// Clear history on user request: log and session identity are dropped,
    /// the surface returns to Uninitialized until re-initialized
    pub fn clear(&mut self) -> Generation {
        self.session_id = None;
        self.messages.clear();
        self.has_more = false;
        self.loading_more = false;
        self.phase = SessionPhase::Uninitialized;
        self.generation += 1;
        self.generation
    }

    // =========================================================================
    // Commits (generation-guarded)
    // =========================================================================

    /// Record the backend-assigned session id; surface becomes Ready
    pub fn commit_session(&mut self, generation: Generation, session_id: String) -> bool {
        if !self.is_current(generation) {
            log::debug!("[session] discarding session id from superseded context");
            return false;
        }
        self.session_id = Some(session_id);
        self.phase = SessionPhase::Ready;
        true
    }

    /// Replace the log with freshly fetched initial history
    pub fn commit_history(&mut self, generation: Generation, entries: Vec<HistoryEntry>) -> bool {
        if !self.is_current(generation) {
            log::debug!("[session] discarding history from superseded context");
            return false;
        }
        let count = entries.len();
        self.messages = ingest_entries(entries);
        self.has_more = count >= PAGE_SIZE;
        self.phase = SessionPhase::Ready;
        true
    }

    pub fn commit_moon_sign(&mut self, generation: Generation, moon_sign: String) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.moon_sign = Some(moon_sign);
        true
    }

    /// Append an assistant message; no-op for a superseded context
    pub fn commit_assistant(&mut self, generation: Generation, message: ChatMessage) -> bool {
        if !self.is_current(generation) {
            log::debug!("[session] discarding reply from superseded context");
            return false;
        }
        self.messages.push(message);
        self.phase = SessionPhase::Ready;
        true
    }

    /// Initialization failed: back to Uninitialized so a reselect retries
    pub fn fail_initialize(&mut self, generation: Generation) {
        if self.is_current(generation) {
            self.phase = SessionPhase::Uninitialized;
        }
    }

    /// Mark initialization finished without history (fresh session)
    pub fn finish_initialize(&mut self, generation: Generation) {
        if self.is_current(generation) && self.phase == SessionPhase::Initializing {
            self.phase = SessionPhase::Ready;
        }
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Append the optimistic user message synchronously before dispatch so
    /// it always orders before the eventual reply
    pub fn begin_send(&mut self, text: &str) -> Generation {
        self.messages.push(ChatMessage::user(text));
        self.phase = SessionPhase::Sending;
        self.generation
    }

    /// Send settled without a committed reply; the optimistic message stays
    pub fn finish_send(&mut self, generation: Generation) {
        if self.is_current(generation) && self.phase == SessionPhase::Sending {
            self.phase = SessionPhase::Ready;
        }
    }

    /// Record feedback on a message by index; idempotent (first call wins)
    pub fn set_feedback(&mut self, index: usize, feedback: Feedback) -> bool {
        match self.messages.get_mut(index) {
            Some(message) if message.role == Role::Assistant => message.set_feedback(feedback),
            _ => false,
        }
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Guarded start of an older-history load
    ///
    /// Returns the request parameters, or `None` when there is no chart, no
    /// session, or a load is already in flight.
    pub fn begin_load_older(&mut self) -> Option<(Generation, String, usize)> {
        if self.chart_id.is_none() || self.loading_more {
            return None;
        }
        let session_id = self.session_id.clone()?;
        self.loading_more = true;
        Some((self.generation, session_id, self.messages.len()))
    }

    /// Prepend an older page in its returned order; already-loaded messages
    /// keep their relative order
    pub fn commit_older(&mut self, generation: Generation, entries: Vec<HistoryEntry>) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.loading_more = false;
        let returned = entries.len();
        let mut older = ingest_entries(entries);
        older.append(&mut self.messages);
        self.messages = older;
        self.has_more = returned >= PAGE_SIZE;
        true
    }

    /// Pagination failed: log and `has_more` stay untouched
    pub fn fail_load_older(&mut self, generation: Generation) {
        if self.is_current(generation) {
            self.loading_more = false;
        }
    }
}

/// Map raw history entries to display messages: system entries are dropped,
/// assistant content is normalized exactly like live replies (extraction
/// against the raw text first, since normalization is lossy)
pub fn ingest_entries(entries: Vec<HistoryEntry>) -> Vec<ChatMessage> {
    entries
        .into_iter()
        .filter_map(|entry| match entry.role.as_str() {
            "user" => Some(ChatMessage {
                id: entry.id,
                role: Role::User,
                content: entry.content.trim().to_string(),
                analysis: None,
                suggestions: None,
                feedback: None,
                timestamp: None,
            }),
            "assistant" => {
                let analysis = entry
                    .analysis
                    .filter(|a| !a.trim().is_empty())
                    .or_else(|| normalizer::extract_analysis(&entry.content));
                let content = normalizer::normalize(&entry.content);
                let suggestions = match entry.suggestions {
                    Some(list) if !list.is_empty() => Some(suggestions::dedup_truncate(list)),
                    _ => None,
                };
                Some(ChatMessage {
                    id: entry.id,
                    role: Role::Assistant,
                    content,
                    analysis,
                    suggestions,
                    feedback: None,
                    timestamp: None,
                })
            }
            _ => None,
        })
        .collect()
}
