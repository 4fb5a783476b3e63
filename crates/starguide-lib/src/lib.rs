// StarGuide shared library
// Headless client core for the StarGuide astrology app: chat pipeline
// (normalization, sessions, pagination, rate limiting), compatibility
// merging, city search, favorites/quota persistence, and notifications.

pub mod api;
pub mod models;
pub mod services;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiErrorCode, ApiResult, ChatBackend};
pub use models::chat::{ChatMessage, ChatMode, Feedback, FocusMode, Role};
pub use services::chat::ChatService;
