// Data models

pub mod chat;
pub mod compatibility;
pub mod quota;

pub use chat::{ChatMessage, ChatMode, Feedback, FocusMode, Role};
pub use compatibility::{CompatibilityReport, CompatibilityScore};
pub use quota::UsageSnapshot;
