// Service Module

pub mod chat;
pub mod compatibility;
pub mod favorites;
pub mod notification;
pub mod quota;
pub mod search;
pub mod store;

pub use chat::ChatService;
pub use compatibility::MatchOutcome;
pub use favorites::Favorites;
pub use notification::{Notification, NotificationCenter, NotificationKind};
pub use quota::QuotaTracker;
pub use search::CitySearch;
pub use store::{LocalStore, StoreError};
