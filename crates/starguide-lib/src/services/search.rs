// Debounced city search
// Feature: Birth Chart Creation (011-birth-chart)
//
// Text-driven geocoding calls debounce at a fixed delay and suppress
// queries under the minimum length. A newer query bumps the generation so
// an older sleeper returns without hitting the network.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api::types::City;
use crate::api::{ApiResult, ChatBackend};

use super::notification::{NotificationCenter, NotificationKind};

/// Debounce delay for city search keystrokes
pub const SEARCH_DEBOUNCE_MS: u64 = 500;
/// Queries shorter than this never reach the network
pub const MIN_QUERY_LEN: usize = 3;

/// Debounced front door to the geocoding endpoint
pub struct CitySearch {
    backend: Arc<dyn ChatBackend>,
    notifications: Option<Arc<NotificationCenter>>,
    generation: AtomicU64,
    delay: Duration,
}

impl CitySearch {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            notifications: None,
            generation: AtomicU64::new(0),
            delay: Duration::from_millis(SEARCH_DEBOUNCE_MS),
        }
    }

    /// Surface search failures as transient notifications
    pub fn with_notifications(mut self, notifications: Arc<NotificationCenter>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    #[cfg(test)]
    fn with_delay(backend: Arc<dyn ChatBackend>, delay: Duration) -> Self {
        Self {
            backend,
            notifications: None,
            generation: AtomicU64::new(0),
            delay,
        }
    }

    /// Search after the debounce window
    ///
    /// Returns `Ok(None)` for suppressed queries: too short, or superseded
    /// by a newer call before (or while) the request ran.
    pub async fn search(&self, query: &str) -> ApiResult<Option<Vec<City>>> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_LEN {
            return Ok(None);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return Ok(None);
        }

        let cities = match self.backend.search_cities(trimmed).await {
            Ok(cities) => cities,
            Err(err) => {
                if let Some(notifications) = &self.notifications {
                    notifications.publish(NotificationKind::SearchFailed, err.to_string());
                }
                return Err(err);
            }
        };
        if self.generation.load(Ordering::SeqCst) != generation {
            return Ok(None);
        }
        Ok(Some(cities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    use crate::api::types::{
        AnalysisReply, DailyChatRequest, DailyReply, HistoryPage, SendMessageRequest,
        SessionCreated,
    };
    use crate::api::ApiError;

    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatBackend for CountingBackend {
        async fn create_analysis_session(&self, _: &str) -> ApiResult<SessionCreated> {
            Err(ApiError::ApiError("unused".to_string()))
        }

        async fn get_session_history(
            &self,
            _: &str,
            _: usize,
            _: usize,
        ) -> ApiResult<HistoryPage> {
            Err(ApiError::ApiError("unused".to_string()))
        }

        async fn send_analysis_message(
            &self,
            _: SendMessageRequest,
        ) -> ApiResult<AnalysisReply> {
            Err(ApiError::ApiError("unused".to_string()))
        }

        async fn daily_chat(&self, _: DailyChatRequest) -> ApiResult<DailyReply> {
            Err(ApiError::ApiError("unused".to_string()))
        }

        async fn search_cities(&self, query: &str) -> ApiResult<Vec<City>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![City {
                name: query.to_string(),
                country: "IN".to_string(),
                latitude: 0.0,
                longitude: 0.0,
                timezone: None,
            }])
        }
    }

    fn backend() -> Arc<CountingBackend> {
        Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_short_query_suppressed() {
        let counting = backend();
        let search = CitySearch::with_delay(counting.clone(), Duration::from_millis(1));
        assert!(search.search("de").await.unwrap().is_none());
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_passes_after_delay() {
        let counting = backend();
        let search = CitySearch::with_delay(counting.clone(), Duration::from_millis(500));
        let result = search.search("delhi").await.unwrap();
        assert_eq!(result.unwrap()[0].name, "delhi");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_query_suppressed() {
        let counting = backend();
        let search = Arc::new(CitySearch::with_delay(
            counting.clone(),
            Duration::from_millis(500),
        ));

        let first = {
            let search = search.clone();
            tokio::spawn(async move { search.search("del").await })
        };
        // let the first call register its generation and start sleeping
        tokio::task::yield_now().await;

        let second = search.search("delhi").await.unwrap();
        assert_eq!(second.unwrap()[0].name, "delhi");

        let first = first.await.unwrap().unwrap();
        assert!(first.is_none());
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    struct FailingBackend;

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn create_analysis_session(&self, _: &str) -> ApiResult<SessionCreated> {
            Err(ApiError::ApiError("unused".to_string()))
        }

        async fn get_session_history(
            &self,
            _: &str,
            _: usize,
            _: usize,
        ) -> ApiResult<HistoryPage> {
            Err(ApiError::ApiError("unused".to_string()))
        }

        async fn send_analysis_message(
            &self,
            _: SendMessageRequest,
        ) -> ApiResult<AnalysisReply> {
            Err(ApiError::ApiError("unused".to_string()))
        }

        async fn daily_chat(&self, _: DailyChatRequest) -> ApiResult<DailyReply> {
            Err(ApiError::ApiError("unused".to_string()))
        }

        async fn search_cities(&self, _: &str) -> ApiResult<Vec<City>> {
            Err(ApiError::Timeout)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_notifies() {
        let center = Arc::new(NotificationCenter::new());
        let mut rx = center.subscribe();
        let search = CitySearch::with_delay(Arc::new(FailingBackend), Duration::from_millis(500))
            .with_notifications(center);

        assert!(search.search("delhi").await.is_err());

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.kind, NotificationKind::SearchFailed);
    }
}
