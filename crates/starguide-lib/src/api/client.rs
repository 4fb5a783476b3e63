// Backend HTTP client
// Feature: Chart Chat Assistant (014-chart-chat)
//
// Thin reqwest client over the StarGuide REST backend. Rate-limit replies
// (HTTP 429 or a body code of RATE_LIMITED) are mapped to a dedicated
// error variant so the caller can route them to the cooldown gate.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::DEFAULT_RETRY_AFTER_SECS;
use super::types::{
    AnalysisReply, BackendError, City, DailyChatRequest, DailyReply, HistoryPage,
    SendMessageRequest, SessionCreated,
};
use super::{ApiError, ApiResult, ChatBackend};

/// HTTP client for the StarGuide backend
#[derive(Debug)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Ok(Self {
            base_url: Self::parse_base(base_url)?,
            client: Client::new(),
            api_key: None,
        })
    }

    pub fn with_api_key(base_url: &str, api_key: impl Into<String>) -> ApiResult<Self> {
        Ok(Self {
            base_url: Self::parse_base(base_url)?,
            client: Client::new(),
            api_key: Some(api_key.into()),
        })
    }

    /// Parse the base url, normalizing the path to end in `/` so endpoint
    /// joins stay under it
    fn parse_base(raw: &str) -> ApiResult<Url> {
        let mut normalized = raw.trim_end_matches('/').to_string();
        normalized.push('/');
        Url::parse(&normalized)
            .map_err(|e| ApiError::InvalidConfig(format!("invalid base url {:?}: {}", raw, e)))
    }

    fn api_url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidConfig(format!("invalid endpoint {:?}: {}", path, e)))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.api_url(path)?;
        let mut request = self.client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = self.api_url(path)?;
        let mut request = self.client.get(url).query(query);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();

        if !status.is_success() {
            let retry_after_header = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());

            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_failure(status, retry_after_header, &body));
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            log::warn!("[api] failed to decode backend response: {}", e);
            ApiError::ParseError(e.to_string())
        })?;
        Ok(parsed)
    }

    fn map_failure(status: StatusCode, retry_after_header: Option<u64>, body: &str) -> ApiError {
        let backend_error = serde_json::from_str::<BackendError>(body).ok();
        let code = backend_error
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .unwrap_or("");
        let message = backend_error
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| format!("Backend error ({}): {}", status, body));

        if status == StatusCode::TOO_MANY_REQUESTS || code == "RATE_LIMITED" {
            let retry_after_secs = retry_after_header
                .or(backend_error.as_ref().and_then(|e| e.retry_after))
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return ApiError::RateLimited { retry_after_secs };
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::AuthFailed(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::ApiError(message),
        }
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn create_analysis_session(&self, chart_id: &str) -> ApiResult<SessionCreated> {
        #[derive(Serialize)]
        struct CreateSessionRequest<'a> {
            chart_id: &'a str,
        }

        log::debug!("[api] creating analysis session for chart {}", chart_id);
        self.post_json("/chat/sessions", &CreateSessionRequest { chart_id })
            .await
    }

    async fn get_session_history(
        &self,
        session_id: &str,
        offset: usize,
        limit: usize,
    ) -> ApiResult<HistoryPage> {
        self.get_json(
            &format!("/chat/sessions/{}/history", session_id),
            &[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn send_analysis_message(
        &self,
        request: SendMessageRequest,
    ) -> ApiResult<AnalysisReply> {
        self.post_json("/chat/messages", &request).await
    }

    async fn daily_chat(&self, request: DailyChatRequest) -> ApiResult<DailyReply> {
        self.post_json("/chat/daily", &request).await
    }

    async fn search_cities(&self, query: &str) -> ApiResult<Vec<City>> {
        self.get_json("/geo/cities", &[("q", query.to_string())])
            .await
    }
}
