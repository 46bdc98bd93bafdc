//! HTTP client for the Article Search API.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::models::{ErrorBody, SearchResponse, UpstreamArticle};
use super::window::DateWindow;
use crate::config::{ApiConfig, ApiKey};
use crate::error::{ConfigError, UpstreamError};

/// Endpoint path relative to the configured base URL.
pub const ENDPOINT: &str = "articlesearch.json";

/// One keyword search over a date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text query, forwarded as `q`.
    pub keyword: String,
    /// Inclusive publication date range.
    pub window: DateWindow,
}

/// Something that can run an article search.
///
/// Implemented by [`NyTimesClient`]; tests substitute canned sources.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Runs `query` and returns the matching documents newest first.
    ///
    /// # Errors
    ///
    /// Returns an [`UpstreamError`] on any non-2xx response or transport
    /// failure.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<UpstreamArticle>, UpstreamError>;
}

/// Client bound to a base URL and API key.
#[derive(Clone)]
pub struct NyTimesClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: ApiKey,
}

impl std::fmt::Debug for NyTimesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NyTimesClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl NyTimesClient {
    /// Builds a client from API settings and the credential.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the base URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ApiConfig, api_key: ApiKey) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|source| ConfigError::HttpClient { source })?;

        let endpoint = endpoint_url(&config.base_url)?;

        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    /// The resolved `articlesearch.json` URL, without credentials.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Resolves [`ENDPOINT`] against `base_url`, keeping any base path.
fn endpoint_url(base_url: &str) -> Result<Url, ConfigError> {
    let invalid = |e: url::ParseError| ConfigError::ValidationError {
        message: format!("Invalid api.base_url '{base_url}': {e}"),
    };

    let mut base = Url::parse(base_url).map_err(invalid)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(ENDPOINT).map_err(invalid)
}

#[async_trait]
impl ArticleSource for NyTimesClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<UpstreamArticle>, UpstreamError> {
        let begin_date = query.window.begin_param();
        let end_date = query.window.end_param();

        tracing::debug!(
            keyword = %query.keyword,
            begin_date = %begin_date,
            end_date = %end_date,
            "Searching articles"
        );

        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("api-key", self.api_key.expose()),
                ("q", query.keyword.as_str()),
                ("sort", "newest"),
                ("begin_date", begin_date.as_str()),
                ("end_date", end_date.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

            tracing::warn!(status = status.as_u16(), %message, "Article search failed");
            return Err(UpstreamError::status(status.as_u16(), message));
        }

        let body: SearchResponse = response.json().await?;
        tracing::debug!(docs = body.response.docs.len(), "Article search succeeded");

        Ok(body.response.docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BASE_URL;

    #[test]
    fn endpoint_keeps_base_path() {
        let url = endpoint_url(DEFAULT_BASE_URL).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.nytimes.com/svc/search/v2/articlesearch.json"
        );

        let url = endpoint_url("http://127.0.0.1:9000/svc/search/v2/").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/svc/search/v2/articlesearch.json"
        );

        let url = endpoint_url("http://127.0.0.1:9000").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/articlesearch.json");
    }

    #[test]
    fn endpoint_rejects_garbage() {
        assert!(endpoint_url("::not a url::").is_err());
    }

    #[test]
    fn debug_hides_api_key() {
        let client = NyTimesClient::new(&ApiConfig::default(), ApiKey::new("secret-key")).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("articlesearch.json"));
    }
}
