//! HTTP statement fetcher.
//!
//! Entity configurations are served at `{entity}/.well-known/openid-federation`.
//! Subordinate statements are requested from the authority's
//! `federation_fetch_endpoint` (published in its configuration metadata)
//! with the subject as the `sub` query parameter.

use std::time::Duration;

use async_trait::async_trait;

use crate::entity::EntityId;
use crate::error::FetchError;
use crate::statement::EntityStatement;

use super::StatementFetcher;

const WELL_KNOWN_PATH: &str = "/.well-known/openid-federation";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetcher that retrieves statements over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default per-request timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("openid-federation/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Use a preconfigured client (proxies, custom roots, ...).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The well-known configuration URL of an entity.
    pub fn configuration_url(entity: &EntityId) -> String {
        format!("{}{}", entity.as_str().trim_end_matches('/'), WELL_KNOWN_PATH)
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        log::debug!("GET {url} {query:?}");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await.map_err(map_reqwest_error)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(FetchError::InvalidResponse(format!("empty body from {url}")));
        }
        Ok(body.to_string())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}

#[async_trait]
impl StatementFetcher for HttpFetcher {
    async fn fetch_configuration_statement(
        &self,
        entity: &EntityId,
    ) -> Result<String, FetchError> {
        self.get(&Self::configuration_url(entity), &[]).await
    }

    async fn fetch_subordinate_statement(
        &self,
        authority: &EntityId,
        subject: &EntityId,
    ) -> Result<String, FetchError> {
        let config = self.fetch_configuration_statement(authority).await?;
        let config = EntityStatement::parse(&config)
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
        let endpoint = config.federation_fetch_endpoint().ok_or_else(|| {
            FetchError::InvalidResponse(format!(
                "{authority} publishes no federation_fetch_endpoint"
            ))
        })?;
        self.get(endpoint, &[("sub", subject.as_str())]).await
    }
}
