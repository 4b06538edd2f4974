//! reqwest-backed fetcher.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::traits::Fetcher;
use crate::error::FetchError;

/// Fetches event pages over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    http_client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
        }
    }

    /// Use a preconfigured client (proxies, user agent, timeouts).
    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let resp = self.http_client.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(transport)?;
        debug!(url, bytes = body.len(), "fetched event source");
        Ok(body)
    }
}
