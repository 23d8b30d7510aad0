use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;
use crate::models::FetchedDocument;
use crate::traits::DocumentFetcher;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// HTTP document fetcher backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Every request made through this fetcher is cut off after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let request_error = |source: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(request_error)?;

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(FetchedDocument { status, body })
    }
}

/// Fetches `url` and turns a non-success status into [`FetchError::Status`].
///
/// # Returns
/// * `Result<String, FetchError>` - The body of a 2xx response
pub async fn fetch_success(fetcher: &dyn DocumentFetcher, url: &str) -> Result<String, FetchError> {
    let document = fetcher.fetch(url).await?;
    if document.is_success() {
        Ok(document.body)
    } else {
        Err(FetchError::Status {
            url: url.to_string(),
            status: document.status,
        })
    }
}
