//! reqwest-backed [`Transport`] with retry on transient failures.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;

use super::retry::{MAX_RETRIES, RETRY_DELAY_MS, is_retryable_status};
use super::{HttpResponse, Transport};
use crate::config::HttpConfig;

/// HTTP client with built-in retry logic for network operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
    retry_delay: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self::with_config(client, HttpConfig::default())
    }

    /// Wraps an existing reqwest Client; `config` only supplies auth headers.
    pub fn with_config(client: Client, config: HttpConfig) -> Self {
        Self {
            client,
            config,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// Builds a reqwest Client with the configured user agent and timeout.
    pub fn from_config(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_config(client, config))
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Single GET attempt without retry.
    async fn get_once(&self, url: &str) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        if let Some((name, value)) = self.config.auth_header(url) {
            request = request.header(name, value);
        }

        let response = request.send().await.context("Failed to send request")?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .context("Failed to read response body")?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl Transport for HttpClient {
    /// Retries send failures and 5xx responses. The last response is returned
    /// as-is once attempts run out, so callers still see the real status.
    #[tracing::instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!("GET {}...", url);

        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.get_once(url).await {
                Ok(response) if !is_retryable_status(response.status) => return Ok(response),
                Ok(response) if attempt == MAX_RETRIES => return Ok(response),
                Ok(response) => {
                    warn!(
                        "GET {}: attempt {}/{} returned {}, retrying in {:?}...",
                        url, attempt, MAX_RETRIES, response.status_text, self.retry_delay
                    );
                }
                Err(e) if attempt == MAX_RETRIES => return Err(e),
                Err(e) => {
                    warn!(
                        "GET {}: attempt {}/{} failed ({}), retrying in {:?}...",
                        url, attempt, MAX_RETRIES, e, self.retry_delay
                    );
                    last_error = Some(e);
                }
            }
            tokio::time::sleep(self.retry_delay).await;
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("GET {}: failed after {} attempts", url, MAX_RETRIES)))
    }
}
