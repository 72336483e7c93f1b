//! HTTP transport used by the release finders.
//!
//! Finders only ever see the [`Transport`] trait, so tests can swap in a mock
//! and embedders can bring their own client.

mod client;
mod retry;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

pub use client::HttpClient;
pub use retry::{MAX_RETRIES, RETRY_DELAY_MS, is_retryable_status};

/// A fully-read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Status line text, e.g. "404 Not Found".
    pub status_text: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let reason = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason());
        let status_text = match reason {
            Some(reason) => format!("{} {}", status, reason),
            None => status.to_string(),
        };
        Self {
            status,
            status_text,
            body: body.into(),
        }
    }

    /// Only 200 counts as success for the release APIs.
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND.as_u16()
    }
}

/// The single network capability finders depend on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a GET request and reads the whole body.
    ///
    /// Returns `Ok` for every HTTP status; `Err` only when the request could
    /// not be sent or the body could not be read.
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}
