//! Error types returned by asset finders.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::http::HttpResponse;

/// Result type alias for finder operations.
pub type FindResult<T> = Result<T, FindError>;

/// Everything that can go wrong while resolving asset URLs.
///
/// Every variant is terminal for a single `find()` call.
#[derive(Debug, Error)]
pub enum FindError {
    /// The transport failed to send the request or read the body.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),

    /// The response body was not the JSON shape we expected.
    #[error("Failed to parse JSON response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    GitLab(#[from] GitLabError),

    /// The selector matched a release that is not newer than the caller's floor.
    #[error("requested release is not more recent than current version")]
    NoUpgrade,

    /// No release tag contains the requested substring.
    #[error("no matching tag for '{tag}'")]
    NoMatchingTag { tag: String },

    /// The release listing came back empty.
    #[error("no releases found")]
    NoReleases,

    /// Resolving the newest pre-release to a concrete tag failed.
    #[error("pre-release finder: {0}")]
    PreRelease(#[source] Box<FindError>),

    /// A selector string that is neither `latest` nor `tags/<tag>`.
    #[error("asset finder: invalid tag format: {0}")]
    InvalidTag(String),
}

impl FindError {
    /// Returns true for the "already up to date" sentinel.
    pub fn is_no_upgrade(&self) -> bool {
        matches!(self, FindError::NoUpgrade)
    }

    pub(crate) fn pre_release(err: FindError) -> Self {
        FindError::PreRelease(Box::new(err))
    }
}

/// Error body returned by the GitHub API.
#[derive(Deserialize, Debug, Default)]
struct GitHubErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    documentation_url: String,
}

/// Non-success response from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubError {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
    pub url: String,
}

impl GitHubError {
    pub fn from_response(response: HttpResponse, url: &str) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text,
            body: response.body,
            url: url.to_string(),
        }
    }
}

impl fmt::Display for GitHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 403 is rate limiting or missing permissions; the body explains which.
        if self.status == 403 {
            let msg: GitHubErrorBody = serde_json::from_slice(&self.body).unwrap_or_default();
            return write!(
                f,
                "{}: {}: {}",
                self.status_text, msg.message, msg.documentation_url
            );
        }
        write!(f, "{} (URL: {})", self.status_text, self.url)
    }
}

impl std::error::Error for GitHubError {}

/// Non-success response from the GitLab API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLabError {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
    pub url: String,
}

impl GitLabError {
    pub fn from_response(response: HttpResponse, url: &str) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text,
            body: response.body,
            url: url.to_string(),
        }
    }
}

impl fmt::Display for GitLabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (URL: {})", self.status_text, self.url)
    }
}

impl std::error::Error for GitLabError {}
