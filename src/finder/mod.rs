//! Asset finders.
//!
//! A finder turns a project plus a version selector into the list of
//! downloadable asset URLs. Each variant owns its construction-time fields
//! and performs at most a sequential chain of read-only GET requests.

mod direct;
mod factory;
mod github;
mod gitlab;
mod source;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{FindError, FindResult};

pub use direct::DirectFinder;
pub use factory::{FinderFactory, FinderSpec};
pub use github::{GITHUB_API_URL, GitHubAssetFinder, PAGE_SIZE};
pub use gitlab::{GITLAB_API_URL, GitLabAssetFinder};
pub use source::{GitHubSourceFinder, GitLabSourceFinder};

/// Wire prefix of an exact-tag selector.
pub const TAG_PREFIX: &str = "tags/";

/// Trait implemented by every finder variant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Finder: Send + Sync {
    /// Returns the asset URLs in the platform's listing order.
    ///
    /// An empty list is a valid result for a release without assets.
    async fn find(&self) -> FindResult<Vec<String>>;
}

/// Which release the caller wants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagSelector {
    /// Most recent release.
    Latest,
    /// A release whose tag equals (or, on GitHub fallback, contains) this string.
    Tag(String),
}

impl TagSelector {
    pub fn tag(name: impl Into<String>) -> Self {
        TagSelector::Tag(name.into())
    }

    /// The bare tag, if this is an exact-tag selector.
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            TagSelector::Latest => None,
            TagSelector::Tag(name) => Some(name),
        }
    }
}

impl fmt::Display for TagSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagSelector::Latest => write!(f, "latest"),
            TagSelector::Tag(name) => write!(f, "{}{}", TAG_PREFIX, name),
        }
    }
}

impl FromStr for TagSelector {
    type Err = FindError;

    /// Accepts exactly `latest` or `tags/<tag>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "latest" {
            return Ok(TagSelector::Latest);
        }
        match s.strip_prefix(TAG_PREFIX) {
            Some(name) => Ok(TagSelector::tag(name)),
            None => Err(FindError::InvalidTag(s.to_string())),
        }
    }
}

/// A release normalized from either platform's wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub tag: String,
    pub created_at: DateTime<Utc>,
    pub prerelease: bool,
    pub asset_urls: Vec<String>,
}

/// Inputs shared by both release-asset finders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseQuery {
    /// `owner/name` on GitHub; project path or numeric id on GitLab.
    pub repo: String,
    pub tag: TagSelector,
    pub prerelease: bool,
    /// Releases created before this are not an upgrade.
    pub min_time: DateTime<Utc>,
}

impl ReleaseQuery {
    pub fn new(repo: impl Into<String>, tag: TagSelector) -> Self {
        Self {
            repo: repo.into(),
            tag,
            prerelease: false,
            min_time: DateTime::<Utc>::MIN_UTC,
        }
    }

    pub fn prerelease(mut self, prerelease: bool) -> Self {
        self.prerelease = prerelease;
        self
    }

    pub fn min_time(mut self, min_time: DateTime<Utc>) -> Self {
        self.min_time = min_time;
        self
    }

    /// True when the pre-release "latest" must be resolved to a concrete tag first.
    pub(crate) fn wants_latest_prerelease(&self) -> bool {
        self.prerelease && self.tag == TagSelector::Latest
    }

    pub(crate) fn is_recent(&self, release: &Release) -> bool {
        release.created_at >= self.min_time
    }
}

/// Release-hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    GitHub,
    GitLab,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::GitHub => write!(f, "github"),
            Platform::GitLab => write!(f, "gitlab"),
        }
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(Platform::GitHub),
            "gitlab" => Ok(Platform::GitLab),
            _ => anyhow::bail!("Unknown platform: {}. Expected github or gitlab.", s),
        }
    }
}

/// Parses a response body, keeping the URL for the diagnostic.
pub(crate) fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> FindResult<T> {
    serde_json::from_slice(body).map_err(|source| FindError::Decode {
        url: url.to_string(),
        source,
    })
}
