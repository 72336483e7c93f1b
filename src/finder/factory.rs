//! Finder factory.
//!
//! Picks exactly one finder variant for a request, the way a caller would
//! from a project's configured platform and URL pattern.

use std::sync::Arc;

use super::{
    DirectFinder, Finder, GITHUB_API_URL, GITLAB_API_URL, GitHubAssetFinder, GitHubSourceFinder,
    GitLabAssetFinder, GitLabSourceFinder, Platform, ReleaseQuery,
};
use crate::config::HttpConfig;
use crate::http::Transport;

/// What the caller wants resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinderSpec {
    /// A literal download URL.
    Direct { url: String },
    /// The platform's generated source tarball for a tag.
    Source {
        platform: Platform,
        tool: String,
        repo: String,
        tag: String,
    },
    /// Assets attached to a release.
    Assets {
        platform: Platform,
        query: ReleaseQuery,
    },
}

/// Creates finders that share one transport.
pub struct FinderFactory {
    transport: Arc<dyn Transport>,
    github_api_url: String,
    gitlab_api_url: String,
}

impl FinderFactory {
    /// Uses the public github.com and gitlab.com APIs.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            github_api_url: GITHUB_API_URL.to_string(),
            gitlab_api_url: GITLAB_API_URL.to_string(),
        }
    }

    /// Uses the API roots from `config`.
    pub fn from_config(transport: Arc<dyn Transport>, config: &HttpConfig) -> Self {
        Self {
            transport,
            github_api_url: config.github_api_url.clone(),
            gitlab_api_url: config.gitlab_api_url.clone(),
        }
    }

    pub fn create(&self, spec: FinderSpec) -> Box<dyn Finder> {
        match spec {
            FinderSpec::Direct { url } => Box::new(DirectFinder::new(url)),
            FinderSpec::Source {
                platform: Platform::GitHub,
                tool,
                repo,
                tag,
            } => Box::new(GitHubSourceFinder::new(tool, repo, tag)),
            FinderSpec::Source {
                platform: Platform::GitLab,
                tool,
                repo,
                tag,
            } => Box::new(GitLabSourceFinder::new(tool, repo, tag)),
            FinderSpec::Assets {
                platform: Platform::GitHub,
                query,
            } => Box::new(GitHubAssetFinder::with_api_url(
                self.transport.clone(),
                &self.github_api_url,
                query,
            )),
            FinderSpec::Assets {
                platform: Platform::GitLab,
                query,
            } => Box::new(GitLabAssetFinder::with_api_url(
                self.transport.clone(),
                &self.gitlab_api_url,
                query,
            )),
        }
    }
}
