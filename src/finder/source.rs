//! Source tarball finders. These synthesize a URL and never touch the network.

use async_trait::async_trait;

use super::Finder;
use crate::error::FindResult;

/// `https://github.com/{repo}/tarball/{tag}/{tool}.tar.gz`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubSourceFinder {
    pub tool: String,
    pub repo: String,
    pub tag: String,
}

impl GitHubSourceFinder {
    pub fn new(tool: impl Into<String>, repo: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            repo: repo.into(),
            tag: tag.into(),
        }
    }
}

#[async_trait]
impl Finder for GitHubSourceFinder {
    async fn find(&self) -> FindResult<Vec<String>> {
        Ok(vec![format!(
            "https://github.com/{}/tarball/{}/{}.tar.gz",
            self.repo, self.tag, self.tool
        )])
    }
}

/// `https://gitlab.com/{repo}/-/archive/{tag}/{tool}.tar.gz`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLabSourceFinder {
    pub tool: String,
    pub repo: String,
    pub tag: String,
}

impl GitLabSourceFinder {
    pub fn new(tool: impl Into<String>, repo: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            repo: repo.into(),
            tag: tag.into(),
        }
    }
}

#[async_trait]
impl Finder for GitLabSourceFinder {
    async fn find(&self) -> FindResult<Vec<String>> {
        Ok(vec![format!(
            "https://gitlab.com/{}/-/archive/{}/{}.tar.gz",
            self.repo, self.tag, self.tool
        )])
    }
}
