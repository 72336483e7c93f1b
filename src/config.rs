//! Transport configuration read from the environment.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::finder::{GITHUB_API_URL, GITLAB_API_URL};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout: Duration,
    /// Sent as a bearer token, only to `github_api_url`.
    pub github_token: Option<String>,
    /// Sent as `PRIVATE-TOKEN`, only to `gitlab_api_url`.
    pub gitlab_token: Option<String>,
    pub github_api_url: String,
    pub gitlab_api_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("relfind/{}", env!("RELFIND_VERSION")),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            github_token: None,
            gitlab_token: None,
            github_api_url: GITHUB_API_URL.to_string(),
            gitlab_api_url: GITLAB_API_URL.to_string(),
        }
    }
}

impl HttpConfig {
    /// Reads `GITHUB_TOKEN`, `GITLAB_TOKEN` and `RELFIND_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key))
    }

    /// Same as [`HttpConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let token = |key: &str| lookup(key).ok().filter(|t| !t.trim().is_empty());

        let mut config = Self {
            github_token: token("GITHUB_TOKEN"),
            gitlab_token: token("GITLAB_TOKEN"),
            ..Self::default()
        };

        if let Ok(secs) = lookup("RELFIND_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid RELFIND_TIMEOUT_SECS: {:?}", secs))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = trim_base(url.into());
        self
    }

    pub fn gitlab_api_url(mut self, url: impl Into<String>) -> Self {
        self.gitlab_api_url = trim_base(url.into());
        self
    }

    /// Picks the auth header for a request URL, if any.
    ///
    /// Tokens are never sent to a host other than the API they belong to,
    /// in particular not to asset download hosts.
    pub fn auth_header(&self, url: &str) -> Option<(&'static str, String)> {
        match (&self.github_token, &self.gitlab_token) {
            (Some(token), _) if url.starts_with(&self.github_api_url) => {
                Some(("Authorization", format!("Bearer {}", token)))
            }
            (_, Some(token)) if url.starts_with(&self.gitlab_api_url) => {
                Some(("PRIVATE-TOKEN", token.clone()))
            }
            _ => None,
        }
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
