//! GitLab release asset finder.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::{Finder, Release, ReleaseQuery, TagSelector, decode};
use crate::error::{FindError, FindResult, GitLabError};
use crate::http::Transport;

/// Default GitLab REST API base URL.
pub const GITLAB_API_URL: &str = "https://gitlab.com/api/v4";

/// GitLab API response types (internal).
mod api {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Release {
        #[serde(default)]
        pub assets: Assets,
        #[serde(default)]
        pub upcoming_release: bool,
        pub tag_name: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct Assets {
        #[serde(default)]
        pub links: Vec<Link>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Link {
        pub direct_asset_url: String,
    }
}

impl From<api::Release> for Release {
    fn from(r: api::Release) -> Self {
        Release {
            tag: r.tag_name,
            created_at: r.created_at,
            prerelease: r.upcoming_release,
            asset_urls: r
                .assets
                .links
                .into_iter()
                .map(|l| l.direct_asset_url)
                .collect(),
        }
    }
}

/// Finds the assets of a GitLab release.
///
/// Unlike [`GitHubAssetFinder`](super::GitHubAssetFinder), a tag that 404s
/// is reported as unmatched right away; there is no listing search.
pub struct GitLabAssetFinder {
    transport: Arc<dyn Transport>,
    api_url: String,
    query: ReleaseQuery,
}

impl GitLabAssetFinder {
    pub fn new(transport: Arc<dyn Transport>, query: ReleaseQuery) -> Self {
        Self::with_api_url(transport, GITLAB_API_URL, query)
    }

    /// Targets a self-hosted instance, e.g. `https://gitlab.example.com/api/v4`.
    pub fn with_api_url(transport: Arc<dyn Transport>, api_url: &str, query: ReleaseQuery) -> Self {
        Self {
            transport,
            api_url: api_url.trim_end_matches('/').to_string(),
            query,
        }
    }

    pub fn query(&self) -> &ReleaseQuery {
        &self.query
    }

    /// The project id goes into a single path segment, so `/` must be escaped.
    fn releases_url(&self) -> String {
        format!(
            "{}/projects/{}/releases",
            self.api_url,
            urlencoding::encode(&self.query.repo)
        )
    }

    fn release_url(&self, tag: &TagSelector) -> String {
        match tag {
            TagSelector::Latest => format!("{}/permalink/latest", self.releases_url()),
            TagSelector::Tag(name) => {
                format!("{}/{}", self.releases_url(), urlencoding::encode(name))
            }
        }
    }

    /// Tag of the newest release, upcoming releases included.
    async fn latest_tag(&self) -> FindResult<String> {
        let url = self.releases_url();
        debug!("Resolving latest pre-release from {}...", url);

        let response = self.transport.get(&url).await?;
        if !response.is_success() {
            return Err(GitLabError::from_response(response, &url).into());
        }

        let releases: Vec<api::Release> = decode(&url, &response.body)?;
        releases
            .into_iter()
            .next()
            .map(|r| r.tag_name)
            .ok_or(FindError::NoReleases)
    }
}

#[async_trait]
impl Finder for GitLabAssetFinder {
    #[tracing::instrument(skip(self))]
    async fn find(&self) -> FindResult<Vec<String>> {
        let tag = if self.query.wants_latest_prerelease() {
            let tag = self.latest_tag().await.map_err(FindError::pre_release)?;
            TagSelector::Tag(tag)
        } else {
            self.query.tag.clone()
        };

        let url = self.release_url(&tag);
        debug!("Fetching release from {}...", url);

        let response = self.transport.get(&url).await?;

        if !response.is_success() {
            if let (Some(name), true) = (tag.as_tag(), response.is_not_found()) {
                return Err(FindError::NoMatchingTag {
                    tag: name.to_string(),
                });
            }
            return Err(GitLabError::from_response(response, &url).into());
        }

        let release: Release = decode::<api::Release>(&url, &response.body)?.into();
        if !self.query.is_recent(&release) {
            return Err(FindError::NoUpgrade);
        }

        Ok(release.asset_urls)
    }
}
