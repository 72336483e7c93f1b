//! GitHub release asset finder.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::{Finder, Release, ReleaseQuery, TagSelector, decode};
use crate::error::{FindError, FindResult, GitHubError};
use crate::http::Transport;

/// Default GitHub REST API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Releases per page when GitHub is not asked for a page size.
pub const PAGE_SIZE: usize = 30;

/// GitHub API response types (internal).
mod api {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Release {
        #[serde(default)]
        pub assets: Vec<Asset>,
        #[serde(default)]
        pub prerelease: bool,
        pub tag_name: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Asset {
        pub browser_download_url: String,
    }
}

impl From<api::Release> for Release {
    fn from(r: api::Release) -> Self {
        Release {
            tag: r.tag_name,
            created_at: r.created_at,
            prerelease: r.prerelease,
            asset_urls: r
                .assets
                .into_iter()
                .map(|a| a.browser_download_url)
                .collect(),
        }
    }
}

/// Finds the assets of a GitHub release.
///
/// An exact tag that 404s falls back to scanning every release page for a
/// tag that *contains* the requested one, so `v1.0` finds `release-v1.0-final`.
pub struct GitHubAssetFinder {
    transport: Arc<dyn Transport>,
    api_url: String,
    query: ReleaseQuery,
}

impl GitHubAssetFinder {
    pub fn new(transport: Arc<dyn Transport>, query: ReleaseQuery) -> Self {
        Self::with_api_url(transport, GITHUB_API_URL, query)
    }

    /// Targets another API root, e.g. GitHub Enterprise.
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

    fn releases_url(&self) -> String {
        format!("{}/repos/{}/releases", self.api_url, self.query.repo)
    }

    /// Tag of the newest release, pre-releases included. Reads the first page only.
    async fn latest_tag(&self) -> FindResult<String> {
        let url = self.releases_url();
        debug!("Resolving latest pre-release from {}...", url);

        let response = self.transport.get(&url).await?;
        if !response.is_success() {
            return Err(GitHubError::from_response(response, &url).into());
        }

        let releases: Vec<api::Release> = decode(&url, &response.body)?;
        releases
            .into_iter()
            .next()
            .map(|r| r.tag_name)
            .ok_or(FindError::NoReleases)
    }

    /// Scans release pages for the first tag containing `target`.
    async fn find_match(&self, target: &str) -> FindResult<Vec<String>> {
        for page in 1u32.. {
            let url = format!("{}?page={}", self.releases_url(), page);
            debug!("Searching releases page {} from {}...", page, url);

            let response = self.transport.get(&url).await?;
            if !response.is_success() {
                return Err(GitHubError::from_response(response, &url).into());
            }

            let releases: Vec<api::Release> = decode(&url, &response.body)?;
            let count = releases.len();

            for release in releases.into_iter().map(Release::from) {
                if release.prerelease && !self.query.prerelease {
                    debug!("Skipping pre-release {}", release.tag);
                    continue;
                }
                if release.tag.contains(target) && self.query.is_recent(&release) {
                    debug!("Tag {} matches '{}'", release.tag, target);
                    return Ok(release.asset_urls);
                }
            }

            if count < PAGE_SIZE {
                break;
            }
        }

        Err(FindError::NoMatchingTag {
            tag: target.to_string(),
        })
    }
}

#[async_trait]
impl Finder for GitHubAssetFinder {
    #[tracing::instrument(skip(self))]
    async fn find(&self) -> FindResult<Vec<String>> {
        let tag = if self.query.wants_latest_prerelease() {
            let tag = self.latest_tag().await.map_err(FindError::pre_release)?;
            TagSelector::Tag(tag)
        } else {
            self.query.tag.clone()
        };

        let url = format!("{}/{}", self.releases_url(), tag);
        debug!("Fetching release from {}...", url);

        let response = self.transport.get(&url).await?;

        if !response.is_success() {
            if let (Some(target), true) = (tag.as_tag(), response.is_not_found()) {
                debug!("No exact release for '{}', searching all releases", target);
                return self.find_match(target).await;
            }
            return Err(GitHubError::from_response(response, &url).into());
        }

        let release: Release = decode::<api::Release>(&url, &response.body)?.into();
        if !self.query.is_recent(&release) {
            return Err(FindError::NoUpgrade);
        }

        Ok(release.asset_urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::test_support::transport_with;
    use crate::http::MockTransport;
    use chrono::{TimeZone, Utc};

    const BASE: &str = "https://api.github.com/repos/o/r/releases";

    fn release_json(tag: &str, prerelease: bool, created_at: &str, assets: &[&str]) -> String {
        let assets: Vec<String> = assets
            .iter()
            .map(|a| format!(r#"{{"browser_download_url": "{}"}}"#, a))
            .collect();
        format!(
            r#"{{"tag_name": "{}", "prerelease": {}, "created_at": "{}", "assets": [{}]}}"#,
            tag,
            prerelease,
            created_at,
            assets.join(",")
        )
    }

    fn page_json(releases: &[String]) -> String {
        format!("[{}]", releases.join(","))
    }

    fn finder(transport: MockTransport, query: ReleaseQuery) -> GitHubAssetFinder {
        GitHubAssetFinder::new(Arc::new(transport), query)
    }

    #[tokio::test]
    async fn test_find_latest() {
        let transport = transport_with(vec![(
            "https://api.github.com/repos/o/r/releases/latest",
            200,
            release_json(
                "v1.0",
                false,
                "2024-01-01T00:00:00Z",
                &["https://dl/a.tar.gz", "https://dl/b.zip", "https://dl/c.deb"],
            ),
        )]);

        let urls = finder(transport, ReleaseQuery::new("o/r", TagSelector::Latest))
            .find()
            .await
            .unwrap();

        assert_eq!(
            urls,
            vec!["https://dl/a.tar.gz", "https://dl/b.zip", "https://dl/c.deb"]
        );
    }

    #[tokio::test]
    async fn test_find_exact_tag() {
        let transport = transport_with(vec![(
            "https://api.github.com/repos/o/r/releases/tags/v1.0",
            200,
            release_json("v1.0", false, "2024-01-01T00:00:00Z", &["https://dl/a"]),
        )]);

        let urls = finder(transport, ReleaseQuery::new("o/r", TagSelector::tag("v1.0")))
            .find()
            .await
            .unwrap();

        assert_eq!(urls, vec!["https://dl/a"]);
    }

    #[tokio::test]
    async fn test_release_without_assets_is_empty_success() {
        let transport = transport_with(vec![(
            "https://api.github.com/repos/o/r/releases/latest",
            200,
            release_json("v1.0", false, "2024-01-01T00:00:00Z", &[]),
        )]);

        let urls = finder(transport, ReleaseQuery::new("o/r", TagSelector::Latest))
            .find()
            .await
            .unwrap();

        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_repo_is_not_escaped() {
        let transport = transport_with(vec![(
            "https://api.github.com/repos/my org/my repo/releases/latest",
            200,
            release_json("v1.0", false, "2024-01-01T00:00:00Z", &[]),
        )]);

        let result = finder(
            transport,
            ReleaseQuery::new("my org/my repo", TagSelector::Latest),
        )
        .find()
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_old_release_is_no_upgrade() {
        let transport = transport_with(vec![(
            "https://api.github.com/repos/o/r/releases/tags/v1.0",
            200,
            release_json("v1.0", false, "2024-01-01T00:00:00Z", &["https://dl/a"]),
        )]);

        let query = ReleaseQuery::new("o/r", TagSelector::tag("v1.0"))
            .min_time(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let err = finder(transport, query).find().await.unwrap_err();

        assert!(err.is_no_upgrade());
    }

    #[tokio::test]
    async fn test_release_at_floor_is_returned() {
        let transport = transport_with(vec![(
            "https://api.github.com/repos/o/r/releases/latest",
            200,
            release_json("v1.0", false, "2024-06-01T00:00:00Z", &["https://dl/a"]),
        )]);

        let query = ReleaseQuery::new("o/r", TagSelector::Latest)
            .min_time(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let urls = finder(transport, query).find().await.unwrap();

        assert_eq!(urls, vec!["https://dl/a"]);
    }

    #[tokio::test]
    async fn test_not_found_falls_back_to_substring_search() {
        let transport = transport_with(vec![
            (
                "https://api.github.com/repos/o/r/releases/tags/v1.0",
                404,
                r#"{"message": "Not Found"}"#.to_string(),
            ),
            (
                "https://api.github.com/repos/o/r/releases?page=1",
                200,
                page_json(&[
                    release_json("v2.0", false, "2024-03-01T00:00:00Z", &["https://dl/v2"]),
                    release_json(
                        "release-v1.0-final",
                        false,
                        "2024-01-01T00:00:00Z",
                        &["https://dl/final-a", "https://dl/final-b"],
                    ),
                ]),
            ),
        ]);

        let urls = finder(transport, ReleaseQuery::new("o/r", TagSelector::tag("v1.0")))
            .find()
            .await
            .unwrap();

        assert_eq!(urls, vec!["https://dl/final-a", "https://dl/final-b"]);
    }

    #[tokio::test]
    async fn test_fallback_skips_prerelease_unless_requested() {
        let listing = page_json(&[
            release_json(
                "release-v1.0-final",
                true,
                "2024-02-01T00:00:00Z",
                &["https://dl/pre"],
            ),
            release_json("v1.0-stable", false, "2024-01-01T00:00:00Z", &["https://dl/stable"]),
        ]);

        let transport = transport_with(vec![
            (
                "https://api.github.com/repos/o/r/releases/tags/v1.0",
                404,
                String::new(),
            ),
            (
                "https://api.github.com/repos/o/r/releases?page=1",
                200,
                listing.clone(),
            ),
        ]);
        let urls = finder(transport, ReleaseQuery::new("o/r", TagSelector::tag("v1.0")))
            .find()
            .await
            .unwrap();
        assert_eq!(urls, vec!["https://dl/stable"]);

        let transport = transport_with(vec![
            (
                "https://api.github.com/repos/o/r/releases/tags/v1.0",
                404,
                String::new(),
            ),
            ("https://api.github.com/repos/o/r/releases?page=1", 200, listing),
        ]);
        let query = ReleaseQuery::new("o/r", TagSelector::tag("v1.0")).prerelease(true);
        let urls = finder(transport, query).find().await.unwrap();
        assert_eq!(urls, vec!["https://dl/pre"]);
    }

    #[tokio::test]
    async fn test_fallback_skips_releases_older_than_floor() {
        let transport = transport_with(vec![
            (
                "https://api.github.com/repos/o/r/releases/tags/v1",
                404,
                String::new(),
            ),
            (
                "https://api.github.com/repos/o/r/releases?page=1",
                200,
                page_json(&[
                    release_json("v1.1", false, "2024-01-01T00:00:00Z", &["https://dl/old"]),
                ]),
            ),
        ]);

        let query = ReleaseQuery::new("o/r", TagSelector::tag("v1"))
            .min_time(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let err = finder(transport, query).find().await.unwrap_err();

        assert!(matches!(err, FindError::NoMatchingTag { ref tag } if tag == "v1"));
    }

    #[tokio::test]
    async fn test_fallback_paginates_until_short_page() {
        let full_page: Vec<String> = (0..PAGE_SIZE)
            .map(|i| release_json(&format!("v0.{}", i), false, "2024-01-01T00:00:00Z", &[]))
            .collect();

        let transport = transport_with(vec![
            (
                "https://api.github.com/repos/o/r/releases/tags/v9.9",
                404,
                String::new(),
            ),
            (
                "https://api.github.com/repos/o/r/releases?page=1",
                200,
                page_json(&full_page),
            ),
            (
                "https://api.github.com/repos/o/r/releases?page=2",
                200,
                page_json(&full_page[..3]),
            ),
        ]);

        let err = finder(transport, ReleaseQuery::new("o/r", TagSelector::tag("v9.9")))
            .find()
            .await
            .unwrap_err();

        assert!(matches!(err, FindError::NoMatchingTag { ref tag } if tag == "v9.9"));
        assert_eq!(err.to_string(), "no matching tag for 'v9.9'");
    }

    #[tokio::test]
    async fn test_fallback_finds_match_on_later_page() {
        let full_page: Vec<String> = (0..PAGE_SIZE)
            .map(|i| release_json(&format!("v0.{}", i), false, "2024-01-01T00:00:00Z", &[]))
            .collect();

        let transport = transport_with(vec![
            (
                "https://api.github.com/repos/o/r/releases/tags/v9.9",
                404,
                String::new(),
            ),
            (
                "https://api.github.com/repos/o/r/releases?page=1",
                200,
                page_json(&full_page),
            ),
            (
                "https://api.github.com/repos/o/r/releases?page=2",
                200,
                page_json(&[release_json(
                    "tool-v9.9",
                    false,
                    "2024-01-01T00:00:00Z",
                    &["https://dl/found"],
                )]),
            ),
        ]);

        let urls = finder(transport, ReleaseQuery::new("o/r", TagSelector::tag("v9.9")))
            .find()
            .await
            .unwrap();

        assert_eq!(urls, vec!["https://dl/found"]);
    }

    #[tokio::test]
    async fn test_fallback_page_error_aborts() {
        let transport = transport_with(vec![
            (
                "https://api.github.com/repos/o/r/releases/tags/v1",
                404,
                String::new(),
            ),
            (
                "https://api.github.com/repos/o/r/releases?page=1",
                500,
                String::new(),
            ),
        ]);

        let err = finder(transport, ReleaseQuery::new("o/r", TagSelector::tag("v1")))
            .find()
            .await
            .unwrap_err();

        match err {
            FindError::GitHub(e) => {
                assert_eq!(e.status, 500);
                assert_eq!(e.url, format!("{}?page=1", BASE));
            }
            other => panic!("expected GitHub error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fallback_decode_error_aborts() {
        let transport = transport_with(vec![
            (
                "https://api.github.com/repos/o/r/releases/tags/v1",
                404,
                String::new(),
            ),
            (
                "https://api.github.com/repos/o/r/releases?page=1",
                200,
                "{not json".to_string(),
            ),
        ]);

        let err = finder(transport, ReleaseQuery::new("o/r", TagSelector::tag("v1")))
            .find()
            .await
            .unwrap_err();

        assert!(matches!(err, FindError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_latest_not_found_is_platform_error() {
        let transport = transport_with(vec![(
            "https://api.github.com/repos/o/r/releases/latest",
            404,
            r#"{"message": "Not Found"}"#.to_string(),
        )]);

        let err = finder(transport, ReleaseQuery::new("o/r", TagSelector::Latest))
            .find()
            .await
            .unwrap_err();

        match err {
            FindError::GitHub(e) => {
                assert_eq!(e.status, 404);
                assert_eq!(
                    e.to_string(),
                    format!("404 Not Found (URL: {}/latest)", BASE)
                );
            }
            other => panic!("expected GitHub error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limited_renders_message() {
        let transport = transport_with(vec![(
            "https://api.github.com/repos/o/r/releases/tags/v1",
            403,
            r#"{"message":"rate limited","documentation_url":"https://docs"}"#.to_string(),
        )]);

        let err = finder(transport, ReleaseQuery::new("o/r", TagSelector::tag("v1")))
            .find()
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(matches!(err, FindError::GitHub(_)));
        assert!(msg.contains("403 Forbidden"));
        assert!(msg.contains("rate limited"));
        assert!(msg.contains("https://docs"));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let err = finder(transport, ReleaseQuery::new("o/r", TagSelector::tag("v1")))
            .find()
            .await
            .unwrap_err();

        assert!(matches!(err, FindError::Transport(_)));
        assert_eq!(err.to_string(), "connection reset");
    }

    #[tokio::test]
    async fn test_latest_prerelease_resolves_newest_tag() {
        let transport = transport_with(vec![
            (
                "https://api.github.com/repos/o/r/releases",
                200,
                page_json(&[
                    release_json("v2.0-rc1", true, "2024-03-01T00:00:00Z", &[]),
                    release_json("v1.0", false, "2024-01-01T00:00:00Z", &[]),
                ]),
            ),
            (
                "https://api.github.com/repos/o/r/releases/tags/v2.0-rc1",
                200,
                release_json("v2.0-rc1", true, "2024-03-01T00:00:00Z", &["https://dl/rc"]),
            ),
        ]);

        let query = ReleaseQuery::new("o/r", TagSelector::Latest).prerelease(true);
        let finder = finder(transport, query);
        let urls = finder.find().await.unwrap();

        assert_eq!(urls, vec!["https://dl/rc"]);
        // The caller's selector is untouched.
        assert_eq!(finder.query().tag, TagSelector::Latest);
    }

    #[tokio::test]
    async fn test_latest_prerelease_empty_listing() {
        let transport = transport_with(vec![(
            "https://api.github.com/repos/o/r/releases",
            200,
            "[]".to_string(),
        )]);

        let query = ReleaseQuery::new("o/r", TagSelector::Latest).prerelease(true);
        let err = finder(transport, query).find().await.unwrap_err();

        assert!(matches!(err, FindError::PreRelease(ref inner) if matches!(**inner, FindError::NoReleases)));
        assert_eq!(err.to_string(), "pre-release finder: no releases found");
    }

    #[tokio::test]
    async fn test_latest_prerelease_transport_failure_is_wrapped() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("timed out")));

        let query = ReleaseQuery::new("o/r", TagSelector::Latest).prerelease(true);
        let err = finder(transport, query).find().await.unwrap_err();

        assert_eq!(err.to_string(), "pre-release finder: timed out");
    }

    #[tokio::test]
    async fn test_custom_api_url() {
        let transport = transport_with(vec![(
            "https://ghe.example.com/api/v3/repos/o/r/releases/latest",
            200,
            release_json("v1", false, "2024-01-01T00:00:00Z", &["https://dl/a"]),
        )]);

        let finder = GitHubAssetFinder::with_api_url(
            Arc::new(transport),
            "https://ghe.example.com/api/v3/",
            ReleaseQuery::new("o/r", TagSelector::Latest),
        );

        assert_eq!(finder.find().await.unwrap(), vec!["https://dl/a"]);
    }
}
