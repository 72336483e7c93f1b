//! Resolve a project's release version to its downloadable asset URLs.
//!
//! ```no_run
//! use std::sync::Arc;
//! use relfind::finder::{Finder, GitHubAssetFinder, ReleaseQuery, TagSelector};
//! use relfind::http::HttpClient;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let transport = Arc::new(HttpClient::new(reqwest::Client::new()));
//! let finder = GitHubAssetFinder::new(transport, ReleaseQuery::new("owner/repo", TagSelector::Latest));
//! for url in finder.find().await? {
//!     println!("{}", url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod finder;
pub mod http;

pub use error::{FindError, FindResult};
pub use finder::{Finder, FinderFactory, FinderSpec, Platform, ReleaseQuery, TagSelector};
