use async_trait::async_trait;

use super::Finder;
use crate::error::FindResult;

/// Returns the embedded URL as the only asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectFinder {
    pub url: String,
}

impl DirectFinder {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Finder for DirectFinder {
    async fn find(&self) -> FindResult<Vec<String>> {
        Ok(vec![self.url.clone()])
    }
}
