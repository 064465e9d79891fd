use async_trait::async_trait;
use thiserror::Error;

use super::types::Resolved;
use crate::config::ResolverSettings;
use crate::fetch::{Fetch, FetchError, HeadersMap, Page, headers};
use crate::run::RunLog;

/// Resolver errors. Every variant is non-fatal to a run: the resource is
/// logged and skipped.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("unexpected response from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("no resolver accepts {0}")]
    Unsupported(String),
}

impl ResolveError {
    pub fn parse(url: &str, reason: impl Into<String>) -> Self {
        ResolveError::Parse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// Everything a resolver may use during one run
pub struct ResolveContext<'a> {
    pub fetch: &'a dyn Fetch,
    /// Passphrase candidates for gated resources, in trial order
    pub passwords: &'a [String],
    pub settings: &'a ResolverSettings,
    pub log: &'a RunLog,
}

impl ResolveContext<'_> {
    pub async fn get(&self, url: &str) -> Result<Page, ResolveError> {
        self.get_with(url, &HeadersMap::new()).await
    }

    /// GET that treats any non-2xx status as an error
    pub async fn get_with(&self, url: &str, headers: &HeadersMap) -> Result<Page, ResolveError> {
        let page = self.fetch.get(url, headers).await?;
        ensure_success(page)
    }

    pub async fn post_form(&self, url: &str, body: String) -> Result<Page, ResolveError> {
        let headers = headers([("Content-Type", "application/x-www-form-urlencoded")]);
        let page = self.fetch.post(url, body, &headers).await?;
        ensure_success(page)
    }

    pub async fn post_with(
        &self,
        url: &str,
        body: String,
        headers: &HeadersMap,
    ) -> Result<Page, ResolveError> {
        let page = self.fetch.post(url, body, headers).await?;
        ensure_success(page)
    }
}

fn ensure_success(page: Page) -> Result<Page, ResolveError> {
    if page.is_success() {
        Ok(page)
    } else {
        Err(ResolveError::Fetch(FetchError::Status {
            url: page.url,
            status: page.status,
        }))
    }
}

/// Network-backed resolution of one matched resource.
///
/// `Ok(None)` means the upstream answered but nothing downloadable was
/// found (missing element, empty album, every passphrase rejected).
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError>;
}
