//! Fetch collaborator used by resolvers and the download orchestrator
//!
//! Resolvers only ever see the [`Fetch`] trait, so every upstream protocol can
//! be exercised against [`MockFetch`] in tests while production runs use the
//! reqwest-backed [`HttpClient`].

mod http;
pub mod mock;

use async_trait::async_trait;
use bytes::Bytes;
use scraper::Html;
use std::collections::BTreeMap;
use thiserror::Error;

pub use http::HttpClient;
pub use mock::MockFetch;

pub type HeadersMap = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// A fetched text document
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as HTML.
    ///
    /// The returned document is not `Send`; parse, extract owned values and
    /// drop it before the next `.await`.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Bytes received so far for one binary transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub loaded: u64,
    /// `None` when the upstream did not declare a length
    pub total: Option<u64>,
}

/// A completed binary transfer with the response metadata needed for naming
#[derive(Debug, Clone)]
pub struct Transfer {
    pub url: String,
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
}

pub type ProgressFn<'a> = &'a (dyn Fn(TransferProgress) + Send + Sync);

#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &str, headers: &HeadersMap) -> Result<Page>;

    async fn post(&self, url: &str, body: String, headers: &HeadersMap) -> Result<Page>;

    /// Binary transfer mode for final downloads, reporting progress as
    /// chunks arrive
    async fn download(
        &self,
        url: &str,
        headers: &HeadersMap,
        on_progress: ProgressFn<'_>,
    ) -> Result<Transfer>;
}

/// Build a header map from literal pairs
pub fn headers<const N: usize>(pairs: [(&str, &str); N]) -> HeadersMap {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
