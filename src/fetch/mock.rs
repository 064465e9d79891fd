//! Scripted [`Fetch`] for tests and offline development
//!
//! Responses are keyed by exact URL. Unknown URLs answer 404 pages and fail
//! downloads. Every request is recorded so tests can assert on the calls a
//! resolver made.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{Fetch, FetchError, HeadersMap, Page, ProgressFn, Result, Transfer, TransferProgress};

#[derive(Debug, Clone)]
enum MockResponse {
    Page { status: u16, body: String },
    File {
        bytes: Bytes,
        content_type: Option<String>,
        content_disposition: Option<String>,
    },
    Fail(String),
}

/// A request seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: HeadersMap,
    pub body: Option<String>,
}

#[derive(Debug, Default)]
pub struct MockFetch {
    routes: Mutex<HashMap<String, MockResponse>>,
    requests: Mutex<Vec<MockRequest>>,
}

impl MockFetch {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(self, url: &str, response: MockResponse) -> Self {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string(), response);
        self
    }

    /// Serve `body` with status 200 for GET and POST
    pub fn page(self, url: &str, body: impl Into<String>) -> Self {
        self.route(
            url,
            MockResponse::Page {
                status: 200,
                body: body.into(),
            },
        )
    }

    pub fn page_with_status(self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.route(
            url,
            MockResponse::Page {
                status,
                body: body.into(),
            },
        )
    }

    /// Serve binary content for downloads
    pub fn file(self, url: &str, bytes: impl Into<Bytes>, content_type: Option<&str>) -> Self {
        self.route(
            url,
            MockResponse::File {
                bytes: bytes.into(),
                content_type: content_type.map(str::to_string),
                content_disposition: None,
            },
        )
    }

    pub fn attachment(self, url: &str, bytes: impl Into<Bytes>, disposition: &str) -> Self {
        self.route(
            url,
            MockResponse::File {
                bytes: bytes.into(),
                content_type: None,
                content_disposition: Some(disposition.to_string()),
            },
        )
    }

    /// Fail every request to `url` with a transport error
    pub fn failing(self, url: &str) -> Self {
        self.route(url, MockResponse::Fail(format!("connection reset: {}", url)))
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of requests whose URL starts with `prefix`
    pub fn request_count(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.starts_with(prefix))
            .count()
    }

    fn record(&self, method: &'static str, url: &str, headers: &HeadersMap, body: Option<String>) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MockRequest {
                method,
                url: url.to_string(),
                headers: headers.clone(),
                body,
            });
    }

    fn lookup(&self, url: &str) -> Option<MockResponse> {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
    }

    fn page_for(&self, url: &str) -> Result<Page> {
        match self.lookup(url) {
            Some(MockResponse::Page { status, body }) => Ok(Page {
                url: url.to_string(),
                status,
                body,
            }),
            Some(MockResponse::File { bytes, .. }) => Ok(Page {
                url: url.to_string(),
                status: 200,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Some(MockResponse::Fail(reason)) => Err(FetchError::RequestFailed(reason)),
            None => Ok(Page {
                url: url.to_string(),
                status: 404,
                body: String::new(),
            }),
        }
    }
}

#[async_trait]
impl Fetch for MockFetch {
    async fn get(&self, url: &str, headers: &HeadersMap) -> Result<Page> {
        self.record("GET", url, headers, None);
        self.page_for(url)
    }

    async fn post(&self, url: &str, body: String, headers: &HeadersMap) -> Result<Page> {
        self.record("POST", url, headers, Some(body));
        self.page_for(url)
    }

    async fn download(
        &self,
        url: &str,
        headers: &HeadersMap,
        on_progress: ProgressFn<'_>,
    ) -> Result<Transfer> {
        self.record("GET", url, headers, None);

        let (bytes, content_type, content_disposition) = match self.lookup(url) {
            Some(MockResponse::File {
                bytes,
                content_type,
                content_disposition,
            }) => (bytes, content_type, content_disposition),
            Some(MockResponse::Page { status, body }) if (200..300).contains(&status) => {
                (Bytes::from(body), None, None)
            }
            Some(MockResponse::Page { status, .. }) => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            Some(MockResponse::Fail(reason)) => return Err(FetchError::RequestFailed(reason)),
            None => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
        };

        // Two chunks, so consumers see an intermediate state
        let total = bytes.len() as u64;
        on_progress(TransferProgress {
            loaded: total / 2,
            total: Some(total),
        });
        on_progress(TransferProgress {
            loaded: total,
            total: Some(total),
        });

        Ok(Transfer {
            url: url.to_string(),
            bytes,
            content_type,
            content_disposition,
        })
    }
}
