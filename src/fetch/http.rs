//! HTTP client for upstream pages and final downloads

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, warn};

use super::{Fetch, FetchError, HeadersMap, Page, ProgressFn, Result, Transfer, TransferProgress};
use crate::config::HttpConfig;

/// Upper bound on the buffer reserved from an advertised Content-Length
const PREALLOC_LIMIT: u64 = 8 << 20;

/// reqwest-backed [`Fetch`] implementation
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));

        // No overall deadline unless configured; stalled transfers are the
        // caller's concern
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        Ok(Self { client })
    }

    fn apply_headers(mut request: RequestBuilder, headers: &HeadersMap) -> RequestBuilder {
        for (name, value) in headers {
            request = request.header(name, value);
        }
        request
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| classify(url, e))
    }

    async fn into_page(url: &str, response: Response) -> Result<Page> {
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("Failed to read body: {}", e)))?;

        debug!(url, final_url, status, size = body.len(), "Page fetched");

        Ok(Page {
            url: final_url,
            status,
            body,
        })
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn get(&self, url: &str, headers: &HeadersMap) -> Result<Page> {
        let request = Self::apply_headers(self.client.get(url), headers);
        let response = self.send(url, request).await?;
        Self::into_page(url, response).await
    }

    async fn post(&self, url: &str, body: String, headers: &HeadersMap) -> Result<Page> {
        let request = Self::apply_headers(self.client.post(url), headers).body(body);
        let response = self.send(url, request).await?;
        Self::into_page(url, response).await
    }

    async fn download(
        &self,
        url: &str,
        headers: &HeadersMap,
        on_progress: ProgressFn<'_>,
    ) -> Result<Transfer> {
        debug!(url, "Starting download");

        let request = Self::apply_headers(self.client.get(url), headers);
        let mut response = self.send(url, request).await?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Download rejected by upstream");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = header_value(response.headers(), CONTENT_TYPE.as_str());
        let content_disposition = header_value(response.headers(), CONTENT_DISPOSITION.as_str());
        let total = response.content_length();

        let mut buffer = Vec::with_capacity(total.map_or(0, |t| t.min(PREALLOC_LIMIT)) as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("Failed to read body: {}", e)))?
        {
            buffer.extend_from_slice(&chunk);
            on_progress(TransferProgress {
                loaded: buffer.len() as u64,
                total,
            });
        }

        debug!(url, size = buffer.len(), "Download completed");

        Ok(Transfer {
            url: url.to_string(),
            bytes: Bytes::from(buffer),
            content_type,
            content_disposition,
        })
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_redirect() {
        FetchError::TooManyRedirects
    } else if e.is_builder() {
        FetchError::InvalidUrl(url.to_string())
    } else {
        FetchError::RequestFailed(e.to_string())
    }
}
