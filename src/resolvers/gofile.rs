//! gofile.io folders through the public content API
//!
//! Folders may nest and may be password protected. Passwords are sent as
//! the SHA-256 hex digest of each candidate, in candidate order.

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::debug;

use super::extract;
use super::traits::{ResolveContext, ResolveError, Resolver};
use super::types::Resolved;
use super::walk::WorkQueue;
use crate::fetch::HeadersMap;

const DEFAULT_API_BASE: &str = "https://api.gofile.io";

#[derive(Debug)]
pub struct Gofile {
    api_base: String,
    /// Guest account token, created on first use when none is configured
    guest_token: OnceCell<String>,
}

impl Default for Gofile {
    fn default() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }
}

impl Gofile {
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            guest_token: OnceCell::new(),
        }
    }

    async fn token(&self, ctx: &ResolveContext<'_>) -> Result<String, ResolveError> {
        if let Some(token) = ctx.settings.gofile.token.as_deref().filter(|t| !t.trim().is_empty()) {
            return Ok(token.to_string());
        }

        let token = self
            .guest_token
            .get_or_try_init(|| async {
                let url = format!("{}/createAccount", self.api_base);
                let page = ctx.get(&url).await?;
                let body = extract::json(&url, &page.body)?;
                let token = extract::json_str(&body, "/data/token")
                    .ok_or_else(|| ResolveError::parse(&url, "no token in createAccount response"))?;
                debug!("Created gofile guest token");
                Ok::<_, ResolveError>(token)
            })
            .await?;

        Ok(token.clone())
    }

    /// Content listing for one folder code, trying passwords when required.
    ///
    /// `Ok(None)` when the folder is missing, private or no candidate
    /// unlocks it.
    async fn fetch_content(
        &self,
        code: &str,
        token: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Value>, ResolveError> {
        let api_url = format!(
            "{}/getContent?contentId={}&token={}&websiteToken={}&cache=true",
            self.api_base, code, token, ctx.settings.gofile.website_token
        );

        let content = api_get(&api_url, ctx).await?;

        match status(&content) {
            "ok" => Ok(Some(content)),
            "error-notFound" => {
                ctx.log.error(format!("gofile folder not found: {}", code));
                Ok(None)
            }
            "error-notPublic" => {
                ctx.log.error(format!("gofile folder is not public: {}", code));
                Ok(None)
            }
            "error-passwordRequired" => self.unlock(code, &api_url, ctx).await,
            other => {
                ctx.log.error(format!("gofile folder {} answered status {}", code, other));
                Ok(None)
            }
        }
    }

    async fn unlock(
        &self,
        code: &str,
        api_url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Value>, ResolveError> {
        if ctx.passwords.is_empty() {
            ctx.log.error(format!("gofile folder {} requires a password and none are available", code));
            return Ok(None);
        }

        ctx.log.info(format!(
            "gofile folder {} requires a password, trying {} candidate(s)",
            code,
            ctx.passwords.len()
        ));

        for candidate in ctx.passwords {
            let url = format!("{}&password={}", api_url, password_hash(candidate));

            match api_get(&url, ctx).await {
                Ok(content) if status(&content) == "ok" => {
                    ctx.log.info(format!("gofile folder {} unlocked with: {}", code, candidate));
                    return Ok(Some(content));
                }
                Ok(content) => debug!(code, status = status(&content), "gofile password rejected"),
                Err(ResolveError::Parse { reason, .. }) => {
                    debug!(code, reason = %reason, "gofile password rejected")
                }
                Err(e) => return Err(e),
            }
        }

        ctx.log.error(format!("no password unlocks gofile folder {}", code));
        Ok(None)
    }
}

/// API call judged by the JSON `status` field, not the HTTP status: the API
/// answers rejected passwords and missing folders with 4xx JSON bodies
async fn api_get(url: &str, ctx: &ResolveContext<'_>) -> Result<Value, ResolveError> {
    let page = ctx.fetch.get(url, &HeadersMap::new()).await?;
    extract::json(url, &page.body)
}

fn status(content: &Value) -> &str {
    content.get("status").and_then(Value::as_str).unwrap_or_default()
}

pub fn password_hash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Entries of `/data/contents`, which the API serves as an object keyed by
/// id (older responses used an array)
fn contents(content: &Value) -> Vec<&Value> {
    match content.pointer("/data/contents") {
        Some(Value::Object(map)) => map.values().collect(),
        Some(Value::Array(items)) => items.iter().collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl Resolver for Gofile {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let code = extract::last_segment(url).to_string();
        let token = self.token(ctx).await?;

        let Some(root) = self.fetch_content(&code, &token, ctx).await? else {
            ctx.log.error(format!("Unable to resolve gofile album: {}", url));
            return Ok(None);
        };

        let folder_name = extract::json_str(&root, "/data/name").unwrap_or_else(|| code.clone());

        let mut folders = WorkQueue::seeded(code);
        let mut root = Some(root);
        let mut urls = Vec::new();

        while let Some(folder) = folders.pop() {
            let content = match root.take() {
                Some(content) => content,
                None => match self.fetch_content(&folder, &token, ctx).await? {
                    Some(content) => content,
                    None => continue,
                },
            };

            for entry in contents(&content) {
                match entry.get("type").and_then(Value::as_str) {
                    Some("file") => urls.extend(extract::json_str(entry, "/link")),
                    Some("folder") => {
                        if let Some(child) = extract::json_str(entry, "/code") {
                            folders.push(child);
                        }
                    }
                    _ => {}
                }
            }
        }

        if urls.is_empty() {
            ctx.log.error(format!("Empty gofile album: {}", url));
        }

        Ok(Some(Resolved::album(Some(folder_name), urls)))
    }
}
