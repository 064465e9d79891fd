use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::extract;
use super::traits::{ResolveContext, ResolveError, Resolver};
use super::types::Resolved;

const FILE_DETAILS: &str = "https://cyberfile.is/account/ajax/file_details";
const LOAD_FILES: &str = "https://cyberfile.is/account/ajax/load_files";

static FILE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"showFileInformation\((\d+)\)").expect("valid regex"));
static OPEN_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)openUrl\('(.*?)'").expect("valid regex"));
static FOLDER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)'folder',\s*'(.*?)'").expect("valid regex"));
static FILE_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)dtfullurl="(.*?)""#).expect("valid regex"));

/// Direct link for one cyberfile.is file page
async fn file_link(url: &str, ctx: &ResolveContext<'_>) -> Result<Option<String>, ResolveError> {
    let page = ctx.get(url).await?;
    let Some(file_id) = extract::capture(&FILE_ID, &page.body) else {
        return Ok(None);
    };

    let details = ctx.post_form(FILE_DETAILS, format!("u={}", file_id)).await?;
    Ok(extract::capture(&OPEN_URL, &details.body).map(|link| link.replace("\\/", "/")))
}

#[derive(Debug, Clone, Default)]
pub struct CyberfileFile;

#[async_trait]
impl Resolver for CyberfileFile {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        Ok(file_link(url, ctx).await?.map(Resolved::Url))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CyberfileFolder;

#[async_trait]
impl Resolver for CyberfileFolder {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let node_id = {
            let doc = page.document();
            extract::raw_texts(&doc, "script")
                .into_iter()
                .find(|script| script.contains(r#"data-toggle="tab""#))
                .and_then(|script| extract::capture(&FOLDER_ID, &script))
        };

        let Some(node_id) = node_id else {
            return Ok(None);
        };

        let listing = ctx
            .post_form(LOAD_FILES, format!("pageType=folder&nodeId={}", node_id))
            .await?;
        let listing = extract::json(LOAD_FILES, &listing.body)?;

        let Some(html) = listing.get("html").and_then(Value::as_str) else {
            return Ok(None);
        };
        let folder_name = extract::json_str(&listing, "/page_title")
            .unwrap_or_else(|| extract::last_segment(url).to_string());

        let mut urls = Vec::new();
        for file_page in extract::captures(&FILE_PAGE, html) {
            match file_link(&file_page, ctx).await {
                Ok(Some(link)) => urls.push(link),
                Ok(None) => ctx.log.error(format!("No download link on cyberfile page: {}", file_page)),
                Err(e) => ctx.log.error(format!("Failed to resolve cyberfile page {}: {}", file_page, e)),
            }
        }

        Ok(Some(Resolved::album(Some(folder_name), urls)))
    }
}
