//! bunkr.is files and albums
//!
//! Pages are Next.js apps; the interesting data lives in the
//! `#__NEXT_DATA__` payload, or behind the `_next/data` endpoint when the
//! page ships without it.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::extract;
use super::traits::{ResolveContext, ResolveError, Resolver};
use super::types::Resolved;

static ARCHIVE_EXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(zip|pdf)").expect("valid regex"));
static CDN_NODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"cdn\d+").expect("valid regex"));
static CDN_IMAGE_NODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"cdn(\d+)?").expect("valid regex"));

const STREAM_DATA_BASE: &str = "https://stream.bunkr.is/_next/data";

fn next_data(url: &str, doc_body: &str) -> Result<Option<Value>, ResolveError> {
    let raw = {
        let doc = scraper::Html::parse_document(doc_body);
        extract::raw_texts(&doc, "#__NEXT_DATA__").into_iter().next()
    };
    raw.map(|raw| extract::json(url, &raw)).transpose()
}

fn has_image_extension(url: &str, extensions: &[String]) -> bool {
    let path = extract::strip_query(url);
    path.rsplit_once('.')
        .map(|(_, ext)| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default)]
pub struct BunkrFile;

#[async_trait]
impl Resolver for BunkrFile {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let url = if ARCHIVE_EXT.is_match(url) {
            CDN_NODE.replace(url, "files").into_owned()
        } else {
            url.to_string()
        };

        if has_image_extension(&url, &ctx.settings.image_extensions) {
            return Ok(Some(Resolved::Url(
                CDN_IMAGE_NODE.replace(&url, "i$1").into_owned(),
            )));
        }

        let page = ctx.get(&url).await?;
        let Some(data) = next_data(&url, &page.body)? else {
            return Ok(None);
        };

        if let Some(name) = extract::json_str(&data, "/props/pageProps/file/name") {
            let mediafiles = extract::json_str(&data, "/props/pageProps/file/mediafiles").unwrap_or_default();
            return Ok(Some(Resolved::Url(format!("{}/{}", mediafiles, name))));
        }

        let Some(build_id) = extract::json_str(&data, "/buildId") else {
            return Ok(None);
        };

        let data_url = format!(
            "{}/{}/v/{}.json",
            STREAM_DATA_BASE,
            build_id,
            extract::last_segment(&url).replace("&amp;", "&")
        );
        let page = ctx.get(&data_url).await?;
        let data = extract::json(&data_url, &page.body)?;

        let file = (
            extract::json_str(&data, "/pageProps/file/mediafiles"),
            extract::json_str(&data, "/pageProps/file/name"),
        );
        Ok(match file {
            (Some(mediafiles), Some(name)) => Some(Resolved::Url(format!("{}/{}", mediafiles, name))),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BunkrAlbum;

#[async_trait]
impl Resolver for BunkrAlbum {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let folder_name = extract::text(&page.document(), "#title");

        let Some(data) = next_data(url, &page.body)? else {
            return Ok(None);
        };

        let urls = data
            .pointer("/props/pageProps/album/files")
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(|file| {
                        let cdn = extract::json_str(file, "/cdn")?;
                        let name = extract::json_str(file, "/name")?;
                        Some(format!("{}/{}", cdn.replacen("cdn", "media-files", 1), name))
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(Some(Resolved::album(folder_name, urls)))
    }
}
