//! Video hosts: pornhub, noodlemagazine, spankbang, gfycat, redgifs

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::extract;
use super::traits::{ResolveContext, ResolveError, Resolver};
use super::types::Resolved;
use crate::fetch::headers;

static PORNHUB_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([a-z0-9]+\.)?pornhub").expect("valid regex"));
static MEDIA_VAR_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)var\s+media_\d+").expect("valid regex"));
static MEDIA_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)var\s+media_\d+=(.*?);").expect("valid regex"));
static INLINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));
static STREAM_DATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)stream_data\s=\s(\{.*?\}.*?);").expect("valid regex"));

const PORNHUB_COOKIE: &str = "age-verified=1; platform=tv; cookiesBannerSeen=1; hasVisited=1";
const PORNHUB_QUALITIES: [&str; 5] = ["1080", "720", "480", "320", "240"];
const SPANKBANG_QUALITIES: [&str; 6] = ["4k", "1080p", "720p", "480p", "320p", "240p"];

/// Reassemble the `get_media` URL that the player script splits across
/// string variables (`var media_0 = a + /* noise */ b;`)
fn media_info_url(script: &str) -> Option<String> {
    extract::captures(&MEDIA_VAR, script)
        .into_iter()
        .filter_map(|expr| {
            INLINE_COMMENT
                .replace_all(&expr, "")
                .split('+')
                .map(str::trim)
                .map(|name| {
                    let lookup = Regex::new(&format!(r#"(?is)var {}="(.*?)""#, regex::escape(name))).ok()?;
                    extract::capture(&lookup, script)
                })
                .collect::<Option<String>>()
        })
        .find(|url| url.contains("pornhub.com/video/get_media?s="))
}

/// Highest preferred quality in the media info payload
fn best_pornhub_format(formats: &Value) -> Option<String> {
    let formats: Vec<&Value> = formats.as_array()?.iter().rev().collect();

    PORNHUB_QUALITIES.iter().find_map(|quality| {
        formats
            .iter()
            .find(|format| match format.get("quality") {
                Some(Value::String(q)) => q == quality,
                Some(Value::Number(q)) => q.to_string() == *quality,
                _ => false,
            })
            .and_then(|format| extract::json_str(format, "/videoUrl"))
    })
}

#[derive(Debug, Clone, Default)]
pub struct Pornhub;

impl Pornhub {
    async fn attempt(&self, url: &str, ctx: &ResolveContext<'_>) -> Result<Option<String>, ResolveError> {
        let request_headers = headers([("Referer", url), ("Cookie", PORNHUB_COOKIE)]);
        let page = ctx.get_with(url, &request_headers).await?;

        let info_url = {
            let doc = page.document();
            extract::raw_texts(&doc, "script")
                .into_iter()
                .find(|script| MEDIA_VAR_DECL.is_match(script))
                .and_then(|script| media_info_url(&script))
        };

        let Some(info_url) = info_url else {
            return Ok(None);
        };

        let info = ctx.get(&info_url).await?;
        let formats = extract::json(&info_url, &info.body)?;
        Ok(best_pornhub_format(&formats))
    }
}

#[async_trait]
impl Resolver for Pornhub {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let url = PORNHUB_HOST.replace(url, "pornhub").into_owned();
        let policy = &ctx.settings.pornhub;

        for attempt in 1..=policy.max_attempts {
            match self.attempt(&url, ctx).await {
                Ok(Some(video)) => return Ok(Some(Resolved::Url(video))),
                Ok(None) => debug!(attempt, url = %url, "No media info yet"),
                Err(e) => debug!(attempt, url = %url, error = %e, "Media info attempt failed"),
            }

            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.delay()).await;
            }
        }

        ctx.log.error(format!(
            "No playable format after {} attempts: {}",
            policy.max_attempts, url
        ));
        Ok(None)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Noodlemagazine;

#[async_trait]
impl Resolver for Noodlemagazine {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let player = extract::attr(&page.document(), "#iplayer", "src");

        let Some(player) = player else {
            return Ok(None);
        };

        let playlist_url = player.replace("/player/", "https://noodlemagazine.com/playlist/");
        let playlist = ctx.get(&playlist_url).await?;
        let playlist = extract::json(&playlist_url, &playlist.body)?;

        Ok(extract::json_str(&playlist, "/sources/0/file").map(Resolved::Url))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Spankbang;

#[async_trait]
impl Resolver for Spankbang {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let Some(raw) = extract::capture(&STREAM_DATA, &page.body) else {
            return Ok(None);
        };

        let streams = extract::json(url, &raw.replace('\'', "\""))?;

        Ok(SPANKBANG_QUALITIES
            .iter()
            .find_map(|quality| {
                streams
                    .get(*quality)
                    .and_then(Value::as_array)
                    .and_then(|sources| sources.iter().find_map(Value::as_str))
                    .map(str::to_string)
            })
            .map(Resolved::Url))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Gfycat;

#[async_trait]
impl Resolver for Gfycat {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let id = extract::last_segment(&url.replace("&amp;", "&")).to_string();
        let page = ctx.get(&format!("https://gfycat.com/{}?hd=1", id)).await?;

        let source = extract::attrs(&page.document(), "source", "src")
            .into_iter()
            .find(|src| src.contains("giant.gfycat"));

        Ok(source.map(Resolved::Url))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Redgifs;

#[async_trait]
impl Resolver for Redgifs {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let watch_url = format!("https://redgifs.com/watch/{}", extract::last_segment(url));
        let page = ctx.get(&watch_url).await?;

        let video = extract::meta(&page.document(), "og:video");
        Ok(video.map(|video| Resolved::Url(video.replace("&amp;", "&"))))
    }
}
