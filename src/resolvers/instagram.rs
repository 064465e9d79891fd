//! Instagram embeds and profile feeds

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::extract;
use super::traits::{ResolveContext, ResolveError, Resolver};
use super::types::Resolved;
use crate::fetch::{HeadersMap, headers};

static VIDEO_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)video_url":"(.*?)""#).expect("valid regex"));
static PROFILE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#""profile_id":"(\d+)""#).expect("valid regex"));
static PROFILE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:instagram|insta):\s*@?").expect("valid regex"));

const APP_USER_AGENT: &str = "Instagram 219.0.0.12.117 Android";
const FEED_API: &str = "https://www.instagram.com/api/v1/feed/user";

/// Zero results is nothing, one is a plain file, more share a folder
fn collect(folder_name: Option<String>, urls: Vec<String>) -> Option<Resolved> {
    match urls.len() {
        0 => None,
        1 => urls.into_iter().next().map(Resolved::Url),
        _ => Some(Resolved::album(folder_name, urls)),
    }
}

/// Post embedded through the s9e iframe (`...instagram.min.html#<shortcode>`)
#[derive(Debug, Clone, Default)]
pub struct InstagramEmbed;

impl InstagramEmbed {
    fn shortcode(url: &str) -> &str {
        let url = url.find("#theme").map(|at| &url[..at]).unwrap_or(url);
        url.rsplit('#').next().unwrap_or(url)
    }
}

#[async_trait]
impl Resolver for InstagramEmbed {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let embed_url = format!("https://www.instagram.com/p/{}/embed", Self::shortcode(url));
        let page = ctx.get(&embed_url).await?;

        let script = extract::raw_texts(&page.document(), "script")
            .into_iter()
            .find(|script| script.contains("shortcode_media"));

        let videos = match script {
            Some(script) if script.contains(r#""is_video":true"#) => extract::captures(&VIDEO_URL, &script)
                .iter()
                .map(|video| extract::unescape_js(video))
                .collect(),
            _ => Vec::new(),
        };

        Ok(collect(None, videos))
    }
}

/// Every image and clip on a public profile, following feed pagination
#[derive(Debug, Clone, Default)]
pub struct InstagramProfile;

impl InstagramProfile {
    /// `insta: @name`, `instagram:name` or a profile URL
    fn username(reference: &str) -> String {
        if PROFILE_PREFIX.is_match(reference) {
            PROFILE_PREFIX.replace(reference, "").trim().to_string()
        } else {
            extract::last_segment(reference).trim_start_matches('@').to_string()
        }
    }

    fn feed_items(feed: &Value) -> Vec<String> {
        let Some(items) = feed.get("items").and_then(Value::as_array) else {
            return Vec::new();
        };

        let first_candidate = |media: &Value| extract::json_str(media, "/image_versions2/candidates/0/url");

        items
            .iter()
            .flat_map(|item| match item.get("product_type").and_then(Value::as_str) {
                Some("feed") => first_candidate(item).into_iter().collect::<Vec<_>>(),
                Some("carousel_container") => item
                    .get("carousel_media")
                    .and_then(Value::as_array)
                    .map(|media| media.iter().filter_map(first_candidate).collect())
                    .unwrap_or_default(),
                Some("clips") => extract::json_str(item, "/video_versions/0/url").into_iter().collect(),
                _ => Vec::new(),
            })
            .map(|url| url.replace("\\u0026", "&"))
            .collect()
    }

    async fn feed_page(
        &self,
        url: &str,
        request_headers: &HeadersMap,
        ctx: &ResolveContext<'_>,
    ) -> Result<Value, ResolveError> {
        let page = ctx.get_with(url, request_headers).await?;
        extract::json(url, &page.body)
    }
}

#[async_trait]
impl Resolver for InstagramProfile {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let username = Self::username(url);
        if username.is_empty() {
            return Ok(None);
        }

        let request_headers = headers([("User-Agent", APP_USER_AGENT)]);
        let profile = ctx
            .get_with(&format!("https://instagram.com/{}", username), &request_headers)
            .await?;

        let Some(profile_id) = extract::capture(&PROFILE_ID, &profile.body) else {
            ctx.log.error(format!("No instagram profile id for {}", username));
            return Ok(None);
        };

        let paging = &ctx.settings.instagram;
        let mut folder_name = None;
        let mut urls = Vec::new();
        let mut max_id: Option<String> = None;

        for page_number in 1..=paging.max_pages {
            let mut feed_url = format!("{}/{}/?count={}", FEED_API, profile_id, paging.page_size);
            if let Some(max_id) = &max_id {
                feed_url.push_str(&format!("&max_id={}", max_id));
            }

            let feed = self.feed_page(&feed_url, &request_headers, ctx).await?;

            let ok = feed.get("status").and_then(Value::as_str) == Some("ok");
            let results = feed.get("num_results").and_then(Value::as_u64).unwrap_or(0);
            if !ok || results == 0 {
                break;
            }

            if folder_name.is_none() {
                folder_name = extract::json_str(&feed, "/user/full_name");
            }
            let items = Self::feed_items(&feed);
            debug!(page = page_number, items = items.len(), profile = %username, "Feed page collected");
            urls.extend(items);

            let more = feed.get("more_available").and_then(Value::as_bool) == Some(true);
            max_id = extract::json_str(&feed, "/next_max_id");
            if !more || max_id.is_none() {
                break;
            }

            if page_number < paging.max_pages {
                tokio::time::sleep(paging.page_delay()).await;
            }
        }

        Ok(collect(Some(folder_name.unwrap_or(username)), urls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockFetch;
    use crate::resolvers::testing::TestEnv;

    #[test]
    fn test_shortcode() {
        assert_eq!(
            InstagramEmbed::shortcode("https://s9e.github.io/iframe/2/instagram.min.html#CxYz#theme=dark"),
            "CxYz"
        );
    }

    #[test]
    fn test_username() {
        assert_eq!(InstagramProfile::username("insta: @some.one"), "some.one");
        assert_eq!(InstagramProfile::username("Instagram:other_1"), "other_1");
        assert_eq!(InstagramProfile::username("https://instagram.com/third/"), "third");
    }

    #[tokio::test]
    async fn test_embed_videos() {
        let env = TestEnv::new(MockFetch::new().page(
            "https://www.instagram.com/p/CxYz/embed",
            r#"<script>window.__additionalDataLoaded('extra',{"shortcode_media":{"is_video":true,
                "video_url":"https:\/\/scontent.cdninstagram.com\/v.mp4?a=1&b=2"}});</script>"#,
        ));
        let resolved = InstagramEmbed
            .resolve("https://s9e.github.io/iframe/2/instagram.min.html#CxYz", &env.ctx())
            .await
            .unwrap();
        assert_eq!(
            resolved,
            Some(Resolved::url("https://scontent.cdninstagram.com/v.mp4?a=1&b=2"))
        );
    }

    #[tokio::test]
    async fn test_embed_without_video() {
        let env = TestEnv::new(MockFetch::new().page(
            "https://www.instagram.com/p/CxYz/embed",
            r#"<script>{"shortcode_media":{"is_video":false}}</script>"#,
        ));
        let resolved = InstagramEmbed
            .resolve("https://s9e.github.io/iframe/2/instagram.min.html#CxYz", &env.ctx())
            .await
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_profile_follows_pages() {
        let first = serde_json::json!({
            "status": "ok", "num_results": 2, "more_available": true, "next_max_id": "m2",
            "user": {"full_name": "Some One"},
            "items": [
                {"product_type": "feed", "image_versions2": {"candidates": [{"url": "https://cdn/1.jpg"}]}},
                {"product_type": "carousel_container", "carousel_media": [
                    {"image_versions2": {"candidates": [{"url": "https://cdn/2.jpg"}]}},
                    {"image_versions2": {"candidates": [{"url": "https://cdn/3.jpg"}]}}
                ]}
            ]
        });
        let second = serde_json::json!({
            "status": "ok", "num_results": 1, "more_available": false,
            "items": [{"product_type": "clips", "video_versions": [{"url": "https://cdn/4.mp4"}]}]
        });
        let env = TestEnv::new(
            MockFetch::new()
                .page("https://instagram.com/someone", r#"{"profile_id":"42"}"#)
                .page("https://www.instagram.com/api/v1/feed/user/42/?count=100", first.to_string())
                .page(
                    "https://www.instagram.com/api/v1/feed/user/42/?count=100&max_id=m2",
                    second.to_string(),
                ),
        );

        let resolved = InstagramProfile
            .resolve("insta: @someone", &env.ctx())
            .await
            .unwrap();

        assert_eq!(
            resolved,
            Some(Resolved::Album {
                folder_name: Some("Some One".to_string()),
                urls: ["1.jpg", "2.jpg", "3.jpg", "4.mp4"]
                    .iter()
                    .map(|name| format!("https://cdn/{}", name))
                    .collect(),
            })
        );
        assert_eq!(env.fetch.requests()[0].headers["User-Agent"], APP_USER_AGENT);
    }

    #[tokio::test]
    async fn test_profile_page_cap() {
        let endless = serde_json::json!({
            "status": "ok", "num_results": 1, "more_available": true, "next_max_id": "m",
            "items": [{"product_type": "feed", "image_versions2": {"candidates": [{"url": "https://cdn/x.jpg"}]}}]
        });
        let mut env = TestEnv::new(
            MockFetch::new()
                .page("https://instagram.com/loop", r#""profile_id":"7""#)
                .page("https://www.instagram.com/api/v1/feed/user/7/?count=100", endless.to_string())
                .page("https://www.instagram.com/api/v1/feed/user/7/?count=100&max_id=m", endless.to_string()),
        );
        env.settings.instagram.max_pages = 3;

        InstagramProfile
            .resolve("https://instagram.com/loop", &env.ctx())
            .await
            .unwrap();

        assert_eq!(env.fetch.request_count(FEED_API), 3);
    }
}
