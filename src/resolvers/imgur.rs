use async_trait::async_trait;
use serde_json::Value;

use super::extract;
use super::traits::{ResolveContext, ResolveError, Resolver};
use super::types::Resolved;

const API_ALBUM: &str = "https://api.imgur.com/3/album";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImgurRef {
    Album(String),
    Single(String),
}

impl ImgurRef {
    /// Embed frames carry the id after `#`, prefixed with `a/` for albums;
    /// site links mark albums with an `/a/` path segment
    fn parse(url: &str) -> Option<Self> {
        let url = url.replace("\\/", "/");

        if url.contains("s9e.github.io") {
            let (_, id) = url.split_once('#')?;
            return Some(match id.strip_prefix("a/") {
                Some(album) => ImgurRef::Album(album.to_string()),
                None => ImgurRef::Single(id.to_string()),
            });
        }

        let id = extract::last_segment(&url).to_string();
        if id.is_empty() {
            return None;
        }

        if extract::strip_query(&url).contains("/a/") {
            Some(ImgurRef::Album(id))
        } else {
            Some(ImgurRef::Single(id))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Imgur;

#[async_trait]
impl Resolver for Imgur {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        match ImgurRef::parse(url) {
            Some(ImgurRef::Album(id)) => {
                let api_url = format!("{}/{}.json", API_ALBUM, id);
                let page = ctx.get(&api_url).await?;
                let album = extract::json(&api_url, &page.body)?;

                let Some(images) = album.pointer("/data/images").and_then(Value::as_array) else {
                    return Ok(None);
                };

                let links = images
                    .iter()
                    .filter_map(|image| extract::json_str(image, "/link"))
                    .collect::<Vec<_>>();
                Ok(Some(Resolved::album(None, links)))
            }
            Some(ImgurRef::Single(id)) => {
                let page = ctx.get(&format!("https://imgur.com/{}", id)).await?;
                let doc = page.document();
                let media = if page.body.contains("og:video") {
                    extract::meta(&doc, "og:video")
                } else {
                    extract::meta(&doc, "og:image")
                };
                Ok(media.map(Resolved::Url))
            }
            None => Ok(None),
        }
    }
}
