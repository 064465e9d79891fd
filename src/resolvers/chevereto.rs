use async_trait::async_trait;
use tracing::debug;

use super::extract;
use super::traits::{ResolveContext, ResolveError, Resolver};
use super::transform::chevereto_full_size;
use super::types::Resolved;
use super::walk::WorkQueue;

/// Album page of a Chevereto-style image host (jpg.church, ibb.co, pixl.is,
/// img.kiwi).
///
/// Thumbnails are collected from every page reachable through the "next"
/// link; the walk ends when a page has no next link or links back to a page
/// already seen.
#[derive(Debug, Clone)]
pub struct ImageAlbum {
    pub item_selector: &'static str,
    pub next_selector: Option<&'static str>,
    /// Drop the query string (sort/paging state) before the first request
    pub strip_query: bool,
}

impl ImageAlbum {
    pub const fn single_page(item_selector: &'static str) -> Self {
        Self {
            item_selector,
            next_selector: None,
            strip_query: false,
        }
    }

    pub const fn paginated(item_selector: &'static str, next_selector: &'static str) -> Self {
        Self {
            item_selector,
            next_selector: Some(next_selector),
            strip_query: false,
        }
    }

    pub const fn without_query(mut self) -> Self {
        self.strip_query = true;
        self
    }
}

#[async_trait]
impl Resolver for ImageAlbum {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let start = if self.strip_query {
            extract::strip_query(url)
        } else {
            url
        };

        let mut pages = WorkQueue::seeded(start.to_string());
        let mut folder_name = None;
        let mut images = Vec::new();

        while let Some(page_url) = pages.pop() {
            let page = ctx.get(&page_url).await?;

            let (found, next, title) = {
                let doc = page.document();
                let found: Vec<String> = extract::attrs(&doc, self.item_selector, "src")
                    .iter()
                    .map(|src| chevereto_full_size(&extract::absolutize(&page.url, src)))
                    .collect();
                let next = self
                    .next_selector
                    .and_then(|css| extract::attr(&doc, css, "href"))
                    .map(|href| extract::absolutize(&page.url, &href));
                (found, next, extract::meta(&doc, "og:title"))
            };

            debug!(page = %page_url, images = found.len(), "Album page parsed");

            if folder_name.is_none() {
                folder_name = title;
            }
            images.extend(found);

            if let Some(next) = next {
                pages.push(next);
            }
        }

        Ok(Some(Resolved::album(folder_name, images)))
    }
}
