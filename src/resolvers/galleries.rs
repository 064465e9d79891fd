//! Gallery pages that list their files directly (pixhost, imgbox, erome,
//! cyberdrop, box.com, imagebam)

use async_trait::async_trait;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::extract;
use super::traits::{ResolveContext, ResolveError, Resolver};
use super::transform::{cyberdrop_node, pixhost_full_size};
use super::types::Resolved;
use crate::fetch::{HeadersMap, headers};

static IMG_BBCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\[img\](https://t\d+.*?)\[/img\]").expect("valid regex"));
static IMGBOX_THUMB_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)(thumbs|t)(\d+)\.").expect("valid regex"));
static URL_BBCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\[URL=(.*?)\]").expect("valid regex"));

/// pixhost.to gallery: the share box carries BBCode with every thumbnail
#[derive(Debug, Clone, Default)]
pub struct PixhostGallery;

#[async_trait]
impl Resolver for PixhostGallery {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let (links, folder_name) = {
            let doc = page.document();
            let links = extract::attr(&doc, ".share > div:nth-child(2) > input", "value")
                .or_else(|| extract::attr(&doc, ".share > input:nth-child(2)", "value"));
            (links, extract::text(&doc, ".link > h2"))
        };

        let Some(links) = links else {
            return Ok(None);
        };

        let urls = extract::captures(&IMG_BBCODE, &links)
            .iter()
            .map(|thumb| pixhost_full_size(thumb))
            .collect::<Vec<_>>();

        Ok(Some(Resolved::album(folder_name, urls)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImgboxGallery;

#[async_trait]
impl Resolver for ImgboxGallery {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let doc = page.document();

        let urls = extract::attrs(&doc, "#gallery-view-content > a > img", "src")
            .iter()
            .map(|thumb| {
                IMGBOX_THUMB_HOST
                    .replace_all(thumb, "images$2.")
                    .replace("_b.", "_o.")
            })
            .collect::<Vec<_>>();

        Ok(Some(Resolved::album(
            extract::text(&doc, "#gallery-view > h1"),
            urls,
        )))
    }
}

/// erome.com album: one image or video per media group
#[derive(Debug, Clone, Default)]
pub struct EromeAlbum;

#[async_trait]
impl Resolver for EromeAlbum {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let doc = page.document();

        let urls = extract::each(&doc, ".media-group", |group| {
            extract::child_attr(group, ".img-front", "data-src")
                .or_else(|| extract::child_attr(group, "source", "src"))
        });

        Ok(Some(Resolved::album(
            extract::text(&doc, ".col-sm-12.page-content > h1"),
            urls,
        )))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CyberdropAlbum;

#[async_trait]
impl Resolver for CyberdropAlbum {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let doc = page.document();

        let urls = extract::attrs(&doc, "#file", "href")
            .iter()
            .map(|href| cyberdrop_node(href))
            .collect::<Vec<_>>();

        Ok(Some(Resolved::album(extract::text(&doc, "#title"), urls)))
    }
}

/// m.box.com shared folder: every file has its own preview page
#[derive(Debug, Clone, Default)]
pub struct BoxFolder;

#[async_trait]
impl Resolver for BoxFolder {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let (files, folder_name) = {
            let doc = page.document();
            let files: Vec<String> = extract::attrs(&doc, ".files-item-anchor", "href")
                .iter()
                .map(|href| extract::absolutize(&page.url, href))
                .collect();
            (files, extract::text(&doc, ".folder-nav-title"))
        };

        let mut urls = Vec::new();
        for file_url in files {
            let file_page = ctx.get(&file_url).await?;
            let found = {
                let doc = file_page.document();
                if file_page.body.contains("image-preview") {
                    extract::attr(&doc, ".image-preview", "src")
                } else {
                    extract::attr(&doc, ".mtl > a", "href")
                }
            };
            if let Some(found) = found {
                urls.push(extract::absolutize(&file_page.url, &found));
            }
        }

        Ok(Some(Resolved::album(folder_name, urls)))
    }
}

/// imagebam.com view or gallery page behind the adult-content interstitial
#[derive(Debug, Clone, Default)]
pub struct Imagebam;

impl Imagebam {
    fn consent_headers() -> HeadersMap {
        let expires = (Utc::now() + Duration::hours(6)).format("%a, %d %b %Y %H:%M:%S GMT");
        headers([(
            "Cookie",
            format!("nsfw_inter=1; expires={}; path=/", expires).as_str(),
        )])
    }
}

#[async_trait]
impl Resolver for Imagebam {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let consent = Self::consent_headers();
        let page = ctx.get_with(url, &consent).await?;

        if !page.body.contains("gallery-name") {
            let image = extract::attr(&page.document(), ".main-image", "src");
            return Ok(image.map(Resolved::Url));
        }

        let (links, folder_name) = {
            let doc = page.document();
            let links = extract::attr(&doc, ".links.gallery > div:nth-child(2) > div > input", "value")
                .map(|value| extract::captures(&URL_BBCODE, &value))
                .unwrap_or_default();
            (links, extract::text(&doc, "#gallery-name"))
        };

        let mut urls = Vec::new();
        for link in links {
            let view = ctx.get_with(&link, &consent).await?;
            if let Some(image) = extract::attr(&view.document(), ".main-image", "src") {
                urls.push(image);
            }
        }

        Ok(Some(Resolved::album(folder_name, urls)))
    }
}
