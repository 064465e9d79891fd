use async_trait::async_trait;

use super::extract;
use super::traits::{ResolveContext, ResolveError, Resolver};
use super::types::Resolved;

/// Fetch a landing page and take one attribute of the first matching
/// element, e.g. the full-size `<img src>` of an image viewer
#[derive(Debug, Clone)]
pub struct PageAttr {
    pub selector: &'static str,
    pub attr: &'static str,
}

impl PageAttr {
    pub const fn new(selector: &'static str, attr: &'static str) -> Self {
        Self { selector, attr }
    }
}

#[async_trait]
impl Resolver for PageAttr {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let found = extract::attr(&page.document(), self.selector, self.attr);
        Ok(found.map(|value| Resolved::Url(extract::absolutize(&page.url, &value))))
    }
}
