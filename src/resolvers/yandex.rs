use async_trait::async_trait;
use serde_json::{Value, json};

use super::extract;
use super::traits::{ResolveContext, ResolveError, Resolver};
use super::types::Resolved;
use crate::fetch::headers;

const DOWNLOAD_URL_API: &str = "https://disk.yandex.ru/public/api/download-url";

/// Public yandex disk share: the page prefetch store holds the resource
/// hash and session key needed to ask for a download URL
#[derive(Debug, Clone, Default)]
pub struct YandexDisk;

#[async_trait]
impl Resolver for YandexDisk {
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let page = ctx.get(url).await?;
        let store = extract::raw_texts(&page.document(), "script#store-prefetch")
            .into_iter()
            .next();

        let Some(store) = store else {
            return Ok(None);
        };
        let store = extract::json(url, &store)?;

        let sk = extract::json_str(&store, "/environment/sk");
        let hash = store
            .get("resources")
            .and_then(Value::as_object)
            .and_then(|resources| resources.values().next())
            .and_then(|resource| extract::json_str(resource, "/hash"));

        let body = json!({ "hash": hash, "sk": sk }).to_string();
        let response = ctx
            .post_with(DOWNLOAD_URL_API, body, &headers([("Content-Type", "text/plain")]))
            .await?;
        let response = extract::json(DOWNLOAD_URL_API, &response.body)?;

        let failed = match response.get("error") {
            Some(Value::Bool(error)) => *error,
            Some(Value::String(error)) => error == "true",
            _ => false,
        };
        if failed {
            return Ok(None);
        }

        Ok(extract::json_str(&response, "/data/url").map(Resolved::Url))
    }
}
