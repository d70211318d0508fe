// src/providers/giphy.rs
use crate::{
    config::{Credential, ProviderConfig},
    providers::{lenient_number, lenient_u32, non_empty, CredentialSlot, GifProvider, JsonFetcher},
    types::{GifResult, MediaVariant, Provenance, ProviderResult},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Renditions kept from a Giphy hit, best first.
const VARIANT_ORDER: [&str; 4] = ["original", "fixed_height", "fixed_height_small", "downsized"];
const DISPLAY_VARIANT: &str = "fixed_height";

#[derive(Debug, Deserialize)]
struct GiphyResponse {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct GiphyHit {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    alt_text: Option<String>,
    #[serde(default)]
    images: Map<String, Value>,
}

pub struct GiphyProvider {
    credential: CredentialSlot,
    search_url: String,
    limit: Option<u32>,
    fetcher: Arc<dyn JsonFetcher>,
}

impl GiphyProvider {
    pub fn new(config: &ProviderConfig, fetcher: Arc<dyn JsonFetcher>) -> Self {
        Self {
            credential: CredentialSlot::new(config.credential()),
            search_url: config.search_url.clone(),
            limit: config.limit,
            fetcher,
        }
    }
}

#[async_trait]
impl GifProvider for GiphyProvider {
    fn provenance(&self) -> Provenance {
        Provenance::Giphy
    }

    fn name(&self) -> &str {
        "GIPHY"
    }

    fn credential(&self) -> Credential {
        self.credential.get()
    }

    fn set_credential(&self, api_key: String, media_prefix: Option<String>) {
        self.credential.replace(api_key, media_prefix);
    }

    async fn fetch(&self, query: &str, api_key: &str) -> ProviderResult<Vec<GifResult>> {
        let mut params = vec![("q", query.to_string()), ("api_key", api_key.to_string())];
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }

        let body = self.fetcher.get_json(&self.search_url, &params).await?;
        parse_response(body)
    }
}

fn parse_response(body: Value) -> ProviderResult<Vec<GifResult>> {
    let response: GiphyResponse = serde_json::from_value(body)?;

    Ok(response
        .data
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<GiphyHit>(raw) {
            Ok(hit) => normalize(hit),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed giphy hit");
                None
            }
        })
        .collect())
}

fn normalize(hit: GiphyHit) -> Option<GifResult> {
    if hit.id.is_empty() {
        return None;
    }

    let variants: Vec<MediaVariant> = VARIANT_ORDER
        .iter()
        .filter_map(|label| hit.images.get(*label).and_then(|image| variant(label, image)))
        .collect();

    let display_url = variants
        .iter()
        .find(|v| v.label == DISPLAY_VARIANT)
        .or_else(|| variants.first())
        .map(|v| v.url.clone());

    let Some(display_url) = display_url else {
        tracing::debug!(id = %hit.id, "giphy hit has no media url, dropping");
        return None;
    };

    Some(GifResult {
        id: hit.id,
        title: hit.title.filter(|t| !t.trim().is_empty()),
        description: hit.alt_text.filter(|t| !t.trim().is_empty()),
        provenance: Provenance::Giphy,
        display_url,
        variants,
    })
}

fn variant(label: &str, image: &Value) -> Option<MediaVariant> {
    let url = non_empty(image.get("url"))?;

    Some(MediaVariant {
        label: label.to_string(),
        url,
        width: lenient_u32(image.get("width")),
        height: lenient_u32(image.get("height")),
        byte_size: image.get("size").and_then(lenient_number),
        mimetype: Some("image/gif".to_string()),
    })
}
