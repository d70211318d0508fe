// src/providers/tenor.rs
//! Tenor adapter.
//!
//! Tenor has shipped two result shapes. Newer responses key renditions by
//! name under `media_formats`; older ones carry an array of such maps under
//! `media`. Each hit goes through [`DECODERS`] in order and the first shape
//! that yields a playable rendition wins. Within a shape renditions are
//! ranked by [`VARIANT_ORDER`], so the same payload always selects the same
//! rendition.

use crate::{
    config::{Credential, ProviderConfig, DEFAULT_TENOR_LIMIT},
    providers::{lenient_number, lenient_u32, non_empty, CredentialSlot, GifProvider, JsonFetcher},
    types::{GifResult, MediaVariant, Provenance, ProviderResult},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Full size first, thumbnails last.
pub const VARIANT_ORDER: [&str; 4] = ["gif", "mediumgif", "tinygif", "nanogif"];

type Decoder = fn(&TenorHit) -> Option<Vec<MediaVariant>>;

/// Result shapes, newest first.
const DECODERS: [(&str, Decoder); 2] = [("media_formats", decode_modern), ("media", decode_legacy)];

#[derive(Debug, Deserialize)]
struct TenorResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TenorHit {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content_description: Option<String>,
    #[serde(default)]
    media_formats: Option<Map<String, Value>>,
    #[serde(default)]
    media: Option<Vec<Value>>,
}

pub struct TenorProvider {
    credential: CredentialSlot,
    search_url: String,
    /// Tenor pages its results, so a page size is always sent.
    limit: u32,
    fetcher: Arc<dyn JsonFetcher>,
}

impl TenorProvider {
    pub fn new(config: &ProviderConfig, fetcher: Arc<dyn JsonFetcher>) -> Self {
        Self {
            credential: CredentialSlot::new(config.credential()),
            search_url: config.search_url.clone(),
            limit: config.limit.unwrap_or(DEFAULT_TENOR_LIMIT),
            fetcher,
        }
    }
}

#[async_trait]
impl GifProvider for TenorProvider {
    fn provenance(&self) -> Provenance {
        Provenance::Tenor
    }

    fn name(&self) -> &str {
        "Tenor"
    }

    fn credential(&self) -> Credential {
        self.credential.get()
    }

    fn set_credential(&self, api_key: String, media_prefix: Option<String>) {
        self.credential.replace(api_key, media_prefix);
    }

    async fn fetch(&self, query: &str, api_key: &str) -> ProviderResult<Vec<GifResult>> {
        let params = [
            ("q", query.to_string()),
            ("key", api_key.to_string()),
            ("limit", self.limit.to_string()),
        ];

        let body = self.fetcher.get_json(&self.search_url, &params).await?;
        parse_response(body)
    }
}

fn parse_response(body: Value) -> ProviderResult<Vec<GifResult>> {
    let response: TenorResponse = serde_json::from_value(body)?;

    Ok(response
        .results
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<TenorHit>(raw) {
            Ok(hit) => normalize(hit),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed tenor hit");
                None
            }
        })
        .collect())
}

fn normalize(hit: TenorHit) -> Option<GifResult> {
    if hit.id.is_empty() {
        return None;
    }

    let Some((shape, variants)) = DECODERS
        .iter()
        .find_map(|(shape, decode)| decode(&hit).map(|variants| (*shape, variants)))
    else {
        tracing::debug!(id = %hit.id, "tenor hit has no playable media, dropping");
        return None;
    };
    tracing::trace!(id = %hit.id, shape, "decoded tenor hit");

    // Smallest rendition for the list, the selected one is variants[0].
    let display_url = variants.last()?.url.clone();

    Some(GifResult {
        id: hit.id,
        title: hit.title.filter(|t| !t.trim().is_empty()),
        description: hit.content_description.filter(|t| !t.trim().is_empty()),
        provenance: Provenance::Tenor,
        display_url,
        variants,
    })
}

fn decode_modern(hit: &TenorHit) -> Option<Vec<MediaVariant>> {
    hit.media_formats.as_ref().and_then(rank_formats)
}

/// The first array entry holding a playable rendition; later entries are
/// never merged in.
fn decode_legacy(hit: &TenorHit) -> Option<Vec<MediaVariant>> {
    hit.media
        .as_ref()?
        .iter()
        .filter_map(Value::as_object)
        .find_map(rank_formats)
}

fn rank_formats(formats: &Map<String, Value>) -> Option<Vec<MediaVariant>> {
    let variants: Vec<MediaVariant> = VARIANT_ORDER
        .iter()
        .filter_map(|label| formats.get(*label).and_then(|format| variant(label, format)))
        .collect();

    if variants.is_empty() {
        None
    } else {
        Some(variants)
    }
}

fn variant(label: &str, format: &Value) -> Option<MediaVariant> {
    let url = non_empty(format.get("url"))?;
    let dims = format.get("dims").and_then(Value::as_array);

    Some(MediaVariant {
        label: label.to_string(),
        url,
        width: lenient_u32(dims.and_then(|d| d.first())),
        height: lenient_u32(dims.and_then(|d| d.get(1))),
        byte_size: format.get("size").and_then(lenient_number),
        mimetype: Some("image/gif".to_string()),
    })
}
