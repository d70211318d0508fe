// src/providers/mod.rs
use crate::{
    config::Credential,
    diagnostics::{DiagnosticEvent, Diagnostics},
    types::{GifResult, Provenance, ProviderError, ProviderResult},
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;

pub mod giphy;
pub mod tenor;

pub use giphy::GiphyProvider;
pub use tenor::TenorProvider;

/// Issues an HTTP GET and hands back the parsed JSON body.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> ProviderResult<Value>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JsonFetcher for HttpFetcher {
    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> ProviderResult<Value> {
        let res = self.client.get(url).query(params).send().await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            tracing::debug!(url, status, "provider returned an error status");
            return Err(ProviderError::Status { status });
        }

        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
pub trait GifProvider: Send + Sync {
    fn provenance(&self) -> Provenance;

    /// Human-readable name
    fn name(&self) -> &str;

    fn credential(&self) -> Credential;

    /// Replace the API key, and the media prefix when one is given.
    fn set_credential(&self, api_key: String, media_prefix: Option<String>);

    fn is_enabled(&self) -> bool {
        self.credential().is_enabled()
    }

    /// Query the provider and normalize its hits. Errors are returned as-is;
    /// callers normally go through [`GifProvider::search`].
    async fn fetch(&self, query: &str, api_key: &str) -> ProviderResult<Vec<GifResult>>;

    /// Never fails: a disabled provider or a failed request yields no results.
    async fn search(&self, query: &str, diagnostics: &dyn Diagnostics) -> Vec<GifResult> {
        let credential = self.credential();
        if !credential.is_enabled() {
            tracing::debug!(provider = %self.provenance(), "provider disabled, skipping");
            return Vec::new();
        }

        match self.fetch(query, &credential.api_key).await {
            Ok(results) => {
                tracing::debug!(provider = %self.provenance(), count = results.len(), "provider search done");
                results
            }
            Err(e) => {
                diagnostics.emit(DiagnosticEvent::ProviderFailed {
                    provider: self.provenance(),
                    kind: e.kind(),
                    cause: e.to_string(),
                });
                Vec::new()
            }
        }
    }
}

/// Interior-mutable holder for a provider credential.
#[derive(Debug, Default)]
pub struct CredentialSlot(RwLock<Credential>);

impl CredentialSlot {
    pub fn new(credential: Credential) -> Self {
        Self(RwLock::new(credential))
    }

    pub fn get(&self) -> Credential {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, api_key: String, media_prefix: Option<String>) {
        let mut guard = match self.0.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.replace(api_key, media_prefix);
    }
}

/// Reads a count that providers send either as a JSON number or as a string.
pub(crate) fn lenient_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        }
        _ => None,
    }
}

pub(crate) fn lenient_u32(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(lenient_number)
        .and_then(|n| u32::try_from(n).ok())
}

pub(crate) fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_number_accepts_text_and_numbers() {
        assert_eq!(lenient_number(&json!(480)), Some(480));
        assert_eq!(lenient_number(&json!("480")), Some(480));
        assert_eq!(lenient_number(&json!(" 12 ")), Some(12));
        assert_eq!(lenient_number(&json!(12.6)), Some(13));
        assert_eq!(lenient_number(&json!("")), None);
        assert_eq!(lenient_number(&json!(null)), None);
        assert_eq!(lenient_number(&json!(-4)), None);
    }

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty(Some(&json!(" cat "))), Some("cat".to_string()));
        assert_eq!(non_empty(Some(&json!("   "))), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_credential_slot_replace() {
        let slot = CredentialSlot::new(Credential {
            api_key: String::new(),
            media_prefix: "mxc://a/".to_string(),
        });
        assert!(!slot.get().is_enabled());

        slot.replace("key".to_string(), Some("mxc://b/".to_string()));
        let credential = slot.get();
        assert_eq!(credential.api_key, "key");
        assert_eq!(credential.media_prefix, "mxc://b/");
    }
}
