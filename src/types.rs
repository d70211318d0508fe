// src/types.rs
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Shown in place of the result list when a search merged to nothing.
pub const NO_RESULTS: &str = "No results";

/// Which provider produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    Giphy,
    Tenor,
}

impl Provenance {
    pub fn id(&self) -> &'static str {
        match self {
            Provenance::Giphy => "giphy",
            Provenance::Tenor => "tenor",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One rendition of an animated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaVariant {
    /// Provider name of the rendition, e.g. `original` or `tinygif`.
    pub label: String,
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub byte_size: Option<u64>,
    pub mimetype: Option<String>,
}

/// A provider hit normalized to the shape the panel works with.
///
/// `variants` is ranked best to worst and never empty, and `display_url` is
/// never empty: adapters drop hits for which no media could be located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifResult {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub provenance: Provenance,
    pub display_url: String,
    pub variants: Vec<MediaVariant>,
}

impl GifResult {
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.description.as_deref().filter(|d| !d.trim().is_empty()))
            .unwrap_or("GIF")
    }

    pub fn variant(&self, label: &str) -> Option<&MediaVariant> {
        self.variants.iter().find(|v| v.label == label)
    }
}

/// The one live search state of a panel. Replaced as a whole on every cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<GifResult>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl SearchState {
    pub fn completed(query: &str, results: Vec<GifResult>) -> Self {
        if results.is_empty() {
            Self {
                query: query.to_string(),
                results,
                is_loading: false,
                error: Some(NO_RESULTS.to_string()),
            }
        } else {
            Self {
                query: query.to_string(),
                results,
                is_loading: false,
                error: None,
            }
        }
    }

    pub fn failed(query: &str, message: String) -> Self {
        Self {
            query: query.to_string(),
            results: Vec::new(),
            is_loading: false,
            error: Some(message),
        }
    }

    pub fn has_no_results(&self) -> bool {
        self.results.is_empty() && self.error.as_deref() == Some(NO_RESULTS)
    }
}

/// Media info block of an outgoing sticker event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageInfo {
    pub h: u32,
    pub w: u32,
    pub size: u64,
    pub mimetype: String,
}

/// The sticker payload handed to the host. Built once and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub body: String,
    pub info: MessageInfo,
    pub msgtype: String,
    pub url: String,
    pub id: String,
    pub filename: String,
}

/// Messages delivered from background tasks to the panel loop.
#[derive(Debug, Clone)]
pub enum SearchMessage {
    Completed { generation: u64, state: SearchState },
}

/// Categories used when reporting failures as diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    ParseFailure,
    NoResults,
    InvalidMedia,
    InternalUnexpected,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: status {status}")]
    Status { status: u16 },
    #[error("Failed to parse API response: {0}")]
    Parse(String),
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Http(_) | ProviderError::Status { .. } => ErrorKind::NetworkFailure,
            ProviderError::Parse(_) => ErrorKind::ParseFailure,
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Invalid media for GIF '{id}': no usable size, dimensions or URL")]
    InvalidMedia { id: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Terminal error: {0}")]
    Terminal(String),
}

pub type AppResult<T> = Result<T, AppError>;
pub type ProviderResult<T> = Result<T, ProviderError>;
