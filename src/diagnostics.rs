// src/diagnostics.rs
use crate::types::{ErrorKind, Provenance};

/// Structured events the panel reports instead of printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    ProviderFailed {
        provider: Provenance,
        kind: ErrorKind,
        cause: String,
    },
    NoResultsReached {
        query: String,
    },
    InvalidMediaSelected {
        id: String,
    },
    SearchAborted {
        query: String,
        cause: String,
    },
}

impl DiagnosticEvent {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiagnosticEvent::ProviderFailed { kind, .. } => *kind,
            DiagnosticEvent::NoResultsReached { .. } => ErrorKind::NoResults,
            DiagnosticEvent::InvalidMediaSelected { .. } => ErrorKind::InvalidMedia,
            DiagnosticEvent::SearchAborted { .. } => ErrorKind::InternalUnexpected,
        }
    }
}

pub trait Diagnostics: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        let kind = event.kind();
        match event {
            DiagnosticEvent::ProviderFailed {
                provider, cause, ..
            } => {
                tracing::warn!(%provider, ?kind, %cause, "provider failed");
            }
            DiagnosticEvent::NoResultsReached { query } => {
                tracing::info!(%query, ?kind, "no results");
            }
            DiagnosticEvent::InvalidMediaSelected { id } => {
                tracing::error!(%id, ?kind, "invalid GIF media selected");
            }
            DiagnosticEvent::SearchAborted { query, cause } => {
                tracing::error!(%query, %cause, ?kind, "search aborted");
            }
        }
    }
}
