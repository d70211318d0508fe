// src/services/search.rs
use crate::{
    config::Config,
    diagnostics::{DiagnosticEvent, Diagnostics},
    providers::{GifProvider, GiphyProvider, JsonFetcher, TenorProvider},
    types::{GifResult, Provenance, SearchState},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Runs one complete search cycle for a query.
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn run_search(&self, query: &str) -> SearchState;
}

/// Fans a query out to both providers and merges what comes back.
pub struct Aggregator {
    giphy: Arc<dyn GifProvider>,
    tenor: Arc<dyn GifProvider>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Aggregator {
    pub fn new(
        giphy: Arc<dyn GifProvider>,
        tenor: Arc<dyn GifProvider>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            giphy,
            tenor,
            diagnostics,
        }
    }

    pub fn from_config(
        config: &Config,
        fetcher: Arc<dyn JsonFetcher>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self::new(
            Arc::new(GiphyProvider::new(&config.giphy, fetcher.clone())),
            Arc::new(TenorProvider::new(&config.tenor, fetcher)),
            diagnostics,
        )
    }

    pub fn provider(&self, provenance: Provenance) -> &dyn GifProvider {
        match provenance {
            Provenance::Giphy => self.giphy.as_ref(),
            Provenance::Tenor => self.tenor.as_ref(),
        }
    }

    pub fn providers(&self) -> [&dyn GifProvider; 2] {
        [self.giphy.as_ref(), self.tenor.as_ref()]
    }
}

async fn gather(
    giphy: Arc<dyn GifProvider>,
    tenor: Arc<dyn GifProvider>,
    diagnostics: Arc<dyn Diagnostics>,
    query: String,
) -> Vec<GifResult> {
    let (giphy_results, tenor_results) = tokio::join!(
        giphy.search(&query, diagnostics.as_ref()),
        tenor.search(&query, diagnostics.as_ref()),
    );

    // Giphy first, then Tenor, each in provider order.
    let mut merged = giphy_results;
    merged.extend(tenor_results);
    merged
}

#[async_trait]
impl Searcher for Aggregator {
    async fn run_search(&self, query: &str) -> SearchState {
        tracing::info!(query, "searching");

        let task = tokio::spawn(gather(
            self.giphy.clone(),
            self.tenor.clone(),
            self.diagnostics.clone(),
            query.to_string(),
        ));

        match task.await {
            Ok(results) => {
                if results.is_empty() {
                    self.diagnostics.emit(DiagnosticEvent::NoResultsReached {
                        query: query.to_string(),
                    });
                } else {
                    tracing::info!(query, count = results.len(), "search finished");
                }
                SearchState::completed(query, results)
            }
            Err(e) => {
                let cause = e.to_string();
                self.diagnostics.emit(DiagnosticEvent::SearchAborted {
                    query: query.to_string(),
                    cause: cause.clone(),
                });
                SearchState::failed(query, format!("Search failed: {}", cause))
            }
        }
    }
}
