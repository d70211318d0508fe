// src/services/debounce.rs
//! Debounced query control.
//!
//! Every query change replaces the single pending timer; only the most recent
//! one can fire. Commit skips the wait. Each dispatched search gets a
//! generation number so the panel can drop responses that were overtaken by
//! a newer search.

use crate::{services::search::Searcher, types::SearchMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    /// A timer is waiting for the quiet interval to pass.
    Pending,
    /// The latest dispatched search has not completed yet.
    Searching,
}

pub struct QueryController {
    query: String,
    delay: Duration,
    searcher: Arc<dyn Searcher>,
    search_tx: mpsc::Sender<SearchMessage>,
    pending: Option<JoinHandle<()>>,
    dispatched: Arc<AtomicU64>,
    completed: u64,
    disposed: bool,
}

impl QueryController {
    pub fn new(
        searcher: Arc<dyn Searcher>,
        search_tx: mpsc::Sender<SearchMessage>,
        delay: Duration,
    ) -> Self {
        Self {
            query: String::new(),
            delay,
            searcher,
            search_tx,
            pending: None,
            dispatched: Arc::new(AtomicU64::new(0)),
            completed: 0,
            disposed: false,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn state(&self) -> ControllerState {
        if self.pending.as_ref().is_some_and(|timer| !timer.is_finished()) {
            ControllerState::Pending
        } else if self.dispatched.load(Ordering::SeqCst) > self.completed {
            ControllerState::Searching
        } else {
            ControllerState::Idle
        }
    }

    /// Record new query text and restart the quiet interval.
    pub fn on_query_changed(&mut self, text: impl Into<String>) {
        self.query = text.into();
        if self.disposed {
            return;
        }

        self.cancel_pending();

        let delay = self.delay;
        let query = self.query.clone();
        let searcher = self.searcher.clone();
        let search_tx = self.search_tx.clone();
        let dispatched = self.dispatched.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            dispatch(searcher, search_tx, &dispatched, query);
        }));
    }

    /// Search now with the current query. Returns the dispatch generation.
    pub fn commit(&mut self) -> Option<u64> {
        if self.disposed {
            return None;
        }

        self.cancel_pending();
        Some(dispatch(
            self.searcher.clone(),
            self.search_tx.clone(),
            &self.dispatched,
            self.query.clone(),
        ))
    }

    /// Mark a search as finished. Returns true when it is the latest one
    /// dispatched and its result should be shown.
    pub fn complete(&mut self, generation: u64) -> bool {
        self.completed = self.completed.max(generation);
        generation == self.dispatched.load(Ordering::SeqCst)
    }

    /// Cancel the pending timer for good. Later changes are still recorded
    /// but never searched.
    pub fn dispose(&mut self) {
        self.cancel_pending();
        self.disposed = true;
    }

    fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }
}

impl Drop for QueryController {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn dispatch(
    searcher: Arc<dyn Searcher>,
    search_tx: mpsc::Sender<SearchMessage>,
    dispatched: &AtomicU64,
    query: String,
) -> u64 {
    let generation = dispatched.fetch_add(1, Ordering::SeqCst) + 1;
    tracing::debug!(generation, query = %query, "dispatching search");

    tokio::spawn(async move {
        let state = searcher.run_search(&query).await;
        if search_tx
            .send(SearchMessage::Completed { generation, state })
            .await
            .is_err()
        {
            tracing::debug!(generation, "panel gone, dropping search result");
        }
    });

    generation
}
