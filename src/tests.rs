// src/tests.rs
//! Panel scenarios: keystrokes in, sticker messages out.

use crate::app::{App, FocusState};
use crate::config::Config;
use crate::diagnostics::testing::RecordingDiagnostics;
use crate::diagnostics::DiagnosticEvent;
use crate::providers::JsonFetcher;
use crate::services::{ControllerState, StickerSink};
use crate::types::{
    MessageError, OutboundMessage, Provenance, ProviderError, ProviderResult, SearchMessage,
    NO_RESULTS,
};

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tokio_test::assert_ok;

const GIPHY_URL: &str = "https://api.giphy.com/v1/gifs/search";
const TENOR_URL: &str = "https://g.tenor.com/v1/search";

/// Serves canned bodies per endpoint.
#[derive(Default)]
struct RoutedFetcher {
    routes: Mutex<HashMap<String, VecDeque<ProviderResult<Value>>>>,
    calls: AtomicUsize,
}

impl RoutedFetcher {
    fn route(self, url: &str, response: ProviderResult<Value>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JsonFetcher for RoutedFetcher {
    async fn get_json(&self, url: &str, _params: &[(&str, String)]) -> ProviderResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.routes
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ProviderError::Status { status: 404 }))
    }
}

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingSink {
    fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl StickerSink for RecordingSink {
    fn send(&self, message: OutboundMessage) {
        self.sent.lock().unwrap().push(message);
    }
}

struct Harness {
    app: App,
    fetcher: Arc<RoutedFetcher>,
    sink: Arc<RecordingSink>,
    diagnostics: Arc<RecordingDiagnostics>,
}

fn harness(giphy_key: &str, tenor_key: &str, fetcher: RoutedFetcher) -> Harness {
    let mut config = Config::default();
    config.giphy.api_key = giphy_key.to_string();
    config.tenor.api_key = tenor_key.to_string();

    let fetcher = Arc::new(fetcher);
    let sink = Arc::new(RecordingSink::default());
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let app = App::new(&config, fetcher.clone(), sink.clone(), diagnostics.clone());

    Harness {
        app,
        fetcher,
        sink,
        diagnostics,
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.handle_key_event(key(KeyCode::Char(c)));
    }
}

async fn apply_next(app: &mut App) {
    let message = app.next_search_message().await.expect("search message");
    app.handle_search_message(message);
}

fn giphy_hits(ids: &[&str]) -> Value {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "title": format!("{} gif", id),
                "images": {
                    "original": {
                        "url": format!("https://media.giphy.com/{}/giphy.gif", id),
                        "width": "480", "height": "360", "size": "2048"
                    },
                    "fixed_height": {
                        "url": format!("https://media.giphy.com/{}/200.gif", id),
                        "width": "267", "height": "200", "size": "1024"
                    }
                }
            })
        })
        .collect();
    json!({ "data": data })
}

fn tenor_legacy_hit(id: &str, size: Value) -> Value {
    json!({
        "results": [{
            "id": id,
            "title": "",
            "content_description": "Cat typing",
            "media": [{
                "nanogif": {
                    "url": format!("https://media.tenor.com/{}/nano.gif", id),
                    "dims": ["90", "68"],
                    "size": size
                }
            }]
        }]
    })
}

#[tokio::test(start_paused = true)]
async fn test_typing_fires_one_search_after_quiet_interval() {
    let fetcher = RoutedFetcher::default()
        .route(GIPHY_URL, Ok(giphy_hits(&["a"])))
        .route(TENOR_URL, Ok(json!({ "results": [] })));
    let mut h = harness("gk", "tk", fetcher);

    type_text(&mut h.app, "cat");
    assert_eq!(h.app.query(), "cat");
    assert_eq!(h.app.controller_state(), ControllerState::Pending);

    sleep(Duration::from_millis(1200)).await;
    apply_next(&mut h.app).await;

    assert_eq!(h.fetcher.calls(), 2);
    assert_eq!(h.app.state.query, "cat");
    assert_eq!(h.app.state.results.len(), 1);
    assert!(!h.app.state.is_loading);
    assert_eq!(h.app.controller_state(), ControllerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_enter_searches_immediately_once() {
    let fetcher = RoutedFetcher::default()
        .route(GIPHY_URL, Ok(giphy_hits(&["a", "b"])))
        .route(TENOR_URL, Ok(json!({ "results": [] })));
    let mut h = harness("gk", "tk", fetcher);

    type_text(&mut h.app, "dog");
    h.app.handle_key_event(key(KeyCode::Enter));
    assert!(h.app.state.is_loading);

    apply_next(&mut h.app).await;
    sleep(Duration::from_millis(3000)).await;

    assert_eq!(h.fetcher.calls(), 2);
    assert_eq!(h.app.state.results.len(), 2);
    assert!(!h.app.state.is_loading);
}

#[tokio::test]
async fn test_no_keys_means_no_results_and_no_requests() {
    let mut h = harness("", "", RoutedFetcher::default());
    assert!(!h.app.giphy_enabled());
    assert!(!h.app.tenor_enabled());

    type_text(&mut h.app, "cat");
    h.app.commit_search();
    apply_next(&mut h.app).await;

    assert_eq!(h.fetcher.calls(), 0);
    assert!(h.app.state.results.is_empty());
    assert_eq!(h.app.state.error.as_deref(), Some(NO_RESULTS));
    assert_eq!(h.app.focus, FocusState::Input);
}

#[tokio::test]
async fn test_tenor_failure_keeps_giphy_hits() {
    let fetcher = RoutedFetcher::default()
        .route(GIPHY_URL, Ok(giphy_hits(&["a", "b", "c"])))
        .route(TENOR_URL, Err(ProviderError::Status { status: 500 }));
    let mut h = harness("gk", "tk", fetcher);

    type_text(&mut h.app, "cat");
    h.app.commit_search();
    apply_next(&mut h.app).await;

    assert_eq!(h.app.state.results.len(), 3);
    assert!(h.app.state.results.iter().all(|r| r.provenance == Provenance::Giphy));
    assert!(h.app.state.error.is_none());
    assert!(h
        .diagnostics
        .events()
        .iter()
        .any(|e| matches!(e, DiagnosticEvent::ProviderFailed { provider: Provenance::Tenor, .. })));
}

#[tokio::test]
async fn test_selecting_legacy_tenor_hit_sends_its_dimensions() {
    let fetcher = RoutedFetcher::default().route(TENOR_URL, Ok(tenor_legacy_hit("t1", json!("5120"))));
    let mut h = harness("", "tk", fetcher);

    type_text(&mut h.app, "typing");
    h.app.commit_search();
    apply_next(&mut h.app).await;

    h.app.handle_key_event(key(KeyCode::Tab));
    assert_eq!(h.app.focus, FocusState::Results);
    h.app.handle_key_event(key(KeyCode::Enter));

    let sent = h.sink.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message.info.w, 90);
    assert_eq!(message.info.h, 68);
    assert_eq!(message.info.size, 5120);
    assert_eq!(message.body, "Cat typing");
    assert_eq!(message.url, "mxc://tenor.mau.dev/t1");
    assert_eq!(message.filename, "t1.webp");
    assert!(h.app.should_exit());
}

#[tokio::test]
async fn test_invalid_media_is_not_sent() {
    let fetcher = RoutedFetcher::default().route(TENOR_URL, Ok(tenor_legacy_hit("t2", json!(null))));
    let mut h = harness("", "tk", fetcher);

    h.app.commit_search();
    apply_next(&mut h.app).await;
    assert_eq!(h.app.state.results.len(), 1);
    assert!(!h.app.is_sendable(&h.app.state.results[0]));

    let outcome = h.app.select(0);

    assert_eq!(outcome, Err(MessageError::InvalidMedia { id: "t2".to_string() }));
    assert!(h.sink.sent().is_empty());
    assert!(h.app.notice.is_some());
    assert!(!h.app.should_exit());
    assert!(h
        .diagnostics
        .events()
        .contains(&DiagnosticEvent::InvalidMediaSelected { id: "t2".to_string() }));
}

fn tenor_hits_with_one_unsendable() -> Value {
    json!({
        "results": [
            {
                "id": "t-bad",
                "media_formats": {
                    "gif": { "url": "https://media.tenor.com/bad.gif", "dims": [100, 80] }
                }
            },
            {
                "id": "t-good",
                "media_formats": {
                    "gif": { "url": "https://media.tenor.com/good.gif", "dims": [100, 80], "size": 4000 }
                }
            }
        ]
    })
}

#[tokio::test]
async fn test_navigation_skips_unsendable_rows() {
    let fetcher = RoutedFetcher::default()
        .route(GIPHY_URL, Ok(giphy_hits(&["g1"])))
        .route(TENOR_URL, Ok(tenor_hits_with_one_unsendable()));
    let mut h = harness("gk", "tk", fetcher);

    h.app.commit_search();
    apply_next(&mut h.app).await;
    let ids: Vec<&str> = h.app.state.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["g1", "t-bad", "t-good"]);

    h.app.handle_key_event(key(KeyCode::Tab));
    assert_eq!(h.app.selected_index, 0);

    h.app.handle_key_event(key(KeyCode::Down));
    assert_eq!(h.app.selected_index, 2);
    h.app.handle_key_event(key(KeyCode::Down));
    assert_eq!(h.app.selected_index, 2);
    h.app.handle_key_event(key(KeyCode::Up));
    assert_eq!(h.app.selected_index, 0);

    h.app.handle_key_event(key(KeyCode::Down));
    h.app.handle_key_event(key(KeyCode::Enter));
    let sent = h.sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].id, "t-good");
}

#[tokio::test]
async fn test_unsendable_rows_cannot_be_entered() {
    let fetcher = RoutedFetcher::default().route(TENOR_URL, Ok(tenor_legacy_hit("t3", json!(null))));
    let mut h = harness("", "tk", fetcher);

    h.app.commit_search();
    apply_next(&mut h.app).await;
    assert_eq!(h.app.state.results.len(), 1);

    // Nothing sendable, so focus never leaves the input box.
    h.app.handle_key_event(key(KeyCode::Tab));
    assert_eq!(h.app.focus, FocusState::Input);
    h.app.handle_key_event(key(KeyCode::Down));
    assert_eq!(h.app.focus, FocusState::Input);

    h.app.focus = FocusState::Results;
    h.app.selected_index = 0;
    h.app.handle_key_event(key(KeyCode::Enter));

    assert!(h.sink.sent().is_empty());
    assert!(h.app.notice.is_none());
    assert!(h.diagnostics.events().iter().all(|e| !matches!(e, DiagnosticEvent::InvalidMediaSelected { .. })));
    assert!(!h.app.should_exit());
}

#[tokio::test(start_paused = true)]
async fn test_dispose_cancels_pending_search() {
    let mut h = harness("gk", "tk", RoutedFetcher::default());

    type_text(&mut h.app, "bye");
    h.app.dispose();

    sleep(Duration::from_millis(2500)).await;

    assert_eq!(h.fetcher.calls(), 0);
    assert_eq!(h.app.controller_state(), ControllerState::Idle);
}

#[tokio::test]
async fn test_stale_response_does_not_replace_newer_one() {
    let fetcher = RoutedFetcher::default()
        .route(GIPHY_URL, Ok(giphy_hits(&["old"])))
        .route(GIPHY_URL, Ok(giphy_hits(&["new"])));
    let mut h = harness("gk", "", fetcher);

    type_text(&mut h.app, "a");
    h.app.commit_search();
    type_text(&mut h.app, "b");
    h.app.commit_search();

    let mut messages = Vec::new();
    for _ in 0..2 {
        messages.push(h.app.next_search_message().await.unwrap());
    }
    // Newest first, so the older response arrives late.
    messages.sort_by_key(|message| match message {
        SearchMessage::Completed { generation, .. } => std::cmp::Reverse(*generation),
    });

    for message in messages {
        h.app.handle_search_message(message);
    }

    assert_eq!(h.app.state.query, "ab");
    assert_eq!(h.app.controller_state(), ControllerState::Idle);
}

#[tokio::test]
async fn test_credentials_can_be_replaced_at_runtime() {
    let fetcher = RoutedFetcher::default().route(GIPHY_URL, Ok(giphy_hits(&["g1"])));
    let mut h = harness("", "", fetcher);
    assert!(!h.app.giphy_enabled());

    h.app.set_giphy_credential("fresh-key", Some("mxc://gifs.example.org/".to_string()));
    assert!(h.app.giphy_enabled());
    assert!(!h.app.tenor_enabled());

    h.app.commit_search();
    apply_next(&mut h.app).await;
    assert_ok!(h.app.select(0));

    let sent = h.sink.sent();
    assert_eq!(sent[0].url, "mxc://gifs.example.org/g1");
    assert_eq!((sent[0].info.w, sent[0].info.h, sent[0].info.size), (480, 360, 2048));
}

#[test]
fn test_focus_stays_on_input_without_results() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let _guard = runtime.enter();

    let mut h = harness("", "", RoutedFetcher::default());
    h.app.handle_key_event(key(KeyCode::Tab));
    assert_eq!(h.app.focus, FocusState::Input);
    h.app.handle_key_event(key(KeyCode::Down));
    assert_eq!(h.app.focus, FocusState::Input);
    assert_eq!(h.app.selected_index, 0);

    h.app.handle_key_event(key(KeyCode::Backspace));
    assert_eq!(h.app.query(), "");

    h.app.handle_key_event(key(KeyCode::Esc));
    assert!(h.app.should_exit());
}
