// src/app.rs
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{backend::Backend, Terminal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::{
    config::Config,
    diagnostics::{DiagnosticEvent, Diagnostics},
    providers::JsonFetcher,
    services::{Aggregator, ControllerState, MessageBuilder, QueryController, StickerSink},
    types::{AppError, AppResult, GifResult, MessageError, Provenance, SearchMessage, SearchState},
};

pub const PLACEHOLDER: &str = "Find GIFs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Input,
    Results,
}

/// The GIF search panel.
pub struct App {
    // UI State
    pub state: SearchState,
    pub selected_index: usize,
    pub focus: FocusState,
    pub notice: Option<String>,

    // Services
    controller: QueryController,
    aggregator: Arc<Aggregator>,
    message_builder: MessageBuilder,
    sink: Arc<dyn StickerSink>,
    diagnostics: Arc<dyn Diagnostics>,
    search_rx: mpsc::Receiver<SearchMessage>,

    // Control
    exit_on_send: bool,
    should_exit: bool,
}

impl App {
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn JsonFetcher>,
        sink: Arc<dyn StickerSink>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        let aggregator = Arc::new(Aggregator::from_config(config, fetcher, diagnostics.clone()));
        let (search_tx, search_rx) = mpsc::channel::<SearchMessage>(32);
        let controller = QueryController::new(
            aggregator.clone(),
            search_tx,
            Duration::from_millis(config.search.debounce_ms),
        );

        Self {
            state: SearchState::default(),
            selected_index: 0,
            focus: FocusState::Input,
            notice: None,
            controller,
            aggregator,
            message_builder: MessageBuilder::new(config.message.clone()),
            sink,
            diagnostics,
            search_rx,
            exit_on_send: config.general.exit_on_send,
            should_exit: false,
        }
    }

    pub fn query(&self) -> &str {
        self.controller.query()
    }

    pub fn controller_state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn set_giphy_credential(&self, api_key: impl Into<String>, media_prefix: Option<String>) {
        self.aggregator
            .provider(Provenance::Giphy)
            .set_credential(api_key.into(), media_prefix);
    }

    pub fn set_tenor_credential(&self, api_key: impl Into<String>, media_prefix: Option<String>) {
        self.aggregator
            .provider(Provenance::Tenor)
            .set_credential(api_key.into(), media_prefix);
    }

    pub fn giphy_enabled(&self) -> bool {
        self.aggregator.provider(Provenance::Giphy).is_enabled()
    }

    pub fn tenor_enabled(&self) -> bool {
        self.aggregator.provider(Provenance::Tenor).is_enabled()
    }

    /// Provider names paired with whether they will be queried.
    pub fn provider_status(&self) -> Vec<(&str, bool)> {
        self.aggregator
            .providers()
            .into_iter()
            .map(|p| (p.name(), p.is_enabled()))
            .collect()
    }

    pub fn is_sendable(&self, result: &GifResult) -> bool {
        let prefix = self.media_prefix(result.provenance);
        self.message_builder.can_build(result, &prefix)
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> AppResult<()> {
        loop {
            if self.should_exit {
                break;
            }

            // Draw UI
            terminal
                .draw(|frame| crate::ui::render(frame, self))
                .map_err(|e| AppError::Terminal(e.to_string()))?;

            // Handle events with timeout
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key_event) = event::read()? {
                    if key_event.kind == KeyEventKind::Press {
                        self.handle_key_event(key_event);
                    }
                }
            }

            // Handle search messages
            while let Ok(message) = self.search_rx.try_recv() {
                self.handle_search_message(message);
            }
            self.refresh_loading();

            // Let timer and search tasks make progress between frames
            tokio::task::yield_now().await;
        }

        self.dispose();
        Ok(())
    }

    pub fn handle_key_event(&mut self, event: KeyEvent) {
        self.notice = None;

        match event.code {
            KeyCode::Esc => self.should_exit = true,

            KeyCode::Enter => match self.focus {
                FocusState::Input => self.commit_search(),
                FocusState::Results => {
                    // Unsendable rows can't be picked; other failures are
                    // already on screen as a notice
                    if self.is_sendable_at(self.selected_index) {
                        let _ = self.select(self.selected_index);
                    }
                }
            },

            KeyCode::Tab => self.cycle_focus(),

            KeyCode::Up => {
                if self.focus == FocusState::Results {
                    self.navigate_results(-1);
                }
            }

            KeyCode::Down => match self.focus {
                FocusState::Input => self.cycle_focus(),
                FocusState::Results => self.navigate_results(1),
            },

            KeyCode::Char(c) => {
                if self.focus == FocusState::Input {
                    let mut query = self.controller.query().to_string();
                    query.push(c);
                    self.controller.on_query_changed(query);
                }
            }

            KeyCode::Backspace => {
                if self.focus == FocusState::Input && !self.controller.query().is_empty() {
                    let mut query = self.controller.query().to_string();
                    query.pop();
                    self.controller.on_query_changed(query);
                }
            }

            _ => {}
        }
    }

    pub fn commit_search(&mut self) {
        if self.controller.commit().is_some() {
            self.refresh_loading();
        }
    }

    pub fn handle_search_message(&mut self, message: SearchMessage) {
        match message {
            SearchMessage::Completed { generation, state } => {
                if !self.controller.complete(generation) {
                    tracing::debug!(generation, "dropping stale search result");
                    return;
                }

                self.state = state;
                match self.first_sendable() {
                    Some(index) => self.selected_index = index,
                    None => {
                        self.selected_index = 0;
                        self.focus = FocusState::Input;
                    }
                }
                self.refresh_loading();
            }
        }
    }

    /// Build and send the sticker for the result at `index`.
    pub fn select(&mut self, index: usize) -> Result<(), MessageError> {
        let Some(result) = self.state.results.get(index) else {
            return Ok(());
        };

        let prefix = self.media_prefix(result.provenance);
        match self.message_builder.build(result, &prefix) {
            Ok(message) => {
                tracing::info!(id = %message.id, provider = %result.provenance, "sending sticker");
                self.sink.send(message);
                if self.exit_on_send {
                    self.should_exit = true;
                }
                Ok(())
            }
            Err(e) => {
                self.diagnostics.emit(DiagnosticEvent::InvalidMediaSelected {
                    id: result.id.clone(),
                });
                self.notice = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Tear the panel down. A pending search timer never fires afterwards.
    pub fn dispose(&mut self) {
        self.controller.dispose();
    }

    fn media_prefix(&self, provenance: Provenance) -> String {
        self.aggregator.provider(provenance).credential().media_prefix
    }

    fn refresh_loading(&mut self) {
        self.state.is_loading = self.controller.state() == ControllerState::Searching;
    }

    fn is_sendable_at(&self, index: usize) -> bool {
        self.state
            .results
            .get(index)
            .is_some_and(|result| self.is_sendable(result))
    }

    fn first_sendable(&self) -> Option<usize> {
        (0..self.state.results.len()).find(|&i| self.is_sendable_at(i))
    }

    fn cycle_focus(&mut self) {
        match self.focus {
            FocusState::Input => {
                if let Some(index) = self.first_sendable() {
                    self.focus = FocusState::Results;
                    self.selected_index = index;
                }
            }
            FocusState::Results => {
                self.focus = FocusState::Input;
            }
        }
    }

    /// Move to the next sendable row in `direction`, staying put when there
    /// is none.
    fn navigate_results(&mut self, direction: i32) {
        let next = if direction > 0 {
            (self.selected_index + 1..self.state.results.len()).find(|&i| self.is_sendable_at(i))
        } else {
            (0..self.selected_index).rev().find(|&i| self.is_sendable_at(i))
        };

        if let Some(index) = next {
            self.selected_index = index;
        }
    }

    #[cfg(test)]
    pub(crate) async fn next_search_message(&mut self) -> Option<SearchMessage> {
        self.search_rx.recv().await
    }
}
