// src/ui.rs
use crate::app::{App, FocusState, PLACEHOLDER};
use crate::services::ControllerState;
use crate::types::{GifResult, NO_RESULTS};
use crate::utils::truncate_text;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

pub fn render(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input area
            Constraint::Min(1),    // Results area
            Constraint::Length(1), // Powered-by footer
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_input(frame, app, main_layout[0]);
    render_results(frame, app, main_layout[1]);
    render_footer(frame, main_layout[2]);
    render_status_bar(frame, app, main_layout[3]);

    if let Some(ref notice) = app.notice {
        render_error_popup(frame, notice);
    }
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.focus == FocusState::Input {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    };

    let (input_text, input_style) = if app.query().is_empty() {
        (PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        (app.query(), Style::default().fg(Color::Yellow))
    };

    let input_paragraph = Paragraph::new(format!("> {}", input_text))
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search")
                .border_style(border_style),
        );

    frame.render_widget(input_paragraph, area);
}

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.focus == FocusState::Results {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    };

    let results_block = Block::default()
        .borders(Borders::ALL)
        .title(format!("GIFs ({})", app.state.results.len()))
        .border_style(border_style);

    if app.state.is_loading {
        let loading_paragraph = Paragraph::new("Searching...")
            .style(Style::default().fg(Color::Cyan))
            .block(results_block);
        frame.render_widget(loading_paragraph, area);
    } else if app.state.has_no_results() {
        let empty_paragraph = Paragraph::new(format!("{} for \"{}\"", NO_RESULTS, app.state.query))
            .style(Style::default().fg(Color::DarkGray))
            .block(results_block);
        frame.render_widget(empty_paragraph, area);
    } else if let Some(ref error) = app.state.error {
        let error_paragraph = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .block(results_block);
        frame.render_widget(error_paragraph, area);
    } else if app.state.results.is_empty() {
        let hint = if app.controller_state() == ControllerState::Pending {
            "Waiting for you to stop typing..."
        } else {
            "Type to search GIPHY and Tenor, Enter to search now."
        };
        let empty_paragraph = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(results_block);
        frame.render_widget(empty_paragraph, area);
    } else {
        render_results_list(frame, app, area, results_block);
    }
}

fn render_results_list(frame: &mut Frame, app: &App, area: Rect, block: Block) {
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = app
        .state
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let sendable = app.is_sendable(result);
            let item_text = truncate_text(&result_line(result, sendable), width.max(10));

            let style = if app.focus == FocusState::Results && i == app.selected_index {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else if sendable {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(item_text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan));

    let mut list_state = ListState::default();
    if app.focus == FocusState::Results && !app.state.results.is_empty() {
        list_state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn result_line(result: &GifResult, sendable: bool) -> String {
    let size = result
        .variants
        .first()
        .and_then(|v| v.width.zip(v.height))
        .map(|(w, h)| format!(" {}x{}", w, h))
        .unwrap_or_default();
    let unavailable = if sendable { "" } else { " (unavailable)" };

    format!(
        "[{}] {}{}{} {}",
        result.provenance,
        result.label(),
        size,
        unavailable,
        result.display_url
    )
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new("Powered by GIPHY · Powered by Tenor")
        .alignment(Alignment::Right)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut status_parts = Vec::new();

    for (name, enabled) in app.provider_status() {
        status_parts.push(format!("{}: {}", name, if enabled { "on" } else { "off" }));
    }

    status_parts.push("ESC:Exit".to_string());
    status_parts.push("TAB:Switch".to_string());
    status_parts.push("↑↓:Navigate".to_string());
    status_parts.push("Enter:Search/Send".to_string());

    let status_text = status_parts.join(" | ");
    let status_paragraph = Paragraph::new(status_text).style(Style::default().fg(Color::DarkGray));

    frame.render_widget(status_paragraph, area);
}

fn render_error_popup(frame: &mut Frame, error_message: &str) {
    let popup_area = centered_rect(60, 20, frame.area());

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let error_paragraph = Paragraph::new(error_message)
        .style(Style::default().fg(Color::Red))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .border_style(Style::default().fg(Color::Red)),
        );

    frame.render_widget(error_paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
