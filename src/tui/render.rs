//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState` by immutable reference, draw to a ratatui
//! Frame, and never mutate state or return effects. The separation from
//! TuiRuntime eliminates borrow-checker conflicts between drawing and the
//! reducer.

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{AppState, TuiState, TurnState};
use crate::tui::input;
use crate::tui::toast::{TOAST_TEXT, ToastPhase};
use crate::tui::transcript::{SPINNER_FRAMES, SPINNER_SPEED_DIVISOR};

/// Height of the status line below the input.
const STATUS_HEIGHT: u16 = 1;

/// Transcript horizontal margin (padding on each side).
pub const TRANSCRIPT_MARGIN: u16 = 1;

/// Width reserved for the scrollbar on the right side.
const SCROLLBAR_WIDTH: u16 = 1;

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let state = &app.tui;

    let input_height = input::calculate_input_height(&state.input, area.width, area.height);
    let content_width = transcript_content_width(area.width);
    let viewport_height = area.height.saturating_sub(input_height + STATUS_HEIGHT) as usize;

    // Pre-wrapped transcript lines; slicing below applies the scroll offset.
    let all_lines = state.transcript.render_lines(content_width, state.spinner_frame);
    let total_lines = all_lines.len();
    let scroll_offset = state
        .transcript
        .scroll
        .get_offset(total_lines, viewport_height);
    let visible_end = (scroll_offset + viewport_height).min(total_lines);
    let content_lines: Vec<Line<'static>> = all_lines
        .into_iter()
        .skip(scroll_offset)
        .take(visible_end.saturating_sub(scroll_offset))
        .collect();

    // Bottom-align: pad at the top when content doesn't fill the pane.
    let visible_lines: Vec<Line<'static>> = if content_lines.len() < viewport_height {
        let padding = viewport_height - content_lines.len();
        let mut padded = vec![Line::default(); padding];
        padded.extend(content_lines);
        padded
    } else {
        content_lines
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(input_height),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);

    // NOTE: no .wrap() here. Content is already wrapped to width; a Paragraph
    // wrap would double-wrap and produce artifacts.
    let transcript = Paragraph::new(visible_lines).block(Block::default().borders(Borders::NONE));
    let transcript_area = Rect {
        x: chunks[0].x + TRANSCRIPT_MARGIN,
        y: chunks[0].y,
        width: chunks[0]
            .width
            .saturating_sub(TRANSCRIPT_MARGIN * 2 + SCROLLBAR_WIDTH),
        height: chunks[0].height,
    };
    frame.render_widget(transcript, transcript_area);

    render_scrollbar(frame, chunks[0], total_lines, viewport_height, scroll_offset);

    let input_focused = app.overlay.is_none();
    input::render_input(&state.input, frame, chunks[1], input_focused);

    render_status_line(state, frame, chunks[2]);

    render_toast(state, frame, chunks[0]);

    // Overlay last, so it draws on top.
    if let Some(overlay) = &app.overlay {
        overlay.render(frame, area, chunks[1].y);
    }
}

/// Transcript text width for a given terminal width; accounts for the
/// horizontal margins and the scrollbar column.
pub fn transcript_content_width(terminal_width: u16) -> usize {
    terminal_width.saturating_sub(TRANSCRIPT_MARGIN * 2 + SCROLLBAR_WIDTH) as usize
}

/// Transcript pane height for a given terminal height. Encapsulates the
/// layout so scroll handlers don't need to know about input/status heights.
pub fn transcript_height(state: &TuiState, terminal_height: u16) -> u16 {
    let input_height =
        input::calculate_input_height(&state.input, state.terminal_size.0, terminal_height);
    terminal_height.saturating_sub(input_height + STATUS_HEIGHT)
}

fn render_scrollbar(
    frame: &mut Frame,
    area: Rect,
    total_lines: usize,
    viewport_height: usize,
    scroll_offset: usize,
) {
    if total_lines <= viewport_height {
        return;
    }

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(None)
        .end_symbol(None)
        .track_symbol(None)
        .thumb_style(Style::default().fg(Color::DarkGray));
    let mut scrollbar_state = ScrollbarState::new(total_lines.saturating_sub(viewport_height))
        .position(scroll_offset)
        .viewport_content_length(viewport_height);
    frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
}

/// Formats an elapsed-seconds count for the status line.
fn format_elapsed(secs: u64) -> String {
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

/// Renders the status line below the input.
fn render_status_line(state: &TuiState, frame: &mut Frame, area: Rect) {
    let spans: Vec<Span> = match &state.turn {
        TurnState::Idle => {
            vec![
                Span::styled("Enter", Style::default().fg(Color::DarkGray)),
                Span::raw(" send  "),
                Span::styled("Ctrl+S", Style::default().fg(Color::DarkGray)),
                Span::raw(" settings  "),
                Span::styled("Ctrl+C", Style::default().fg(Color::DarkGray)),
                Span::raw(" quit"),
            ]
        }
        TurnState::AwaitingReply { .. } => {
            let spinner_idx = (state.spinner_frame / SPINNER_SPEED_DIVISOR) % SPINNER_FRAMES.len();
            let mut spans = vec![
                Span::styled(
                    SPINNER_FRAMES[spinner_idx],
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(" "),
                Span::styled(
                    "Contacting assistant...",
                    Style::default().fg(Color::Yellow),
                ),
            ];
            if let Some(secs) = state.turn.elapsed_secs() {
                spans.push(Span::styled(
                    format!(" ({})", format_elapsed(secs)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans
        }
    };

    let status = Paragraph::new(Line::from(spans)).alignment(Alignment::Left);
    frame.render_widget(status, area);
}

/// Draws the memory-saved toast in the bottom-right corner of the transcript
/// pane. The appearing and disappearing phases render dimmed, standing in for
/// the fade animation.
fn render_toast(state: &TuiState, frame: &mut Frame, transcript_area: Rect) {
    let phase = state.toast.phase(Instant::now());
    if phase == ToastPhase::Hidden {
        return;
    }

    let box_width = TOAST_TEXT.width() as u16 + 4;
    let box_height = 3;
    if transcript_area.width < box_width + 2 || transcript_area.height < box_height {
        return;
    }

    let popup = Rect {
        x: transcript_area.right().saturating_sub(box_width + 1),
        y: transcript_area.bottom().saturating_sub(box_height),
        width: box_width,
        height: box_height,
    };

    let style = match phase {
        ToastPhase::Visible => Style::default().fg(Color::Green),
        _ => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::DIM),
    };

    frame.render_widget(Clear, popup);
    let block = Block::default().borders(Borders::ALL).border_style(style);
    let toast = Paragraph::new(Line::from(Span::styled(TOAST_TEXT, style)))
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(toast, popup);
}
