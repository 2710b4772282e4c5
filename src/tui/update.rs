//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects. This is the single source of truth
//! for how events modify state, which makes the submission lifecycle
//! directly testable without a terminal.

use std::time::Instant;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers as CrosstermKeyModifiers, MouseEventKind,
};

use crate::client::{ChatOutcome, ERROR_PREFIX};
use crate::tui::app::{AppState, TuiState, TurnState};
use crate::tui::effects::UiEffect;
use crate::tui::events::UiEvent;
use crate::tui::overlay::{OverlayTransition, SettingsOverlay};
use crate::tui::render;

/// Lines moved per mouse wheel notch.
const MOUSE_SCROLL_LINES: usize = 3;

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.tui.spinner_frame = app.tui.spinner_frame.wrapping_add(1);
            app.tui.toast.tick(Instant::now());
            vec![]
        }
        UiEvent::Frame { width, height } => {
            app.tui.terminal_size = (width, height);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::SettingsLoaded { api_url } => {
            if app.overlay.is_none() {
                app.overlay = Some(SettingsOverlay::open(api_url));
            }
            vec![]
        }
        UiEvent::TurnFinished { result } => finish_turn(&mut app.tui, result),
    }
}

/// Applies the end of a chat round trip.
///
/// The first two lines are the cleanup block and run for every outcome:
/// the thinking placeholder goes away and the request slot reopens before
/// the reply is rendered.
fn finish_turn(tui: &mut TuiState, result: Result<ChatOutcome, String>) -> Vec<UiEffect> {
    tui.transcript.clear_thinking();
    tui.turn = TurnState::Idle;

    match result {
        Ok(outcome) => {
            if outcome.memory_saved {
                tui.toast.trigger(Instant::now());
            }
            tui.transcript.push_assistant(outcome.text, outcome.memory_saved);
        }
        Err(diagnostic) => {
            tui.transcript
                .push_assistant(format!("{ERROR_PREFIX}{diagnostic}"), false);
        }
    }
    vec![]
}

// ============================================================================
// Terminal Event Handlers
// ============================================================================

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) => handle_key(app, key),
        Event::Mouse(mouse) => {
            match mouse.kind {
                MouseEventKind::ScrollUp => scroll_transcript(&mut app.tui, MOUSE_SCROLL_LINES, true),
                MouseEventKind::ScrollDown => {
                    scroll_transcript(&mut app.tui, MOUSE_SCROLL_LINES, false);
                }
                _ => {}
            }
            vec![]
        }
        Event::Paste(text) => {
            let text = text.replace('\t', "    ");
            match app.overlay.as_mut() {
                Some(overlay) => overlay.input.push_str(text.trim()),
                None => app.tui.input.insert_str(&text),
            }
            vec![]
        }
        Event::Resize(_, _) => {
            // Wrapped lines depend on width.
            app.tui.transcript.wrap_cache.clear();
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if matches!(key.kind, KeyEventKind::Release) {
        return vec![];
    }

    // The overlay captures all keys while open.
    if let Some(overlay) = app.overlay.as_mut() {
        let overlay_update = overlay.handle_key(key);
        if matches!(overlay_update.transition, OverlayTransition::Close) {
            app.overlay = None;
        }
        return overlay_update.effects;
    }

    let mods = Modifiers::from(&key);
    handle_control_keys(&mut app.tui, key.code, &mods)
        .or_else(|| handle_scroll_keys(&mut app.tui, key.code, &mods))
        .or_else(|| handle_submission(&mut app.tui, key.code, &mods))
        .unwrap_or_else(|| {
            app.tui.input.input(key);
            vec![]
        })
}

/// Parsed key modifiers for cleaner pattern matching.
struct Modifiers {
    ctrl: bool,
    shift: bool,
    alt: bool,
}

impl Modifiers {
    fn from(key: &KeyEvent) -> Self {
        Self {
            ctrl: key.modifiers.contains(CrosstermKeyModifiers::CONTROL),
            shift: key.modifiers.contains(CrosstermKeyModifiers::SHIFT),
            alt: key.modifiers.contains(CrosstermKeyModifiers::ALT),
        }
    }

    fn none(&self) -> bool {
        !self.ctrl && !self.shift && !self.alt
    }

    fn only_ctrl(&self) -> bool {
        self.ctrl && !self.shift && !self.alt
    }
}

fn handle_control_keys(
    tui: &mut TuiState,
    code: KeyCode,
    mods: &Modifiers,
) -> Option<Vec<UiEffect>> {
    match code {
        // Ctrl+C: clear the draft first, quit on a second press.
        KeyCode::Char('c') if mods.ctrl => {
            if tui.input.text().is_empty() {
                Some(vec![UiEffect::Quit])
            } else {
                tui.input.clear();
                Some(vec![])
            }
        }
        KeyCode::Esc => {
            tui.input.clear();
            Some(vec![])
        }
        KeyCode::Char('s') if mods.only_ctrl() => Some(vec![UiEffect::LoadSettings]),
        KeyCode::Char('a') if mods.only_ctrl() => {
            tui.input.move_line_start();
            Some(vec![])
        }
        KeyCode::Char('e') if mods.only_ctrl() => {
            tui.input.move_line_end();
            Some(vec![])
        }
        KeyCode::Char('u') if mods.only_ctrl() => {
            tui.input.kill_to_line_start();
            Some(vec![])
        }
        KeyCode::Char('k') if mods.only_ctrl() => {
            tui.input.kill_to_line_end();
            Some(vec![])
        }
        KeyCode::Char('j') if mods.only_ctrl() => {
            tui.input.insert_newline();
            Some(vec![])
        }
        _ => None,
    }
}

fn handle_scroll_keys(
    tui: &mut TuiState,
    code: KeyCode,
    mods: &Modifiers,
) -> Option<Vec<UiEffect>> {
    match code {
        KeyCode::PageUp => {
            let (total, viewport) = transcript_metrics(tui);
            tui.transcript.scroll.page_up(total, viewport);
            Some(vec![])
        }
        KeyCode::PageDown => {
            let (total, viewport) = transcript_metrics(tui);
            tui.transcript.scroll.page_down(total, viewport);
            Some(vec![])
        }
        KeyCode::Home if mods.ctrl => {
            tui.transcript.scroll.scroll_to_top();
            Some(vec![])
        }
        KeyCode::End if mods.ctrl => {
            tui.transcript.scroll.follow_latest();
            Some(vec![])
        }
        _ => None,
    }
}

fn handle_submission(tui: &mut TuiState, code: KeyCode, mods: &Modifiers) -> Option<Vec<UiEffect>> {
    match code {
        // Shift+Enter and Alt+Enter insert a line break instead of sending.
        KeyCode::Enter if mods.shift || mods.alt => {
            tui.input.insert_newline();
            Some(vec![])
        }
        KeyCode::Enter if mods.none() => Some(submit_input(tui)),
        _ => None,
    }
}

/// Submission guards, in order: an in-flight request wins, then the blank
/// check. Both drop the key silently.
fn submit_input(tui: &mut TuiState) -> Vec<UiEffect> {
    if tui.turn.is_running() {
        return vec![];
    }
    if tui.input.is_blank() {
        return vec![];
    }

    let message = tui.input.text().trim().to_string();
    tui.transcript.push_user(&message);
    tui.transcript.show_thinking();
    tui.input.clear();
    tui.turn = TurnState::AwaitingReply {
        started_at: Instant::now(),
    };

    vec![UiEffect::StartTurn { message }]
}

fn scroll_transcript(tui: &mut TuiState, lines: usize, up: bool) {
    let (total, viewport) = transcript_metrics(tui);
    if up {
        tui.transcript.scroll.scroll_up(lines, total, viewport);
    } else {
        tui.transcript.scroll.scroll_down(lines, total, viewport);
    }
}

/// (total rendered lines, viewport height) for scroll calculations.
fn transcript_metrics(tui: &TuiState) -> (usize, usize) {
    let (width, height) = tui.terminal_size;
    let viewport = render::transcript_height(tui, height) as usize;
    let content_width = render::transcript_content_width(width);
    let total = tui
        .transcript
        .render_lines(content_width, tui.spinner_frame)
        .len();
    (total, viewport)
}
