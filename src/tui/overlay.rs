//! Settings overlay for editing the assistant endpoint.
//!
//! A modal single-field editor. It opens prefilled with the persisted value,
//! saves on Enter exactly as typed (the store applies trimming and the blank
//! fallback), and closes without saving on Esc.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::tui::effects::UiEffect;

const OVERLAY_WIDTH: u16 = 60;
const OVERLAY_HEIGHT: u16 = 7;

/// Transition returned by the overlay key handler.
#[derive(Debug)]
pub enum OverlayTransition {
    Stay,
    Close,
}

/// Update returned by the overlay key handler.
#[derive(Debug)]
pub struct OverlayUpdate {
    pub transition: OverlayTransition,
    pub effects: Vec<UiEffect>,
}

impl OverlayUpdate {
    fn stay() -> Self {
        Self {
            transition: OverlayTransition::Stay,
            effects: Vec::new(),
        }
    }

    fn close() -> Self {
        Self {
            transition: OverlayTransition::Close,
            effects: Vec::new(),
        }
    }

    fn close_with(effects: Vec<UiEffect>) -> Self {
        Self {
            transition: OverlayTransition::Close,
            effects,
        }
    }
}

/// State for the settings overlay.
#[derive(Debug, Clone)]
pub struct SettingsOverlay {
    /// Editable endpoint value.
    pub input: String,
}

impl SettingsOverlay {
    /// Opens the overlay prefilled with the persisted endpoint.
    pub fn open(api_url: String) -> Self {
        Self { input: api_url }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> OverlayUpdate {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => OverlayUpdate::close(),
            KeyCode::Char('c') if ctrl => OverlayUpdate::close(),
            KeyCode::Enter => OverlayUpdate::close_with(vec![UiEffect::SaveSettings {
                raw: self.input.clone(),
            }]),
            KeyCode::Backspace => {
                self.input.pop();
                OverlayUpdate::stay()
            }
            KeyCode::Char('u') if ctrl => {
                self.input.clear();
                OverlayUpdate::stay()
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.push(c);
                OverlayUpdate::stay()
            }
            _ => OverlayUpdate::stay(),
        }
    }

    /// Renders the overlay centered above the input area.
    pub fn render(&self, frame: &mut Frame, area: Rect, input_top_y: u16) {
        let popup = centered_area(area, input_top_y, OVERLAY_WIDTH, OVERLAY_HEIGHT);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Assistant Settings ")
            .title_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(block, popup);

        let inner = Rect::new(
            popup.x + 1,
            popup.y + 1,
            popup.width.saturating_sub(2),
            popup.height.saturating_sub(2),
        );
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let label = Paragraph::new(Line::from(Span::styled(
            "API URL",
            Style::default().fg(Color::DarkGray),
        )));
        frame.render_widget(label, Rect::new(inner.x, inner.y, inner.width, 1));

        // Input line: "> <value>█", value truncated from the start so the
        // editable tail stays visible.
        let max_text_width = inner.width.saturating_sub(3) as usize;
        let display = truncate_start(&self.input, max_text_width);
        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::DarkGray)),
            Span::styled(display, Style::default().fg(Color::Yellow)),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ]);
        frame.render_widget(
            Paragraph::new(input_line),
            Rect::new(inner.x, inner.y + 1, inner.width, 1),
        );

        let help = Paragraph::new(Line::from(Span::styled(
            "Blank restores the default endpoint",
            Style::default().fg(Color::DarkGray),
        )));
        frame.render_widget(help, Rect::new(inner.x, inner.y + 3, inner.width, 1));

        let hints = Line::from(vec![
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::styled(" save", Style::default().fg(Color::DarkGray)),
            Span::styled(" • ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
        ]);
        let footer_y = inner.y + inner.height.saturating_sub(1);
        frame.render_widget(
            Paragraph::new(hints).alignment(Alignment::Center),
            Rect::new(inner.x, footer_y, inner.width, 1),
        );
    }
}

/// Centers the popup horizontally, and vertically within the space above
/// the input area.
fn centered_area(area: Rect, available_height: u16, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(available_height.saturating_sub(2)).max(3);
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (available_height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Truncates from the start, keeping the tail within `max_width` columns.
fn truncate_start(value: &str, max_width: usize) -> String {
    let total: usize = value
        .chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
        .sum();
    if total <= max_width {
        return value.to_string();
    }

    let keep_width = max_width.saturating_sub(1);
    let mut acc = 0usize;
    let mut kept: Vec<char> = Vec::new();
    for ch in value.chars().rev() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if acc + w > keep_width {
            break;
        }
        acc += w;
        kept.push(ch);
    }
    let tail: String = kept.into_iter().rev().collect();
    format!("…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_open_prefills_the_field() {
        let overlay = SettingsOverlay::open("http://localhost:9999".to_string());
        assert_eq!(overlay.input, "http://localhost:9999");
    }

    #[test]
    fn test_enter_saves_current_value_and_closes() {
        let mut overlay = SettingsOverlay::open("http://a".to_string());
        overlay.handle_key(key(KeyCode::Char('b')));

        let update = overlay.handle_key(key(KeyCode::Enter));
        assert!(matches!(update.transition, OverlayTransition::Close));
        assert_eq!(
            update.effects,
            vec![UiEffect::SaveSettings {
                raw: "http://ab".to_string()
            }]
        );
    }

    #[test]
    fn test_enter_on_blank_field_still_saves() {
        // The store resolves blanks to the default; the overlay does not
        // second-guess the entry.
        let mut overlay = SettingsOverlay::open(String::new());
        let update = overlay.handle_key(key(KeyCode::Enter));
        assert!(matches!(update.transition, OverlayTransition::Close));
        assert_eq!(
            update.effects,
            vec![UiEffect::SaveSettings { raw: String::new() }]
        );
    }

    #[test]
    fn test_esc_closes_without_saving() {
        let mut overlay = SettingsOverlay::open("http://a".to_string());
        let update = overlay.handle_key(key(KeyCode::Esc));
        assert!(matches!(update.transition, OverlayTransition::Close));
        assert!(update.effects.is_empty());
    }

    #[test]
    fn test_editing_keys() {
        let mut overlay = SettingsOverlay::open("ab".to_string());
        overlay.handle_key(key(KeyCode::Backspace));
        assert_eq!(overlay.input, "a");

        overlay.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(overlay.input, "");
    }

    #[test]
    fn test_truncate_start_keeps_tail() {
        assert_eq!(truncate_start("short", 10), "short");
        assert_eq!(truncate_start("abcdefgh", 5), "…efgh");
    }
}
