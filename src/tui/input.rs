//! Input editing state and rendering.
//!
//! The buffer is a flat string with embedded newlines and a char-indexed
//! cursor. Editing works in char units; display wrapping and the on-screen
//! cursor position work in display-width units so wide characters line up.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

/// Minimum input area height including borders (one content row).
const INPUT_HEIGHT_MIN: u16 = 3;

/// Maximum input area height as a fraction of the terminal.
const INPUT_HEIGHT_MAX_PERCENT: f32 = 0.4;

/// Hint shown while the input is empty.
const PLACEHOLDER: &str = "Type your message...";

/// Editable input buffer.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    text: String,
    /// Cursor as a char offset into `text`, 0..=char count.
    cursor: usize,
}

impl InputState {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the buffer holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map_or(self.text.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.text.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    pub fn delete_prev_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = self.byte_index(self.cursor - 1);
        let end = self.byte_index(self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor -= 1;
    }

    pub fn delete_next_char(&mut self) {
        if self.cursor >= self.char_count() {
            return;
        }
        let start = self.byte_index(self.cursor);
        let end = self.byte_index(self.cursor + 1);
        self.text.replace_range(start..end, "");
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    /// Cursor as (row, col) in char units over the logical lines.
    pub fn cursor_position(&self) -> (usize, usize) {
        let mut row = 0;
        let mut col = 0;
        for ch in self.text.chars().take(self.cursor) {
            if ch == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (row, col)
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Char offset of (row, col), with col clamped to the line length.
    fn char_index_at(&self, row: usize, col: usize) -> usize {
        let mut idx = 0;
        for (i, line) in self.text.split('\n').enumerate() {
            let len = line.chars().count();
            if i == row {
                return idx + col.min(len);
            }
            idx += len + 1;
        }
        self.char_count()
    }

    pub fn move_up(&mut self) {
        let (row, col) = self.cursor_position();
        if row > 0 {
            self.cursor = self.char_index_at(row - 1, col);
        }
    }

    pub fn move_down(&mut self) {
        let (row, col) = self.cursor_position();
        if row + 1 < self.line_count() {
            self.cursor = self.char_index_at(row + 1, col);
        }
    }

    pub fn move_line_start(&mut self) {
        let (row, _) = self.cursor_position();
        self.cursor = self.char_index_at(row, 0);
    }

    pub fn move_line_end(&mut self) {
        let (row, _) = self.cursor_position();
        self.cursor = self.char_index_at(row, usize::MAX);
    }

    /// Deletes from the cursor back to the start of the line. On an empty
    /// column this removes the preceding line break instead.
    pub fn kill_to_line_start(&mut self) {
        let (_, col) = self.cursor_position();
        if col == 0 {
            self.delete_prev_char();
            return;
        }
        let start = self.byte_index(self.cursor - col);
        let end = self.byte_index(self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor -= col;
    }

    /// Deletes from the cursor to the end of the line.
    pub fn kill_to_line_end(&mut self) {
        let (row, col) = self.cursor_position();
        let line_len = self
            .text
            .split('\n')
            .nth(row)
            .map_or(0, |l| l.chars().count());
        let remove = line_len.saturating_sub(col);
        if remove == 0 {
            return;
        }
        let start = self.byte_index(self.cursor);
        let end = self.byte_index(self.cursor + remove);
        self.text.replace_range(start..end, "");
    }

    /// Applies a key for basic editing. Keys with chord-level meaning
    /// (submit, kill bindings) are handled by the reducer before this.
    pub fn input(&mut self, key: KeyEvent) {
        if matches!(key.kind, KeyEventKind::Release) {
            return;
        }
        match key.code {
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_char(ch);
            }
            KeyCode::Enter => self.insert_newline(),
            KeyCode::Backspace => self.delete_prev_char(),
            KeyCode::Delete => self.delete_next_char(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Up => self.move_up(),
            KeyCode::Down => self.move_down(),
            KeyCode::Home => self.move_line_start(),
            KeyCode::End => self.move_line_end(),
            _ => {}
        }
    }
}

/// Result of wrapping the buffer for display.
pub struct WrappedInput {
    pub lines: Vec<Line<'static>>,
    /// Visual row of the cursor after wrapping.
    pub cursor_row: usize,
    /// Visual column of the cursor in display-width units.
    pub cursor_col: usize,
}

/// Wraps the buffer at the given display width, tracking where the cursor
/// lands among the wrapped rows.
pub fn wrap_input(input: &InputState, available_width: usize) -> WrappedInput {
    let width = available_width.max(1);
    let (cursor_line, cursor_col) = input.cursor_position();

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut cursor_visual_row = 0;
    let mut cursor_visual_col = 0;

    for (line_idx, logical) in input.text().split('\n').enumerate() {
        let is_cursor_line = line_idx == cursor_line;
        let mut current = String::new();
        let mut current_width = 0usize;
        let line_len = logical.chars().count();

        for (char_idx, ch) in logical.chars().enumerate() {
            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
            if current_width + ch_width > width && current_width > 0 {
                lines.push(Line::raw(std::mem::take(&mut current)));
                current_width = 0;
            }
            if is_cursor_line && char_idx == cursor_col {
                cursor_visual_row = lines.len();
                cursor_visual_col = current_width;
            }
            current.push(ch);
            current_width += ch_width;
        }

        if is_cursor_line && cursor_col >= line_len {
            cursor_visual_row = lines.len();
            cursor_visual_col = current_width;
        }
        lines.push(Line::raw(current));
    }

    WrappedInput {
        lines,
        cursor_row: cursor_visual_row,
        cursor_col: cursor_visual_col,
    }
}

/// Dynamic input area height: collapses to one content row when empty,
/// grows with wrapped content, capped at a share of the terminal.
pub fn calculate_input_height(input: &InputState, terminal_width: u16, terminal_height: u16) -> u16 {
    let content_width = terminal_width.saturating_sub(2).max(1) as usize;
    let rows = wrap_input(input, content_width).lines.len() as u16;
    let desired = rows + 2;
    let max_height =
        ((f32::from(terminal_height) * INPUT_HEIGHT_MAX_PERCENT) as u16).max(INPUT_HEIGHT_MIN);
    desired.clamp(INPUT_HEIGHT_MIN, max_height)
}

/// Renders the bordered input area. When `show_cursor` is false (an overlay
/// has focus) the terminal cursor is not placed.
pub fn render_input(input: &InputState, frame: &mut Frame, area: Rect, show_cursor: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);

    if inner.width == 0 || inner.height == 0 {
        frame.render_widget(block, area);
        return;
    }

    if input.text().is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(hint, area);
        if show_cursor {
            frame.set_cursor_position((inner.x, inner.y));
        }
        return;
    }

    let wrapped = wrap_input(input, inner.width as usize);
    let viewport = inner.height as usize;

    // Keep the cursor row in view when content overflows the area.
    let scroll = if wrapped.cursor_row >= viewport {
        wrapped.cursor_row + 1 - viewport
    } else {
        0
    };

    let visible: Vec<Line<'static>> = wrapped
        .lines
        .into_iter()
        .skip(scroll)
        .take(viewport)
        .collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);

    let cursor_x = inner.x + wrapped.cursor_col as u16;
    let cursor_y = inner.y + (wrapped.cursor_row - scroll) as u16;
    if show_cursor
        && cursor_x < inner.x + inner.width
        && cursor_y < inner.y + inner.height
    {
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_delete_around_cursor() {
        let mut input = InputState::default();
        input.insert_str("helo");
        input.move_left();
        input.insert_char('l');
        assert_eq!(input.text(), "hello");

        input.move_line_end();
        input.delete_prev_char();
        assert_eq!(input.text(), "hell");
    }

    #[test]
    fn test_multibyte_editing() {
        let mut input = InputState::default();
        input.insert_str("héllo");
        input.move_line_start();
        input.move_right();
        input.delete_next_char();
        assert_eq!(input.text(), "hllo");
    }

    #[test]
    fn test_newline_and_vertical_movement() {
        let mut input = InputState::default();
        input.insert_str("first line");
        input.insert_newline();
        input.insert_str("x");
        assert_eq!(input.cursor_position(), (1, 1));

        // Moving up clamps the column to the shorter line on the way back down.
        input.move_up();
        assert_eq!(input.cursor_position(), (0, 1));
        input.move_down();
        assert_eq!(input.cursor_position(), (1, 1));
    }

    #[test]
    fn test_kill_to_line_start() {
        let mut input = InputState::default();
        input.insert_str("keep\ndrop this");
        input.move_line_end();
        input.kill_to_line_start();
        assert_eq!(input.text(), "keep\n");

        // Column already zero: the line break itself goes.
        input.kill_to_line_start();
        assert_eq!(input.text(), "keep");
    }

    #[test]
    fn test_kill_to_line_end() {
        let mut input = InputState::default();
        input.insert_str("keep rest");
        input.move_line_start();
        for _ in 0..4 {
            input.move_right();
        }
        input.kill_to_line_end();
        assert_eq!(input.text(), "keep");
    }

    #[test]
    fn test_is_blank_on_whitespace() {
        let mut input = InputState::default();
        assert!(input.is_blank());
        input.insert_str("  \n  ");
        assert!(input.is_blank());
        input.insert_char('x');
        assert!(!input.is_blank());
    }

    #[test]
    fn test_key_input_dispatch() {
        let mut input = InputState::default();
        input.input(KeyEvent::new(KeyCode::Char('h'), KeyModifiers::NONE));
        input.input(KeyEvent::new(KeyCode::Char('i'), KeyModifiers::NONE));
        input.input(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(input.text(), "h");

        // Ctrl-modified chars are not plain insertions.
        input.input(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(input.text(), "h");
    }

    #[test]
    fn test_wrap_tracks_cursor_across_rows() {
        let mut input = InputState::default();
        input.insert_str("abcdef");
        let wrapped = wrap_input(&input, 5);
        assert_eq!(wrapped.lines.len(), 2);
        assert_eq!((wrapped.cursor_row, wrapped.cursor_col), (1, 1));
    }

    #[test]
    fn test_wrap_counts_wide_chars_by_display_width() {
        let mut input = InputState::default();
        input.insert_str("你好世界");
        let wrapped = wrap_input(&input, 4);
        assert_eq!(wrapped.lines.len(), 2);
    }

    #[test]
    fn test_height_collapses_when_empty() {
        let input = InputState::default();
        assert_eq!(calculate_input_height(&input, 80, 40), 3);
    }

    #[test]
    fn test_height_grows_with_lines_and_caps() {
        let mut input = InputState::default();
        for _ in 0..4 {
            input.insert_str("line");
            input.insert_newline();
        }
        assert_eq!(calculate_input_height(&input, 80, 40), 7);

        for _ in 0..40 {
            input.insert_newline();
        }
        assert_eq!(calculate_input_height(&input, 80, 40), 16);
    }

    #[test]
    fn test_height_counts_soft_wrapped_rows() {
        let mut input = InputState::default();
        input.insert_str(&"x".repeat(200));
        // 200 chars at width 78 wrap to 3 rows.
        assert_eq!(calculate_input_height(&input, 80, 40), 5);
    }
}
