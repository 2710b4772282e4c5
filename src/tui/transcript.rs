//! Transcript state and rendering.
//!
//! The transcript is an append-only sequence of message cells. Cells are
//! immutable once pushed: their markup is produced by the formatter exactly
//! once, in the constructor, and display rendering only rasterizes that
//! cached markup. The transient thinking placeholder lives beside the cells
//! and never persists.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::markup::format_message;
use crate::tui::markup::{BADGE_OPEN_TAG, render_markup};

/// Badge text shown on replies the backend persisted to memory.
pub const MEMORY_BADGE_TEXT: &str = "💾 Saved";

/// Spinner frames for the thinking placeholder.
pub const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Ticks per spinner frame advance.
pub const SPINNER_SPEED_DIVISOR: usize = 4;

/// Prefix on the first line of a user cell.
const USER_PREFIX: &str = "> ";

static NEXT_CELL_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity for one transcript cell, used as a render-cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(u64);

impl CellId {
    fn next() -> Self {
        CellId(NEXT_CELL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// One rendered message in the transcript.
#[derive(Debug, Clone)]
pub struct TranscriptCell {
    pub id: CellId,
    pub sender: Sender,
    /// Raw text as submitted or received.
    pub content: String,
    /// Formatter output, produced once at construction.
    pub markup: String,
    pub memory_saved: bool,
}

impl TranscriptCell {
    /// Creates a user cell. The body passes through the formatter here and
    /// nowhere else.
    pub fn user(content: impl Into<String>) -> Self {
        let content = content.into();
        let markup = format_message(&content);
        Self {
            id: CellId::next(),
            sender: Sender::User,
            content,
            markup,
            memory_saved: false,
        }
    }

    /// Creates an assistant cell. When `memory_saved` is set, the badge span
    /// is appended to the rendered body, inside the final paragraph so it
    /// sits inline after the last line of text.
    pub fn assistant(content: impl Into<String>, memory_saved: bool) -> Self {
        let content = content.into();
        let mut markup = format_message(&content);
        if memory_saved {
            let badge = format!(" <{BADGE_OPEN_TAG}>{MEMORY_BADGE_TEXT}</span>");
            if let Some(body) = markup.strip_suffix("</p>") {
                markup = format!("{body}{badge}</p>");
            } else {
                markup.push_str(&badge);
            }
        }
        Self {
            id: CellId::next(),
            sender: Sender::Assistant,
            content,
            markup,
            memory_saved,
        }
    }

    /// Rasterizes this cell's markup into display lines at the given width.
    fn display_lines(&self, width: usize) -> Vec<Line<'static>> {
        match self.sender {
            Sender::User => {
                let base = Style::default().fg(Color::Gray);
                let prefix_style = Style::default().fg(Color::DarkGray);
                let body_width = width.saturating_sub(USER_PREFIX.len()).max(10);
                render_markup(&self.markup, body_width, base)
                    .into_iter()
                    .enumerate()
                    .map(|(i, line)| {
                        let prefix = if i == 0 { USER_PREFIX } else { "  " };
                        let mut spans = vec![Span::styled(prefix, prefix_style)];
                        spans.extend(line.spans);
                        Line::from(spans)
                    })
                    .collect()
            }
            Sender::Assistant => render_markup(&self.markup, width.max(10), Style::default()),
        }
    }
}

/// Cache of rasterized cell lines keyed by (cell, width).
///
/// Cells are immutable, so entries never go stale; the runtime clears the
/// cache on terminal resize to drop lines for widths no longer in use.
/// Interior mutability lets render passes fill it from `&self`.
#[derive(Debug, Default)]
pub struct WrapCache {
    cache: RefCell<HashMap<(CellId, usize), Vec<Line<'static>>>>,
}

impl WrapCache {
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    fn get(&self, id: CellId, width: usize) -> Option<Vec<Line<'static>>> {
        self.cache.borrow().get(&(id, width)).cloned()
    }

    fn insert(&self, id: CellId, width: usize, lines: Vec<Line<'static>>) {
        self.cache.borrow_mut().insert((id, width), lines);
    }
}

/// Scroll position over the rendered transcript lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollMode {
    /// Pinned to the newest line; the default.
    #[default]
    FollowLatest,
    /// User scrolled back; offset is the first visible line index.
    Anchored { offset: usize },
}

#[derive(Debug, Default)]
pub struct ScrollState {
    pub mode: ScrollMode,
}

impl ScrollState {
    pub fn is_following(&self) -> bool {
        matches!(self.mode, ScrollMode::FollowLatest)
    }

    /// First visible line for the given totals.
    pub fn get_offset(&self, total_lines: usize, viewport_height: usize) -> usize {
        let max_offset = total_lines.saturating_sub(viewport_height);
        match self.mode {
            ScrollMode::FollowLatest => max_offset,
            ScrollMode::Anchored { offset } => offset.min(max_offset),
        }
    }

    pub fn scroll_up(&mut self, lines: usize, total_lines: usize, viewport_height: usize) {
        let current = self.get_offset(total_lines, viewport_height);
        self.mode = ScrollMode::Anchored {
            offset: current.saturating_sub(lines),
        };
    }

    pub fn scroll_down(&mut self, lines: usize, total_lines: usize, viewport_height: usize) {
        let max_offset = total_lines.saturating_sub(viewport_height);
        let next = self.get_offset(total_lines, viewport_height) + lines;
        if next >= max_offset {
            self.mode = ScrollMode::FollowLatest;
        } else {
            self.mode = ScrollMode::Anchored { offset: next };
        }
    }

    pub fn page_up(&mut self, total_lines: usize, viewport_height: usize) {
        self.scroll_up(viewport_height.max(1), total_lines, viewport_height);
    }

    pub fn page_down(&mut self, total_lines: usize, viewport_height: usize) {
        self.scroll_down(viewport_height.max(1), total_lines, viewport_height);
    }

    pub fn scroll_to_top(&mut self) {
        self.mode = ScrollMode::Anchored { offset: 0 };
    }

    pub fn follow_latest(&mut self) {
        self.mode = ScrollMode::FollowLatest;
    }
}

/// Transcript contents plus display state.
#[derive(Debug, Default)]
pub struct TranscriptState {
    pub cells: Vec<TranscriptCell>,
    /// Set while a reply is pending; at most one placeholder ever exists.
    pub thinking_since: Option<Instant>,
    pub scroll: ScrollState,
    pub wrap_cache: WrapCache,
}

impl TranscriptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user message and reveals it.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.cells.push(TranscriptCell::user(content));
        self.scroll.follow_latest();
    }

    /// Appends an assistant message and reveals it.
    pub fn push_assistant(&mut self, content: impl Into<String>, memory_saved: bool) {
        self.cells.push(TranscriptCell::assistant(content, memory_saved));
        self.scroll.follow_latest();
    }

    /// Inserts the thinking placeholder.
    pub fn show_thinking(&mut self) {
        self.thinking_since = Some(Instant::now());
        self.scroll.follow_latest();
    }

    /// Removes the thinking placeholder. Idempotent: both the success and
    /// the failure path call this without checking.
    pub fn clear_thinking(&mut self) {
        self.thinking_since = None;
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking_since.is_some()
    }

    /// Number of placeholder entries currently shown (0 or 1).
    pub fn thinking_count(&self) -> usize {
        usize::from(self.thinking_since.is_some())
    }

    /// Renders the whole transcript as display lines: cells separated by one
    /// blank line, then the thinking placeholder when active.
    pub fn render_lines(&self, width: usize, spinner_frame: usize) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = Vec::new();

        for cell in &self.cells {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            let cell_lines = match self.wrap_cache.get(cell.id, width) {
                Some(cached) => cached,
                None => {
                    let fresh = cell.display_lines(width);
                    self.wrap_cache.insert(cell.id, width, fresh.clone());
                    fresh
                }
            };
            lines.extend(cell_lines);
        }

        if let Some(since) = self.thinking_since {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            lines.push(thinking_line(since, spinner_frame));
        }

        lines
    }
}

/// Builds the animated placeholder line.
fn thinking_line(since: Instant, spinner_frame: usize) -> Line<'static> {
    let spinner_idx = (spinner_frame / SPINNER_SPEED_DIVISOR) % SPINNER_FRAMES.len();
    let dots = ".".repeat((spinner_frame / (SPINNER_SPEED_DIVISOR * 2)) % 4);
    let elapsed = since.elapsed().as_secs();

    let mut spans = vec![
        Span::styled(SPINNER_FRAMES[spinner_idx], Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("Thinking{dots}"),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if elapsed >= 2 {
        spans.push(Span::styled(
            format!(" ({elapsed}s)"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_text(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_cell_markup_is_one_formatter_pass() {
        let cell = TranscriptCell::user("a & b");
        assert_eq!(cell.markup, format_message("a & b"));
        // Double application would have produced &amp;amp;.
        assert!(cell.markup.contains("&amp;"));
        assert!(!cell.markup.contains("&amp;amp;"));
    }

    #[test]
    fn test_assistant_badge_appended_inline() {
        let cell = TranscriptCell::assistant("Hi", true);
        assert!(cell.markup.starts_with("<p>Hi"));
        assert!(cell.markup.contains(MEMORY_BADGE_TEXT));
        assert!(cell.markup.ends_with("</p>"), "badge sits inside the final paragraph");
    }

    #[test]
    fn test_assistant_without_flag_has_no_badge() {
        let cell = TranscriptCell::assistant("Hi", false);
        assert!(!cell.markup.contains(MEMORY_BADGE_TEXT));
    }

    #[test]
    fn test_badge_renders_with_reply_text() {
        let mut transcript = TranscriptState::new();
        transcript.push_assistant("Hi", true);

        let text = all_text(&transcript.render_lines(80, 0));
        assert!(text.contains("Hi"));
        assert!(text.contains(MEMORY_BADGE_TEXT));
    }

    #[test]
    fn test_user_cell_rendered_with_prompt_prefix() {
        let mut transcript = TranscriptState::new();
        transcript.push_user("hello");

        let text = all_text(&transcript.render_lines(80, 0));
        assert!(text.contains("> hello"));
    }

    #[test]
    fn test_cells_are_append_only_in_order() {
        let mut transcript = TranscriptState::new();
        transcript.push_user("one");
        transcript.push_assistant("two", false);
        transcript.push_user("three");

        let contents: Vec<&str> = transcript.cells.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_thinking_count_is_zero_or_one() {
        let mut transcript = TranscriptState::new();
        assert_eq!(transcript.thinking_count(), 0);

        transcript.show_thinking();
        assert_eq!(transcript.thinking_count(), 1);

        // A second show never yields a second placeholder.
        transcript.show_thinking();
        assert_eq!(transcript.thinking_count(), 1);
    }

    #[test]
    fn test_clear_thinking_is_idempotent() {
        let mut transcript = TranscriptState::new();
        transcript.show_thinking();

        transcript.clear_thinking();
        assert_eq!(transcript.thinking_count(), 0);

        // Clearing again is a no-op, not an error.
        transcript.clear_thinking();
        assert_eq!(transcript.thinking_count(), 0);
    }

    #[test]
    fn test_thinking_line_rendered_while_pending() {
        let mut transcript = TranscriptState::new();
        transcript.push_user("hello");
        transcript.show_thinking();

        let text = all_text(&transcript.render_lines(80, 0));
        assert!(text.contains("Thinking"));

        transcript.clear_thinking();
        let text = all_text(&transcript.render_lines(80, 0));
        assert!(!text.contains("Thinking"));
    }

    #[test]
    fn test_append_snaps_scroll_to_follow() {
        let mut transcript = TranscriptState::new();
        transcript.push_user("one");
        transcript.scroll.scroll_up(5, 100, 10);
        assert!(!transcript.scroll.is_following());

        transcript.push_assistant("two", false);
        assert!(transcript.scroll.is_following());
    }

    #[test]
    fn test_scroll_down_past_end_returns_to_follow() {
        let mut scroll = ScrollState::default();
        scroll.scroll_up(10, 100, 20);
        assert!(matches!(scroll.mode, ScrollMode::Anchored { offset: 70 }));

        scroll.scroll_down(20, 100, 20);
        assert!(scroll.is_following());
    }

    #[test]
    fn test_scroll_up_clamps_at_top() {
        let mut scroll = ScrollState::default();
        scroll.scroll_up(500, 100, 20);
        assert_eq!(scroll.get_offset(100, 20), 0);
    }

    #[test]
    fn test_follow_offset_shows_tail() {
        let scroll = ScrollState::default();
        assert_eq!(scroll.get_offset(100, 20), 80);
        assert_eq!(scroll.get_offset(10, 20), 0);
    }

    #[test]
    fn test_cells_separated_by_blank_line() {
        let mut transcript = TranscriptState::new();
        transcript.push_user("one");
        transcript.push_assistant("two", false);

        let lines = transcript.render_lines(80, 0);
        let texts: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(texts, vec!["> one", "", "two"]);
    }

    #[test]
    fn test_wrap_cache_reused_across_renders() {
        let mut transcript = TranscriptState::new();
        transcript.push_user("hello");

        let first = transcript.render_lines(80, 0);
        let second = transcript.render_lines(80, 0);
        assert_eq!(all_text(&first), all_text(&second));
    }
}
