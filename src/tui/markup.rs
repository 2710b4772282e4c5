//! Markup rasterization for the transcript.
//!
//! Turns formatter output (`crate::markup`) into styled, width-wrapped
//! ratatui lines. The tag vocabulary is closed (`<p>`, `<br>`, `<code>`,
//! `<strong>`, and the memory badge span), and the five escape entities are
//! decoded back to characters for display. Anything else between `<` and
//! `>` is dropped rather than printed, so text that never went through the
//! formatter cannot draw stray tags on screen.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Opening tag of the badge appended to memory-saved replies.
pub const BADGE_OPEN_TAG: &str = r#"span class="memory-badge""#;

/// Renders a markup string into wrapped display lines.
///
/// `base` styles plain text; code spans, bold spans, and the badge carry
/// their own styles. Paragraphs are separated by one blank line, `<br>`
/// starts a new line within a paragraph. Empty markup renders as a single
/// empty line.
pub fn render_markup(markup: &str, width: usize, base: Style) -> Vec<Line<'static>> {
    let logical = parse_markup(markup, base);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for logical_line in logical {
        lines.extend(wrap_spans(logical_line, width));
    }

    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

/// Parses markup into logical (unwrapped) lines of styled spans.
fn parse_markup(markup: &str, base: Style) -> Vec<Vec<Span<'static>>> {
    let code_style = Style::default().fg(Color::Yellow);
    let strong_style = base.add_modifier(Modifier::BOLD);
    let badge_style = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);

    let mut lines: Vec<Vec<Span<'static>>> = Vec::new();
    let mut current_line: Vec<Span<'static>> = Vec::new();
    let mut current_text = String::new();
    // Innermost style wins; `base` sits at the bottom of the stack.
    let mut style_stack: Vec<Style> = vec![base];
    let mut saw_paragraph = false;

    let mut chars = markup.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                let mut tag = String::new();
                for t in chars.by_ref() {
                    if t == '>' {
                        break;
                    }
                    tag.push(t);
                }

                let style = *style_stack.last().unwrap_or(&base);
                match tag.as_str() {
                    "p" => {
                        flush_span(&mut current_text, style, &mut current_line);
                        if saw_paragraph {
                            if !current_line.is_empty() {
                                flush_line(&mut current_line, &mut lines);
                            }
                            // Blank separator between paragraph blocks.
                            lines.push(Vec::new());
                        }
                        saw_paragraph = true;
                    }
                    "/p" => {
                        flush_span(&mut current_text, style, &mut current_line);
                        flush_line(&mut current_line, &mut lines);
                    }
                    "br" => {
                        flush_span(&mut current_text, style, &mut current_line);
                        flush_line(&mut current_line, &mut lines);
                    }
                    "code" => {
                        flush_span(&mut current_text, style, &mut current_line);
                        style_stack.push(code_style);
                    }
                    "strong" => {
                        flush_span(&mut current_text, style, &mut current_line);
                        style_stack.push(strong_style);
                    }
                    t if t == BADGE_OPEN_TAG => {
                        flush_span(&mut current_text, style, &mut current_line);
                        style_stack.push(badge_style);
                    }
                    "/code" | "/strong" | "/span" => {
                        flush_span(&mut current_text, style, &mut current_line);
                        if style_stack.len() > 1 {
                            style_stack.pop();
                        }
                    }
                    // Unknown tag: drop it.
                    _ => {}
                }
            }
            '&' => current_text.push(decode_entity(&mut chars)),
            _ => current_text.push(ch),
        }
    }

    let style = *style_stack.last().unwrap_or(&base);
    flush_span(&mut current_text, style, &mut current_line);
    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines
}

fn flush_span(text: &mut String, style: Style, line: &mut Vec<Span<'static>>) {
    if !text.is_empty() {
        line.push(Span::styled(std::mem::take(text), style));
    }
}

fn flush_line(line: &mut Vec<Span<'static>>, lines: &mut Vec<Vec<Span<'static>>>) {
    lines.push(std::mem::take(line));
}

/// Decodes one entity after a consumed `&`.
///
/// Only the five entities the formatter emits are recognized; anything else
/// yields the ampersand back and leaves the iterator untouched beyond it.
fn decode_entity(chars: &mut std::iter::Peekable<std::str::Chars>) -> char {
    const ENTITIES: [(&str, char); 5] = [
        ("amp;", '&'),
        ("lt;", '<'),
        ("gt;", '>'),
        ("quot;", '"'),
        ("#39;", '\''),
    ];

    for (name, decoded) in ENTITIES {
        let mut lookahead = chars.clone();
        if name.chars().all(|expected| lookahead.next() == Some(expected)) {
            for _ in 0..name.len() {
                chars.next();
            }
            return decoded;
        }
    }
    '&'
}

/// Wraps one logical line of spans to the given display width.
///
/// Word-based with unicode-aware widths; words longer than the width are
/// broken at character boundaries. An empty logical line stays one empty
/// visual line.
fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![Line::from(spans)];
    }
    if spans.is_empty() {
        return vec![Line::default()];
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;

    let mut emit = |current: &mut Vec<Span<'static>>, current_width: &mut usize| {
        trim_trailing_spaces(current);
        lines.push(Line::from(std::mem::take(current)));
        *current_width = 0;
    };

    for span in spans {
        let style = span.style;
        for piece in split_inclusive_spaces(&span.content) {
            let piece_width = piece.width();

            if current_width + piece_width <= width {
                push_piece(&mut current, piece, style);
                current_width += piece_width;
                continue;
            }

            if piece.trim().is_empty() {
                // Trailing spaces never force a wrap; drop them at the edge.
                emit(&mut current, &mut current_width);
                continue;
            }

            if piece_width <= width {
                emit(&mut current, &mut current_width);
                push_piece(&mut current, piece, style);
                current_width += piece_width;
            } else {
                // Word wider than the viewport: hard-break by character.
                for ch in piece.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if current_width + ch_width > width && current_width > 0 {
                        emit(&mut current, &mut current_width);
                    }
                    push_piece(&mut current, &ch.to_string(), style);
                    current_width += ch_width;
                }
            }
        }
    }

    if !current.is_empty() {
        trim_trailing_spaces(&mut current);
        lines.push(Line::from(current));
    }
    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

/// Splits text into alternating word and whitespace pieces, preserving both.
fn split_inclusive_spaces(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_space = None::<bool>;

    for (idx, ch) in text.char_indices() {
        let is_space = ch == ' ';
        match in_space {
            Some(prev) if prev != is_space => {
                pieces.push(&text[start..idx]);
                start = idx;
                in_space = Some(is_space);
            }
            None => in_space = Some(is_space),
            _ => {}
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Removes space-only tail content left behind when a word forces a wrap.
fn trim_trailing_spaces(line: &mut Vec<Span<'static>>) {
    while let Some(last) = line.last_mut() {
        let trimmed = last.content.trim_end_matches(' ');
        if trimmed.len() == last.content.len() {
            break;
        }
        if trimmed.is_empty() {
            line.pop();
        } else {
            last.content = std::borrow::Cow::Owned(trimmed.to_string());
            break;
        }
    }
}

/// Appends a text piece, merging into the previous span when styles match.
fn push_piece(line: &mut Vec<Span<'static>>, piece: &str, style: Style) {
    if let Some(last) = line.last_mut()
        && last.style == style
    {
        last.content.to_mut().push_str(piece);
        return;
    }
    line.push(Span::styled(piece.to_string(), style));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn all_text(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(line_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_plain_paragraph() {
        let lines = render_markup("<p>hello</p>", 80, Style::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "hello");
    }

    #[test]
    fn test_paragraphs_separated_by_blank_line() {
        let lines = render_markup("<p>one</p><p>two</p>", 80, Style::default());
        assert_eq!(
            lines.iter().map(line_text).collect::<Vec<_>>(),
            vec!["one", "", "two"]
        );
    }

    #[test]
    fn test_br_breaks_line_without_blank() {
        let lines = render_markup("<p>one<br>two</p>", 80, Style::default());
        assert_eq!(
            lines.iter().map(line_text).collect::<Vec<_>>(),
            vec!["one", "two"]
        );
    }

    #[test]
    fn test_entities_decode_for_display() {
        let lines = render_markup(
            "<p>&lt;tag&gt; &amp; &quot;q&quot; &#39;s&#39;</p>",
            80,
            Style::default(),
        );
        assert_eq!(line_text(&lines[0]), "<tag> & \"q\" 's'");
    }

    #[test]
    fn test_code_span_styled() {
        let lines = render_markup("<p>use <code>cargo</code> here</p>", 80, Style::default());
        let code_span = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "cargo")
            .expect("code span present");
        assert_eq!(code_span.style.fg, Some(Color::Yellow));
    }

    #[test]
    fn test_strong_span_bold() {
        let lines = render_markup("<p><strong>loud</strong></p>", 80, Style::default());
        let strong = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "loud")
            .expect("strong span present");
        assert!(strong.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_badge_span_styled_green() {
        let markup = format!("<p>Hi</p><{BADGE_OPEN_TAG}>💾 Saved</span>");
        let lines = render_markup(&markup, 80, Style::default());
        let badge = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content.contains("Saved"))
            .expect("badge span present");
        assert_eq!(badge.style.fg, Some(Color::Green));
    }

    #[test]
    fn test_unknown_tag_dropped() {
        let lines = render_markup("<p><blink>x</blink></p>", 80, Style::default());
        assert_eq!(all_text(&lines), "x");
        assert!(!all_text(&lines).contains("blink"));
    }

    #[test]
    fn test_wraps_at_width() {
        let lines = render_markup("<p>alpha beta gamma</p>", 11, Style::default());
        assert_eq!(
            lines.iter().map(line_text).collect::<Vec<_>>(),
            vec!["alpha beta", "gamma"]
        );
    }

    #[test]
    fn test_long_word_hard_broken() {
        let lines = render_markup("<p>abcdefghij</p>", 4, Style::default());
        assert_eq!(
            lines.iter().map(line_text).collect::<Vec<_>>(),
            vec!["abcd", "efgh", "ij"]
        );
    }

    #[test]
    fn test_style_survives_wrap() {
        let lines = render_markup(
            "<p><code>one two three four</code></p>",
            8,
            Style::default(),
        );
        assert!(lines.len() > 1);
        for line in &lines {
            for span in &line.spans {
                assert_eq!(span.style.fg, Some(Color::Yellow));
            }
        }
    }

    #[test]
    fn test_empty_markup_single_empty_line() {
        let lines = render_markup("", 80, Style::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "");
    }

    #[test]
    fn test_cjk_wraps_by_display_width() {
        // Four double-width characters need two lines at width 4.
        let lines = render_markup("<p>你好世界</p>", 4, Style::default());
        assert_eq!(
            lines.iter().map(line_text).collect::<Vec<_>>(),
            vec!["你好", "世界"]
        );
    }
}
