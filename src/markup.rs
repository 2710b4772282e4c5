//! Chat text to display markup.
//!
//! Raw message text (user input or assistant reply) is converted into a small
//! markup string before it ever reaches the transcript. The vocabulary is
//! closed: `<p>`, `<br>`, `<code>`, `<strong>`, plus the badge span the
//! transcript appends for memory-saved replies. Entity escaping runs first,
//! so text arriving from the wire can never smuggle tags into the markup;
//! the rasterizer in `crate::tui::markup` treats everything between `<` and
//! `>` as one of its own tags.
//!
//! The pipeline is order-sensitive: escaping must happen before the inline
//! substitutions insert real tags.

use std::sync::OnceLock;

use regex::Regex;

static CODE_RE: OnceLock<Regex> = OnceLock::new();
static BOLD_RE: OnceLock<Regex> = OnceLock::new();
static PARAGRAPH_RE: OnceLock<Regex> = OnceLock::new();

/// Inline code: a backtick pair with no backtick in between.
fn code_re() -> &'static Regex {
    CODE_RE.get_or_init(|| Regex::new(r"`([^`]+)`").expect("compile inline code regex"))
}

/// Bold: a double-asterisk pair with no asterisk in between.
fn bold_re() -> &'static Regex {
    BOLD_RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").expect("compile bold regex"))
}

/// Paragraph boundary: a run of two or more newlines.
fn paragraph_re() -> &'static Regex {
    PARAGRAPH_RE.get_or_init(|| Regex::new(r"\n{2,}").expect("compile paragraph regex"))
}

/// Converts raw chat text into transcript markup.
///
/// Stages, in order:
/// 1. escape `& < > ' "` to entities (`&` first so entities stay intact)
/// 2. `` `code` `` spans to `<code>…</code>`
/// 3. `**bold**` spans to `<strong>…</strong>`
/// 4. paragraph blocks split on blank lines, single newlines become `<br>`,
///    each block wrapped in `<p>…</p>`
///
/// Empty input produces an empty string. Unmatched delimiters (a stray
/// backtick or `**` without a partner) are left as literal text. Applying
/// this to already-formatted output double-escapes the entities, so callers
/// format each message exactly once.
pub fn format_message(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let escaped = escape_text(raw);
    let with_code = code_re().replace_all(&escaped, "<code>$1</code>");
    let with_bold = bold_re().replace_all(&with_code, "<strong>$1</strong>");

    let mut markup = String::with_capacity(with_bold.len() + 16);
    for block in paragraph_re().split(&with_bold) {
        markup.push_str("<p>");
        markup.push_str(&block.replace('\n', "<br>"));
        markup.push_str("</p>");
    }
    markup
}

/// Escapes the five markup-significant characters to entity form.
///
/// Every character of the input passes through here; this is the sole
/// injection defense for the markup layer.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
