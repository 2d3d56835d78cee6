//! Backend reply → display markup.
//!
//! The markup vocabulary is `<strong>`, `<em>`, `<br>` and the five HTML
//! entities produced by [`escape_html`].

use regex::Regex;
use std::sync::LazyLock;

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold regex must compile"));

static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic regex must compile"));

/// Escape the characters that would otherwise be read as markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Convert a raw reply into display markup.
///
/// `**bold**` becomes `<strong>`, `*italic*` becomes `<em>`, stray `*` are
/// dropped and newlines become `<br>`. Emphasis never spans a line break.
pub fn format_reply(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let escaped = escape_html(text);
    let bold = BOLD_RE.replace_all(&escaped, "<strong>$1</strong>");
    let italic = ITALIC_RE.replace_all(&bold, "<em>$1</em>");
    let stripped = italic.replace('*', "");

    stripped.replace('\n', "<br>")
}
