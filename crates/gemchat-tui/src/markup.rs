//! Reply markup → styled terminal lines.
//!
//! Understands exactly what the formatter emits: `<strong>`, `<em>`, `<br>`
//! and a handful of entities. Anything else between `<` and `>` is dropped.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

const ENTITIES: &[(&str, char)] = &[
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#39;", '\''),
];

struct LineBuilder {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    current: String,
    bold: usize,
    italic: usize,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            spans: Vec::new(),
            current: String::new(),
            bold: 0,
            italic: 0,
        }
    }

    fn style(&self) -> Style {
        let mut style = Style::default();
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        style
    }

    /// Close the pending text run with the current style
    fn flush(&mut self) {
        if !self.current.is_empty() {
            let text = std::mem::take(&mut self.current);
            self.spans.push(Span::styled(text, self.style()));
        }
    }

    fn break_line(&mut self) {
        self.flush();
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
    }

    fn tag(&mut self, name: &str) {
        let name = name.trim().trim_end_matches('/').trim();
        self.flush();
        match name {
            "strong" | "b" => self.bold += 1,
            "/strong" | "/b" => self.bold = self.bold.saturating_sub(1),
            "em" | "i" => self.italic += 1,
            "/em" | "/i" => self.italic = self.italic.saturating_sub(1),
            "br" => self.break_line(),
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        self.lines
    }
}

fn decode_entity(rest: &str) -> Option<(char, usize)> {
    ENTITIES
        .iter()
        .find(|(entity, _)| rest.starts_with(entity))
        .map(|(entity, c)| (*c, entity.len()))
}

/// Render markup into lines; always returns at least one line
pub fn to_lines(markup: &str) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::new();
    let mut rest = markup;

    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some(end) = rest.find('>') {
                builder.tag(&rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }

        if c == '&' {
            if let Some((decoded, len)) = decode_entity(rest) {
                builder.current.push(decoded);
                rest = &rest[len..];
                continue;
            }
        }

        builder.current.push(c);
        rest = &rest[c.len_utf8()..];
    }

    builder.finish()
}

/// Plain text of a line, for width calculations and tests
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}
