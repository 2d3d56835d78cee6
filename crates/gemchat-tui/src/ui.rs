use crate::app::{App, EntryKind, InputMode};
use crate::markup;
use gemchat_core::presentation::{WELCOME_HINT, WELCOME_TITLE};
use gemchat_core::Theme;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Colors for one theme
struct Palette {
    bar_bg: Color,
    bar_fg: Color,
    title: Color,
    user: Color,
    assistant: Color,
    text: Color,
    muted: Color,
    notice: Color,
    border: Color,
    focus: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            bar_bg: Color::DarkGray,
            bar_fg: Color::White,
            title: Color::Cyan,
            user: Color::Cyan,
            assistant: Color::Yellow,
            text: Color::Reset,
            muted: Color::DarkGray,
            notice: Color::LightRed,
            border: Color::DarkGray,
            focus: Color::Yellow,
        },
        Theme::Light => Palette {
            bar_bg: Color::Gray,
            bar_fg: Color::Black,
            title: Color::Blue,
            user: Color::Blue,
            assistant: Color::Magenta,
            text: Color::Black,
            muted: Color::Gray,
            notice: Color::Red,
            border: Color::Gray,
            focus: Color::Blue,
        },
    }
}

/// Lines of the welcome block shown above an empty conversation
pub fn welcome_lines(app: &App) -> Vec<Line<'static>> {
    let p = palette(app.theme);
    vec![
        Line::from(Span::styled(
            WELCOME_TITLE,
            Style::default().fg(p.title).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(app.welcome, Style::default().fg(p.text))),
        Line::default(),
        Line::from(Span::styled(
            WELCOME_HINT,
            Style::default().fg(p.muted).add_modifier(Modifier::ITALIC),
        )),
        Line::default(),
    ]
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let suggestions_height = if app.show_suggestions && app.show_welcome() {
        (app.suggestions.len() + 2) as u16 // +2 for borders
    } else {
        0
    };

    // Main layout: header, chat, suggestions, input, footer
    let [header_area, chat_area, suggestions_area, input_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(suggestions_height),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    if suggestions_height > 0 {
        render_suggestions(app, frame, suggestions_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let p = palette(app.theme);

    let status = if app.generating {
        Span::styled(" ● generating ", Style::default().fg(p.focus).bold())
    } else {
        Span::raw("")
    };

    let title = Line::from(vec![
        Span::styled(" Gemini Chat ", Style::default().fg(p.title).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(p.bar_fg),
        ),
        status,
        Span::styled(
            format!(" [{}] ", app.theme.as_str()),
            Style::default().fg(p.bar_fg),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(p.bar_bg));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let p = palette(app.theme);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let mut lines: Vec<Line> = Vec::new();

    if app.show_welcome() {
        lines.extend(welcome_lines(app));
    }

    for entry in &app.entries {
        match entry.kind {
            EntryKind::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(p.user).add_modifier(Modifier::BOLD),
                )));
                for line in entry.text.split('\n') {
                    lines.push(Line::from(Span::styled(
                        line.to_string(),
                        Style::default().fg(p.text),
                    )));
                }
            }
            EntryKind::Assistant => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(p.assistant).add_modifier(Modifier::BOLD),
                )));
                lines.extend(markup::to_lines(&entry.text));
            }
            EntryKind::Typing => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(p.assistant).add_modifier(Modifier::BOLD),
                )));
                // Animated ellipsis: cycles through ".", "..", "..."
                let dots = ".".repeat((app.animation_frame as usize) + 1);
                lines.push(Line::from(Span::styled(
                    format!("Thinking{}", dots),
                    Style::default().fg(p.muted).add_modifier(Modifier::ITALIC),
                )));
            }
            EntryKind::Notice => {
                lines.push(Line::from(Span::styled(
                    "System:",
                    Style::default().fg(p.notice).add_modifier(Modifier::BOLD),
                )));
                for line in entry.text.split('\n') {
                    lines.push(Line::from(Span::styled(
                        line.to_string(),
                        Style::default().fg(p.notice),
                    )));
                }
            }
        }
        lines.push(Line::default());
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.border))
        .title(" Chat ");

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_suggestions(app: &App, frame: &mut Frame, area: Rect) {
    let p = palette(app.theme);

    let (number_style, text_style) = if app.suggestions_enabled {
        (
            Style::default().fg(p.focus).bold(),
            Style::default().fg(p.text),
        )
    } else {
        (
            Style::default().fg(p.muted),
            Style::default().fg(p.muted),
        )
    };

    let lines: Vec<Line> = app
        .suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Line::from(vec![
                Span::styled(format!(" {} ", i + 1), number_style),
                Span::styled(format!("{} ", s.icon), text_style),
                Span::styled(s.text, text_style),
                Span::styled(format!("  {}", s.category), Style::default().fg(p.muted)),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.border))
        .title(" Suggestions (Esc, then 1-4) ");

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let p = palette(app.theme);

    let border_color = if app.input_mode == InputMode::Editing {
        p.focus
    } else {
        p.border
    };

    let title = if app.generating {
        " Message (Esc to stop) "
    } else {
        " Message "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    // Newlines are shown as a single glyph so the box stays one row
    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .map(|c| if c == '\n' { '⏎' } else { c })
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(p.user))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Alt+Enter ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(if app.generating { " stop " } else { " normal " }, label_style),
        ],
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" type ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ];
            if app.show_suggestions && app.show_welcome() {
                hints.extend(vec![
                    Span::styled(" 1-4 ", key_style),
                    Span::styled(" suggest ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" r ", key_style),
                Span::styled(" regenerate ", label_style),
                Span::styled(" y ", key_style),
                Span::styled(" copy ", label_style),
                Span::styled(" t ", key_style),
                Span::styled(format!(" {} ", app.theme.toggle_label()), label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
    };
    hints.extend(vec![
        Span::styled(" ^K ", key_style),
        Span::styled(" clear ", label_style),
    ]);

    if let Some(status) = &app.status {
        hints.push(Span::styled(
            format!("  {}", status),
            Style::default().bg(Color::Black).fg(Color::Green),
        ));
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
