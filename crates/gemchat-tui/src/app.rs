use crate::markup;
use crate::tui::AppEvent;
use gemchat_core::presentation::{self, Suggestion, SUGGESTION_SUBMIT_DELAY_MS};
use gemchat_core::{ChatController, Config, Role, SendOutcome, SurfaceUpdate, Theme, TurnId};
use ratatui::layout::Rect;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Assistant,
    Notice,
    Typing,
}

/// One element of the on-screen transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: Option<TurnId>,
    pub kind: EntryKind,
    /// Plain text for user turns and notices, markup for assistant turns
    pub text: String,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub theme: Theme,

    // Message input
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript
    pub entries: Vec<Entry>,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub chat_area: Option<Rect>,

    // Page-level indicators
    pub generating: bool,
    pub suggestions_enabled: bool,

    // Welcome and suggestions
    pub welcome: &'static str,
    pub suggestions: Vec<Suggestion>,
    pub show_suggestions: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Transient status line (e.g. "Copied")
    pub status: Option<String>,

    pub controller: ChatController,
    pub task: Option<JoinHandle<SendOutcome>>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        controller: ChatController,
        theme: Theme,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let mut rng = rand::thread_rng();

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            theme,

            input: String::new(),
            cursor: 0,

            entries: Vec::new(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,

            generating: false,
            suggestions_enabled: true,

            welcome: presentation::pick_welcome(&mut rng),
            suggestions: presentation::pick_suggestions(&mut rng),
            show_suggestions: true,

            animation_frame: 0,
            status: None,

            controller,
            task: None,
            events,
        }
    }

    /// True while a send/regenerate task exists or the controller is busy
    pub fn is_busy(&self) -> bool {
        self.controller.is_generating() || self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Drop the handle of a finished send task
    pub fn reap_task(&mut self) {
        if self.task.as_ref().is_some_and(|t| t.is_finished()) {
            self.task = None;
        }
    }

    /// Show the welcome block until the first user turn
    pub fn show_welcome(&self) -> bool {
        !self.entries.iter().any(|e| e.kind == EntryKind::User)
    }

    pub fn apply_surface(&mut self, update: SurfaceUpdate) {
        match update {
            SurfaceUpdate::AppendTurn(turn) => {
                let (kind, text) = match turn.role {
                    Role::User => (EntryKind::User, turn.content),
                    Role::Assistant => (
                        EntryKind::Assistant,
                        gemchat_core::format::format_reply(&turn.content),
                    ),
                };
                self.entries.push(Entry {
                    id: Some(turn.id),
                    kind,
                    text,
                });
            }
            SurfaceUpdate::BeginReply(id) => self.entries.push(Entry {
                id: Some(id),
                kind: EntryKind::Assistant,
                text: String::new(),
            }),
            SurfaceUpdate::UpdateTurn { id, markup } => {
                if let Some(entry) = self.entries.iter_mut().find(|e| e.id.as_ref() == Some(&id)) {
                    entry.text = markup;
                }
            }
            SurfaceUpdate::RemoveTurn(id) => {
                self.entries.retain(|e| e.id.as_ref() != Some(&id));
            }
            SurfaceUpdate::ShowTyping(id) => self.entries.push(Entry {
                id: Some(id),
                kind: EntryKind::Typing,
                text: String::new(),
            }),
            SurfaceUpdate::ClearTyping => {
                self.entries.retain(|e| e.kind != EntryKind::Typing);
            }
            SurfaceUpdate::Notice(text) => self.entries.push(Entry {
                id: None,
                kind: EntryKind::Notice,
                text,
            }),
            SurfaceUpdate::Generating(on) => self.generating = on,
            SurfaceUpdate::SuggestionsEnabled(on) => self.suggestions_enabled = on,
            SurfaceUpdate::ScrollToBottom => self.scroll_chat_to_bottom(),
            SurfaceUpdate::Clear => {
                self.entries.clear();
                self.chat_scroll = 0;
            }
        }
    }

    /// Send the input box contents
    pub fn submit(&mut self) {
        let message = self.input.trim().to_string();
        if message.is_empty() || self.is_busy() {
            return;
        }

        self.input.clear();
        self.cursor = 0;
        self.status = None;

        let controller = self.controller.clone();
        self.task = Some(tokio::spawn(async move { controller.send(&message).await }));
    }

    pub fn regenerate(&mut self) {
        if self.is_busy() {
            return;
        }
        let controller = self.controller.clone();
        self.task = Some(tokio::spawn(async move { controller.regenerate().await }));
    }

    pub fn stop(&mut self) {
        if self.controller.stop() {
            debug!("Stopped by user");
        }
    }

    /// Pre-fill a suggestion and submit it shortly after
    pub fn pick_suggestion(&mut self, index: usize) {
        // The panel is only drawn above an empty conversation
        if !self.show_suggestions
            || !self.show_welcome()
            || !self.suggestions_enabled
            || self.is_busy()
        {
            return;
        }
        let Some(suggestion) = self.suggestions.get(index) else {
            return;
        };

        self.input = suggestion.text.to_string();
        self.cursor = self.input.chars().count();
        self.show_suggestions = false;

        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(SUGGESTION_SUBMIT_DELAY_MS)).await;
            let _ = events.send(AppEvent::SubmitPending);
        });
    }

    /// Forget the conversation and start over with a fresh welcome
    pub fn clear_chat(&mut self) {
        self.controller.clear();

        let mut rng = rand::thread_rng();
        self.welcome = presentation::pick_welcome(&mut rng);
        self.suggestions = presentation::pick_suggestions(&mut rng);
        self.show_suggestions = true;
        self.status = None;
        self.input_mode = InputMode::Editing;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(e) = Config::save_theme(self.theme) {
            warn!(error = %e, "Could not save theme preference");
        }
    }

    /// Raw text of the latest assistant reply
    /// Text of the newest reply on screen, as displayed
    pub fn last_reply(&self) -> Option<String> {
        let entry = self
            .entries
            .iter()
            .rev()
            .find(|e| e.kind == EntryKind::Assistant && !e.text.is_empty())?;

        let lines: Vec<String> = markup::to_lines(&entry.text)
            .iter()
            .map(markup::line_text)
            .collect();
        Some(lines.join("\n"))
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.generating {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Total rendered lines of the transcript at the current width
    pub fn transcript_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let wrapped = |char_count: usize| -> u16 {
            if char_count == 0 {
                1 // Empty line still takes one line
            } else {
                char_count.div_ceil(wrap_width) as u16
            }
        };

        let mut total_lines: u16 = 0;
        if self.show_welcome() {
            for line in crate::ui::welcome_lines(self) {
                total_lines = total_lines.saturating_add(wrapped(markup::line_text(&line).chars().count()));
            }
        }
        for entry in &self.entries {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "AI:")
            let body: u16 = match entry.kind {
                EntryKind::Assistant => markup::to_lines(&entry.text)
                    .iter()
                    .map(|line| wrapped(markup::line_text(line).chars().count()))
                    .sum(),
                EntryKind::Typing => 1,
                EntryKind::User | EntryKind::Notice => entry
                    .text
                    .split('\n')
                    .map(|line| wrapped(line.chars().count()))
                    .sum(),
            };
            total_lines = total_lines.saturating_add(body).saturating_add(1); // Blank line after entry
        }
        total_lines
    }

    /// Scroll chat so the newest content is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = self.transcript_lines().saturating_sub(visible_height);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.transcript_lines().saturating_sub(self.chat_height.max(1));
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }
}
