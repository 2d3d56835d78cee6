//! Render-target abstraction.
//!
//! The request lifecycle never touches a concrete UI. Every visible effect
//! goes through [`Surface::apply`] as a [`SurfaceUpdate`], so the core can be
//! driven by a terminal, a test recorder, or anything else that can consume
//! the commands in order.

use crate::state::{Turn, TurnId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceUpdate {
    /// Append a finished turn (user turns are appended as plain text)
    AppendTurn(Turn),
    /// Append an empty assistant element that will be filled by a reveal
    BeginReply(TurnId),
    /// Replace the markup shown for a turn
    UpdateTurn { id: TurnId, markup: String },
    /// Remove a turn's element, if present
    RemoveTurn(TurnId),
    /// Show the "thinking" placeholder under the given id
    ShowTyping(TurnId),
    /// Remove every typing placeholder
    ClearTyping,
    /// Inline system message (errors, warnings)
    Notice(String),
    /// Page-level "generating" indicator
    Generating(bool),
    /// Enable or disable suggestion affordances
    SuggestionsEnabled(bool),
    ScrollToBottom,
    /// Drop every element
    Clear,
}

pub trait Surface: Send + Sync {
    fn apply(&self, update: SurfaceUpdate);
}

impl Surface for mpsc::UnboundedSender<SurfaceUpdate> {
    fn apply(&self, update: SurfaceUpdate) {
        // A closed receiver means the view is gone; nothing left to draw on.
        let _ = self.send(update);
    }
}
