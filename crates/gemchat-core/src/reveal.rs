//! Progressive, tag-atomic reveal of reply markup.

use crate::state::TurnId;
use crate::surface::{Surface, SurfaceUpdate};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Delay between two revealed units
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    /// The token fired; whatever was already revealed stays on the surface
    Interrupted,
}

/// Splits markup into reveal units.
///
/// A unit is a single `char`, or a whole tag from `<` through the next `>`.
/// A `<` without a closing `>` is yielded as a plain character.
#[derive(Debug, Clone)]
pub struct Reveal<'a> {
    markup: &'a str,
    pos: usize,
}

impl<'a> Reveal<'a> {
    pub fn new(markup: &'a str) -> Self {
        Self { markup, pos: 0 }
    }

    /// Everything yielded so far
    pub fn revealed(&self) -> &'a str {
        &self.markup[..self.pos]
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.markup.len()
    }
}

impl<'a> Iterator for Reveal<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.markup[self.pos..];
        let first = rest.chars().next()?;

        let len = match (first, rest.find('>')) {
            ('<', Some(end)) => end + 1,
            _ => first.len_utf8(),
        };

        let unit = &rest[..len];
        self.pos += len;
        Some(unit)
    }
}

/// Reveal `markup` into the element `id`, one unit per `delay`.
///
/// The token is checked before every unit and raced against every delay.
pub async fn reveal(
    surface: &dyn Surface,
    id: &TurnId,
    markup: &str,
    delay: Duration,
    token: &CancellationToken,
) -> RevealOutcome {
    let mut units = Reveal::new(markup);

    while units.next().is_some() {
        if token.is_cancelled() {
            return RevealOutcome::Interrupted;
        }

        surface.apply(SurfaceUpdate::UpdateTurn {
            id: id.clone(),
            markup: units.revealed().to_string(),
        });
        surface.apply(SurfaceUpdate::ScrollToBottom);

        if units.is_done() {
            break;
        }

        tokio::select! {
            _ = token.cancelled() => return RevealOutcome::Interrupted,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    RevealOutcome::Completed
}
