//! Single-flight request lifecycle.
//!
//! A [`ChatController`] owns one chat session: the conversation log and the
//! state of the (at most one) request in flight. Clones share the session, so
//! a front-end can keep one handle for `stop()` while another is awaiting
//! `send()` on a spawned task.

use crate::backend::{ChatBackend, ChatRequest, HealthStatus};
use crate::conversation::{Conversation, DEFAULT_CONTEXT_WINDOW};
use crate::error::ChatError;
use crate::format::format_reply;
use crate::reveal::{reveal, RevealOutcome, DEFAULT_REVEAL_DELAY};
use crate::state::{Role, Turn, TurnId};
use crate::surface::{Surface, SurfaceUpdate};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Waiting on the backend
    Sending,
    /// Reply received, reveal in progress
    Streaming,
}

#[derive(Debug)]
struct ActiveRequest {
    seq: u64,
    token: CancellationToken,
    phase: Phase,
}

/// The in-flight request, if any.
///
/// "Generating" is derived from the presence of the active record, so the
/// flag and the cancellation handle can never disagree.
#[derive(Debug, Default)]
pub struct RequestState {
    active: Option<ActiveRequest>,
    next_seq: u64,
}

impl RequestState {
    pub fn is_generating(&self) -> bool {
        self.active.is_some()
    }

    pub fn phase(&self) -> Phase {
        self.active.as_ref().map(|a| a.phase).unwrap_or_default()
    }

    fn begin(&mut self) -> (u64, CancellationToken) {
        self.next_seq += 1;
        let token = CancellationToken::new();
        self.active = Some(ActiveRequest {
            seq: self.next_seq,
            token: token.clone(),
            phase: Phase::Sending,
        });
        (self.next_seq, token)
    }

    fn set_phase(&mut self, seq: u64, phase: Phase) {
        if let Some(active) = self.active.as_mut().filter(|a| a.seq == seq) {
            active.phase = phase;
        }
    }

    /// Clear the record if it still belongs to request `seq`
    fn finish(&mut self, seq: u64) -> bool {
        if self.active.as_ref().is_some_and(|a| a.seq == seq) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// No request was started after `seq`
    fn is_latest(&self, seq: u64) -> bool {
        self.next_seq == seq
    }

    fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                active.token.cancel();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Default)]
struct Session {
    conversation: Conversation,
    request: RequestState,
    /// On-screen element of a reply whose reveal was stopped. It has no turn
    /// in the conversation; the next regenerate replaces it.
    interrupted: Option<TurnId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Trailing turns sent as context
    pub context_window: usize,
    pub reveal_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            reveal_delay: DEFAULT_REVEAL_DELAY,
        }
    }
}

#[derive(Debug)]
pub enum SendOutcome {
    /// The reply was revealed and recorded
    Replied(Turn),
    /// Another request is in flight; nothing changed
    Busy,
    /// Blank input; nothing changed
    Ignored,
    /// Regenerate found no assistant turn to replace
    NothingToRegenerate,
    /// Stopped by the user before the reply was recorded
    Cancelled,
    Failed(ChatError),
}

#[derive(Debug, Clone, Copy)]
enum Origin<'a> {
    User(&'a str),
    Regenerate,
}

struct Pending {
    seq: u64,
    token: CancellationToken,
    request: ChatRequest,
    typing_id: TurnId,
    regenerate: bool,
}

#[derive(Clone)]
pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    surface: Arc<dyn Surface>,
    session: Arc<Mutex<Session>>,
    settings: ControllerSettings,
}

impl ChatController {
    pub fn new(backend: Arc<dyn ChatBackend>, surface: Arc<dyn Surface>) -> Self {
        Self {
            backend,
            surface,
            session: Arc::new(Mutex::new(Session::default())),
            settings: ControllerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_generating(&self) -> bool {
        self.session().request.is_generating()
    }

    pub fn phase(&self) -> Phase {
        self.session().request.phase()
    }

    /// Snapshot of the conversation
    pub fn turns(&self) -> Vec<Turn> {
        self.session().conversation.iter().cloned().collect()
    }

    /// Submit a user message.
    ///
    /// Returns [`SendOutcome::Busy`] without touching the conversation when a
    /// request is already in flight.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }
        self.dispatch(Origin::User(text)).await
    }

    /// Drop the latest assistant turn and ask again with the latest user
    /// turn, without recording that user turn a second time.
    pub async fn regenerate(&self) -> SendOutcome {
        self.dispatch(Origin::Regenerate).await
    }

    /// Cancel the in-flight request, if any, and reset the indicators.
    ///
    /// Text already revealed stays where it is.
    pub fn stop(&self) -> bool {
        let cancelled = self.session().request.cancel();
        if cancelled {
            info!("Generation stopped");
        }

        self.surface.apply(SurfaceUpdate::Generating(false));
        self.surface.apply(SurfaceUpdate::SuggestionsEnabled(true));
        self.surface.apply(SurfaceUpdate::ClearTyping);
        cancelled
    }

    /// Stop anything in flight and forget the conversation
    pub fn clear(&self) {
        if self.is_generating() {
            self.stop();
        }
        {
            let mut session = self.session();
            session.conversation.clear();
            session.interrupted = None;
        }
        self.surface.apply(SurfaceUpdate::Clear);
        debug!("Conversation cleared");
    }

    /// Probe the backend and post an advisory notice if it looks unhealthy
    pub async fn check_backend(&self) -> HealthStatus {
        let status = self.backend.health().await;
        match status.notice() {
            None => info!("Backend connected"),
            Some(notice) => {
                warn!(?status, "Backend health check failed");
                self.surface.apply(SurfaceUpdate::Notice(notice.to_string()));
            }
        }
        status
    }

    async fn dispatch(&self, origin: Origin<'_>) -> SendOutcome {
        let pending = match self.begin(origin) {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let Pending {
            seq,
            token,
            request,
            typing_id,
            regenerate,
        } = pending;

        if !regenerate {
            self.surface.apply(SurfaceUpdate::SuggestionsEnabled(false));
        }
        self.surface.apply(SurfaceUpdate::Generating(true));
        self.surface.apply(SurfaceUpdate::ShowTyping(typing_id.clone()));
        self.surface.apply(SurfaceUpdate::ScrollToBottom);

        info!(seq, regenerate, context_turns = request.conversation.len(), "Chat request started");

        let outcome = match self.exchange(seq, &request, &token, &typing_id).await {
            Ok(turn) => {
                info!(seq, turn = %turn.id, "Chat reply recorded");
                SendOutcome::Replied(turn)
            }
            Err(err) => {
                self.surface.apply(SurfaceUpdate::RemoveTurn(typing_id));
                if err.is_cancelled() {
                    debug!(seq, "Chat request cancelled");
                    SendOutcome::Cancelled
                } else {
                    warn!(seq, kind = ?err.kind(), error = %err, "Chat error");
                    if let Some(notice) = err.notice() {
                        self.surface.apply(SurfaceUpdate::Notice(notice));
                    }
                    SendOutcome::Failed(err)
                }
            }
        };

        // A stopped request no longer owns the indicators; a newer one may.
        if self.session().request.finish(seq) {
            self.surface.apply(SurfaceUpdate::Generating(false));
            self.surface.apply(SurfaceUpdate::SuggestionsEnabled(true));
        }
        self.surface.apply(SurfaceUpdate::ScrollToBottom);

        outcome
    }

    /// Guard, mutate the conversation and open the request in one critical
    /// section.
    fn begin(&self, origin: Origin<'_>) -> Result<Pending, SendOutcome> {
        let mut updates = Vec::new();

        let pending = {
            let mut session = self.session();
            if session.request.is_generating() {
                debug!("Request already in flight, ignoring");
                return Err(SendOutcome::Busy);
            }

            let text = match origin {
                Origin::User(text) => {
                    session.interrupted = None;
                    let turn = session.conversation.push(Role::User, text);
                    updates.push(SurfaceUpdate::AppendTurn(turn));
                    text.to_string()
                }
                Origin::Regenerate => {
                    let Some(text) = session
                        .conversation
                        .last(Role::User)
                        .map(|t| t.content.clone())
                    else {
                        return Err(SendOutcome::NothingToRegenerate);
                    };
                    // A stopped partial reply answers the latest user turn,
                    // so it is the one to replace.
                    let removed = match session.interrupted.take() {
                        Some(id) => id,
                        None => match session.conversation.remove_last(Role::Assistant) {
                            Some(turn) => turn.id,
                            None => return Err(SendOutcome::NothingToRegenerate),
                        },
                    };
                    updates.push(SurfaceUpdate::RemoveTurn(removed));
                    text
                }
            };

            let request = ChatRequest::new(
                text,
                session.conversation.window(self.settings.context_window),
            );
            let (seq, token) = session.request.begin();

            Pending {
                seq,
                token,
                request,
                typing_id: TurnId::new(format!("typing_{}", seq)),
                regenerate: matches!(origin, Origin::Regenerate),
            }
        };

        for update in updates {
            self.surface.apply(update);
        }
        Ok(pending)
    }

    async fn exchange(
        &self,
        seq: u64,
        request: &ChatRequest,
        token: &CancellationToken,
        typing_id: &TurnId,
    ) -> Result<Turn, ChatError> {
        // Dropping the backend future aborts the HTTP request.
        let reply = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ChatError::Cancelled),
            reply = self.backend.chat(request) => reply?,
        };

        // stop() may have landed after the reply resolved
        if token.is_cancelled() {
            return Err(ChatError::Cancelled);
        }

        let reply_id = {
            let mut session = self.session();
            session.request.set_phase(seq, Phase::Streaming);
            session.conversation.next_id(Role::Assistant)
        };

        self.surface.apply(SurfaceUpdate::RemoveTurn(typing_id.clone()));
        self.surface.apply(SurfaceUpdate::BeginReply(reply_id.clone()));

        let markup = format_reply(&reply);
        let revealed = reveal(
            self.surface.as_ref(),
            &reply_id,
            &markup,
            self.settings.reveal_delay,
            token,
        )
        .await;

        if revealed == RevealOutcome::Interrupted {
            let mut session = self.session();
            if session.request.is_latest(seq) {
                session.interrupted = Some(reply_id);
            }
            return Err(ChatError::Cancelled);
        }

        let turn = Turn::new(reply_id, Role::Assistant, reply);
        self.session().conversation.append(turn.clone());
        Ok(turn)
    }
}
