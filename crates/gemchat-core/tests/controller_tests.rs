//! Request lifecycle tests against a scripted backend.

mod common;

use async_trait::async_trait;
use common::{controller, RecordingSurface, ScriptedBackend};
use gemchat_core::error::QUOTA_NOTICE;
use gemchat_core::{
    ChatBackend, ChatController, ChatError, ChatRequest, ControllerSettings, HealthStatus, Phase,
    Role, SendOutcome, SurfaceUpdate, TurnId,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn hello_reply_is_revealed_and_recorded() {
    let backend = Arc::new(ScriptedBackend::new().reply("**Hello**"));
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    let outcome = chat.send("Hi").await;

    let turn = match outcome {
        SendOutcome::Replied(turn) => turn,
        other => panic!("expected a reply, got {:?}", other),
    };
    assert_eq!(turn.role, Role::Assistant);

    let turns = chat.turns();
    assert_eq!(turns.len(), 2);
    assert_eq!((turns[0].role, turns[0].content.as_str()), (Role::User, "Hi"));
    assert_eq!(
        (turns[1].role, turns[1].content.as_str()),
        (Role::Assistant, "**Hello**")
    );

    assert_eq!(
        surface.last_markup().as_deref(),
        Some("<strong>Hello</strong>")
    );
    assert!(!chat.is_generating());
    assert_eq!(chat.phase(), Phase::Idle);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].message, "Hi");
    assert_eq!(requests[0].conversation, vec![turns[0].clone()]);
}

#[tokio::test]
async fn each_exchange_adds_exactly_two_turns() {
    let backend = Arc::new(ScriptedBackend::new().reply("one").reply("two"));
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    chat.send("first").await;
    assert_eq!(chat.turns().len(), 2);

    chat.send("second").await;
    assert_eq!(chat.turns().len(), 4);
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let backend = Arc::new(ScriptedBackend::new());
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    assert!(matches!(chat.send("   ").await, SendOutcome::Ignored));
    assert!(chat.turns().is_empty());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn send_while_generating_is_a_noop() {
    let backend = Arc::new(ScriptedBackend::hanging());
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    let in_flight = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send("Hi").await })
    };
    backend.entered.notified().await;
    assert!(chat.is_generating());

    assert!(matches!(chat.send("again").await, SendOutcome::Busy));
    assert!(matches!(chat.regenerate().await, SendOutcome::Busy));
    assert_eq!(chat.turns().len(), 1);
    assert_eq!(backend.requests().len(), 1);

    chat.stop();
    assert!(matches!(in_flight.await.unwrap(), SendOutcome::Cancelled));
}

#[tokio::test]
async fn quota_failure_shows_quota_notice_and_keeps_user_turn() {
    let backend = Arc::new(
        ScriptedBackend::new().fail(ChatError::status(500, Some("quota exceeded".to_string()))),
    );
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    let outcome = chat.send("Hi").await;

    assert!(matches!(outcome, SendOutcome::Failed(ChatError::Status { status: 500, .. })));
    assert_eq!(surface.notices(), vec![QUOTA_NOTICE.to_string()]);

    let turns = chat.turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);
    assert!(!chat.is_generating());
}

#[tokio::test]
async fn other_failures_are_prefixed_with_error() {
    let backend = Arc::new(
        ScriptedBackend::new().fail(ChatError::Application("model overloaded".to_string())),
    );
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    chat.send("Hi").await;

    assert_eq!(surface.notices(), vec!["Error: model overloaded".to_string()]);
}

#[tokio::test]
async fn failure_removes_typing_indicator_and_resets_indicators() {
    let backend = Arc::new(ScriptedBackend::new().fail(ChatError::status(502, None)));
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    chat.send("Hi").await;

    let updates = surface.updates();
    let typing = updates
        .iter()
        .find_map(|u| match u {
            SurfaceUpdate::ShowTyping(id) => Some(id.clone()),
            _ => None,
        })
        .expect("typing indicator shown");
    assert!(updates.contains(&SurfaceUpdate::RemoveTurn(typing)));

    let last_generating = updates.iter().rev().find_map(|u| match u {
        SurfaceUpdate::Generating(on) => Some(*on),
        _ => None,
    });
    assert_eq!(last_generating, Some(false));
    assert!(updates.contains(&SurfaceUpdate::SuggestionsEnabled(true)));
}

#[tokio::test]
async fn stop_mid_request_is_silent() {
    let backend = Arc::new(ScriptedBackend::hanging());
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    let in_flight = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send("Hi").await })
    };
    backend.entered.notified().await;

    assert!(chat.stop());

    assert!(matches!(in_flight.await.unwrap(), SendOutcome::Cancelled));
    assert!(!chat.is_generating());
    assert_eq!(chat.phase(), Phase::Idle);
    assert_eq!(chat.turns().len(), 1);
    assert!(surface.notices().is_empty());
    assert!(surface.updates().contains(&SurfaceUpdate::ClearTyping));
    assert!(!surface
        .updates()
        .iter()
        .any(|u| matches!(u, SurfaceUpdate::BeginReply(_))));
}

#[tokio::test]
async fn stop_when_idle_reports_nothing_cancelled() {
    let backend = Arc::new(ScriptedBackend::new());
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    assert!(!chat.stop());
}

#[tokio::test(start_paused = true)]
async fn stop_during_reveal_keeps_text_but_records_nothing() {
    let backend = Arc::new(ScriptedBackend::new().reply("abcdefghij"));
    let surface = Arc::new(RecordingSurface::default());
    let chat = ChatController::new(backend.clone(), surface.clone()).with_settings(
        ControllerSettings {
            reveal_delay: Duration::from_millis(30),
            ..ControllerSettings::default()
        },
    );

    let in_flight = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send("Hi").await })
    };

    while chat.phase() != Phase::Streaming {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    tokio::time::sleep(Duration::from_millis(70)).await;
    chat.stop();

    assert!(matches!(in_flight.await.unwrap(), SendOutcome::Cancelled));

    let shown = surface.last_markup().expect("some text was revealed");
    assert!(!shown.is_empty());
    assert!(shown.len() < "abcdefghij".len());
    assert_eq!(chat.turns().len(), 1);
    assert!(surface.notices().is_empty());
}

#[tokio::test]
async fn regenerate_without_assistant_turn_is_a_noop() {
    let backend = Arc::new(
        ScriptedBackend::new().fail(ChatError::Application("boom".to_string())),
    );
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    chat.send("Hi").await;
    let turns_before = chat.turns();
    let updates_before = surface.updates().len();

    assert!(matches!(
        chat.regenerate().await,
        SendOutcome::NothingToRegenerate
    ));
    assert_eq!(chat.turns(), turns_before);
    assert_eq!(surface.updates().len(), updates_before);
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn regenerate_on_empty_conversation_is_a_noop() {
    let backend = Arc::new(ScriptedBackend::new());
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    assert!(matches!(
        chat.regenerate().await,
        SendOutcome::NothingToRegenerate
    ));
    assert!(surface.updates().is_empty());
}

#[tokio::test]
async fn regenerate_replaces_last_reply_without_duplicating_user_turn() {
    let backend = Arc::new(ScriptedBackend::new().reply("first").reply("second"));
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    chat.send("Hi").await;
    let first_reply = chat.turns()[1].clone();

    let outcome = chat.regenerate().await;
    assert!(matches!(outcome, SendOutcome::Replied(_)));

    let turns = chat.turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "Hi");
    assert_eq!(turns[1].content, "second");
    assert_ne!(turns[1].id, first_reply.id);

    assert!(surface
        .updates()
        .contains(&SurfaceUpdate::RemoveTurn(first_reply.id)));

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].message, "Hi");
    assert_eq!(requests[1].conversation, vec![turns[0].clone()]);
}

#[tokio::test]
async fn only_trailing_window_is_sent() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("r1")
            .reply("r2")
            .reply("r3")
            .reply("r4"),
    );
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    for msg in ["m1", "m2", "m3", "m4"] {
        chat.send(msg).await;
    }

    let requests = backend.requests();
    let last = &requests[3];
    let contents: Vec<&str> = last
        .conversation
        .iter()
        .map(|t| t.content.as_str())
        .collect();
    assert_eq!(contents, vec!["m2", "r2", "m3", "r3", "m4"]);
    assert_eq!(chat.turns().len(), 8);
}

#[tokio::test]
async fn clear_forgets_the_conversation() {
    let backend = Arc::new(ScriptedBackend::new().reply("hello"));
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    chat.send("Hi").await;
    chat.clear();

    assert!(chat.turns().is_empty());
    assert_eq!(surface.updates().last(), Some(&SurfaceUpdate::Clear));
}

#[tokio::test]
async fn unhealthy_backend_posts_advisory_notice() {
    let backend = Arc::new(ScriptedBackend::new().with_health(HealthStatus::ServerError(503)));
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    assert_eq!(chat.check_backend().await, HealthStatus::ServerError(503));
    assert_eq!(
        surface.notices(),
        vec!["⚠️ Backend server error. Responses may be limited.".to_string()]
    );

    // Advisory only: chatting still works afterwards.
    assert!(matches!(chat.send("Hi").await, SendOutcome::Replied(_)));
}

#[tokio::test]
async fn healthy_backend_is_quiet() {
    let backend = Arc::new(ScriptedBackend::new());
    let surface = Arc::new(RecordingSurface::default());
    let chat = controller(&backend, &surface);

    assert_eq!(chat.check_backend().await, HealthStatus::Connected);
    assert!(surface.updates().is_empty());
}

fn begun_replies(surface: &RecordingSurface) -> Vec<TurnId> {
    surface
        .updates()
        .into_iter()
        .filter_map(|u| match u {
            SurfaceUpdate::BeginReply(id) => Some(id),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn regenerate_after_stopped_reveal_replaces_the_partial_reply() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("first answer")
            .reply("a long second answer")
            .reply("regen"),
    );
    let surface = Arc::new(RecordingSurface::default());
    let chat = ChatController::new(backend.clone(), surface.clone()).with_settings(
        ControllerSettings {
            reveal_delay: Duration::from_millis(30),
            ..ControllerSettings::default()
        },
    );

    chat.send("q1").await;
    let first_reply = chat.turns()[1].id.clone();

    let in_flight = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send("q2").await })
    };
    while chat.phase() != Phase::Streaming {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    tokio::time::sleep(Duration::from_millis(70)).await;
    chat.stop();
    assert!(matches!(in_flight.await.unwrap(), SendOutcome::Cancelled));

    let partial = begun_replies(&surface)[1].clone();

    assert!(matches!(chat.regenerate().await, SendOutcome::Replied(_)));

    let updates = surface.updates();
    assert!(updates.contains(&SurfaceUpdate::RemoveTurn(partial)));
    assert!(!updates.contains(&SurfaceUpdate::RemoveTurn(first_reply)));

    let contents: Vec<(Role, String)> = chat
        .turns()
        .into_iter()
        .map(|t| (t.role, t.content))
        .collect();
    assert_eq!(
        contents,
        vec![
            (Role::User, "q1".to_string()),
            (Role::Assistant, "first answer".to_string()),
            (Role::User, "q2".to_string()),
            (Role::Assistant, "regen".to_string()),
        ]
    );

    let requests = backend.requests();
    assert_eq!(requests[2].message, "q2");
    let context: Vec<&str> = requests[2]
        .conversation
        .iter()
        .map(|t| t.content.as_str())
        .collect();
    assert_eq!(context, vec!["q1", "first answer", "q2"]);
}

#[tokio::test(start_paused = true)]
async fn new_message_after_stopped_reveal_is_what_regenerate_replaces() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("a long first answer")
            .reply("second")
            .reply("regen"),
    );
    let surface = Arc::new(RecordingSurface::default());
    let chat = ChatController::new(backend.clone(), surface.clone()).with_settings(
        ControllerSettings {
            reveal_delay: Duration::from_millis(30),
            ..ControllerSettings::default()
        },
    );

    let in_flight = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.send("q1").await })
    };
    while chat.phase() != Phase::Streaming {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    tokio::time::sleep(Duration::from_millis(70)).await;
    chat.stop();
    in_flight.await.unwrap();
    let partial = begun_replies(&surface)[0].clone();

    chat.send("q2").await;
    let second = chat.turns()[2].id.clone();
    chat.regenerate().await;

    let updates = surface.updates();
    assert!(updates.contains(&SurfaceUpdate::RemoveTurn(second)));
    assert!(!updates.contains(&SurfaceUpdate::RemoveTurn(partial)));
    assert_eq!(chat.turns().last().unwrap().content, "regen");
}

/// Backend that stops its own request while answering, so the reply
/// resolves with the token already cancelled.
struct StopsWhileAnswering {
    chat: Mutex<Option<ChatController>>,
}

#[async_trait]
impl ChatBackend for StopsWhileAnswering {
    async fn chat(&self, _request: &ChatRequest) -> Result<String, ChatError> {
        if let Some(chat) = self.chat.lock().unwrap().take() {
            chat.stop();
        }
        Ok("late reply".to_string())
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus::Connected
    }
}

#[tokio::test]
async fn reply_resolving_after_stop_is_discarded() {
    let backend = Arc::new(StopsWhileAnswering {
        chat: Mutex::new(None),
    });
    let surface = Arc::new(RecordingSurface::default());
    let chat = ChatController::new(backend.clone(), surface.clone())
        .with_settings(common::instant_settings());
    *backend.chat.lock().unwrap() = Some(chat.clone());

    let outcome = chat.send("Hi").await;

    assert!(matches!(outcome, SendOutcome::Cancelled));
    assert!(begun_replies(&surface).is_empty());
    assert_eq!(chat.turns().len(), 1);
    assert!(surface.notices().is_empty());
}
