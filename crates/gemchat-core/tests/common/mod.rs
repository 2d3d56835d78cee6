//! Shared fixtures: a scripted in-memory backend and a recording surface.

#![allow(dead_code)]

use async_trait::async_trait;
use gemchat_core::{
    ChatBackend, ChatController, ChatError, ChatRequest, ControllerSettings, HealthStatus,
    Surface, SurfaceUpdate,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Backend that answers from a queue and records every request.
///
/// With `hanging()` it never answers, which leaves the request in flight
/// until the controller drops it.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, ChatError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    health: HealthStatus,
    hang: bool,
    pub entered: Notify,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            health: HealthStatus::Connected,
            hang: false,
            entered: Notify::new(),
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new()
        }
    }

    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = health;
        self
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, err: ChatError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        self.entered.notify_one();

        if self.hang {
            std::future::pending::<()>().await;
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn health(&self) -> HealthStatus {
        self.health
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    updates: Mutex<Vec<SurfaceUpdate>>,
}

impl RecordingSurface {
    pub fn updates(&self) -> Vec<SurfaceUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter_map(|u| match u {
                SurfaceUpdate::Notice(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Last markup written by a reveal
    pub fn last_markup(&self) -> Option<String> {
        self.updates().into_iter().rev().find_map(|u| match u {
            SurfaceUpdate::UpdateTurn { markup, .. } => Some(markup),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn apply(&self, update: SurfaceUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

pub fn instant_settings() -> ControllerSettings {
    ControllerSettings {
        reveal_delay: Duration::ZERO,
        ..ControllerSettings::default()
    }
}

pub fn controller(backend: &Arc<ScriptedBackend>, surface: &Arc<RecordingSurface>) -> ChatController {
    ChatController::new(backend.clone(), surface.clone()).with_settings(instant_settings())
}
