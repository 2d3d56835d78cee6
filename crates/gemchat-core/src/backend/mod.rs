//! The chat backend as seen by the request lifecycle.

pub mod http;

pub use http::HttpBackend;

use crate::error::ChatError;
use crate::state::Turn;
use async_trait::async_trait;
use serde::Serialize;

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation: Vec<Turn>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, conversation: &[Turn]) -> Self {
        Self {
            message: message.into(),
            conversation: conversation.to_vec(),
        }
    }
}

/// Result of the startup probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Connected,
    ServerError(u16),
    Unreachable,
}

impl HealthStatus {
    /// Advisory notice for the user; `None` when the backend is healthy
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            HealthStatus::Connected => None,
            HealthStatus::ServerError(_) => {
                Some("⚠️ Backend server error. Responses may be limited.")
            }
            HealthStatus::Unreachable => Some(
                "❌ Cannot connect to backend server. Please make sure the backend is running.",
            ),
        }
    }
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one chat turn and return the raw reply text
    async fn chat(&self, request: &ChatRequest) -> Result<String, ChatError>;

    /// Probe the backend; never fails, failures are folded into the status
    async fn health(&self) -> HealthStatus;
}
