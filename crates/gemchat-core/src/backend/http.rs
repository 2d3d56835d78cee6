use crate::backend::{ChatBackend, ChatRequest, HealthStatus};
use crate::error::ChatError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// Backend used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "https://gemini-ai-chatbot-backend-a7yo.onrender.com";

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ChatResponse {
    fn error_message(self) -> Option<String> {
        self.error.filter(|e| !e.is_empty())
    }
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let url = format!("{}/api/chat", self.base_url);

        debug!(
            url = %url,
            context_turns = request.conversation.len(),
            "Sending chat request"
        );

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ChatResponse>(&body)
                .ok()
                .and_then(ChatResponse::error_message);
            return Err(ChatError::status(status.as_u16(), message));
        }

        let reply: ChatResponse = serde_json::from_slice(&body)?;
        if !reply.success {
            let message = reply
                .error_message()
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(ChatError::Application(message));
        }

        Ok(reply.response.unwrap_or_default())
    }

    async fn health(&self) -> HealthStatus {
        let url = format!("{}/health", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => HealthStatus::Connected,
            Ok(response) => HealthStatus::ServerError(response.status().as_u16()),
            Err(e) => {
                warn!(error = %e, url = %url, "Backend connection error");
                HealthStatus::Unreachable
            }
        }
    }
}
