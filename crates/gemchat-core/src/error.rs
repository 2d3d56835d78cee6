//! Error taxonomy for a chat turn.

use thiserror::Error;

/// Notice shown when the backend reports an exhausted quota
pub const QUOTA_NOTICE: &str = "API quota exceeded. Please try again later.";

/// Broad class of a [`ChatError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network unreachable, non-2xx status, or an unreadable body
    Transport,
    /// The backend answered but reported `success: false`
    Application,
    /// The user stopped the request
    Cancellation,
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{0}")]
    Application(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ChatError {
    /// Build a status error, falling back to `HTTP <status>` when the body
    /// carried no message.
    pub fn status(status: u16, message: Option<String>) -> Self {
        Self::Status {
            status,
            message: message.unwrap_or_else(|| format!("HTTP {}", status)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::Network(_) | ChatError::Status { .. } | ChatError::Malformed(_) => {
                ErrorKind::Transport
            }
            ChatError::Application(_) => ErrorKind::Application,
            ChatError::Cancelled => ErrorKind::Cancellation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancellation
    }

    /// Text of the inline system notice, or `None` for silent errors
    pub fn notice(&self) -> Option<String> {
        if self.is_cancelled() {
            return None;
        }

        let message = self.to_string();
        if message.contains("quota") {
            Some(QUOTA_NOTICE.to_string())
        } else {
            Some(format!("Error: {}", message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_errors_are_relabeled() {
        let err = ChatError::status(500, Some("quota exceeded".to_string()));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.notice().as_deref(), Some(QUOTA_NOTICE));
    }

    #[test]
    fn test_status_without_message_falls_back_to_code() {
        let err = ChatError::status(503, None);
        assert_eq!(err.notice().as_deref(), Some("Error: HTTP 503"));
    }

    #[test]
    fn test_application_error_notice() {
        let err = ChatError::Application("model overloaded".to_string());
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.notice().as_deref(), Some("Error: model overloaded"));
    }

    #[test]
    fn test_cancellation_is_silent() {
        assert!(ChatError::Cancelled.notice().is_none());
        assert!(ChatError::Cancelled.is_cancelled());
    }
}
