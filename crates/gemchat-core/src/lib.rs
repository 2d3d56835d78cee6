pub mod backend;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod format;
pub mod presentation;
pub mod reveal;
pub mod state;
pub mod surface;
pub mod theme;

// Re-export main types for convenience
pub use backend::{ChatBackend, ChatRequest, HealthStatus, HttpBackend};
pub use config::Config;
pub use controller::{ChatController, ControllerSettings, Phase, SendOutcome};
pub use conversation::Conversation;
pub use error::{ChatError, ErrorKind};
pub use presentation::Suggestion;
pub use state::{Role, Turn, TurnId};
pub use surface::{Surface, SurfaceUpdate};
pub use theme::Theme;
