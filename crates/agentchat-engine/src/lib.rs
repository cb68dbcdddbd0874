//! agentchat-engine: conversations with a remote agent, without a UI
//!
//! This crate provides:
//! - The conversation and message model
//! - The [`AgentsBackend`] contract with in-memory and HTTP implementations
//! - [`ChatSession`], which drives a chat screen against a backend
//! - Configuration loading

pub mod backend;
pub mod config;
pub mod model;
pub mod session;

// Re-export commonly used types
pub use backend::{
    connect, AgentsBackend, BackendError, EchoResponder, HttpBackend, MemoryBackend, Responder,
    Subscription,
};
pub use config::{BackendConfig, Config, ConfigError, CONFIG_DIR, CONFIG_FILE};
pub use model::{
    filter_conversations, title_from_message, Conversation, ConversationMetadata,
    ConversationUpdate, Message, Role, DEFAULT_CONVERSATION_NAME, TITLE_PREVIEW_CHARS,
};
pub use session::{ChatSession, Notification, NotificationLevel};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
