//! Client side of the agent service.
//!
//! [`AgentsBackend`] is the contract the chat session talks to. Two
//! implementations ship with the crate:
//! - [`MemoryBackend`] keeps everything in process (offline mode, tests)
//! - [`HttpBackend`] forwards calls to a REST deployment of the service

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::{EchoResponder, MemoryBackend, Responder};

use crate::config::BackendConfig;
use crate::model::{Conversation, ConversationMetadata, ConversationUpdate, Message};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Operations offered by the agent service.
#[async_trait]
pub trait AgentsBackend: Send + Sync {
    /// List conversations that belong to `agent_name`, in backend order.
    async fn list_conversations(&self, agent_name: &str)
        -> Result<Vec<Conversation>, BackendError>;

    /// Fetch one conversation including its messages.
    async fn get_conversation(&self, id: &str) -> Result<Conversation, BackendError>;

    /// Create a conversation record for `agent_name`.
    async fn create_conversation(
        &self,
        agent_name: &str,
        metadata: ConversationMetadata,
    ) -> Result<Conversation, BackendError>;

    /// Update conversation metadata.
    async fn update_conversation(
        &self,
        id: &str,
        metadata: ConversationMetadata,
    ) -> Result<(), BackendError>;

    /// Append a message. Replies arrive later through subscriptions.
    async fn add_message(
        &self,
        conversation: &Conversation,
        message: Message,
    ) -> Result<(), BackendError>;

    /// Start receiving pushes for one conversation.
    async fn subscribe_to_conversation(&self, id: &str) -> Result<Subscription, BackendError>;
}

/// A live-update feed for one conversation.
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// releases it on the backend side.
pub struct Subscription {
    conversation_id: String,
    updates: mpsc::UnboundedReceiver<ConversationUpdate>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a receiver and the action that tears the feed down.
    pub fn new(
        conversation_id: impl Into<String>,
        updates: mpsc::UnboundedReceiver<ConversationUpdate>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            updates,
            release: Some(Box::new(release)),
        }
    }

    /// Conversation this feed belongs to.
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Run `hook` right after the backend release.
    #[must_use]
    pub fn on_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        let previous = self.release.take();
        self.release = Some(Box::new(move || {
            if let Some(release) = previous {
                release();
            }
            hook();
        }));
        self
    }

    /// Non-blocking poll for the next pending push.
    pub fn try_next(&mut self) -> Option<ConversationUpdate> {
        self.updates.try_recv().ok()
    }

    /// Wait for the next push. `None` once the backend closed the feed.
    pub async fn next(&mut self) -> Option<ConversationUpdate> {
        self.updates.recv().await
    }

    /// Release the feed now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("conversation_id", &self.conversation_id)
            .field("released", &self.release.is_none())
            .finish_non_exhaustive()
    }
}

/// Build the backend described by the config.
pub fn connect(config: &BackendConfig) -> Result<Arc<dyn AgentsBackend>, BackendError> {
    match config {
        BackendConfig::Memory {
            echo,
            reply_delay_ms,
        } => {
            let backend = if *echo {
                MemoryBackend::with_responder(
                    EchoResponder::new(Duration::from_millis(*reply_delay_ms)),
                )
            } else {
                MemoryBackend::new()
            };
            Ok(Arc::new(backend))
        }
        BackendConfig::Http {
            base_url,
            api_token,
            poll_interval_ms,
        } => {
            let backend = HttpBackend::new(base_url)?
                .with_token(api_token.clone())
                .with_poll_interval(Duration::from_millis(*poll_interval_ms));
            Ok(Arc::new(backend))
        }
    }
}

/// Errors returned by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport failure talking to the service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Conversation id unknown to the backend.
    #[error("Conversation not found: {0}")]
    NotFound(String),

    /// Invalid base URL or route.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend shut down.
    #[error("Backend closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_releases_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let (_tx, rx) = mpsc::unbounded_channel();
        let sub = Subscription::new("c1", rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(sub);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let (_tx, rx) = mpsc::unbounded_channel();
        let sub = Subscription::new("c1", rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_release_runs_after_backend_release() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let first = Arc::clone(&order);
        let second = Arc::clone(&order);
        let (_tx, rx) = mpsc::unbounded_channel();
        let sub = Subscription::new("c1", rx, move || first.lock().unwrap().push("backend"))
            .on_release(move || second.lock().unwrap().push("hook"));
        drop(sub);
        assert_eq!(*order.lock().unwrap(), vec!["backend", "hook"]);
    }

    #[test]
    fn test_try_next_drains_pushes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = Subscription::new("c1", rx, || {});
        assert!(sub.try_next().is_none());
        tx.send(ConversationUpdate {
            conversation_id: "c1".into(),
            messages: vec![Message::user("hi")],
        })
        .unwrap();
        let update = sub.try_next().unwrap();
        assert_eq!(update.messages.len(), 1);
        assert_eq!(sub.conversation_id(), "c1");
    }

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let backend = connect(&BackendConfig::Memory {
            echo: false,
            reply_delay_ms: 0,
        })
        .unwrap();
        let conv = backend
            .create_conversation("agent", ConversationMetadata::named("New Chat"))
            .await
            .unwrap();
        let listed = backend.list_conversations("agent").await.unwrap();
        assert_eq!(listed[0].id, conv.id);
    }

    #[test]
    fn test_connect_http_rejects_bad_url() {
        let result = connect(&BackendConfig::Http {
            base_url: "not a url".into(),
            api_token: None,
            poll_interval_ms: 1000,
        });
        assert!(matches!(result, Err(BackendError::Url(_))));
    }
}
