//! In-process agent service.
//!
//! Conversations live in a mutex-guarded vector and pushes fan out to
//! subscribers over unbounded channels. An optional [`Responder`] stands in
//! for the remote agent and answers user messages asynchronously.

use super::{AgentsBackend, BackendError, Subscription};
use crate::model::{Conversation, ConversationMetadata, ConversationUpdate, Message, Role};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Produces the agent side of a conversation.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Reply to the latest user message, or `None` to stay silent.
    async fn respond(&self, conversation: &Conversation) -> Option<String>;
}

/// Replies by quoting the user's message back.
#[derive(Debug, Clone, Default)]
pub struct EchoResponder {
    delay: Duration,
}

impl EchoResponder {
    /// Echo after waiting `delay`.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Responder for EchoResponder {
    async fn respond(&self, conversation: &Conversation) -> Option<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let last = conversation
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)?;
        let quoted: Vec<String> = last.content.lines().map(|l| format!("> {l}")).collect();
        Some(format!("You said:\n\n{}", quoted.join("\n")))
    }
}

type Subscribers = HashMap<String, Vec<(u64, mpsc::UnboundedSender<ConversationUpdate>)>>;

#[derive(Default)]
struct Store {
    conversations: Vec<Conversation>,
    subscribers: Subscribers,
    next_subscriber: u64,
}

impl Store {
    fn find_mut(&mut self, id: &str) -> Result<&mut Conversation, BackendError> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| BackendError::NotFound(id.to_string()))
    }

    fn publish(&mut self, id: &str) {
        let Some(conv) = self.conversations.iter().find(|c| c.id == id) else {
            return;
        };
        let update = ConversationUpdate {
            conversation_id: id.to_string(),
            messages: conv.messages.clone(),
        };
        if let Some(subs) = self.subscribers.get_mut(id) {
            subs.retain(|(_, tx)| tx.send(update.clone()).is_ok());
        }
    }

    fn append(&mut self, id: &str, message: Message) -> Result<Conversation, BackendError> {
        let conv = self.find_mut(id)?;
        conv.messages.push(message);
        let snapshot = conv.clone();
        self.publish(id);
        Ok(snapshot)
    }
}

/// Agent service kept entirely in memory.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
    responder: Option<Arc<dyn Responder>>,
}

impl MemoryBackend {
    /// A backend that never replies on its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that answers user messages with `responder`.
    pub fn with_responder(responder: impl Responder + 'static) -> Self {
        Self {
            store: Arc::default(),
            responder: Some(Arc::new(responder)),
        }
    }

    /// Seed a conversation, placing it first like a fresh create would.
    pub fn insert(&self, conversation: Conversation) {
        self.lock().conversations.insert(0, conversation);
    }

    /// Append an assistant message and notify subscribers.
    pub fn push_reply(&self, id: &str, content: impl Into<String>) -> Result<(), BackendError> {
        self.lock().append(id, Message::assistant(content)).map(|_| ())
    }

    /// Number of live subscriptions for a conversation.
    pub fn subscriber_count(&self, id: &str) -> usize {
        self.lock().subscribers.get(id).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_reply(&self, conversation: Conversation) {
        let Some(responder) = self.responder.clone() else {
            return;
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let Some(reply) = responder.respond(&conversation).await else {
                return;
            };
            let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = store.append(&conversation.id, Message::assistant(reply)) {
                debug!(conversation = %conversation.id, error = %e, "dropping reply");
            }
        });
    }
}

#[async_trait]
impl AgentsBackend for MemoryBackend {
    async fn list_conversations(
        &self,
        agent_name: &str,
    ) -> Result<Vec<Conversation>, BackendError> {
        Ok(self
            .lock()
            .conversations
            .iter()
            .filter(|c| c.agent_name.as_deref().map_or(true, |a| a == agent_name))
            .cloned()
            .collect())
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation, BackendError> {
        self.lock().find_mut(id).map(|c| c.clone())
    }

    async fn create_conversation(
        &self,
        agent_name: &str,
        metadata: ConversationMetadata,
    ) -> Result<Conversation, BackendError> {
        let mut conv = Conversation::new(Uuid::new_v4().to_string(), metadata);
        conv.agent_name = Some(agent_name.to_string());
        self.lock().conversations.insert(0, conv.clone());
        Ok(conv)
    }

    async fn update_conversation(
        &self,
        id: &str,
        metadata: ConversationMetadata,
    ) -> Result<(), BackendError> {
        self.lock().find_mut(id)?.metadata.merge(metadata);
        Ok(())
    }

    async fn add_message(
        &self,
        conversation: &Conversation,
        message: Message,
    ) -> Result<(), BackendError> {
        let from_user = message.role == Role::User;
        let snapshot = self.lock().append(&conversation.id, message)?;
        if from_user {
            self.spawn_reply(snapshot);
        }
        Ok(())
    }

    async fn subscribe_to_conversation(&self, id: &str) -> Result<Subscription, BackendError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let key = {
            let mut store = self.lock();
            store.find_mut(id)?;
            let key = store.next_subscriber;
            store.next_subscriber += 1;
            store
                .subscribers
                .entry(id.to_string())
                .or_default()
                .push((key, tx));
            key
        };

        let store = Arc::clone(&self.store);
        let conversation_id = id.to_string();
        Ok(Subscription::new(id, rx, move || {
            let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(subs) = store.subscribers.get_mut(&conversation_id) {
                subs.retain(|(k, _)| *k != key);
                if subs.is_empty() {
                    store.subscribers.remove(&conversation_id);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn backend_with_conversation() -> (MemoryBackend, Conversation) {
        let backend = MemoryBackend::new();
        let conv = backend
            .create_conversation("agent", ConversationMetadata::named("New Chat"))
            .await
            .unwrap();
        (backend, conv)
    }

    #[tokio::test]
    async fn test_create_prepends() {
        let (backend, first) = backend_with_conversation().await;
        let second = backend
            .create_conversation("agent", ConversationMetadata::default())
            .await
            .unwrap();
        let listed = backend.list_conversations("agent").await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_list_filters_by_agent() {
        let (backend, _) = backend_with_conversation().await;
        backend
            .create_conversation("other", ConversationMetadata::default())
            .await
            .unwrap();
        assert_eq!(backend.list_conversations("agent").await.unwrap().len(), 1);
        assert_eq!(backend.list_conversations("other").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_conversation() {
        let backend = MemoryBackend::new();
        let err = backend.get_conversation("missing").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_update_merges_metadata() {
        let (backend, conv) = backend_with_conversation().await;
        backend
            .update_conversation(&conv.id, ConversationMetadata::named("Renamed"))
            .await
            .unwrap();
        let fetched = backend.get_conversation(&conv.id).await.unwrap();
        assert_eq!(fetched.display_name(), "Renamed");
    }

    #[tokio::test]
    async fn test_add_message_pushes_to_subscribers() {
        let (backend, conv) = backend_with_conversation().await;
        let mut sub = backend.subscribe_to_conversation(&conv.id).await.unwrap();
        backend
            .add_message(&conv, Message::user("hello"))
            .await
            .unwrap();
        let update = sub.try_next().unwrap();
        assert_eq!(update.conversation_id, conv.id);
        assert_eq!(update.messages, vec![Message::user("hello")]);
    }

    #[tokio::test]
    async fn test_dropping_subscription_unregisters() {
        let (backend, conv) = backend_with_conversation().await;
        let sub = backend.subscribe_to_conversation(&conv.id).await.unwrap();
        assert_eq!(backend.subscriber_count(&conv.id), 1);
        drop(sub);
        assert_eq!(backend.subscriber_count(&conv.id), 0);
    }

    #[tokio::test]
    async fn test_last_release_drops_subscriber_entry() {
        let (backend, conv) = backend_with_conversation().await;
        let first = backend.subscribe_to_conversation(&conv.id).await.unwrap();
        let second = backend.subscribe_to_conversation(&conv.id).await.unwrap();

        first.unsubscribe();
        assert!(backend.lock().subscribers.contains_key(&conv.id));
        drop(second);
        assert!(!backend.lock().subscribers.contains_key(&conv.id));
    }

    #[tokio::test]
    async fn test_subscribe_unknown_conversation_fails() {
        let backend = MemoryBackend::new();
        assert!(backend.subscribe_to_conversation("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_echo_responder_replies_through_subscription() {
        let backend = MemoryBackend::with_responder(EchoResponder::default());
        let conv = backend
            .create_conversation("agent", ConversationMetadata::default())
            .await
            .unwrap();
        let mut sub = backend.subscribe_to_conversation(&conv.id).await.unwrap();
        backend
            .add_message(&conv, Message::user("ping"))
            .await
            .unwrap();

        let first = sub.next().await.unwrap();
        assert_eq!(first.messages.len(), 1);
        let second = tokio::time::timeout(Duration::from_secs(2), sub.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.messages.len(), 2);
        assert_eq!(second.messages[1].role, Role::Assistant);
        assert!(second.messages[1].content.contains("> ping"));
    }

    #[tokio::test]
    async fn test_push_reply() {
        let (backend, conv) = backend_with_conversation().await;
        backend.push_reply(&conv.id, "hi from agent").unwrap();
        let fetched = backend.get_conversation(&conv.id).await.unwrap();
        assert_eq!(fetched.messages, vec![Message::assistant("hi from agent")]);
    }
}
