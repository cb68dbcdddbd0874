//! Conversation lifecycle and live-update orchestration.
//!
//! [`ChatSession`] owns everything the chat screen shows: the conversation
//! list, the active conversation, its messages and the loading/sending
//! flags. Each operation awaits its backend calls in sequence. Failures never
//! escape; they are logged and queued as [`Notification`]s for the UI.
//!
//! At most one [`Subscription`] is held at a time. Switching conversations
//! always releases the previous feed before the next one is opened.

use crate::backend::{AgentsBackend, Subscription};
use crate::model::{
    title_from_message, Conversation, ConversationMetadata, Message, Role,
    DEFAULT_CONVERSATION_NAME,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A short message for the user, shown briefly and then dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// State and operations behind the chat screen.
pub struct ChatSession {
    backend: Arc<dyn AgentsBackend>,
    agent_name: String,
    conversations: Vec<Conversation>,
    current: Option<Conversation>,
    messages: Vec<Message>,
    is_loading: bool,
    is_sending: bool,
    subscription: Option<Subscription>,
    notifications: VecDeque<Notification>,
}

impl ChatSession {
    /// Create a session. Nothing is fetched until [`Self::initialize`].
    pub fn new(backend: Arc<dyn AgentsBackend>, agent_name: impl Into<String>) -> Self {
        Self {
            backend,
            agent_name: agent_name.into(),
            conversations: Vec::new(),
            current: None,
            messages: Vec::new(),
            is_loading: true,
            is_sending: false,
            subscription: None,
            notifications: VecDeque::new(),
        }
    }

    /// Fetch the conversation list, then open the first conversation or
    /// create one when there are none. Loading ends either way.
    pub async fn initialize(&mut self) {
        match self.backend.list_conversations(&self.agent_name).await {
            Ok(conversations) => {
                info!(count = conversations.len(), agent = %self.agent_name, "loaded conversations");
                self.conversations = conversations;
                match self.conversations.first().map(|c| c.id.clone()) {
                    Some(id) => self.load_conversation(&id).await,
                    None => self.create_new_conversation().await,
                }
            }
            Err(e) => {
                error!(error = %e, "failed to list conversations");
                self.notify(Notification::error("Failed to load conversations"));
            }
        }
        self.is_loading = false;
    }

    /// Make `id` the active conversation.
    ///
    /// The current subscription is released first, then the full
    /// conversation is fetched and a new feed opened for it.
    pub async fn load_conversation(&mut self, id: &str) {
        self.release_subscription();

        let conversation = match self.backend.get_conversation(id).await {
            Ok(conversation) => conversation,
            Err(e) => {
                error!(conversation = %id, error = %e, "failed to load conversation");
                self.notify(Notification::error("Failed to load conversation"));
                return;
            }
        };
        self.messages = conversation.messages.clone();
        self.current = Some(conversation);

        match self.backend.subscribe_to_conversation(id).await {
            Ok(subscription) => {
                debug!(conversation = %id, "subscribed");
                self.subscription = Some(subscription);
            }
            Err(e) => {
                error!(conversation = %id, error = %e, "failed to subscribe");
                self.notify(Notification::error("Failed to load conversation"));
            }
        }
    }

    /// Create a conversation, put it at the top of the list and open it.
    pub async fn create_new_conversation(&mut self) {
        let metadata = ConversationMetadata::named(DEFAULT_CONVERSATION_NAME);
        match self
            .backend
            .create_conversation(&self.agent_name, metadata)
            .await
        {
            Ok(conversation) => {
                info!(conversation = %conversation.id, "created conversation");
                let id = conversation.id.clone();
                self.conversations.insert(0, conversation);
                self.load_conversation(&id).await;
            }
            Err(e) => {
                error!(error = %e, "failed to create conversation");
                self.notify(Notification::error("Failed to create conversation"));
            }
        }
    }

    /// Whether [`Self::send`] would accept `input` right now.
    pub fn can_send(&self, input: &str) -> bool {
        !input.trim().is_empty() && !self.is_sending && self.current.is_some()
    }

    /// Submit `input` as a user message to the active conversation.
    ///
    /// Returns `false` without side effects when the input is blank, a send
    /// is in flight, or no conversation is active. The first message of a
    /// conversation also renames it. The reply arrives via the subscription.
    pub async fn send(&mut self, input: String) -> bool {
        if !self.can_send(&input) {
            return false;
        }
        let Some(conversation) = self.current.clone() else {
            return false;
        };

        self.is_sending = true;
        if self.messages.is_empty() {
            self.rename_from_first_message(&conversation.id, &input)
                .await;
        }
        if let Err(e) = self
            .backend
            .add_message(&conversation, Message::user(input))
            .await
        {
            error!(conversation = %conversation.id, error = %e, "failed to send message");
            self.notify(Notification::error("Failed to send message"));
        }
        self.is_sending = false;
        true
    }

    async fn rename_from_first_message(&mut self, id: &str, first_message: &str) {
        let name = title_from_message(first_message);
        let result = self
            .backend
            .update_conversation(id, ConversationMetadata::named(name.clone()))
            .await;
        if let Err(e) = result {
            error!(conversation = %id, error = %e, "failed to update conversation name");
            return;
        }

        for conv in self.conversations.iter_mut().filter(|c| c.id == id) {
            conv.metadata.name = Some(name.clone());
        }
        if let Some(current) = self.current.as_mut().filter(|c| c.id == id) {
            current.metadata.name = Some(name);
        }
    }

    /// Remove a conversation from the list.
    ///
    /// Removal is local and immediate. Deleting the active conversation
    /// opens the next remaining one, or creates a fresh one if none are left.
    pub async fn delete_conversation(&mut self, id: &str) {
        self.conversations.retain(|c| c.id != id);

        if self.current.as_ref().is_some_and(|c| c.id == id) {
            self.release_subscription();
            self.current = None;
            self.messages.clear();

            match self.conversations.first().map(|c| c.id.clone()) {
                Some(next) => self.load_conversation(&next).await,
                None => self.create_new_conversation().await,
            }
            if self.current.is_none() {
                self.notify(Notification::error("Failed to delete conversation"));
                return;
            }
        }

        info!(conversation = %id, "deleted conversation");
        self.notify(Notification::success("Conversation deleted"));
    }

    /// Apply any pushes waiting on the live feed.
    ///
    /// Each push replaces the message list wholesale; only the newest one
    /// matters. Returns `true` when the message list changed.
    pub fn poll_updates(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        let mut latest = None;
        while let Some(update) = subscription.try_next() {
            latest = Some(update);
        }
        let Some(update) = latest else {
            return false;
        };
        if self.current.as_ref().map(|c| c.id.as_str()) != Some(update.conversation_id.as_str()) {
            return false;
        }
        let changed = self.messages != update.messages;
        self.messages = update.messages;
        changed
    }

    /// Release the live feed. Call when the screen goes away.
    pub fn shutdown(&mut self) {
        self.release_subscription();
    }

    fn release_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!(conversation = %subscription.conversation_id(), "unsubscribed");
            subscription.unsubscribe();
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
    }

    /// Take all queued notifications, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Agent whose conversations this session shows.
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Conversations in display order.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// The active conversation.
    pub fn current(&self) -> Option<&Conversation> {
        self.current.as_ref()
    }

    /// Id of the active conversation.
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.id.as_str())
    }

    /// Header title for the active conversation.
    pub fn current_name(&self) -> &str {
        self.current
            .as_ref()
            .map_or(DEFAULT_CONVERSATION_NAME, Conversation::display_name)
    }

    /// Messages of the active conversation.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    /// A reply is expected: a send is in flight or the thread ends with a
    /// user message.
    pub fn awaiting_reply(&self) -> bool {
        self.is_sending || self.messages.last().is_some_and(|m| m.role == Role::User)
    }

    /// Whether a live feed is open.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.release_subscription();
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("agent_name", &self.agent_name)
            .field("conversations", &self.conversations.len())
            .field("current", &self.current_id())
            .field("messages", &self.messages.len())
            .field("is_loading", &self.is_loading)
            .field("is_sending", &self.is_sending)
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}
