//! REST client for a remote agent service.
//!
//! Routes, relative to the configured base URL:
//!
//! | call | route |
//! |------|-------|
//! | list | `GET conversations?agent_name=..` |
//! | create | `POST conversations` |
//! | get | `GET conversations/{id}` |
//! | update | `PUT conversations/{id}` |
//! | add message | `POST conversations/{id}/messages` |
//!
//! Live updates are delivered by polling `GET conversations/{id}` and
//! pushing whenever the message list changes.

use super::{AgentsBackend, BackendError, Subscription};
use crate::model::{Conversation, ConversationMetadata, ConversationUpdate, Message};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

fn cannot_be_base() -> BackendError {
    BackendError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase)
}

#[derive(Serialize)]
struct CreateConversationRequest<'a> {
    agent_name: &'a str,
    metadata: &'a ConversationMetadata,
}

#[derive(Serialize)]
struct UpdateConversationRequest<'a> {
    metadata: &'a ConversationMetadata,
}

/// HTTP implementation of [`AgentsBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
    token: Option<String>,
    poll_interval: Duration,
}

impl HttpBackend {
    /// Create a client for the service rooted at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            token: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// How often subscriptions poll for changes.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(path)?)
    }

    fn conversation_url(&self, id: &str) -> Result<Url, BackendError> {
        let mut url = self.url("conversations/")?;
        url.path_segments_mut()
            .map_err(|()| cannot_be_base())?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".into());
        debug!(status = status.as_u16(), %message, "request rejected");
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch(&self, id: &str) -> Result<Conversation, BackendError> {
        let request = self.authorize(self.http.get(self.conversation_url(id)?));
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AgentsBackend for HttpBackend {
    async fn list_conversations(
        &self,
        agent_name: &str,
    ) -> Result<Vec<Conversation>, BackendError> {
        let mut url = self.url("conversations")?;
        url.query_pairs_mut().append_pair("agent_name", agent_name);
        let response = Self::check(self.authorize(self.http.get(url)).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation, BackendError> {
        self.fetch(id).await
    }

    async fn create_conversation(
        &self,
        agent_name: &str,
        metadata: ConversationMetadata,
    ) -> Result<Conversation, BackendError> {
        let body = CreateConversationRequest {
            agent_name,
            metadata: &metadata,
        };
        let request = self.authorize(self.http.post(self.url("conversations")?).json(&body));
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn update_conversation(
        &self,
        id: &str,
        metadata: ConversationMetadata,
    ) -> Result<(), BackendError> {
        let body = UpdateConversationRequest {
            metadata: &metadata,
        };
        let request = self.authorize(self.http.put(self.conversation_url(id)?).json(&body));
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn add_message(
        &self,
        conversation: &Conversation,
        message: Message,
    ) -> Result<(), BackendError> {
        let mut url = self.conversation_url(&conversation.id)?;
        url.path_segments_mut()
            .map_err(|()| cannot_be_base())?
            .push("messages");
        let request = self.authorize(self.http.post(url).json(&message));
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn subscribe_to_conversation(&self, id: &str) -> Result<Subscription, BackendError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.clone();
        let conversation_id = id.to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(client.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last: Option<Vec<Message>> = None;
            loop {
                ticker.tick().await;
                match client.fetch(&conversation_id).await {
                    Ok(conv) => {
                        if last.as_ref() == Some(&conv.messages) {
                            continue;
                        }
                        let update = ConversationUpdate {
                            conversation_id: conversation_id.clone(),
                            messages: conv.messages.clone(),
                        };
                        if tx.send(update).is_err() {
                            break;
                        }
                        last = Some(conv.messages);
                    }
                    Err(e) => {
                        warn!(conversation = %conversation_id, error = %e, "poll failed");
                    }
                }
            }
        });

        Ok(Subscription::new(id, rx, move || handle.abort()))
    }
}
