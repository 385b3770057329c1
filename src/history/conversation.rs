use chrono::{ DateTime, Duration, Utc };
use log::{ error, info, warn };
use std::sync::Arc;

use super::{ KeyValueStore, StoreError };
use crate::gateway::{ Progress, Responder };
use crate::models::chat::{ ChatMessage, Role };

pub const CHAT_HISTORY_KEY: &str = "jnan_chat_history";
pub const LAST_CLEAR_KEY: &str = "jnan_last_clear";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub threshold: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self { threshold: Duration::hours(24) }
    }
}

/// The visible chat, kept in insertion order and written back to the
/// key-value store after every mutation.
pub struct ConversationStore {
    kv: Arc<dyn KeyValueStore>,
    messages: Vec<ChatMessage>,
    last_id: i64,
}

impl ConversationStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            messages: Vec::new(),
            last_id: 0,
        }
    }

    /// Session start: drops the saved chat if the last clear is older than
    /// the policy allows, otherwise restores it.
    pub async fn open(kv: Arc<dyn KeyValueStore>, policy: ExpiryPolicy, now: DateTime<Utc>) -> Self {
        let mut store = Self::new(kv);

        let last_clear = match store.kv.get(LAST_CLEAR_KEY).await {
            Ok(raw) => raw.and_then(|v| v.trim().parse::<i64>().ok()),
            Err(e) => {
                warn!("Could not read last-clear marker: {}", e);
                None
            }
        };

        // A marker in the future or too far in the past to subtract is
        // treated like a missing one.
        let elapsed = last_clear.and_then(|ms| {
            now.timestamp_millis()
                .checked_sub(ms)
                .filter(|elapsed| *elapsed >= 0)
        });
        if last_clear.is_some() && elapsed.is_none() {
            warn!("Ignoring unusable last-clear marker");
        }

        match elapsed {
            Some(elapsed) if elapsed > policy.threshold.num_milliseconds() => {
                info!("Chat history older than {}h, starting fresh", policy.threshold.num_hours());
                if let Err(e) = store.kv.remove(CHAT_HISTORY_KEY).await {
                    warn!("Could not remove expired chat history: {}", e);
                }
                store.write_marker(now).await;
                return store;
            }
            Some(_) => {}
            None => store.write_marker(now).await,
        }

        match store.kv.get(CHAT_HISTORY_KEY).await {
            Ok(Some(snapshot)) => store.restore(&snapshot),
            Ok(None) => {}
            Err(e) => warn!("Could not read chat history: {}", e),
        }
        store
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Millisecond clock reading, bumped past the last issued id so ids stay
    /// unique and ordered.
    pub fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last_id = if now > self.last_id { now } else { self.last_id + 1 };
        self.last_id.to_string()
    }

    pub async fn append(&mut self, message: ChatMessage) -> Result<(), StoreError> {
        if message.id.is_empty() {
            return Err(StoreError::EmptyId);
        }
        self.track_id(&message.id);
        self.messages.push(message);
        self.persist().await;
        Ok(())
    }

    /// Rewrites the user message `id` and everything after it: keeps the
    /// messages before `id`, re-adds `id` with `new_text`, then asks
    /// `responder` for a fresh reply. Returns `false` when `id` is unknown or
    /// names a bot message.
    ///
    /// The truncation is kept even if `responder` fails.
    pub async fn edit_and_regenerate(
        &mut self,
        id: &str,
        new_text: &str,
        responder: &dyn Responder,
        progress: &Progress<'_>
    ) -> bool {
        let Some(index) = self.messages.iter().position(|m| m.id == id) else {
            return false;
        };
        if self.messages[index].role != Role::User {
            warn!("Refusing to edit bot message {}", id);
            return false;
        }

        let mut edited = self.messages[index].clone();
        self.messages.truncate(index);
        let history = self.messages.clone();

        edited.content = new_text.to_string();
        edited.timestamp = Utc::now();
        let image = edited.image.clone();
        self.messages.push(edited);
        self.persist().await;

        match responder.respond(new_text, &history, image.as_ref(), progress).await {
            Ok(reply) => {
                let reply_id = self.next_id();
                self.messages.push(ChatMessage::bot(reply_id, reply));
                self.persist().await;
            }
            Err(e) => {
                error!("Regeneration failed for message {}: {}", id, e);
            }
        }
        true
    }

    pub async fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.messages.iter().position(|m| m.id == id) else {
            return false;
        };
        self.messages.remove(index);
        self.persist().await;
        true
    }

    /// Replaces the conversation with `snapshot`. Unreadable snapshots leave
    /// an empty conversation.
    pub fn restore(&mut self, snapshot: &str) {
        match serde_json::from_str::<Vec<ChatMessage>>(snapshot) {
            Ok(messages) => {
                self.last_id = messages
                    .iter()
                    .filter_map(|m| m.id.parse::<i64>().ok())
                    .max()
                    .unwrap_or(0);
                self.messages = messages;
            }
            Err(e) => {
                error!("Discarding unreadable chat history: {}", e);
                self.messages.clear();
            }
        }
    }

    pub fn snapshot(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&self.messages)?)
    }

    /// "New chat": empties the conversation and restarts the expiry clock.
    pub async fn clear(&mut self) {
        self.messages.clear();
        self.persist().await;
        self.write_marker(Utc::now()).await;
    }

    fn track_id(&mut self, id: &str) {
        if let Ok(n) = id.parse::<i64>() {
            self.last_id = self.last_id.max(n);
        }
    }

    async fn write_marker(&self, now: DateTime<Utc>) {
        let value = now.timestamp_millis().to_string();
        if let Err(e) = self.kv.set(LAST_CLEAR_KEY, &value).await {
            warn!("Could not write last-clear marker: {}", e);
        }
    }

    async fn persist(&self) {
        let result = match self.snapshot() {
            Ok(json) => self.kv.set(CHAT_HISTORY_KEY, &json).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("Could not persist chat history: {}", e);
        }
    }
}
