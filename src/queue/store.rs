//! Queue store adapter contract and the in-memory implementation
//!
//! The durable backend is an external collaborator; every state-machine
//! operation loads one queue, mutates it, and persists it back through
//! this trait. The in-memory implementation backs tests and the default
//! binary wiring.

use crate::error::Result;
use crate::queue::model::PickupQueue;
use crate::types::{GuildId, MessageId};
use crate::utils::queue_key;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keyed lookup/upsert/delete of queue records, keyed by guild+name and
/// by rendered message id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn find_by_name(&self, guild_id: GuildId, name: &str) -> Result<Option<PickupQueue>>;

    async fn find_by_message_id(
        &self,
        guild_id: GuildId,
        message_id: MessageId,
    ) -> Result<Option<PickupQueue>>;

    async fn list_all(&self, guild_id: GuildId) -> Result<Vec<PickupQueue>>;

    /// Insert a new record; false when the key is already taken
    async fn add(&self, queue: PickupQueue) -> Result<bool>;

    /// Overwrite an existing record; false when it is missing
    async fn update(&self, queue: PickupQueue) -> Result<bool>;

    /// Delete by key; false when nothing was there
    async fn remove(&self, guild_id: GuildId, name: &str) -> Result<bool>;
}

/// Process-local store used by tests and the standalone binary
#[derive(Debug, Default)]
pub struct InMemoryQueueStore {
    queues: RwLock<HashMap<(GuildId, String), PickupQueue>>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn find_by_name(&self, guild_id: GuildId, name: &str) -> Result<Option<PickupQueue>> {
        let queues = self.queues.read().await;
        Ok(queues.get(&(guild_id, queue_key(name))).cloned())
    }

    async fn find_by_message_id(
        &self,
        guild_id: GuildId,
        message_id: MessageId,
    ) -> Result<Option<PickupQueue>> {
        let queues = self.queues.read().await;
        Ok(queues
            .values()
            .find(|q| q.guild_id == guild_id && q.static_message_id == Some(message_id))
            .cloned())
    }

    async fn list_all(&self, guild_id: GuildId) -> Result<Vec<PickupQueue>> {
        let queues = self.queues.read().await;
        Ok(queues
            .values()
            .filter(|q| q.guild_id == guild_id)
            .cloned()
            .collect())
    }

    async fn add(&self, queue: PickupQueue) -> Result<bool> {
        let mut queues = self.queues.write().await;
        let key = (queue.guild_id, queue.key());
        if queues.contains_key(&key) {
            return Ok(false);
        }
        queues.insert(key, queue);
        Ok(true)
    }

    async fn update(&self, queue: PickupQueue) -> Result<bool> {
        let mut queues = self.queues.write().await;
        let key = (queue.guild_id, queue.key());
        if !queues.contains_key(&key) {
            return Ok(false);
        }
        queues.insert(key, queue);
        Ok(true)
    }

    async fn remove(&self, guild_id: GuildId, name: &str) -> Result<bool> {
        let mut queues = self.queues.write().await;
        Ok(queues.remove(&(guild_id, queue_key(name))).is_some())
    }
}
