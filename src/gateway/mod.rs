//! Chat-platform collaborator contracts
//!
//! The gateway, renderer, voice-channel manager, and member directory are
//! external systems. The state machine talks to them through these traits
//! so the core logic stays platform-agnostic and testable.

use crate::error::Result;
use crate::queue::model::PickupQueue;
use crate::types::{ActivityKind, GuildId, MessageId, Subscriber, UserId, VoiceChannelHandle};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// How long transient replies stay visible before the platform removes them
pub const NOTICE_TTL: Duration = Duration::from_secs(10);
/// Team roster posts stay around a while longer
pub const TEAMS_TTL: Duration = Duration::from_secs(120);

/// Produces and maintains the rendered chat surface for queues.
///
/// Each queue owns one "static" message updated in place; everything else
/// is transient content with an auto-expiry duration.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create or update the static queue status message. Returns the new
    /// message id when the message was created on this call.
    async fn publish_queue(&self, queue: &PickupQueue) -> Result<Option<MessageId>>;

    /// Delete the static queue status message, if any
    async fn retract_queue(&self, queue: &PickupQueue) -> Result<()>;

    /// Post transient text that self-deletes after `ttl`
    async fn post_notice(&self, guild_id: GuildId, text: &str, ttl: Duration) -> Result<()>;

    /// Post the team rosters of a started queue
    async fn post_teams(&self, queue: &PickupQueue) -> Result<()>;

    /// Send an out-of-band direct message to one user
    async fn direct_message(&self, user_id: UserId, text: &str) -> Result<()>;
}

/// Voice-channel lifecycle collaborator
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    async fn get_or_create(&self, label: &str, guild_id: GuildId) -> Result<VoiceChannelHandle>;

    async fn delete(&self, guild_id: GuildId, handle: &VoiceChannelHandle) -> Result<()>;
}

/// Guild membership queries the pickup flows depend on
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Returns the flag reason when the user is barred from queues
    async fn is_flagged(&self, guild_id: GuildId, user_id: UserId) -> Result<Option<String>>;

    async fn is_admin(&self, guild_id: GuildId, user_id: UserId) -> Result<bool>;

    /// Users holding the promote-notification role
    async fn promote_subscribers(&self, guild_id: GuildId) -> Result<Vec<Subscriber>>;
}

/// Per-user usage counters; recorded, never enforced
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, guild_id: GuildId, user_id: UserId, kind: ActivityKind) -> Result<()>;
}

/// Receives the connected-player count from the activity status poll
#[async_trait]
pub trait PresenceSink: Send + Sync {
    async fn set_player_count(&self, count: usize) -> Result<()>;
}

/// In-process activity counter implementation
#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    counters: Mutex<HashMap<(GuildId, UserId, ActivityKind), u64>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, guild_id: GuildId, user_id: UserId, kind: ActivityKind) -> u64 {
        self.counters
            .lock()
            .map(|c| c.get(&(guild_id, user_id, kind)).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn record(&self, guild_id: GuildId, user_id: UserId, kind: ActivityKind) -> Result<()> {
        if let Ok(mut counters) = self.counters.lock() {
            *counters.entry((guild_id, user_id, kind)).or_insert(0) += 1;
        }
        Ok(())
    }
}

/// Presence sink that only logs; used when no platform connection exists
#[derive(Debug, Default)]
pub struct LoggingPresenceSink;

#[async_trait]
impl PresenceSink for LoggingPresenceSink {
    async fn set_player_count(&self, count: usize) -> Result<()> {
        info!("Game server presence: {} players connected", count);
        Ok(())
    }
}
