//! Common types used throughout the pickup coordination service

use serde::{Deserialize, Serialize};

/// Unique identifier for a guild (chat community)
pub type GuildId = u64;

/// Unique identifier for a user
pub type UserId = u64;

/// Unique identifier for a rendered chat message
pub type MessageId = u64;

/// Unique identifier for a channel
pub type ChannelId = u64;

/// A user holding a slot in a queue's roster or waiting list.
///
/// Identity is the user id; the display name is carried along for
/// rendering only and takes no part in membership tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: UserId,
    pub name: String,
}

impl Subscriber {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subscriber {}

/// Opaque handle to an externally managed voice channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceChannelHandle {
    pub label: String,
    pub id: Option<u64>,
}

/// A subset of subscribers assigned to one side after a queue starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub subscribers: Vec<Subscriber>,
    pub voice_channel: VoiceChannelHandle,
}

/// Per-user activity counters tracked by the [`crate::gateway::ActivityLog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Create,
    Join,
    Promote,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityKind::Create => write!(f, "create"),
            ActivityKind::Join => write!(f, "join"),
            ActivityKind::Promote => write!(f, "promote"),
        }
    }
}
