//! Pickup Hub - Pickup game session coordination
//!
//! This crate coordinates ad-hoc multiplayer pickup sessions for a chat
//! community: named queues with rosters and waiting lists, balanced team
//! formation, reaction and text-command entry points, and match
//! notifications to the game server over the legacy UDP RCON protocol.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod gateway;
pub mod metrics;
pub mod queue;
pub mod rcon;
pub mod scheduler;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{PickupError, Result};
pub use types::*;

// Re-export key components
pub use dispatch::{CommandContext, Dispatcher, ReactionEvent};
pub use flags::FlagSet;
pub use queue::{InMemoryQueueStore, PickupQueue, QueueService, QueueState, QueueStore};
pub use rcon::{RconClient, RconEndpoint, ServerStatus};
pub use scheduler::Scheduler;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
