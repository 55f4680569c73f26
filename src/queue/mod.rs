//! Queue domain: entity model, state-machine service, and store contract

pub mod model;
pub mod service;
pub mod store;

pub use model::{JoinOutcome, LeaveOutcome, PickupQueue, QueueState};
pub use service::{QueueService, QueueServiceConfig};
pub use store::{InMemoryQueueStore, QueueStore};
