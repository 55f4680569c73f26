//! Utility functions for the pickup coordination service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique scheduled-task ID
pub fn generate_task_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Normalize a queue name into its row key form
pub fn queue_key(name: &str) -> String {
    name.to_lowercase()
}

/// Render a roster as `name1, name2, ...` for replies and promote messages
pub fn format_subscribers(subscribers: &[crate::types::Subscriber]) -> String {
    subscribers
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
