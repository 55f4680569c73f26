//! Error types for the pickup coordination service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific pickup queue scenarios
#[derive(Debug, thiserror::Error)]
pub enum PickupError {
    #[error("Queue with the name '{name}' doesn't exist")]
    NotFound { name: String },

    #[error("Queue with the name '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("A queue with the name '{name}' already exists")]
    NameTaken { name: String },

    #[error("You have to be either the queue owner or a server admin")]
    Forbidden,

    #[error("Queue '{name}' is full")]
    QueueFull { name: String },

    #[error("You have been flagged and can't join or create queues: {reason}")]
    FlaggedUser { reason: String },

    #[error("Invalid operator flags: {reason}")]
    InvalidFlags { reason: String },

    #[error("External collaborator failed: {message}")]
    ExternalIo { message: String },

    #[error("RCON response timed out after {timeout_ms}ms")]
    ProtocolTimeout { timeout_ms: u64 },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl PickupError {
    /// Whether this error should be surfaced to the triggering user as a
    /// short-lived chat reply. Infrastructure failures are logged instead.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            PickupError::ExternalIo { .. }
                | PickupError::ProtocolTimeout { .. }
                | PickupError::InternalError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_classification() {
        assert!(PickupError::NotFound {
            name: "duel".to_string()
        }
        .is_user_facing());
        assert!(PickupError::Forbidden.is_user_facing());
        assert!(!PickupError::ProtocolTimeout { timeout_ms: 500 }.is_user_facing());
        assert!(!PickupError::ExternalIo {
            message: "store write failed".to_string()
        }
        .is_user_facing());
    }
}
