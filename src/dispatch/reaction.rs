//! Reaction toggle events
//!
//! The rendered queue message carries two reaction glyphs: a check mark
//! toggling queue membership and a megaphone triggering a promote. The
//! platform gateway forwards raw add/remove events; this module gives
//! them a typed shape before dispatch.

use crate::types::{GuildId, MessageId, Subscriber};

/// Glyph toggling join/leave on the rendered queue message
pub const JOIN_GLYPH: &str = "\u{2705}";
/// Glyph requesting a promote broadcast
pub const PROMOTE_GLYPH: &str = "\u{1F4E2}";

/// A reaction add or remove on some message the bot can see
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub guild_id: GuildId,
    /// Name of the channel the message lives in
    pub channel_name: String,
    pub message_id: MessageId,
    pub user: Subscriber,
    pub emoji: String,
    /// True when the reacting account is a bot (including this one)
    pub from_bot: bool,
}

impl ReactionEvent {
    pub fn is_join_glyph(&self) -> bool {
        self.emoji == JOIN_GLYPH
    }

    pub fn is_promote_glyph(&self) -> bool {
        self.emoji == PROMOTE_GLYPH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_classification() {
        let mut event = ReactionEvent {
            guild_id: 1,
            channel_name: "active-pickups".to_string(),
            message_id: 10,
            user: Subscriber::new(5, "user"),
            emoji: JOIN_GLYPH.to_string(),
            from_bot: false,
        };
        assert!(event.is_join_glyph());
        assert!(!event.is_promote_glyph());

        event.emoji = PROMOTE_GLYPH.to_string();
        assert!(event.is_promote_glyph());

        event.emoji = "\u{1F389}".to_string();
        assert!(!event.is_join_glyph());
        assert!(!event.is_promote_glyph());
    }
}
