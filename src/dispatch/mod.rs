//! Dual entry-point dispatch
//!
//! Text commands and reaction toggles are two independent event streams
//! that must converge on the same state-machine operations. Both are
//! mapped onto [`QueueCommand`] values and executed here, so the
//! business rules live in exactly one place. User-facing failures turn
//! into short-lived replies; infrastructure failures are logged and
//! swallowed so the event loop never dies.

pub mod command;
pub mod reaction;

pub use command::{parse_command, QueueCommand};
pub use reaction::{ReactionEvent, JOIN_GLYPH, PROMOTE_GLYPH};

use crate::config::PickupSettings;
use crate::error::{PickupError, Result};
use crate::gateway::{Renderer, NOTICE_TTL};
use crate::queue::model::QueueState;
use crate::queue::QueueService;
use crate::types::{GuildId, Subscriber};
use crate::utils::format_subscribers;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Where a text command came from
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub guild_id: GuildId,
    pub channel_name: String,
    pub author: Subscriber,
}

/// Routes both entry points into the queue service
pub struct Dispatcher {
    service: Arc<QueueService>,
    renderer: Arc<dyn Renderer>,
    settings: PickupSettings,
}

impl Dispatcher {
    pub fn new(
        service: Arc<QueueService>,
        renderer: Arc<dyn Renderer>,
        settings: PickupSettings,
    ) -> Self {
        Self {
            service,
            renderer,
            settings,
        }
    }

    /// Handle one chat line. Lines outside the pickup channel, without
    /// the prefix, or with an unknown command word are ignored.
    pub async fn handle_message(&self, ctx: &CommandContext, content: &str) -> Result<()> {
        if ctx.channel_name != self.settings.command_channel {
            return Ok(());
        }

        match parse_command(content, &self.settings.command_prefix) {
            None => Ok(()),
            Some(Err(usage)) => {
                self.renderer
                    .post_notice(ctx.guild_id, &usage.to_string(), NOTICE_TTL)
                    .await
            }
            Some(Ok(command)) => {
                debug!("Dispatching {:?} from {}", command, ctx.author.name);
                let result = self.execute(ctx, command).await;
                self.surface_result(ctx.guild_id, result).await
            }
        }
    }

    /// Handle a reaction-add on some visible message
    pub async fn handle_reaction_added(&self, event: &ReactionEvent) -> Result<()> {
        let Some(queue) = self.resolve_reaction_queue(event).await? else {
            return Ok(());
        };

        let result = if event.is_join_glyph() {
            self.service
                .join(event.guild_id, &queue.name, event.user.clone())
                .await
                .map(|_| ())
        } else if event.is_promote_glyph() {
            self.service
                .promote(event.guild_id, Some(&queue.name), event.user.clone())
                .await
        } else {
            Ok(())
        };

        self.surface_result(event.guild_id, result).await
    }

    /// Handle a reaction-remove; only the join glyph toggles anything
    pub async fn handle_reaction_removed(&self, event: &ReactionEvent) -> Result<()> {
        if !event.is_join_glyph() {
            return Ok(());
        }
        let Some(queue) = self.resolve_reaction_queue(event).await? else {
            return Ok(());
        };

        let result = self
            .service
            .leave(event.guild_id, &queue.name, event.user.id)
            .await
            .map(|_| ());
        self.surface_result(event.guild_id, result).await
    }

    /// Shared reaction guards: bot traffic and foreign channels are
    /// ignored, a stale message id is a silent no-op.
    async fn resolve_reaction_queue(
        &self,
        event: &ReactionEvent,
    ) -> Result<Option<crate::queue::PickupQueue>> {
        if event.from_bot {
            return Ok(None);
        }
        if event.channel_name != self.settings.queues_channel {
            return Ok(None);
        }
        let queue = self
            .service
            .find_by_message(event.guild_id, event.message_id)
            .await?;
        if queue.is_none() {
            debug!(
                "Reaction on unknown message {} ignored (stale queue?)",
                event.message_id
            );
        }
        Ok(queue)
    }

    async fn execute(&self, ctx: &CommandContext, command: QueueCommand) -> Result<()> {
        let guild_id = ctx.guild_id;
        match command {
            QueueCommand::Create {
                name,
                team_size,
                flags,
            } => {
                let queue = self
                    .service
                    .create(guild_id, &name, team_size, &flags, ctx.author.clone())
                    .await?;
                self.renderer
                    .post_notice(
                        guild_id,
                        &format!("Queue '{}' was added by {}", queue.name, ctx.author.name),
                        NOTICE_TTL,
                    )
                    .await
            }
            QueueCommand::Join { name } => self
                .service
                .join(guild_id, &name, ctx.author.clone())
                .await
                .map(|_| ()),
            QueueCommand::Leave { name } => self
                .service
                .leave(guild_id, &name, ctx.author.id)
                .await
                .map(|_| ()),
            QueueCommand::Rename { name, new_name } => {
                let renamed = self
                    .service
                    .rename(guild_id, &name, &new_name, ctx.author.id)
                    .await?;
                self.renderer
                    .post_notice(
                        guild_id,
                        &format!("The queue '{}' has been renamed to '{}'", name, renamed.name),
                        NOTICE_TTL,
                    )
                    .await
            }
            QueueCommand::Delete { name } => {
                self.service.delete(guild_id, &name, ctx.author.id).await
            }
            QueueCommand::List => {
                let queues = self.service.list(guild_id).await?;
                if queues.is_empty() {
                    return self
                        .renderer
                        .post_notice(
                            guild_id,
                            "There are no active pickup queues at this time, maybe you should create one",
                            NOTICE_TTL,
                        )
                        .await;
                }
                for queue in queues {
                    self.renderer
                        .post_notice(guild_id, &Self::format_list_entry(&queue), NOTICE_TTL)
                        .await?;
                }
                Ok(())
            }
            QueueCommand::WaitList { name } => {
                let queue = self.service.find(guild_id, &name).await?;
                self.renderer
                    .post_notice(guild_id, &Self::format_waitlist(&queue), NOTICE_TTL)
                    .await
            }
            QueueCommand::Promote { name } => {
                self.service
                    .promote(guild_id, name.as_deref(), ctx.author.clone())
                    .await
            }
            QueueCommand::Start { name } => self
                .service
                .start(guild_id, &name, ctx.author.id)
                .await
                .map(|_| ()),
            QueueCommand::Teams { name } => {
                let queue = self.service.show_teams(guild_id, &name).await?;
                if !queue.started {
                    self.renderer
                        .post_notice(
                            guild_id,
                            &format!("Queue '{}' has not been started", queue.name),
                            NOTICE_TTL,
                        )
                        .await?;
                }
                Ok(())
            }
            QueueCommand::Stop { name } => self.service.stop(guild_id, &name, ctx.author.id).await,
            QueueCommand::UpdateOperators { name, flags } => {
                let queue = self
                    .service
                    .update_operators(guild_id, &name, &flags, ctx.author.id)
                    .await?;
                self.renderer
                    .post_notice(
                        guild_id,
                        &format!("Queue '{}' operators updated", queue.name),
                        NOTICE_TTL,
                    )
                    .await
            }
        }
    }

    /// Translate operation failures into a single auto-expiring reply;
    /// infrastructure failures only reach the log.
    async fn surface_result(&self, guild_id: GuildId, result: Result<()>) -> Result<()> {
        let Err(err) = result else { return Ok(()) };

        match err.downcast_ref::<PickupError>() {
            Some(pickup) if pickup.is_user_facing() => {
                info!("Rejected operation: {}", pickup);
                self.renderer
                    .post_notice(guild_id, &pickup.to_string(), NOTICE_TTL)
                    .await
            }
            _ => {
                error!("Operation failed: {:#}", err);
                Ok(())
            }
        }
    }

    fn format_list_entry(queue: &crate::queue::PickupQueue) -> String {
        let mut text = format!(
            "{}{}\n`!add \"{}\"` to join!\nCreated by {}{}\n[{}/{}] - {}",
            queue.name,
            if queue.state() == QueueState::Started {
                " - Started"
            } else {
                ""
            },
            queue.name,
            queue.owner_name,
            if queue.is_coop { " (coop)" } else { "" },
            queue.subscribers.len(),
            queue.max_in_queue(),
            format_subscribers(&queue.subscribers),
        );

        if !queue.waiting_list.is_empty() {
            text.push_str(&format!("\nIn waitlist: {}", queue.waiting_list.len()));
        }
        if !queue.games.is_empty() {
            text.push_str(&format!("\nGame(s): {}", queue.games.join(", ")));
        }
        if let Some(host) = &queue.host {
            let port = if queue.port > 0 { queue.port } else { 27960 };
            text.push_str(&format!("\nServer: {}:{}", host, port));
        }
        text
    }

    fn format_waitlist(queue: &crate::queue::PickupQueue) -> String {
        if queue.waiting_list.is_empty() {
            return format!("No players in the waiting list for queue {}", queue.name);
        }
        let rows: Vec<String> = queue
            .waiting_list
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}: {}", i + 1, s.name))
            .collect();
        format!(
            "Players in waiting list for queue {}:\n{}",
            queue.name,
            rows.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FlagSet;
    use crate::queue::PickupQueue;

    #[test]
    fn test_format_list_entry_mentions_waitlist_and_server() {
        let flags = FlagSet::parse("-host ra3.se -game baseq3").unwrap();
        let mut queue = PickupQueue::new(42, "duel", Subscriber::new(1, "alpha"), Some(1), &flags);
        queue.join(Subscriber::new(2, "bravo"));
        queue.join(Subscriber::new(3, "charlie"));

        let text = Dispatcher::format_list_entry(&queue);
        assert!(text.contains("[2/2]"));
        assert!(text.contains("In waitlist: 1"));
        assert!(text.contains("Server: ra3.se:27960"));
        assert!(text.contains("Game(s): baseq3"));
    }

    #[test]
    fn test_format_waitlist_positions_start_at_one() {
        let mut queue = PickupQueue::new(
            42,
            "duel",
            Subscriber::new(1, "alpha"),
            Some(1),
            &FlagSet::default(),
        );
        queue.join(Subscriber::new(2, "bravo"));
        queue.join(Subscriber::new(3, "charlie"));
        queue.join(Subscriber::new(4, "delta"));

        let text = Dispatcher::format_waitlist(&queue);
        assert!(text.contains("1: charlie"));
        assert!(text.contains("2: delta"));
    }
}
