//! Queue state-machine orchestration
//!
//! Every operation loads one queue from the store, mutates it in memory,
//! persists it, and then performs best-effort side effects (render,
//! voice channels, RCON announcements). Persistence always happens
//! before side effects; a failed render or announcement is logged and
//! never rolls back the persisted change.

use crate::error::{PickupError, Result};
use crate::flags::FlagSet;
use crate::gateway::{
    ActivityLog, MemberDirectory, Renderer, VoiceProvider, NOTICE_TTL,
};
use crate::metrics::MetricsCollector;
use crate::queue::model::{JoinOutcome, LeaveOutcome, PickupQueue, MAX_TEAM_SIZE, MIN_TEAM_SIZE};
use crate::queue::store::QueueStore;
use crate::rcon::Announcer;
use crate::scheduler::Scheduler;
use crate::types::{ActivityKind, GuildId, Subscriber, Team, UserId};
use crate::utils::{format_subscribers, queue_key};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Tunables the service needs beyond its collaborators
#[derive(Debug, Clone)]
pub struct QueueServiceConfig {
    /// Delay between promote direct messages
    pub promote_dm_delay: Duration,
    /// Match-start announcement offsets after `start`
    pub announcement_offsets: Vec<Duration>,
}

impl Default for QueueServiceConfig {
    fn default() -> Self {
        Self {
            promote_dm_delay: Duration::from_millis(200),
            announcement_offsets: vec![Duration::from_secs(120), Duration::from_secs(240)],
        }
    }
}

/// The central pickup queue coordinator
pub struct QueueService {
    store: Arc<dyn QueueStore>,
    renderer: Arc<dyn Renderer>,
    voice: Arc<dyn VoiceProvider>,
    directory: Arc<dyn MemberDirectory>,
    activity_log: Arc<dyn ActivityLog>,
    announcer: Arc<dyn Announcer>,
    scheduler: Scheduler,
    metrics: Arc<MetricsCollector>,
    config: QueueServiceConfig,
}

impl QueueService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn QueueStore>,
        renderer: Arc<dyn Renderer>,
        voice: Arc<dyn VoiceProvider>,
        directory: Arc<dyn MemberDirectory>,
        activity_log: Arc<dyn ActivityLog>,
        announcer: Arc<dyn Announcer>,
        scheduler: Scheduler,
        metrics: Arc<MetricsCollector>,
        config: QueueServiceConfig,
    ) -> Self {
        Self {
            store,
            renderer,
            voice,
            directory,
            activity_log,
            announcer,
            scheduler,
            metrics,
            config,
        }
    }

    /// Scheduler key grouping all pending timers of one queue
    fn task_key(guild_id: GuildId, name: &str) -> String {
        format!("{}/{}", guild_id, queue_key(name))
    }

    async fn load(&self, guild_id: GuildId, name: &str) -> Result<PickupQueue> {
        self.store
            .find_by_name(guild_id, name)
            .await?
            .ok_or_else(|| {
                PickupError::NotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    async fn ensure_can_manage(&self, queue: &PickupQueue, actor_id: UserId) -> Result<()> {
        if queue.owner_id == actor_id || self.directory.is_admin(queue.guild_id, actor_id).await? {
            return Ok(());
        }
        Err(PickupError::Forbidden.into())
    }

    async fn ensure_not_flagged(&self, guild_id: GuildId, user_id: UserId) -> Result<()> {
        if let Some(reason) = self.directory.is_flagged(guild_id, user_id).await? {
            return Err(PickupError::FlaggedUser { reason }.into());
        }
        Ok(())
    }

    /// Persist the queue, then refresh its rendered message. The render
    /// is best-effort except that a first render's message id must make
    /// it back into the store.
    async fn persist_and_render(&self, queue: &mut PickupQueue) -> Result<()> {
        if !self.store.update(queue.clone()).await? {
            return Err(PickupError::ExternalIo {
                message: format!("store rejected update for queue '{}'", queue.name),
            }
            .into());
        }

        match self.renderer.publish_queue(queue).await {
            Ok(Some(message_id)) => {
                queue.static_message_id = Some(message_id);
                if !self.store.update(queue.clone()).await? {
                    warn!(
                        "Failed to persist static message id for queue '{}'",
                        queue.name
                    );
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Render of queue '{}' failed: {}", queue.name, e),
        }
        Ok(())
    }

    /// Remove the record and its rendered message, cancelling whatever is
    /// still scheduled for the queue.
    async fn remove_queue(&self, queue: &PickupQueue, notice: Option<&str>) -> Result<bool> {
        self.scheduler
            .cancel_key(&Self::task_key(queue.guild_id, &queue.name));

        let removed = self.store.remove(queue.guild_id, &queue.name).await?;
        if removed {
            if let Err(e) = self.renderer.retract_queue(queue).await {
                warn!("Failed to retract message for '{}': {}", queue.name, e);
            }
            if let Some(text) = notice {
                if let Err(e) = self
                    .renderer
                    .post_notice(queue.guild_id, text, NOTICE_TTL)
                    .await
                {
                    warn!("Failed to post notice: {}", e);
                }
            }
        }
        Ok(removed)
    }

    /// Create a queue with the creator as sole subscriber
    pub async fn create(
        &self,
        guild_id: GuildId,
        name: &str,
        team_size: Option<u32>,
        flags_text: &str,
        creator: Subscriber,
    ) -> Result<PickupQueue> {
        let result = self
            .create_inner(guild_id, name, team_size, flags_text, creator)
            .await;
        self.metrics.record_operation("create", result.is_ok());
        result
    }

    async fn create_inner(
        &self,
        guild_id: GuildId,
        name: &str,
        team_size: Option<u32>,
        flags_text: &str,
        creator: Subscriber,
    ) -> Result<PickupQueue> {
        self.ensure_not_flagged(guild_id, creator.id).await?;

        let flags = FlagSet::parse(flags_text)?;
        let team_size = team_size.map(|n| n.clamp(MIN_TEAM_SIZE, MAX_TEAM_SIZE));

        if self.store.find_by_name(guild_id, name).await?.is_some() {
            return Err(PickupError::AlreadyExists {
                name: name.to_string(),
            }
            .into());
        }

        self.activity_log
            .record(guild_id, creator.id, ActivityKind::Create)
            .await?;
        self.activity_log
            .record(guild_id, creator.id, ActivityKind::Join)
            .await?;

        let mut queue = PickupQueue::new(guild_id, name, creator, team_size, &flags);
        if !self.store.add(queue.clone()).await? {
            return Err(PickupError::AlreadyExists {
                name: name.to_string(),
            }
            .into());
        }

        info!(
            "Queue '{}' created in guild {} by {} (team size {}, coop {})",
            queue.name, guild_id, queue.owner_name, queue.team_size, queue.is_coop
        );

        self.persist_and_render(&mut queue).await?;
        Ok(queue)
    }

    /// Add a user to a queue's roster or waiting list; idempotent per user
    pub async fn join(
        &self,
        guild_id: GuildId,
        name: &str,
        user: Subscriber,
    ) -> Result<(PickupQueue, JoinOutcome)> {
        self.ensure_not_flagged(guild_id, user.id).await?;

        let mut queue = self.load(guild_id, name).await?;
        let user_id = user.id;
        let outcome = queue.join(user);

        match outcome {
            JoinOutcome::AlreadyMember => {
                // duplicate delivery from a reaction replay, nothing to persist
                info!("User {} already in '{}', join ignored", user_id, queue.name);
            }
            JoinOutcome::Subscribed | JoinOutcome::Waitlisted => {
                self.activity_log
                    .record(guild_id, user_id, ActivityKind::Join)
                    .await?;
                self.persist_and_render(&mut queue).await?;
                info!(
                    "User {} joined '{}' ({:?}), {}/{} in roster",
                    user_id,
                    queue.name,
                    outcome,
                    queue.subscribers.len(),
                    queue.max_in_queue()
                );
            }
        }

        self.metrics.record_operation("join", true);
        Ok((queue, outcome))
    }

    /// Remove a user from roster or waiting list. An emptied queue is
    /// deleted instead of persisted.
    pub async fn leave(
        &self,
        guild_id: GuildId,
        name: &str,
        user_id: UserId,
    ) -> Result<LeaveOutcome> {
        let mut queue = self.load(guild_id, name).await?;
        let outcome = queue.leave(user_id);

        match &outcome {
            LeaveOutcome::NotMember => {}
            LeaveOutcome::Left { promoted } => {
                if queue.is_empty() && !queue.started {
                    let notice = format!("{} has been removed since everyone left.", queue.name);
                    self.remove_queue(&queue, Some(&notice)).await?;
                } else {
                    self.persist_and_render(&mut queue).await?;
                }
                if let Some(next) = promoted {
                    info!(
                        "Promoted {} from waiting list into '{}'",
                        next.name, queue.name
                    );
                }
            }
        }

        self.metrics.record_operation("leave", true);
        Ok(outcome)
    }

    /// Delete a queue on the owner's or an admin's request
    pub async fn delete(&self, guild_id: GuildId, name: &str, actor_id: UserId) -> Result<()> {
        let queue = self.load(guild_id, name).await?;
        self.ensure_can_manage(&queue, actor_id).await?;

        let notice = format!("Queue '{}' has been canceled", queue.name);
        self.remove_queue(&queue, Some(&notice)).await?;
        self.metrics.record_operation("delete", true);
        Ok(())
    }

    /// Re-parse operator flags and overwrite only the fields present
    pub async fn update_operators(
        &self,
        guild_id: GuildId,
        name: &str,
        flags_text: &str,
        actor_id: UserId,
    ) -> Result<PickupQueue> {
        let mut queue = self.load(guild_id, name).await?;
        self.ensure_can_manage(&queue, actor_id).await?;

        let flags = FlagSet::parse(flags_text)?;
        queue.apply_flags(&flags);
        self.persist_and_render(&mut queue).await?;

        self.metrics.record_operation("update_operators", true);
        Ok(queue)
    }

    /// Re-key the queue under a new name.
    ///
    /// This is add-then-remove, not atomic: a crash between the two store
    /// calls can leave both records present.
    pub async fn rename(
        &self,
        guild_id: GuildId,
        name: &str,
        new_name: &str,
        actor_id: UserId,
    ) -> Result<PickupQueue> {
        let queue = self.load(guild_id, name).await?;
        self.ensure_can_manage(&queue, actor_id).await?;

        if self.store.find_by_name(guild_id, new_name).await?.is_some() {
            return Err(PickupError::NameTaken {
                name: new_name.to_string(),
            }
            .into());
        }

        let mut renamed = queue.clone();
        renamed.name = new_name.to_string();

        if !self.store.add(renamed.clone()).await? {
            return Err(PickupError::NameTaken {
                name: new_name.to_string(),
            }
            .into());
        }
        if !self.store.remove(guild_id, &queue.name).await? {
            warn!(
                "Old record '{}' was already gone while renaming to '{}'",
                queue.name, renamed.name
            );
        }
        self.scheduler
            .cancel_key(&Self::task_key(guild_id, &queue.name));

        self.persist_and_render(&mut renamed).await?;
        info!("Queue '{}' renamed to '{}'", queue.name, renamed.name);

        self.metrics.record_operation("rename", true);
        Ok(renamed)
    }

    /// Split subscribers into teams, set up voice channels, and schedule
    /// the delayed match-start announcements. A no-op on an already
    /// started queue.
    pub async fn start(
        &self,
        guild_id: GuildId,
        name: &str,
        _actor_id: UserId,
    ) -> Result<PickupQueue> {
        let mut queue = self.load(guild_id, name).await?;
        if queue.started {
            return Ok(queue);
        }

        let (first, second) = {
            let mut rng = rand::thread_rng();
            queue.partition_subscribers(&mut rng)
        };

        let mut teams = Vec::with_capacity(2);
        let red_label = format!("{} red", queue.name);
        let red_voice = self.voice.get_or_create(&red_label, guild_id).await?;
        teams.push(Team {
            name: if queue.is_coop { "Coop Team" } else { "Red Team" }.to_string(),
            subscribers: first,
            voice_channel: red_voice,
        });

        if !queue.is_coop {
            let blue_label = format!("{} blue", queue.name);
            let blue_voice = self.voice.get_or_create(&blue_label, guild_id).await?;
            teams.push(Team {
                name: "Blue Team".to_string(),
                subscribers: second,
                voice_channel: blue_voice,
            });
        }

        queue.start_with_teams(teams)?;
        self.persist_and_render(&mut queue).await?;

        if let Err(e) = self.renderer.post_teams(&queue).await {
            warn!("Failed to post team rosters for '{}': {}", queue.name, e);
        }

        let key = Self::task_key(guild_id, &queue.name);
        for offset in self.config.announcement_offsets.clone() {
            let announcer = Arc::clone(&self.announcer);
            let snapshot = queue.clone();
            self.scheduler.schedule(Some(key.clone()), offset, async move {
                announcer.announce_match_start(&snapshot).await;
            });
        }

        info!(
            "Queue '{}' started with {} team(s), announcements at {:?}",
            queue.name,
            queue.teams.len(),
            self.config.announcement_offsets
        );

        self.metrics.record_operation("start", true);
        Ok(queue)
    }

    /// Tear down a started queue: voice channels deleted, teams cleared,
    /// pending announcements cancelled, then the record removed.
    pub async fn stop(&self, guild_id: GuildId, name: &str, actor_id: UserId) -> Result<()> {
        let mut queue = self.load(guild_id, name).await?;
        self.ensure_can_manage(&queue, actor_id).await?;

        self.scheduler
            .cancel_key(&Self::task_key(guild_id, &queue.name));

        for team in &queue.teams {
            if let Err(e) = self.voice.delete(guild_id, &team.voice_channel).await {
                warn!(
                    "Failed to delete voice channel '{}': {}",
                    team.voice_channel.label, e
                );
            }
        }

        queue.reset();
        if !self.store.update(queue.clone()).await? {
            warn!("Store rejected reset of '{}' during stop", queue.name);
        }

        let notice = format!("Queue '{}' has been canceled", queue.name);
        self.remove_queue(&queue, Some(&notice)).await?;

        self.metrics.record_operation("stop", true);
        Ok(())
    }

    /// Notify promote-role members that a queue needs players, or
    /// summarize all queues with free capacity when none is named.
    pub async fn promote(
        &self,
        guild_id: GuildId,
        name: Option<&str>,
        actor: Subscriber,
    ) -> Result<()> {
        self.activity_log
            .record(guild_id, actor.id, ActivityKind::Promote)
            .await?;

        let queue = match name {
            Some(name) => {
                let queue = self.load(guild_id, name).await?;
                if queue.subscribers.len() as u32 >= queue.max_in_queue() {
                    return Err(PickupError::QueueFull {
                        name: queue.name.clone(),
                    }
                    .into());
                }
                Some(queue)
            }
            None => None,
        };

        let members = self.directory.promote_subscribers(guild_id).await?;
        if members.is_empty() {
            self.renderer
                .post_notice(
                    guild_id,
                    "No users have subscribed to pickup notifications.",
                    NOTICE_TTL,
                )
                .await?;
            return Ok(());
        }

        match queue {
            None => {
                let queues = self.store.list_all(guild_id).await?;
                let open_count = queues
                    .iter()
                    .filter(|q| (q.subscribers.len() as u32) < q.max_in_queue())
                    .count();
                if open_count > 0 {
                    self.renderer
                        .post_notice(
                            guild_id,
                            &format!(
                                "There are {} pickup queues with spots left, check out the list!",
                                open_count
                            ),
                            NOTICE_TTL,
                        )
                        .await?;
                }
            }
            Some(queue) => {
                let message = Self::build_promote_message(&queue);
                for member in &members {
                    if let Err(e) = self.renderer.direct_message(member.id, &message).await {
                        warn!("Promote DM to {} failed: {}", member.id, e);
                    }
                    // fixed inter-message delay to respect outbound rate limits
                    tokio::time::sleep(self.config.promote_dm_delay).await;
                }
                info!(
                    "Promoted '{}' to {} subscriber(s)",
                    queue.name,
                    members.len()
                );
            }
        }

        self.metrics.record_operation("promote", true);
        Ok(())
    }

    /// All queues of the guild, most nearly full first
    pub async fn list(&self, guild_id: GuildId) -> Result<Vec<PickupQueue>> {
        let mut queues = self.store.list_all(guild_id).await?;
        queues.sort_by(|a, b| {
            b.readiness()
                .partial_cmp(&a.readiness())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.metrics.set_active_queues(queues.len());
        Ok(queues)
    }

    /// Queue lookup for the read-side commands (waitlist, teams)
    pub async fn find(&self, guild_id: GuildId, name: &str) -> Result<PickupQueue> {
        self.load(guild_id, name).await
    }

    /// Queue lookup through the rendered-message index; a missing record
    /// is a normal outcome for stale messages.
    pub async fn find_by_message(
        &self,
        guild_id: GuildId,
        message_id: crate::types::MessageId,
    ) -> Result<Option<PickupQueue>> {
        self.store.find_by_message_id(guild_id, message_id).await
    }

    /// Re-print team rosters and fire an immediate RCON announcement
    pub async fn show_teams(&self, guild_id: GuildId, name: &str) -> Result<PickupQueue> {
        let queue = self.load(guild_id, name).await?;
        if queue.started && !queue.teams.is_empty() {
            if let Err(e) = self.renderer.post_teams(&queue).await {
                warn!("Failed to post team rosters for '{}': {}", queue.name, e);
            }
            self.announcer.announce_match_start(&queue).await;
        }
        Ok(queue)
    }

    fn build_promote_message(queue: &PickupQueue) -> String {
        let mut message = format!(
            "Pickup queue '{}' needs more players!\n\
             Current queue: {}\n\
             Spots left: {}\n\
             Team size: {}\n\
             Run `!add \"{}\"` in the pickup channel to join!",
            queue.name,
            format_subscribers(&queue.subscribers),
            queue.max_in_queue() as usize - queue.subscribers.len(),
            queue.team_size,
            queue.name,
        );

        if !queue.games.is_empty() {
            message.push_str(&format!("\nGame(s): {}", queue.games.join(", ")));
        }
        if let Some(host) = &queue.host {
            let port = if queue.port > 0 { queue.port } else { 27960 };
            message.push_str(&format!("\nServer: {}:{}", host, port));
        }

        message
    }
}
