//! Test fixtures and mock collaborators for integration testing

use async_trait::async_trait;
use pickup_hub::config::PickupSettings;
use pickup_hub::dispatch::Dispatcher;
use pickup_hub::error::Result;
use pickup_hub::gateway::{
    ActivityLog, InMemoryActivityLog, MemberDirectory, Renderer, VoiceProvider,
};
use pickup_hub::metrics::MetricsCollector;
use pickup_hub::queue::{InMemoryQueueStore, QueueService, QueueServiceConfig};
use pickup_hub::rcon::Announcer;
use pickup_hub::scheduler::Scheduler;
use pickup_hub::types::{GuildId, MessageId, Subscriber, UserId, VoiceChannelHandle};
use pickup_hub::PickupQueue;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The guild every fixture operates in
pub const GUILD: GuildId = 42;

/// Renderer that records every outbound surface interaction
#[derive(Default)]
pub struct RecordingRenderer {
    next_message_id: AtomicU64,
    pub published: Mutex<Vec<String>>,
    pub retracted: Mutex<Vec<String>>,
    pub notices: Mutex<Vec<String>>,
    pub team_posts: Mutex<Vec<String>>,
    pub direct_messages: Mutex<Vec<(UserId, String)>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicU64::new(1000),
            ..Default::default()
        }
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn direct_message_count(&self) -> usize {
        self.direct_messages.lock().unwrap().len()
    }
}

#[async_trait]
impl Renderer for RecordingRenderer {
    async fn publish_queue(&self, queue: &PickupQueue) -> Result<Option<MessageId>> {
        self.published.lock().unwrap().push(queue.name.clone());
        if queue.static_message_id.is_some() {
            return Ok(None);
        }
        Ok(Some(self.next_message_id.fetch_add(1, Ordering::Relaxed)))
    }

    async fn retract_queue(&self, queue: &PickupQueue) -> Result<()> {
        self.retracted.lock().unwrap().push(queue.name.clone());
        Ok(())
    }

    async fn post_notice(&self, _guild_id: GuildId, text: &str, _ttl: Duration) -> Result<()> {
        self.notices.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn post_teams(&self, queue: &PickupQueue) -> Result<()> {
        self.team_posts.lock().unwrap().push(queue.name.clone());
        Ok(())
    }

    async fn direct_message(&self, user_id: UserId, text: &str) -> Result<()> {
        self.direct_messages
            .lock()
            .unwrap()
            .push((user_id, text.to_string()));
        Ok(())
    }
}

/// Voice provider that fabricates channel handles and records deletions
#[derive(Default)]
pub struct RecordingVoice {
    next_channel_id: AtomicU64,
    pub created: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl RecordingVoice {
    pub fn new() -> Self {
        Self {
            next_channel_id: AtomicU64::new(500),
            ..Default::default()
        }
    }

    pub fn created_labels(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted_labels(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl VoiceProvider for RecordingVoice {
    async fn get_or_create(&self, label: &str, _guild_id: GuildId) -> Result<VoiceChannelHandle> {
        self.created.lock().unwrap().push(label.to_string());
        Ok(VoiceChannelHandle {
            label: label.to_string(),
            id: Some(self.next_channel_id.fetch_add(1, Ordering::Relaxed)),
        })
    }

    async fn delete(&self, _guild_id: GuildId, handle: &VoiceChannelHandle) -> Result<()> {
        self.deleted.lock().unwrap().push(handle.label.clone());
        Ok(())
    }
}

/// Directory with a configurable admin set, flag list, and promote roster
#[derive(Default)]
pub struct StaticDirectory {
    pub admins: HashSet<UserId>,
    pub flagged: HashMap<UserId, String>,
    pub promote_members: Vec<Subscriber>,
}

#[async_trait]
impl MemberDirectory for StaticDirectory {
    async fn is_flagged(&self, _guild_id: GuildId, user_id: UserId) -> Result<Option<String>> {
        Ok(self.flagged.get(&user_id).cloned())
    }

    async fn is_admin(&self, _guild_id: GuildId, user_id: UserId) -> Result<bool> {
        Ok(self.admins.contains(&user_id))
    }

    async fn promote_subscribers(&self, _guild_id: GuildId) -> Result<Vec<Subscriber>> {
        Ok(self.promote_members.clone())
    }
}

/// Announcer that counts announcements instead of touching the network
#[derive(Default)]
pub struct RecordingAnnouncer {
    pub announced: Mutex<Vec<String>>,
}

impl RecordingAnnouncer {
    pub fn announced_queues(&self) -> Vec<String> {
        self.announced.lock().unwrap().clone()
    }
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    async fn announce_match_start(&self, queue: &PickupQueue) {
        self.announced.lock().unwrap().push(queue.name.clone());
    }
}

/// Everything a scenario needs, wired against the in-memory store
pub struct TestHarness {
    pub service: Arc<QueueService>,
    pub dispatcher: Dispatcher,
    pub store: Arc<InMemoryQueueStore>,
    pub renderer: Arc<RecordingRenderer>,
    pub voice: Arc<RecordingVoice>,
    pub announcer: Arc<RecordingAnnouncer>,
    pub activity_log: Arc<InMemoryActivityLog>,
    pub scheduler: Scheduler,
    pub settings: PickupSettings,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_directory(StaticDirectory::default())
    }

    pub fn with_directory(directory: StaticDirectory) -> Self {
        let store = Arc::new(InMemoryQueueStore::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let voice = Arc::new(RecordingVoice::new());
        let announcer = Arc::new(RecordingAnnouncer::default());
        let activity_log = Arc::new(InMemoryActivityLog::new());
        let scheduler = Scheduler::new();
        let settings = PickupSettings::default();

        let service = Arc::new(QueueService::new(
            Arc::clone(&store) as Arc<dyn pickup_hub::queue::QueueStore>,
            Arc::clone(&renderer) as Arc<dyn Renderer>,
            Arc::clone(&voice) as Arc<dyn VoiceProvider>,
            Arc::new(directory),
            Arc::clone(&activity_log) as Arc<dyn ActivityLog>,
            Arc::clone(&announcer) as Arc<dyn Announcer>,
            scheduler.clone(),
            Arc::new(MetricsCollector::new().expect("metrics")),
            QueueServiceConfig {
                promote_dm_delay: Duration::from_millis(1),
                announcement_offsets: vec![Duration::from_secs(120), Duration::from_secs(240)],
            },
        ));

        let dispatcher = Dispatcher::new(
            Arc::clone(&service),
            Arc::clone(&renderer) as Arc<dyn Renderer>,
            settings.clone(),
        );

        Self {
            service,
            dispatcher,
            store,
            renderer,
            voice,
            announcer,
            activity_log,
            scheduler,
            settings,
        }
    }

    /// A command context in the pickup channel
    pub fn ctx(&self, user: &Subscriber) -> pickup_hub::CommandContext {
        pickup_hub::CommandContext {
            guild_id: GUILD,
            channel_name: self.settings.command_channel.clone(),
            author: user.clone(),
        }
    }

    pub async fn stored(&self, name: &str) -> Option<PickupQueue> {
        use pickup_hub::queue::QueueStore;
        self.store.find_by_name(GUILD, name).await.unwrap()
    }
}

pub fn user(id: UserId) -> Subscriber {
    Subscriber::new(id, format!("user{}", id))
}
