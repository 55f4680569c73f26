//! Main entry point for the Pickup Hub coordination service
//!
//! Builds the queue service against the in-process store and standalone
//! gateway stand-ins, starts the game-server activity poll, and waits
//! for shutdown. A chat-platform integration plugs in by replacing the
//! gateway collaborators and feeding the dispatcher.

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use pickup_hub::config::AppConfig;
use pickup_hub::dispatch::Dispatcher;
use pickup_hub::gateway::{
    InMemoryActivityLog, LoggingPresenceSink, MemberDirectory, Renderer, VoiceProvider,
};
use pickup_hub::metrics::MetricsCollector;
use pickup_hub::queue::{InMemoryQueueStore, QueueService, QueueServiceConfig};
use pickup_hub::rcon::activity::ActivityPoller;
use pickup_hub::rcon::{RconAnnouncer, RconClient};
use pickup_hub::scheduler::Scheduler;
use pickup_hub::types::{GuildId, MessageId, Subscriber, UserId, VoiceChannelHandle};
use pickup_hub::PickupQueue;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

/// Pickup Hub - pickup game queue coordination service
#[derive(Parser)]
#[command(
    name = "pickup-hub",
    version,
    about = "Pickup game queue coordination with RCON game-server notifications",
    long_about = "Pickup Hub coordinates named pickup queues for a chat community: \
                 join/leave via commands or reaction toggles, balanced team splits, \
                 voice channel setup, and match announcements over legacy UDP RCON."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// RCON host override
    #[arg(long, value_name = "HOST", help = "Override RCON game server host")]
    rcon_host: Option<String>,

    /// RCON port override
    #[arg(long, value_name = "PORT", help = "Override RCON game server port")]
    rcon_port: Option<u16>,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Renderer stand-in that writes renders to the log instead of a chat
/// platform, handing out locally unique message ids
struct LoggingRenderer {
    next_message_id: AtomicU64,
}

impl LoggingRenderer {
    fn new() -> Self {
        Self {
            next_message_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl Renderer for LoggingRenderer {
    async fn publish_queue(&self, queue: &PickupQueue) -> Result<Option<MessageId>> {
        if queue.static_message_id.is_some() {
            info!(
                "[render] queue '{}' updated: {}/{} in roster",
                queue.name,
                queue.subscribers.len(),
                queue.max_in_queue()
            );
            return Ok(None);
        }
        let id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        info!("[render] queue '{}' published as message {}", queue.name, id);
        Ok(Some(id))
    }

    async fn retract_queue(&self, queue: &PickupQueue) -> Result<()> {
        info!("[render] queue '{}' retracted", queue.name);
        Ok(())
    }

    async fn post_notice(&self, guild_id: GuildId, text: &str, ttl: Duration) -> Result<()> {
        info!("[notice guild {} ttl {:?}] {}", guild_id, ttl, text);
        Ok(())
    }

    async fn post_teams(&self, queue: &PickupQueue) -> Result<()> {
        for team in &queue.teams {
            info!(
                "[teams] {}: {}",
                team.name,
                pickup_hub::utils::format_subscribers(&team.subscribers)
            );
        }
        Ok(())
    }

    async fn direct_message(&self, user_id: UserId, text: &str) -> Result<()> {
        info!("[dm {}] {}", user_id, text);
        Ok(())
    }
}

/// Voice stand-in returning label-only handles
struct StandaloneVoice;

#[async_trait]
impl VoiceProvider for StandaloneVoice {
    async fn get_or_create(&self, label: &str, _guild_id: GuildId) -> Result<VoiceChannelHandle> {
        Ok(VoiceChannelHandle {
            label: label.to_string(),
            id: None,
        })
    }

    async fn delete(&self, _guild_id: GuildId, handle: &VoiceChannelHandle) -> Result<()> {
        info!("[voice] channel '{}' deleted", handle.label);
        Ok(())
    }
}

/// Directory stand-in without flags, admins, or promote subscribers
struct OpenDirectory;

#[async_trait]
impl MemberDirectory for OpenDirectory {
    async fn is_flagged(&self, _guild_id: GuildId, _user_id: UserId) -> Result<Option<String>> {
        Ok(None)
    }

    async fn is_admin(&self, _guild_id: GuildId, _user_id: UserId) -> Result<bool> {
        Ok(false)
    }

    async fn promote_subscribers(&self, _guild_id: GuildId) -> Result<Vec<Subscriber>> {
        Ok(Vec::new())
    }
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Pickup Hub coordination service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    if config.rcon_endpoint().is_complete() {
        info!("   RCON: {}:{}", config.rcon.host, config.rcon.port);
        info!(
            "   Status poll: every {}s",
            config.rcon.status_poll_interval_seconds
        );
    } else {
        info!("   RCON: disabled (endpoint not configured)");
    }
    info!("   Command channel: #{}", config.pickup.command_channel);
    info!("   Queues channel: #{}", config.pickup.queues_channel);
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if let Some(host) = &args.rcon_host {
        config.rcon.host = host.clone();
    }
    if let Some(port) = args.rcon_port {
        config.rcon.port = port;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    let scheduler = Scheduler::new();
    let metrics = Arc::new(MetricsCollector::new()?);
    let renderer = Arc::new(LoggingRenderer::new());

    let service = Arc::new(QueueService::new(
        Arc::new(InMemoryQueueStore::new()),
        renderer.clone(),
        Arc::new(StandaloneVoice),
        Arc::new(OpenDirectory),
        Arc::new(InMemoryActivityLog::new()),
        Arc::new(RconAnnouncer::new(config.rcon_endpoint())),
        scheduler.clone(),
        Arc::clone(&metrics),
        QueueServiceConfig {
            promote_dm_delay: config.promote_dm_delay(),
            announcement_offsets: config.announcement_offsets(),
        },
    ));

    // a platform gateway integration feeds this dispatcher with message
    // and reaction events; standalone mode only exercises the RCON side
    let _dispatcher = Dispatcher::new(service, renderer, config.pickup.clone());

    let poller = Arc::new(ActivityPoller::new(
        RconClient::with_timeouts(
            config.rcon_endpoint(),
            config.rcon_response_timeout(),
            Duration::from_millis(300),
        ),
        Arc::new(LoggingPresenceSink),
        config.status_poll_interval(),
    ));
    poller.start(&scheduler);

    info!("Pickup Hub is running, press Ctrl+C to shut down");
    wait_for_shutdown_signal().await;

    info!("Shutdown signal received");
    info!("Final metrics:\n{}", metrics.render());
    info!("Pickup Hub stopped");
    Ok(())
}
