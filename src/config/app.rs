//! Main application configuration
//!
//! Configuration comes from environment variables with defaults, or from
//! a TOML file; CLI arguments may override individual values on top.

use crate::rcon::RconEndpoint;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub rcon: RconSettings,
    #[serde(default)]
    pub pickup: PickupSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Game-server console connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RconSettings {
    /// Game server host; empty disables RCON features
    pub host: String,
    /// Console password; empty disables RCON features
    pub password: String,
    /// Game server port; 0 disables RCON features
    pub port: u16,
    /// Interval between activity status polls in seconds
    pub status_poll_interval_seconds: u64,
    /// Wait for the first response datagram in milliseconds
    pub response_timeout_ms: u64,
}

/// Pickup flow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupSettings {
    /// Prefix marking chat lines as commands
    pub command_prefix: String,
    /// Channel where commands are accepted
    pub command_channel: String,
    /// Channel holding the static queue messages
    pub queues_channel: String,
    /// Role whose members receive promote notifications
    pub promote_role: String,
    /// Category under which team voice channels are created
    pub voice_category: String,
    /// Delay between promote direct messages in milliseconds
    pub promote_dm_delay_ms: u64,
    /// Match-start announcement offsets after `start`, in minutes
    pub announcement_offsets_minutes: Vec<u64>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "pickup-hub".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for RconSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            password: String::new(),
            port: 0,
            status_poll_interval_seconds: 60,
            response_timeout_ms: 1500,
        }
    }
}

impl Default for PickupSettings {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            command_channel: "pickup".to_string(),
            queues_channel: "active-pickups".to_string(),
            promote_role: "pickup-promote".to_string(),
            voice_category: "Pickup voice channels".to_string(),
            promote_dm_delay_ms: 200,
            announcement_offsets_minutes: vec![2, 4],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }

        if let Ok(host) = env::var("RCON_HOST") {
            config.rcon.host = host;
        }
        if let Ok(password) = env::var("RCON_PASSWORD") {
            config.rcon.password = password;
        }
        if let Ok(port) = env::var("RCON_PORT") {
            config.rcon.port = port
                .parse()
                .map_err(|_| anyhow!("Invalid RCON_PORT value: {}", port))?;
        }
        if let Ok(interval) = env::var("RCON_STATUS_POLL_INTERVAL_SECONDS") {
            config.rcon.status_poll_interval_seconds = interval.parse().map_err(|_| {
                anyhow!("Invalid RCON_STATUS_POLL_INTERVAL_SECONDS value: {}", interval)
            })?;
        }
        if let Ok(timeout) = env::var("RCON_RESPONSE_TIMEOUT_MS") {
            config.rcon.response_timeout_ms = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid RCON_RESPONSE_TIMEOUT_MS value: {}", timeout))?;
        }

        if let Ok(prefix) = env::var("COMMAND_PREFIX") {
            config.pickup.command_prefix = prefix;
        }
        if let Ok(channel) = env::var("PICKUP_COMMAND_CHANNEL") {
            config.pickup.command_channel = channel;
        }
        if let Ok(channel) = env::var("PICKUP_QUEUES_CHANNEL") {
            config.pickup.queues_channel = channel;
        }
        if let Ok(role) = env::var("PICKUP_PROMOTE_ROLE") {
            config.pickup.promote_role = role;
        }
        if let Ok(delay) = env::var("PICKUP_PROMOTE_DM_DELAY_MS") {
            config.pickup.promote_dm_delay_ms = delay
                .parse()
                .map_err(|_| anyhow!("Invalid PICKUP_PROMOTE_DM_DELAY_MS value: {}", delay))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn rcon_endpoint(&self) -> RconEndpoint {
        RconEndpoint {
            host: self.rcon.host.clone(),
            port: self.rcon.port,
            password: self.rcon.password.clone(),
        }
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.rcon.status_poll_interval_seconds)
    }

    pub fn rcon_response_timeout(&self) -> Duration {
        Duration::from_millis(self.rcon.response_timeout_ms)
    }

    pub fn promote_dm_delay(&self) -> Duration {
        Duration::from_millis(self.pickup.promote_dm_delay_ms)
    }

    pub fn announcement_offsets(&self) -> Vec<Duration> {
        self.pickup
            .announcement_offsets_minutes
            .iter()
            .map(|m| Duration::from_secs(m * 60))
            .collect()
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.rcon.status_poll_interval_seconds == 0 {
        return Err(anyhow!("RCON status poll interval must be greater than 0"));
    }
    if config.rcon.response_timeout_ms == 0 {
        return Err(anyhow!("RCON response timeout must be greater than 0"));
    }

    if config.pickup.command_prefix.is_empty() {
        return Err(anyhow!("Command prefix cannot be empty"));
    }
    if config.pickup.command_channel.is_empty() {
        return Err(anyhow!("Pickup command channel cannot be empty"));
    }
    if config.pickup.queues_channel.is_empty() {
        return Err(anyhow!("Pickup queues channel cannot be empty"));
    }
    if config.pickup.announcement_offsets_minutes.is_empty() {
        return Err(anyhow!("At least one announcement offset is required"));
    }

    Ok(())
}
