//! Configuration loading and validation

pub mod app;

pub use app::{validate_config, AppConfig, PickupSettings, RconSettings, ServiceSettings};
