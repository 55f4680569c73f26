//! Prometheus metrics for queue operations and RCON traffic

use crate::error::{PickupError, Result};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tracing::warn;

/// Collects operational counters for the coordination service
pub struct MetricsCollector {
    registry: Registry,
    operations_total: IntCounterVec,
    rcon_commands_total: IntCounterVec,
    active_queues: IntGauge,
}

impl MetricsCollector {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new(
                "pickup_operations_total",
                "Queue state-machine operations by name and outcome",
            ),
            &["operation", "outcome"],
        )
        .map_err(|e| PickupError::InternalError {
            message: format!("failed to create operations counter: {}", e),
        })?;

        let rcon_commands_total = IntCounterVec::new(
            Opts::new(
                "pickup_rcon_commands_total",
                "RCON commands sent by command and outcome",
            ),
            &["command", "outcome"],
        )
        .map_err(|e| PickupError::InternalError {
            message: format!("failed to create rcon counter: {}", e),
        })?;

        let active_queues = IntGauge::new(
            "pickup_active_queues",
            "Number of queue records currently stored",
        )
        .map_err(|e| PickupError::InternalError {
            message: format!("failed to create active queues gauge: {}", e),
        })?;

        registry
            .register(Box::new(operations_total.clone()))
            .and_then(|_| registry.register(Box::new(rcon_commands_total.clone())))
            .and_then(|_| registry.register(Box::new(active_queues.clone())))
            .map_err(|e| PickupError::InternalError {
                message: format!("failed to register metrics: {}", e),
            })?;

        Ok(Self {
            registry,
            operations_total,
            rcon_commands_total,
            active_queues,
        })
    }

    pub fn record_operation(&self, operation: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        self.operations_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    pub fn record_rcon_command(&self, command: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        self.rcon_commands_total
            .with_label_values(&[command, outcome])
            .inc();
    }

    pub fn set_active_queues(&self, count: usize) {
        self.active_queues.set(count as i64);
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            warn!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("default metrics registry must build")
    }
}
