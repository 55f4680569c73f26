//! UDP wire client for the legacy id-software RCON protocol
//!
//! Requests and responses are single UDP datagrams prefixed with four
//! `0xFF` bytes; there is no length framing or sequencing. Commands with
//! long output (`status`) arrive as several datagrams, which are
//! collected within a bounded timeout window and concatenated in receipt
//! order.

use crate::error::{PickupError, Result};
use crate::rcon::status::ServerStatus;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

/// Out-of-band packet marker shared by requests and responses
pub const OOB_MARKER: [u8; 4] = [0xFF; 4];

/// Largest datagram the client will accept
const MAX_DATAGRAM: usize = 64 * 1024;

/// Where and how to reach the game server console
#[derive(Debug, Clone)]
pub struct RconEndpoint {
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl RconEndpoint {
    /// An endpoint is usable only when every part is present
    pub fn is_complete(&self) -> bool {
        !self.host.trim().is_empty() && !self.password.trim().is_empty() && self.port != 0
    }
}

/// Connectionless RCON client
#[derive(Debug, Clone)]
pub struct RconClient {
    endpoint: RconEndpoint,
    first_timeout: Duration,
    drain_timeout: Duration,
}

impl RconClient {
    pub fn new(endpoint: RconEndpoint) -> Self {
        Self {
            endpoint,
            first_timeout: Duration::from_millis(1500),
            drain_timeout: Duration::from_millis(300),
        }
    }

    pub fn with_timeouts(
        endpoint: RconEndpoint,
        first_timeout: Duration,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            endpoint,
            first_timeout,
            drain_timeout,
        }
    }

    pub fn endpoint(&self) -> &RconEndpoint {
        &self.endpoint
    }

    /// Build the request datagram for `command`
    fn request_datagram(&self, command: &str) -> Vec<u8> {
        let mut packet = Vec::with_capacity(OOB_MARKER.len() + command.len() + 32);
        packet.extend_from_slice(&OOB_MARKER);
        packet.extend_from_slice(
            format!("rcon {} {}", self.endpoint.password, command).as_bytes(),
        );
        packet
    }

    async fn connect(&self) -> Result<UdpSocket> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| PickupError::ExternalIo {
                message: format!("failed to bind UDP socket: {}", e),
            })?;
        socket
            .connect((self.endpoint.host.as_str(), self.endpoint.port))
            .await
            .map_err(|e| PickupError::ExternalIo {
                message: format!(
                    "failed to resolve or connect {}:{}: {}",
                    self.endpoint.host, self.endpoint.port, e
                ),
            })?;
        Ok(socket)
    }

    /// Send `command` and assemble the response from every datagram that
    /// arrives within the timeout window, stripping the four-byte marker
    /// from each.
    pub async fn execute(&self, command: &str) -> Result<String> {
        let socket = self.connect().await?;
        socket
            .send(&self.request_datagram(command))
            .await
            .map_err(|e| PickupError::ExternalIo {
                message: format!("failed to send RCON request: {}", e),
            })?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        let mut assembled = String::new();
        let mut datagrams = 0usize;

        loop {
            let window = if datagrams == 0 {
                self.first_timeout
            } else {
                self.drain_timeout
            };

            match timeout(window, socket.recv(&mut buf)).await {
                Ok(Ok(len)) => {
                    let payload = buf[..len]
                        .strip_prefix(&OOB_MARKER[..])
                        .unwrap_or(&buf[..len]);
                    assembled.push_str(&String::from_utf8_lossy(payload));
                    datagrams += 1;
                }
                Ok(Err(e)) => {
                    return Err(PickupError::ExternalIo {
                        message: format!("RCON receive failed: {}", e),
                    }
                    .into());
                }
                Err(_) if datagrams == 0 => {
                    return Err(PickupError::ProtocolTimeout {
                        timeout_ms: self.first_timeout.as_millis() as u64,
                    }
                    .into());
                }
                // drain window closed, response is complete
                Err(_) => break,
            }
        }

        debug!(
            "RCON '{}' answered with {} datagram(s), {} bytes",
            command,
            datagrams,
            assembled.len()
        );
        Ok(assembled)
    }

    /// Send `command` without waiting for a response
    pub async fn execute_fire_and_forget(&self, command: &str) -> Result<()> {
        let socket = self.connect().await?;
        socket
            .send(&self.request_datagram(command))
            .await
            .map_err(|e| PickupError::ExternalIo {
                message: format!("failed to send RCON request: {}", e),
            })?;
        Ok(())
    }

    /// Broadcast a chat line on the game server
    pub async fn say(&self, message: &str) -> Result<()> {
        self.execute_fire_and_forget(&format!("say \"{}\"", message))
            .await
    }

    /// Query and parse the server status
    pub async fn status(&self) -> Result<ServerStatus> {
        let raw = self.execute("status").await?;
        Ok(ServerStatus::parse(&raw))
    }
}
