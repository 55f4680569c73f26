//! Match-start announcements broadcast on the game server console

use crate::queue::model::PickupQueue;
use crate::rcon::client::{RconClient, RconEndpoint};
use crate::utils::format_subscribers;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Pushes a "match started" line to the game server. Implementations are
/// best-effort: failures are logged and never surface to the caller.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce_match_start(&self, queue: &PickupQueue);
}

/// Announcer backed by the UDP RCON client
pub struct RconAnnouncer {
    client: Option<RconClient>,
}

impl RconAnnouncer {
    /// Builds a live announcer when the endpoint is complete, otherwise a
    /// permanently silent one.
    pub fn new(endpoint: RconEndpoint) -> Self {
        let client = endpoint.is_complete().then(|| RconClient::new(endpoint));
        Self { client }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    /// Console line with the queue name and both rosters, using quake
    /// color escapes
    fn build_message(queue: &PickupQueue) -> String {
        let mut message = format!("^2Pickup '^3{}^2' has started!", queue.name);

        match queue.teams.as_slice() {
            [coop] => {
                message.push_str(&format!(
                    " ^5{}",
                    format_subscribers(&coop.subscribers)
                ));
            }
            [red, blue, ..] => {
                message.push_str(&format!(
                    " ^1RED TEAM: ^5{} ^7- ^4BLUE TEAM: ^5{}",
                    format_subscribers(&red.subscribers),
                    format_subscribers(&blue.subscribers)
                ));
            }
            [] => {}
        }

        message
    }

    /// The queue can pin a different game host; announcements only go to
    /// the server this process is configured against.
    fn targets_configured_host(&self, queue: &PickupQueue) -> bool {
        match (&queue.host, &self.client) {
            (Some(host), Some(client)) => host.eq_ignore_ascii_case(&client.endpoint().host),
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }
}

#[async_trait]
impl Announcer for RconAnnouncer {
    async fn announce_match_start(&self, queue: &PickupQueue) {
        if !queue.rcon_enabled {
            debug!("RCON disabled on queue '{}', skipping announcement", queue.name);
            return;
        }
        if !self.targets_configured_host(queue) {
            debug!(
                "Queue '{}' targets a different host, skipping announcement",
                queue.name
            );
            return;
        }

        let Some(client) = &self.client else { return };

        if let Err(e) = client.say(&Self::build_message(queue)).await {
            warn!("Match-start announcement for '{}' failed: {}", queue.name, e);
        }
    }
}
