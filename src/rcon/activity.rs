//! Self-rescheduling game-server activity poll
//!
//! Every poll queries `status` and pushes the connected-player count to
//! the presence sink. A successful poll schedules the next one; the
//! first failure stops the loop until the process restarts.

use crate::gateway::PresenceSink;
use crate::rcon::client::RconClient;
use crate::scheduler::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Scheduler key grouping the poll's pending timer
pub const ACTIVITY_POLL_KEY: &str = "activity-status-poll";

pub struct ActivityPoller {
    client: RconClient,
    sink: Arc<dyn PresenceSink>,
    interval: Duration,
}

impl ActivityPoller {
    pub fn new(client: RconClient, sink: Arc<dyn PresenceSink>, interval: Duration) -> Self {
        Self {
            client,
            sink,
            interval,
        }
    }

    /// Schedule the first poll. Does nothing when the endpoint is not
    /// fully configured.
    pub fn start(self: &Arc<Self>, scheduler: &Scheduler) {
        if !self.client.endpoint().is_complete() {
            info!("RCON endpoint not configured, activity poll disabled");
            return;
        }
        self.schedule_next(scheduler, Duration::ZERO);
    }

    fn schedule_next(self: &Arc<Self>, scheduler: &Scheduler, delay: Duration) {
        let poller = Arc::clone(self);
        let chained = scheduler.clone();
        scheduler.schedule(Some(ACTIVITY_POLL_KEY.to_string()), delay, async move {
            poller.tick(&chained).await;
        });
    }

    async fn tick(self: Arc<Self>, scheduler: &Scheduler) {
        match self.client.status().await {
            Ok(status) => {
                if let Err(e) = self.sink.set_player_count(status.player_count()).await {
                    warn!("Failed to push presence update: {}", e);
                }
                self.schedule_next(scheduler, self.interval);
            }
            Err(e) => {
                // no retry loop: the poll stays down until the next restart
                warn!("Activity status poll failed, stopping: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::rcon::client::RconEndpoint;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        counts: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl PresenceSink for RecordingSink {
        async fn set_player_count(&self, count: usize) -> Result<()> {
            self.counts.lock().unwrap().push(count);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_without_endpoint_schedules_nothing() {
        let scheduler = Scheduler::new();
        let poller = Arc::new(ActivityPoller::new(
            RconClient::new(RconEndpoint {
                host: String::new(),
                port: 0,
                password: String::new(),
            }),
            Arc::new(RecordingSink::default()),
            Duration::from_secs(60),
        ));

        poller.start(&scheduler);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_poll_pushes_player_count_and_reschedules() {
        // loopback server answering one status query
        let server = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 2048];
            let (_, peer) = server.recv_from(&mut buf).await.unwrap();
            let mut response = vec![0xFF; 4];
            response.extend_from_slice(
                b"--- ----- ---- ----\n  0 1 20 orbb 0 192.0.2.1:27960\n  1 2 30 keel 0 192.0.2.2:27960\n",
            );
            server.send_to(&response, peer).await.unwrap();
        });

        let sink = Arc::new(RecordingSink::default());
        let scheduler = Scheduler::new();
        let poller = Arc::new(ActivityPoller::new(
            RconClient::with_timeouts(
                RconEndpoint {
                    host: addr.ip().to_string(),
                    port: addr.port(),
                    password: "pw".to_string(),
                },
                Duration::from_millis(1000),
                Duration::from_millis(100),
            ),
            Arc::clone(&sink) as Arc<dyn PresenceSink>,
            Duration::from_secs(3600),
        ));

        poller.start(&scheduler);

        // wait for the first tick to complete and reschedule
        for _ in 0..200 {
            if !sink.counts.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(sink.counts.lock().unwrap().as_slice(), &[2]);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_poll_stops_after_failure() {
        // endpoint with nothing listening -> timeout -> poll stops
        let probe = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = probe.local_addr().unwrap();
        drop(probe);

        let sink = Arc::new(RecordingSink::default());
        let scheduler = Scheduler::new();
        let poller = Arc::new(ActivityPoller::new(
            RconClient::with_timeouts(
                RconEndpoint {
                    host: addr.ip().to_string(),
                    port: addr.port(),
                    password: "pw".to_string(),
                },
                Duration::from_millis(50),
                Duration::from_millis(20),
            ),
            Arc::clone(&sink) as Arc<dyn PresenceSink>,
            Duration::from_secs(3600),
        ));

        poller.start(&scheduler);

        for _ in 0..200 {
            if scheduler.pending_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(sink.counts.lock().unwrap().is_empty());
        assert_eq!(scheduler.pending_count(), 0);
    }
}
