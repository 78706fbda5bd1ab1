// One-shot link failure injection.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::client::ProtocolClient;
use crate::core::routing_state::RoutingState;
use crate::protocol::message_types::{ControlMessage, WireMessage};
use crate::protocol::packet_parser::encode;
use crate::types::RouterId;
use crate::utils::Logger;

pub struct OutageSimulator {
    router_id: RouterId,
    delay: Duration,
    state: Arc<RoutingState>,
    client: ProtocolClient,
    logger: Logger,
}

impl OutageSimulator {
    pub fn new(
        router_id: RouterId,
        delay: Duration,
        state: Arc<RoutingState>,
        client: ProtocolClient,
        logger: Logger,
    ) -> Self {
        Self {
            router_id,
            delay,
            state,
            client,
            logger,
        }
    }

    /// Sleeps for the configured delay, then evaluates every link once.
    pub async fn run(self) -> Vec<RouterId> {
        tokio::time::sleep(self.delay).await;
        let mut rng = StdRng::from_entropy();
        self.inject(&mut rng).await
    }

    /// Draws the failures and tells each failed neighbor that the link is
    /// down. Returns the neighbors whose link failed.
    pub async fn inject<R: Rng>(&self, rng: &mut R) -> Vec<RouterId> {
        let target = self.logger.target();
        let failed = self.state.fail_links(rng).await;
        if failed.is_empty() {
            info!(target: target, "Outage simulation: every link survived");
            return Vec::new();
        }

        let payload = match encode(&WireMessage::ControlMessage(ControlMessage::down(&self.router_id))) {
            Ok(payload) => payload,
            Err(e) => {
                error!(target: target, "Failed to encode DOWN message: {}", e);
                return failed.into_iter().map(|n| n.router_id).collect();
            }
        };

        for neighbor in &failed {
            info!(target: target, "Link to {} is DOWN, notifying it", neighbor.router_id);
            if let Err(e) = self
                .client
                .send_to(&neighbor.ip_address, neighbor.port, &payload)
                .await
            {
                error!(target: target, "Failed to notify {}: {}", neighbor.router_id, e);
            }
        }
        failed.into_iter().map(|n| n.router_id).collect()
    }
}
