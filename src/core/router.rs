// The router: routing state plus the transport endpoints it talks through.

use std::sync::Arc;

use log::{debug, error, info};

use crate::client::ProtocolClient;
use crate::core::outage::OutageSimulator;
use crate::core::routing_state::RoutingState;
use crate::error::{AppError, Result};
use crate::protocol::message_types::WireMessage;
use crate::protocol::packet_parser::encode;
use crate::read_config::Topology;
use crate::server::ProtocolServer;
use crate::types::RouterIdentity;
use crate::utils::{Logger, RouterSettings};

pub struct Router {
    identity: RouterIdentity,
    settings: RouterSettings,
    state: Arc<RoutingState>,
    client: ProtocolClient,
    logger: Logger,
}

impl Router {
    /// Builds the router with its tables seeded from `topology`.
    pub fn new(
        identity: RouterIdentity,
        settings: RouterSettings,
        topology: &Topology,
        logger: Logger,
    ) -> Self {
        let state = RoutingState::initialize_from_topology(
            &identity.router_id,
            topology,
            logger.child("state"),
        );
        let client = ProtocolClient::new(settings.retry.clone(), logger.child("client"));
        Self {
            identity,
            settings,
            state: Arc::new(state),
            client,
            logger,
        }
    }

    pub fn identity(&self) -> &RouterIdentity {
        &self.identity
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn state(&self) -> &Arc<RoutingState> {
        &self.state
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Binds the transport server on the router's own address.
    pub async fn bind(&self) -> Result<ProtocolServer> {
        ProtocolServer::bind(
            &self.identity.ip_address,
            self.identity.port,
            self.logger.child("server"),
        )
        .await
    }

    pub fn outage_simulator(&self) -> OutageSimulator {
        OutageSimulator::new(
            self.identity.router_id.clone(),
            self.settings.outage_delay(),
            Arc::clone(&self.state),
            self.client.clone(),
            self.logger.child("outage"),
        )
    }

    /// One broadcast cycle: snapshot the distance vector and push it to every
    /// direct neighbor whose link is up. Returns how many sends succeeded.
    pub async fn broadcast_once(&self) -> usize {
        let target = self.logger.target();
        let (update, neighbors) = self.state.broadcast_plan().await;

        let table = self.state.render_table().await;
        info!(target: target, "Routing table of {}:\n{}", self.identity.router_id, table);

        let payload = match encode(&WireMessage::DistanceVectorUpdate(update)) {
            Ok(payload) => payload,
            Err(e) => {
                error!(target: target, "Failed to encode distance vector: {}", e);
                return 0;
            }
        };

        let mut reached = 0;
        for neighbor in &neighbors {
            match self
                .client
                .send_to(&neighbor.ip_address, neighbor.port, &payload)
                .await
            {
                Ok(_) => reached += 1,
                Err(e) => error!(target: target, "Failed to update {}: {}", neighbor.router_id, e),
            }
        }
        debug!(target: target, "Distance vector sent to {}/{} neighbors", reached, neighbors.len());
        reached
    }

    /// Waits for one inbound message and applies it to the routing state.
    pub async fn receive_one(&self, server: &ProtocolServer) {
        let message = server.receive().await;
        debug!(
            target: self.logger.target(),
            "Received {} from {}",
            message.kind(),
            message.origin_id()
        );
        self.state.dispatch(message).await;
    }

    /// Binds the server and runs the broadcast, dispatch and outage
    /// activities. Only returns if binding fails or a loop stops.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let server = self.bind().await?;
        info!(target: self.logger.target(), "Router {} started on {}", self.identity, server.local_addr()?);

        let broadcast = crate::tasks::spawn_broadcast_task(Arc::clone(&self));
        let dispatch = crate::tasks::spawn_dispatch_task(Arc::clone(&self), server);
        let outage = crate::tasks::spawn_outage_task(self.outage_simulator());

        let stopped = tokio::select! {
            res = broadcast => ("broadcast", res),
            res = dispatch => ("dispatch", res),
        };
        outage.abort();

        Err(AppError::NetworkError(format!(
            "{} loop stopped: {:?}",
            stopped.0, stopped.1
        )))
    }
}
