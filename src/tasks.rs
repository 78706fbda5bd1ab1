use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::{OutageSimulator, Router};
use crate::server::ProtocolServer;

/// Periodic distance vector broadcast. Cycles that overrun the interval
/// push the next tick back instead of bursting.
pub fn spawn_broadcast_task(router: Arc<Router>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(router.settings().interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            router.broadcast_once().await;
        }
    })
}

/// Inbound dispatch: one message per accepted connection, applied in
/// arrival order.
pub fn spawn_dispatch_task(router: Arc<Router>, server: ProtocolServer) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            router.receive_one(&server).await;
        }
    })
}

pub fn spawn_outage_task(simulator: OutageSimulator) -> JoinHandle<()> {
    tokio::spawn(async move {
        let failed = simulator.run().await;
        log::debug!("Outage simulation finished, {} link(s) failed", failed.len());
    })
}
