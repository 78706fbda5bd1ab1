// Shared routing state: the distance vector and the link table, each behind
// its own lock.
//
// Lock order: whenever both tables are needed, the distance vector is locked
// first. Every dual-lock path goes through `lock_both`. No lock is held
// across a network call.

use std::fmt::Write as _;

use log::{debug, info, warn};
use rand::Rng;
use tokio::sync::{Mutex, MutexGuard};

use crate::core::distance_vector::{DistanceVector, RouteChange};
use crate::core::routing_table::LinkTable;
use crate::protocol::message_types::{
    ControlCommand, ControlMessage, DistanceVectorUpdate, WireMessage,
};
use crate::read_config::Topology;
use crate::types::{format_cost, Link, RouterId, INFINITY, NEIGHBOR_COST};
use crate::utils::Logger;

/// Address of a neighbor a message has to be sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborAddress {
    pub router_id: RouterId,
    pub ip_address: String,
    pub port: u16,
}

pub struct RoutingState {
    router_id: RouterId,
    distance_vector: Mutex<DistanceVector>,
    links: Mutex<LinkTable>,
    logger: Logger,
}

impl RoutingState {
    /// Seeds both tables: 0 for `router_id`, 1 with `next_hop` set for every
    /// direct neighbor, unreachable for everyone else. The topology must
    /// already be validated.
    pub fn initialize_from_topology(router_id: &str, topology: &Topology, logger: Logger) -> Self {
        let mut distance_vector = DistanceVector::new();
        let mut links = LinkTable::new();

        for (node_id, node) in &topology.nodes {
            if node_id == router_id {
                distance_vector.set_cost(router_id, 0);
            } else {
                links.add_link(node_id.clone(), Link::new(node.ip_address.clone(), node.port));
                distance_vector.set_cost(node_id, INFINITY);
            }
        }
        distance_vector.set_cost(router_id, 0);

        for edge in &topology.links {
            let Some(neighbor) = edge.peer_of(router_id) else {
                continue;
            };
            if neighbor == router_id {
                continue;
            }
            distance_vector.set_cost(neighbor, NEIGHBOR_COST);
            if let Some(link) = links.get_mut(neighbor) {
                link.next_hop = neighbor.to_string();
                if let Some(pof) = edge.pof {
                    link.probability_of_failure = pof;
                }
            }
            debug!(target: logger.target(), "Direct neighbor: {}", neighbor);
        }

        Self {
            router_id: router_id.to_string(),
            distance_vector: Mutex::new(distance_vector),
            links: Mutex::new(links),
            logger,
        }
    }

    pub fn router_id(&self) -> &str {
        &self.router_id
    }

    async fn lock_both(&self) -> (MutexGuard<'_, DistanceVector>, MutexGuard<'_, LinkTable>) {
        let distance_vector = self.distance_vector.lock().await;
        let links = self.links.lock().await;
        (distance_vector, links)
    }

    pub async fn snapshot(&self) -> DistanceVector {
        self.distance_vector.lock().await.clone()
    }

    pub async fn cost(&self, router_id: &str) -> Option<i32> {
        self.distance_vector.lock().await.cost(router_id)
    }

    pub async fn link(&self, router_id: &str) -> Option<Link> {
        self.links.lock().await.get(router_id).cloned()
    }

    /// Takes one snapshot of the distance vector and returns the update to
    /// advertise together with the neighbors it goes to: routers at cost 1
    /// whose link is up.
    pub async fn broadcast_plan(&self) -> (DistanceVectorUpdate, Vec<NeighborAddress>) {
        let snapshot = self.snapshot().await;
        let update = snapshot.to_update(&self.router_id);

        let links = self.links.lock().await;
        let targets = snapshot
            .direct_neighbors()
            .into_iter()
            .filter_map(|router_id| {
                let link = links.get(&router_id)?;
                if !link.up {
                    return None;
                }
                Some(NeighborAddress {
                    ip_address: link.ip_address.clone(),
                    port: link.port,
                    router_id,
                })
            })
            .collect();
        (update, targets)
    }

    /// Routes a decoded message to the matching handler.
    pub async fn dispatch(&self, message: WireMessage) {
        match message {
            WireMessage::DistanceVectorUpdate(update) => {
                self.apply_update(&update).await;
            }
            WireMessage::ControlMessage(control) => {
                self.handle_control_message(&control).await;
            }
        }
    }

    /// Relaxation step for one neighbor advertisement. The whole update is
    /// applied while holding the distance-vector lock; next hops are written
    /// under the link lock taken second.
    pub async fn apply_update(&self, update: &DistanceVectorUpdate) -> Vec<RouteChange> {
        let (mut distance_vector, mut links) = self.lock_both().await;
        let changes = distance_vector.relax(&self.router_id, update);
        for change in &changes {
            links.set_next_hop(&change.destination, &update.origin_id);
            info!(
                target: self.logger.target(),
                "Route to {} now costs {} via {} (was {})",
                change.destination,
                change.cost,
                update.origin_id,
                format_cost(change.previous)
            );
        }
        if changes.is_empty() {
            debug!(target: self.logger.target(), "Update from {} changed nothing", update.origin_id);
        }
        changes
    }

    /// Returns `true` when the message marked a link down.
    pub async fn handle_control_message(&self, message: &ControlMessage) -> bool {
        match message.parsed_command() {
            Some(ControlCommand::Down) => {
                info!(target: self.logger.target(), "{} reports the link DOWN", message.origin_id);
                self.mark_link_down(&message.origin_id).await
            }
            None => {
                warn!(
                    target: self.logger.target(),
                    "Ignoring unknown command {:?} from {}", message.command, message.origin_id
                );
                false
            }
        }
    }

    /// Marks the link to `router_id` down and its cost unreachable, both
    /// tables at once. Routes through `router_id` to other destinations are
    /// left as they are.
    pub async fn mark_link_down(&self, router_id: &str) -> bool {
        if router_id == self.router_id {
            return false;
        }
        let (mut distance_vector, mut links) = self.lock_both().await;
        if !links.mark_down(router_id) {
            warn!(target: self.logger.target(), "DOWN for unknown router {}", router_id);
            return false;
        }
        distance_vector.set_cost(router_id, INFINITY);
        true
    }

    /// One Bernoulli trial per link that is up and has a non-zero
    /// probability of failure. Failed links are marked down with their cost
    /// set to unreachable, and returned so the caller can notify them.
    pub async fn fail_links<R: Rng>(&self, rng: &mut R) -> Vec<NeighborAddress> {
        let (mut distance_vector, mut links) = self.lock_both().await;
        let mut failed = Vec::new();

        let candidates: Vec<(RouterId, f64)> = links
            .iter()
            .filter(|(_, link)| link.up && link.probability_of_failure > 0.0)
            .map(|(id, link)| (id.clone(), link.probability_of_failure))
            .collect();

        for (router_id, pof) in candidates {
            if !rng.gen_bool(pof.clamp(0.0, 1.0)) {
                debug!(target: self.logger.target(), "Link to {} survived (pof {})", router_id, pof);
                continue;
            }
            if let Some(link) = links.get_mut(&router_id) {
                link.up = false;
                distance_vector.set_cost(&router_id, INFINITY);
                warn!(target: self.logger.target(), "Link to {} failed", router_id);
                failed.push(NeighborAddress {
                    router_id: router_id.clone(),
                    ip_address: link.ip_address.clone(),
                    port: link.port,
                });
            }
        }
        failed
    }

    /// Human-readable dump of destinations, costs and next hops.
    pub async fn render_table(&self) -> String {
        let (distance_vector, links) = self.lock_both().await;
        let mut out = String::new();
        let _ = writeln!(out, "{:<10}{:<6}{:<10}{}", "dest", "cost", "next hop", "link");
        for (router_id, cost) in distance_vector.iter() {
            let (next_hop, state) = match links.get(router_id) {
                Some(link) => (
                    if link.next_hop.is_empty() { "-" } else { link.next_hop.as_str() },
                    if link.up { "up" } else { "down" },
                ),
                None => ("-", "-"),
            };
            let _ = writeln!(out, "{:<10}{:<6}{:<10}{}", router_id, format_cost(cost), next_hop, state);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TRIANGLE: &str = r#"{
        "nodes": {
            "A": { "ip_address": "127.0.0.1", "port": 9101 },
            "B": { "ip_address": "127.0.0.1", "port": 9102 },
            "C": { "ip_address": "127.0.0.1", "port": 9103 },
            "D": { "ip_address": "127.0.0.1", "port": 9104 }
        },
        "links": [
            { "source": "B", "target": "A", "pof": 1.0 },
            { "source": "A", "target": "C", "pof": 0.0 },
            { "source": "C", "target": "D" }
        ]
    }"#;

    fn state(router_id: &str) -> RoutingState {
        let topology = Topology::from_json(TRIANGLE).unwrap();
        RoutingState::initialize_from_topology(router_id, &topology, Logger::new(router_id))
    }

    #[tokio::test]
    async fn test_initialization_handles_both_edge_directions() {
        let state = state("A");
        assert_eq!(state.cost("A").await, Some(0));
        assert_eq!(state.cost("B").await, Some(1));
        assert_eq!(state.cost("C").await, Some(1));
        assert_eq!(state.cost("D").await, Some(INFINITY));

        let b = state.link("B").await.unwrap();
        assert_eq!(b.next_hop, "B");
        assert_eq!(b.probability_of_failure, 1.0);
        assert!(state.link("A").await.is_none());
        assert!(state.link("D").await.unwrap().next_hop.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_plan_skips_down_links() {
        let state = state("A");
        let (update, targets) = state.broadcast_plan().await;
        assert_eq!(update.origin_id, "A");
        assert_eq!(update.entries.len(), 4);
        let ids: Vec<_> = targets.iter().map(|t| t.router_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C"]);

        state.mark_link_down("B").await;
        let (_, targets) = state.broadcast_plan().await;
        let ids: Vec<_> = targets.iter().map(|t| t.router_id.as_str()).collect();
        assert_eq!(ids, vec!["C"]);
    }

    #[tokio::test]
    async fn test_apply_update_sets_next_hop() {
        let state = state("A");
        let update = DistanceVectorUpdate {
            origin_id: "C".to_string(),
            entries: vec![crate::protocol::DistanceEntry { node_id: "D".to_string(), distance: 1 }],
        };
        let changes = state.apply_update(&update).await;
        assert_eq!(changes.len(), 1);
        assert_eq!(state.cost("D").await, Some(2));
        assert_eq!(state.link("D").await.unwrap().next_hop, "C");
    }

    #[tokio::test]
    async fn test_down_leaves_routes_through_failed_neighbor() {
        let state = state("A");
        state
            .apply_update(&DistanceVectorUpdate {
                origin_id: "C".to_string(),
                entries: vec![crate::protocol::DistanceEntry { node_id: "D".to_string(), distance: 1 }],
            })
            .await;

        assert!(state.handle_control_message(&ControlMessage::down("C")).await);
        assert_eq!(state.cost("C").await, Some(INFINITY));
        assert!(!state.link("C").await.unwrap().up);
        // stale route via C is kept
        assert_eq!(state.cost("D").await, Some(2));
        assert_eq!(state.link("D").await.unwrap().next_hop, "C");
    }

    #[tokio::test]
    async fn test_unknown_command_and_origin_are_ignored() {
        let state = state("A");
        let reboot = ControlMessage { origin_id: "B".to_string(), command: "REBOOT".to_string() };
        assert!(!state.handle_control_message(&reboot).await);
        assert!(state.link("B").await.unwrap().up);

        assert!(!state.handle_control_message(&ControlMessage::down("Z")).await);
        assert!(!state.handle_control_message(&ControlMessage::down("A")).await);
        assert_eq!(state.cost("A").await, Some(0));
    }

    #[tokio::test]
    async fn test_fail_links_uses_probabilities() {
        let state = state("A");
        let mut rng = StdRng::seed_from_u64(7);
        let failed = state.fail_links(&mut rng).await;

        // B has pof 1.0, C has pof 0.0
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].router_id, "B");
        assert_eq!(failed[0].port, 9102);
        assert_eq!(state.cost("B").await, Some(INFINITY));
        assert!(!state.link("B").await.unwrap().up);
        assert_eq!(state.cost("C").await, Some(1));

        // already down, not evaluated again
        assert!(state.fail_links(&mut rng).await.is_empty());
    }

    #[tokio::test]
    async fn test_render_table() {
        let state = state("A");
        state.mark_link_down("B").await;
        let table = state.render_table().await;
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("dest"));
        assert!(lines[1].starts_with("A"));
        assert!(lines[2].contains("inf") && lines[2].ends_with("down"));
        assert!(lines[4].starts_with("D") && lines[4].contains("inf"));
    }
}
