// Distance vector storage and the Bellman-Ford relaxation step.

use std::collections::BTreeMap;

use crate::protocol::message_types::{DistanceEntry, DistanceVectorUpdate};
use crate::types::{RouterId, INFINITY, NEIGHBOR_COST};

/// Cost to every known destination. Keys are sorted so that both the wire
/// entries and the rendered table come out in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistanceVector {
    costs: BTreeMap<RouterId, i32>,
}

/// A destination whose cost improved during relaxation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    pub destination: RouterId,
    pub previous: i32,
    pub cost: i32,
}

impl DistanceVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cost(&mut self, router_id: &str, cost: i32) {
        self.costs.insert(router_id.to_string(), cost);
    }

    pub fn cost(&self, router_id: &str) -> Option<i32> {
        self.costs.get(router_id).copied()
    }

    pub fn contains(&self, router_id: &str) -> bool {
        self.costs.contains_key(router_id)
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouterId, i32)> {
        self.costs.iter().map(|(id, cost)| (id, *cost))
    }

    /// Destinations currently at the direct-neighbor cost.
    pub fn direct_neighbors(&self) -> Vec<RouterId> {
        self.costs
            .iter()
            .filter(|(_, cost)| **cost == NEIGHBOR_COST)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn to_update(&self, origin_id: &str) -> DistanceVectorUpdate {
        DistanceVectorUpdate {
            origin_id: origin_id.to_string(),
            entries: self
                .costs
                .iter()
                .map(|(node_id, distance)| DistanceEntry {
                    node_id: node_id.clone(),
                    distance: *distance,
                })
                .collect(),
        }
    }

    /// Applies one neighbor advertisement.
    ///
    /// An entry is considered when it names neither the sender nor
    /// `self_id`, is already known locally, and the sender reaches it
    /// (`distance > 0`). The local cost becomes `distance + 1` when it was
    /// unreachable or the candidate is strictly cheaper. Costs never grow.
    pub fn relax(&mut self, self_id: &str, update: &DistanceVectorUpdate) -> Vec<RouteChange> {
        let sender = update.origin_id.as_str();
        let mut changes = Vec::new();

        for entry in &update.entries {
            if entry.node_id == sender || entry.node_id == self_id || entry.distance <= 0 {
                continue;
            }
            let Some(candidate) = entry.distance.checked_add(1) else {
                continue;
            };
            let Some(current) = self.costs.get_mut(&entry.node_id) else {
                continue;
            };
            if *current == INFINITY || candidate < *current {
                changes.push(RouteChange {
                    destination: entry.node_id.clone(),
                    previous: *current,
                    cost: candidate,
                });
                *current = candidate;
            }
        }
        changes
    }
}
