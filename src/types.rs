// Shared structures used by the routing core and the transport layer

use serde::{Deserialize, Serialize};
use std::fmt;

pub type RouterId = String;

/// Cost sentinel for an unreachable destination.
pub const INFINITY: i32 = -1;

/// Cost advertised for a direct neighbor.
pub const NEIGHBOR_COST: i32 = 1;

/// Identity of the local router, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterIdentity {
    pub router_id: RouterId,
    pub ip_address: String,
    pub port: u16,
}

impl RouterIdentity {
    pub fn new(router_id: impl Into<String>, ip_address: impl Into<String>, port: u16) -> Self {
        Self {
            router_id: router_id.into(),
            ip_address: ip_address.into(),
            port,
        }
    }
}

impl fmt::Display for RouterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.router_id, self.ip_address, self.port)
    }
}

/// Link table entry for another router of the topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub ip_address: String,
    pub port: u16,
    /// Neighbor through which the destination is currently reached.
    /// Empty until a route is known.
    pub next_hop: RouterId,
    pub up: bool,
    /// Only meaningful for direct neighbors.
    pub probability_of_failure: f64,
}

impl Link {
    pub fn new(ip_address: impl Into<String>, port: u16) -> Self {
        Self {
            ip_address: ip_address.into(),
            port,
            next_hop: String::new(),
            up: true,
            probability_of_failure: 0.0,
        }
    }
}

/// Formats a cost the way the routing table shows it.
pub fn format_cost(cost: i32) -> String {
    if cost == INFINITY {
        "inf".to_string()
    } else {
        cost.to_string()
    }
}
