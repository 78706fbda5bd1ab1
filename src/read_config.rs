// Topology file loading and validation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::types::{RouterId, RouterIdentity};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeConfig {
    pub ip_address: String,
    pub port: u16,
}

/// Undirected edge between two routers. `(A, B)` and `(B, A)` are the same
/// link.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LinkConfig {
    pub source: RouterId,
    pub target: RouterId,
    /// Probability of failure, in `[0, 1]`.
    #[serde(default)]
    pub pof: Option<f64>,
}

impl LinkConfig {
    /// The other endpoint when `router_id` is one end of the edge.
    pub fn peer_of(&self, router_id: &str) -> Option<&str> {
        if self.source == router_id {
            Some(&self.target)
        } else if self.target == router_id {
            Some(&self.source)
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Topology {
    #[serde(default)]
    pub nodes: BTreeMap<RouterId, NodeConfig>,
    #[serde(default)]
    pub links: Vec<LinkConfig>,
}

/// Reads and parses a JSON topology file.
pub fn load_topology<P: AsRef<Path>>(path: P) -> Result<Topology> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AppError::TopologyError(format!("{} does not exist", path.display())));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        AppError::TopologyError(format!("Failed to read topology file {}: {}", path.display(), e))
    })?;

    let topology = Topology::from_json(&content)?;
    log::info!("Nodes in topology: {}", topology.nodes.len());
    Ok(topology)
}

impl Topology {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| AppError::TopologyError(format!("Topology file malformed: {}", e)))
    }

    /// Rejects topologies the router core cannot start from.
    pub fn validate(&self, router_id: &str) -> Result<()> {
        if self.nodes.is_empty() || self.links.is_empty() {
            return Err(AppError::TopologyError("Nodes or links are missing".to_string()));
        }
        if !self.nodes.contains_key(router_id) {
            return Err(AppError::TopologyError(format!(
                "{} does not exist in the topology",
                router_id
            )));
        }

        let mut seen = HashSet::new();
        for link in &self.links {
            for end in [&link.source, &link.target] {
                if !self.nodes.contains_key(end) {
                    return Err(AppError::TopologyError(format!(
                        "Link {}-{} references unknown node {}",
                        link.source, link.target, end
                    )));
                }
            }
            if link.source == link.target {
                return Err(AppError::TopologyError(format!(
                    "Link {}-{} connects a node to itself",
                    link.source, link.target
                )));
            }
            if let Some(pof) = link.pof {
                if !(0.0..=1.0).contains(&pof) {
                    return Err(AppError::TopologyError(format!(
                        "Link {}-{} has probability of failure {} outside [0, 1]",
                        link.source, link.target, pof
                    )));
                }
            }
            let key = if link.source < link.target {
                (link.source.as_str(), link.target.as_str())
            } else {
                (link.target.as_str(), link.source.as_str())
            };
            if !seen.insert(key) {
                log::warn!("Link {}-{} is listed more than once", link.source, link.target);
            }
        }
        Ok(())
    }

    pub fn identity_of(&self, router_id: &str) -> Result<RouterIdentity> {
        self.nodes
            .get(router_id)
            .map(|node| RouterIdentity::new(router_id, node.ip_address.clone(), node.port))
            .ok_or_else(|| {
                AppError::TopologyError(format!("{} does not exist in the topology", router_id))
            })
    }
}
