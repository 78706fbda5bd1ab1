// Link table: one entry for every other router of the topology.

use std::collections::BTreeMap;

use crate::types::{Link, RouterId};

#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: BTreeMap<RouterId, Link>,
}

impl LinkTable {
    pub fn new() -> Self {
        LinkTable {
            links: BTreeMap::new(),
        }
    }

    pub fn add_link(&mut self, router_id: RouterId, link: Link) {
        self.links.insert(router_id, link);
    }

    pub fn get(&self, router_id: &str) -> Option<&Link> {
        self.links.get(router_id)
    }

    pub fn get_mut(&mut self, router_id: &str) -> Option<&mut Link> {
        self.links.get_mut(router_id)
    }

    pub fn set_next_hop(&mut self, router_id: &str, next_hop: &str) {
        if let Some(link) = self.links.get_mut(router_id) {
            link.next_hop = next_hop.to_string();
        }
    }

    pub fn is_up(&self, router_id: &str) -> bool {
        self.links.get(router_id).map(|link| link.up).unwrap_or(false)
    }

    /// Returns `false` when the router is unknown.
    pub fn mark_down(&mut self, router_id: &str) -> bool {
        match self.links.get_mut(router_id) {
            Some(link) => {
                link.up = false;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouterId, &Link)> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
