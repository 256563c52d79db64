use crate::error::RegistryError;
use crate::graph::{NodeId, RawGraph};
use ahash::{AHashMap, AHashSet};

pub mod policy;

/// Tracks which (node, inbound port) pairs are occupied by a link.
///
/// The table is mutated transactionally alongside link creation/removal and
/// must never desync from the actual link set; [`PortRegistry::derive_from`]
/// re-derives it from the links as a consistency check.
#[derive(Debug, Clone, Default)]
pub struct PortRegistry {
    occupied: AHashMap<NodeId, AHashSet<String>>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the table from a graph's link set.
    pub fn derive_from(graph: &RawGraph) -> Self {
        let mut registry = Self::new();
        for link in &graph.links {
            registry
                .occupied
                .entry(link.target.clone())
                .or_default()
                .insert(link.target_port.clone());
        }
        registry
    }

    pub fn is_occupied(&self, node_id: &str, port: &str) -> bool {
        self.occupied
            .get(node_id)
            .is_some_and(|ports| ports.contains(port))
    }

    /// Marks a port as occupied. Reserving an already-occupied port is a
    /// broken invariant upstream, not a first line of defense.
    pub fn reserve(&mut self, node_id: &str, port: &str) -> Result<(), RegistryError> {
        let ports = self.occupied.entry(node_id.to_string()).or_default();
        if !ports.insert(port.to_string()) {
            return Err(RegistryError::PortAlreadyOccupied {
                node_id: node_id.to_string(),
                port: port.to_string(),
            });
        }
        Ok(())
    }

    /// Frees a port. Returns whether it was occupied.
    pub fn release(&mut self, node_id: &str, port: &str) -> bool {
        let Some(ports) = self.occupied.get_mut(node_id) else {
            return false;
        };
        let removed = ports.remove(port);
        if ports.is_empty() {
            self.occupied.remove(node_id);
        }
        removed
    }

    /// Drops every entry for a node, e.g. when the node is deleted.
    pub fn forget_node(&mut self, node_id: &str) {
        self.occupied.remove(node_id);
    }

    /// Whether the table matches what the graph's link set implies.
    pub fn matches(&self, graph: &RawGraph) -> bool {
        Self::derive_from(graph).occupied == self.occupied
    }
}
