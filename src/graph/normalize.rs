use crate::error::GraphError;
use crate::graph::{NodeId, RawGraph};
use ahash::{AHashMap, AHasher};
use std::hash::{Hash, Hasher};

/// What a declared input port of a node resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedInput {
    /// The port is unconnected and falls back to a literal default.
    Literal(serde_json::Value),
    /// The port is wired to the output of another node.
    Reference(NodeId),
    /// The port is unconnected and has no default. Reported by the
    /// validator as a dangling port.
    Missing,
}

/// A node of the normalized graph: type, resolved inputs in declared port
/// order, and the nodes consuming its output (one entry per link, in link
/// insertion order).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedNode {
    pub node_type: String,
    pub inputs: Vec<(String, ResolvedInput)>,
    pub consumers: Vec<NodeId>,
    pub variable_name: Option<String>,
    pub attributes: serde_json::Value,
}

/// The canonical, view-independent snapshot of the node graph: an
/// insertion-ordered mapping from node id to [`NormalizedNode`]. Two
/// normalized graphs are equal iff their fingerprints match; view-only
/// attributes (position, styling) are excluded by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedGraph {
    order: Vec<NodeId>,
    nodes: AHashMap<NodeId, NormalizedNode>,
}

impl NormalizedGraph {
    pub fn get(&self, node_id: &str) -> Option<&NormalizedNode> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Nodes in insertion order of the raw graph.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NormalizedNode)> {
        self.order.iter().map(|id| (id, &self.nodes[id]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, id: NodeId, node: NormalizedNode) {
        self.order.push(id.clone());
        self.nodes.insert(id, node);
    }
}

/// Converts the raw, editor-shaped graph into its canonical form.
///
/// Walks every node exactly once, resolving each declared input port to
/// either the wired upstream node or a literal default. Nodes whose inputs
/// all resolve and whose type satisfies `is_input` are collected into the
/// returned inputs list, in node insertion order. Pure function of the raw
/// graph: position and styling are never consulted.
pub fn normalize(
    graph: &RawGraph,
    is_input: impl Fn(&str) -> bool,
) -> Result<(NormalizedGraph, Vec<NodeId>), GraphError> {
    // Pre-index links for O(1) lookups, the way the raw edge list is
    // folded into a connection map before any node is visited.
    let mut wired: AHashMap<(&str, &str), &NodeId> = AHashMap::new();
    let mut consumers: AHashMap<&str, Vec<NodeId>> = AHashMap::new();
    for link in &graph.links {
        let target = graph
            .node(&link.target)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: link.target.clone(),
                link_id: link.id.clone(),
            })?;
        if graph.node(&link.source).is_none() {
            return Err(GraphError::NodeNotFound {
                node_id: link.source.clone(),
                link_id: link.id.clone(),
            });
        }
        if !target.in_ports.iter().any(|p| *p == link.target_port) {
            return Err(GraphError::PortNotDeclared {
                link_id: link.id.clone(),
                node_id: link.target.clone(),
                port: link.target_port.clone(),
            });
        }
        wired.insert((link.target.as_str(), link.target_port.as_str()), &link.source);
        consumers
            .entry(link.source.as_str())
            .or_default()
            .push(link.target.clone());
    }

    let mut normalized = NormalizedGraph::default();
    let mut inputs = Vec::new();

    for node in &graph.nodes {
        let resolved: Vec<(String, ResolvedInput)> = node
            .in_ports
            .iter()
            .map(|port| {
                let value = if let Some(source) = wired.get(&(node.id.as_str(), port.as_str())) {
                    ResolvedInput::Reference((*source).clone())
                } else if let Some(default) = node.defaults.get(port) {
                    ResolvedInput::Literal(default.clone())
                } else {
                    ResolvedInput::Missing
                };
                (port.clone(), value)
            })
            .collect();

        let fully_resolved = resolved
            .iter()
            .all(|(_, input)| !matches!(input, ResolvedInput::Missing));
        if fully_resolved && is_input(&node.node_type) {
            inputs.push(node.id.clone());
        }

        normalized.insert(
            node.id.clone(),
            NormalizedNode {
                node_type: node.node_type.clone(),
                inputs: resolved,
                consumers: consumers.get(node.id.as_str()).cloned().unwrap_or_default(),
                variable_name: node.variable_name.clone(),
                attributes: node.attributes.clone(),
            },
        );
    }

    Ok((normalized, inputs))
}

/// Digests the normalized graph into a fingerprint: equal graphs (up to
/// view-only attributes) hash equal. This is the sole signal used to skip
/// redundant re-validation and regeneration.
///
/// Uses a fixed-key hasher so the value is stable across calls within a
/// process, which is the only scope the regeneration gate needs.
pub fn fingerprint(graph: &NormalizedGraph) -> u64 {
    let mut hasher = AHasher::default();
    for (id, node) in graph.iter() {
        id.hash(&mut hasher);
        node.node_type.hash(&mut hasher);
        for (port, input) in &node.inputs {
            port.hash(&mut hasher);
            match input {
                // serde_json maps are ordered, so `to_string` is canonical.
                ResolvedInput::Literal(value) => ("lit", value.to_string()).hash(&mut hasher),
                ResolvedInput::Reference(source) => ("ref", source).hash(&mut hasher),
                ResolvedInput::Missing => "missing".hash(&mut hasher),
            }
        }
        node.consumers.hash(&mut hasher);
        node.variable_name.hash(&mut hasher);
        node.attributes.to_string().hash(&mut hasher);
    }
    hasher.finish()
}
