use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Stable identifier of a node, assigned at creation by the editor shell.
pub type NodeId = String;
/// Stable identifier of a link.
pub type LinkId = String;

/// Canvas position of a node. Owned by the canvas and irrelevant to
/// code generation; the normalizer never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A single node of the raw, editor-owned graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: NodeId,
    #[serde(alias = "nodeType", alias = "type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    /// Present iff the node's output is consumed by more than one link,
    /// or the user set one manually.
    #[serde(default, alias = "variableName")]
    pub variable_name: Option<String>,
    /// Named input ports, in the order declared by the node's template.
    #[serde(default, alias = "inPorts")]
    pub in_ports: Vec<String>,
    /// Named output ports declared by the node's template.
    #[serde(default, alias = "outPorts")]
    pub out_ports: Vec<String>,
    /// Literal default value per unconnected input port.
    #[serde(default, alias = "defaultValues")]
    pub defaults: AHashMap<String, serde_json::Value>,
    /// Adapter-opaque configuration. Not interpreted by the core, but part
    /// of the node's content (it may influence generated code).
    #[serde(default)]
    pub attributes: serde_json::Value,
}

/// A directed edge from one node's output to another node's input port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLink {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(alias = "targetPort")]
    pub target_port: String,
}

/// The raw graph as the editor shell persists it: flat, id-keyed
/// collections of nodes and links. Links reference node ids, never node
/// handles, so the cyclic node/link navigation of the canvas library never
/// leaks into the core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}

impl RawGraph {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn node(&self, id: &str) -> Option<&RawNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut RawNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn link(&self, id: &str) -> Option<&RawLink> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Outgoing links of a node, in insertion order.
    pub fn links_from<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a RawLink> {
        self.links.iter().filter(move |l| l.source == node_id)
    }

    /// Incoming links of a node, in insertion order.
    pub fn links_into<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a RawLink> {
        self.links.iter().filter(move |l| l.target == node_id)
    }

    pub fn out_degree(&self, node_id: &str) -> usize {
        self.links_from(node_id).count()
    }

    /// Number of occupied inbound ports of a node. Each port accepts at
    /// most one link, so this equals the number of incoming links.
    pub fn count_in_ports(&self, node_id: &str) -> usize {
        self.links_into(node_id).count()
    }

    pub fn add_node(&mut self, node: RawNode) {
        self.nodes.push(node);
    }

    pub fn add_link(&mut self, link: RawLink) {
        self.links.push(link);
    }

    /// Removes a link by id. Returns the removed link, if any.
    pub fn remove_link(&mut self, link_id: &str) -> Option<RawLink> {
        let index = self.links.iter().position(|l| l.id == link_id)?;
        Some(self.links.remove(index))
    }

    /// Removes a node and cascades to removal of all incident links.
    /// Returns the removed node together with the removed links.
    pub fn remove_node(&mut self, node_id: &str) -> Option<(RawNode, Vec<RawLink>)> {
        let index = self.nodes.iter().position(|n| n.id == node_id)?;
        let node = self.nodes.remove(index);
        let mut removed = Vec::new();
        self.links.retain(|l| {
            if l.source == node_id || l.target == node_id {
                removed.push(l.clone());
                false
            } else {
                true
            }
        });
        Some((node, removed))
    }

    /// Variable names currently assigned anywhere in the graph.
    pub fn used_variable_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|n| n.variable_name.as_deref())
    }
}
