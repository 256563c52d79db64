use crate::graph::{LinkId, NodeId};
use thiserror::Error;

/// Errors that can occur while normalizing or mutating the raw graph.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Node '{node_id}' not found, but it is referenced by link '{link_id}'")]
    NodeNotFound { node_id: NodeId, link_id: LinkId },

    #[error("Link '{link_id}' targets port '{port}', which node '{node_id}' does not declare")]
    PortNotDeclared {
        link_id: LinkId,
        node_id: NodeId,
        port: String,
    },

    #[error("Link '{0}' not found in the graph")]
    LinkNotFound(LinkId),
}

/// Errors raised by the occupied-ports registry.
///
/// These indicate a broken invariant upstream (connection validation should
/// reject a second link into an occupied port before it ever reaches the
/// registry), so they are logic faults rather than user-facing diagnostics.
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    #[error("Port '{port}' on node '{node_id}' is already occupied")]
    PortAlreadyOccupied { node_id: NodeId, port: String },
}

/// Errors that can occur during the code generation pass.
#[derive(Error, Debug, Clone)]
pub enum GenerateError {
    #[error("Circular dependency between nodes: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<NodeId> },

    #[error("Node '{node_id}' has an unregistered or invalid node type: '{type_name}'")]
    UnknownNodeType { node_id: NodeId, type_name: String },

    #[error("Template for node '{node_id}' failed: {message}")]
    Template { node_id: NodeId, message: String },
}

/// Top-level error for document session operations.
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("Connection rejected: {reason}")]
    ConnectionRejected { reason: String },
}
