//! Variable-naming and port bookkeeping policy around link mutations.
//!
//! The planners here are pure: they inspect the graph as it is *before* the
//! mutation and emit a [`CommandBatch`] for the owning session to apply
//! atomically with the link change itself. A link is never added or removed
//! without its paired variable-name and port commands.

use crate::adapter::{Adapter, Language};
use crate::command::{Command, CommandBatch};
use crate::error::GraphError;
use crate::graph::{NodeId, RawGraph, RawLink};
use crate::registry::PortRegistry;
use ahash::AHashSet;

/// Connection-time validity check: no self-loops, the target port must be a
/// declared inbound port of the target node, and it must be free.
pub fn can_connect(
    graph: &RawGraph,
    registry: &PortRegistry,
    source: &str,
    target: &str,
    port: &str,
) -> Result<(), String> {
    if source == target {
        return Err("a node cannot be linked to itself".to_string());
    }
    if graph.node(source).is_none() {
        return Err(format!("source node '{source}' does not exist"));
    }
    let Some(target_node) = graph.node(target) else {
        return Err(format!("target node '{target}' does not exist"));
    };
    if !target_node.in_ports.iter().any(|p| p == port) {
        return Err(format!(
            "'{port}' is not an inbound port of node '{target}'"
        ));
    }
    if registry.is_occupied(target, port) {
        return Err(format!("port '{port}' of node '{target}' is occupied"));
    }
    Ok(())
}

/// Plans the atomic batch for adding `link` to `graph`.
///
/// When the source's outgoing link count transitions from one to two, a
/// second consumer appears and the source's inlined expression must become
/// a named, reusable value: the batch assigns it a collision-free variable
/// name from the language's namer.
pub fn plan_link_add(
    graph: &RawGraph,
    link: RawLink,
    adapter: &dyn Adapter,
    language: &dyn Language,
    used_variables: &AHashSet<String>,
) -> CommandBatch {
    let mut batch = CommandBatch::new();
    batch.push(Command::ReservePort {
        node_id: link.target.clone(),
        port: link.target_port.clone(),
    });

    if let Some(source) = graph.node(&link.source)
        && graph.out_degree(&link.source) >= 1
        && source.variable_name.is_none()
        && let Some(template) = adapter.node_templates().get(&source.node_type)
    {
        let name = language.name_node(template.as_ref(), used_variables);
        batch.push(Command::SetVariable {
            node_id: link.source.clone(),
            name,
        });
    }

    batch.push(Command::AddLink(link));
    batch
}

/// Plans the atomic batch for removing the link `link_id` from `graph`.
///
/// Two independent clearing rules apply, resolved against the graph as it
/// stands with the link still present:
/// 1. the source's outgoing count drops from two to one, so its remaining
///    single consumer can re-inline the value and the source's variable
///    name is cleared;
/// 2. the target has a variable name and this link is its only inbound
///    connection, so the name is removed together with the link as one
///    atomic pair.
pub fn plan_link_removal(graph: &RawGraph, link_id: &str) -> Result<CommandBatch, GraphError> {
    let link = graph
        .link(link_id)
        .ok_or_else(|| GraphError::LinkNotFound(link_id.to_string()))?;

    let mut batch = CommandBatch::new();

    if let Some(source) = graph.node(&link.source)
        && source.variable_name.is_some()
        && graph.out_degree(&link.source) == 2
    {
        batch.push(Command::RemoveVariable {
            node_id: link.source.clone(),
        });
    }

    if let Some(target) = graph.node(&link.target)
        && target.variable_name.is_some()
        && graph.count_in_ports(&link.target) == 1
    {
        batch.push(Command::RemoveVariable {
            node_id: link.target.clone(),
        });
    }

    batch.push(Command::RemoveLink {
        link_id: link.id.clone(),
    });
    batch.push(Command::ReleasePort {
        node_id: link.target.clone(),
        port: link.target_port.clone(),
    });
    Ok(batch)
}

/// Plans the atomic batch for deleting a node: every incident link goes
/// through the link-removal policy, then the node itself is deleted, which
/// also drops any then-orphaned variable name.
pub fn plan_node_delete(graph: &RawGraph, node_id: &str) -> CommandBatch {
    let mut batch = CommandBatch::new();
    let mut cleared: AHashSet<NodeId> = AHashSet::new();

    for link in &graph.links {
        if link.source == node_id {
            if let Some(target) = graph.node(&link.target)
                && target.variable_name.is_some()
                && graph.count_in_ports(&link.target) == 1
                && cleared.insert(link.target.clone())
            {
                batch.push(Command::RemoveVariable {
                    node_id: link.target.clone(),
                });
            }
            batch.push(Command::RemoveLink {
                link_id: link.id.clone(),
            });
            batch.push(Command::ReleasePort {
                node_id: link.target.clone(),
                port: link.target_port.clone(),
            });
        } else if link.target == node_id {
            if let Some(source) = graph.node(&link.source)
                && source.variable_name.is_some()
                && graph.out_degree(&link.source) == 2
                && cleared.insert(link.source.clone())
            {
                batch.push(Command::RemoveVariable {
                    node_id: link.source.clone(),
                });
            }
            batch.push(Command::RemoveLink {
                link_id: link.id.clone(),
            });
        }
    }

    batch.push(Command::DeleteNode {
        node_id: node_id.to_string(),
    });
    batch
}
