use crate::adapter::{Adapter, Language};
use crate::graph::{NodeId, NormalizedGraph, RawGraph, ResolvedInput};
use ahash::AHashMap;
use itertools::Itertools;

/// How severe a diagnostic is, for display styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    CircularDependency,
    DanglingPort,
    TypeMismatch,
    UnknownNodeType,
    /// Adapter-declared structural checks outside the built-in kinds.
    Custom(String),
}

/// A single finding of the validation pass. Ephemeral: the whole set is
/// recomputed on every pass, replacing the previous one wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Anchors the diagnostic to a node for error highlighting, when one
    /// node is to blame.
    pub node_id: Option<NodeId>,
    pub kind: DiagnosticKind,
    pub message: String,
    pub severity: Severity,
    /// Sort weight: higher values are displayed first.
    pub importance: i32,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, importance: i32) -> Self {
        Self {
            node_id: None,
            kind,
            message: message.into(),
            severity: Severity::Error,
            importance,
        }
    }

    pub fn anchored_to(mut self, node_id: impl Into<NodeId>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }
}

/// Runs the validation passes in order: dangling/required-port resolution,
/// adapter-declared structural and type checks, and cycle detection over
/// the node-dependency graph. The result is sorted by descending
/// importance, ready for display. A non-empty result gates code
/// generation: stale text and markers are preserved untouched.
pub fn validate(
    raw: &RawGraph,
    normalized: &NormalizedGraph,
    inputs: &[NodeId],
    adapter: &dyn Adapter,
    language: &dyn Language,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let templates = adapter.node_templates();
    for (id, node) in normalized.iter() {
        if !templates.contains_key(&node.node_type) {
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::UnknownNodeType,
                    format!(
                        "Node '{}' has an unregistered node type: '{}'",
                        id, node.node_type
                    ),
                    8,
                )
                .anchored_to(id.clone()),
            );
        }
        for (port, input) in &node.inputs {
            if matches!(input, ResolvedInput::Missing) {
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::DanglingPort,
                        format!("Required input port '{port}' of node '{id}' is not connected"),
                        5,
                    )
                    .anchored_to(id.clone()),
                );
            }
        }
    }

    diagnostics.extend(adapter.validate_graph(raw, normalized, inputs, language));

    if let Some(cycle) = find_cycle(normalized) {
        diagnostics.push(Diagnostic::error(
            DiagnosticKind::CircularDependency,
            format!(
                "Circular dependency between nodes: {}",
                cycle.iter().join(" -> ")
            ),
            10,
        ));
    }

    // Stable, so equal-importance diagnostics keep their pass order.
    diagnostics.sort_by(|a, b| b.importance.cmp(&a.importance));
    diagnostics
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Depth-first three-color walk over consumer edges. A back edge to an
/// in-progress node is a cycle; the participants are the stack slice from
/// that node down to the current one.
fn find_cycle(graph: &NormalizedGraph) -> Option<Vec<NodeId>> {
    let mut color: AHashMap<&str, Color> =
        graph.iter().map(|(id, _)| (id.as_str(), Color::White)).collect();

    for (root, _) in graph.iter() {
        if color.get(root.as_str()) != Some(&Color::White) {
            continue;
        }
        let mut stack: Vec<(&NodeId, usize)> = vec![(root, 0)];
        color.insert(root.as_str(), Color::Gray);

        while let Some(&(node, index)) = stack.last() {
            let consumers = graph
                .get(node)
                .map(|n| n.consumers.as_slice())
                .unwrap_or_default();

            if index >= consumers.len() {
                color.insert(node.as_str(), Color::Black);
                stack.pop();
                continue;
            }
            let last = stack.len() - 1;
            stack[last].1 += 1;

            let next = &consumers[index];
            match color.get(next.as_str()) {
                Some(Color::White) => {
                    color.insert(next.as_str(), Color::Gray);
                    stack.push((next, 0));
                }
                Some(Color::Gray) => {
                    let position = stack
                        .iter()
                        .position(|(n, _)| *n == next)
                        .unwrap_or_default();
                    return Some(stack[position..].iter().map(|(n, _)| (*n).clone()).collect());
                }
                _ => {}
            }
        }
    }

    None
}
