use crate::adapter::{Language, NodeTemplate};
use crate::error::GenerateError;
use crate::graph::{NodeId, NormalizedGraph, NormalizedNode, ResolvedInput};
use ahash::{AHashMap, AHashSet};
use log::trace;
use std::collections::BTreeSet;

mod builder;

pub use builder::CodeBuilder;

/// What a range of generated text stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Node,
    Variable,
}

/// A tagged `[start, end)` byte range over the generated text, associating
/// it with a node or an emitted variable name. Rebuilt wholesale on every
/// regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub node_id: NodeId,
    pub start: usize,
    pub end: usize,
}

/// One piece of a [`Fragment`]: plain text, an emitted variable name, or a
/// nested range attributed to a node. Nesting is what lets an inlined
/// upstream expression keep its own node marker inside the consumer's
/// statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Text(String),
    Variable { node_id: NodeId, name: String },
    Node { node_id: NodeId, children: Vec<Span> },
}

/// A piece of code under construction, carrying its marker structure
/// alongside the text. Templates compose fragments; the builder flattens
/// them into the final string plus offset markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    spans: Vec<Span>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let mut fragment = Self::new();
        fragment.text(text.into());
        fragment
    }

    /// A lone reference to a node's variable name.
    pub fn variable_ref(node_id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            spans: vec![Span::Variable {
                node_id: node_id.into(),
                name: name.into(),
            }],
        }
    }

    /// Wraps `inner` in a node span, attributing its whole range to the node.
    pub fn node(node_id: impl Into<NodeId>, inner: Fragment) -> Self {
        Self {
            spans: vec![Span::Node {
                node_id: node_id.into(),
                children: inner.spans,
            }],
        }
    }

    /// Appends plain text, merging with a trailing text span.
    pub fn text(&mut self, text: impl AsRef<str>) {
        if let Some(Span::Text(existing)) = self.spans.last_mut() {
            existing.push_str(text.as_ref());
        } else {
            self.spans.push(Span::Text(text.as_ref().to_string()));
        }
    }

    /// Appends a variable-name occurrence attributed to `node_id`.
    pub fn variable(&mut self, node_id: impl Into<NodeId>, name: impl Into<String>) {
        self.spans.push(Span::Variable {
            node_id: node_id.into(),
            name: name.into(),
        });
    }

    pub fn extend(&mut self, other: Fragment) {
        for span in other.spans {
            match span {
                Span::Text(text) => self.text(text),
                other => self.spans.push(other),
            }
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Everything a node template sees while rendering one node: the node's
/// resolved input expressions, its variable name, its adapter config, and
/// the sinks for what it produces (inline expression and/or statements).
pub struct RenderContext<'a> {
    node_id: &'a NodeId,
    node: &'a NormalizedNode,
    language: &'a dyn Language,
    inputs: Vec<Option<Fragment>>,
    statements: Vec<Fragment>,
    inline: Option<Fragment>,
}

impl<'a> RenderContext<'a> {
    pub fn node_id(&self) -> &NodeId {
        self.node_id
    }

    pub fn node_type(&self) -> &str {
        &self.node.node_type
    }

    pub fn variable_name(&self) -> Option<&str> {
        self.node.variable_name.as_deref()
    }

    pub fn language(&self) -> &dyn Language {
        self.language
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// The expression fragment resolved for the input port at `index`.
    pub fn input(&self, index: usize) -> Result<&Fragment, GenerateError> {
        self.inputs
            .get(index)
            .and_then(|input| input.as_ref())
            .ok_or_else(|| {
                let port = self
                    .node
                    .inputs
                    .get(index)
                    .map(|(port, _)| port.clone())
                    .unwrap_or_else(|| index.to_string());
                GenerateError::Template {
                    node_id: self.node_id.clone(),
                    message: format!("input port '{port}' is unresolved"),
                }
            })
    }

    /// Adapter-opaque node configuration, by key.
    pub fn attr(&self, key: &str) -> Option<&serde_json::Value> {
        self.node.attributes.get(key)
    }

    /// Emits a full statement attributed to this node.
    pub fn emit_statement(&mut self, fragment: Fragment) {
        self.statements.push(fragment);
    }

    /// Registers the expression consumers of this node's output will splice
    /// in. A node that never calls this cannot be used as an input.
    pub fn set_inline(&mut self, fragment: Fragment) {
        self.inline = Some(fragment);
    }
}

/// Topological emission over the normalized graph: dependencies first, ties
/// broken by node id so output is deterministic for a given graph shape.
/// Each node's template renders its fragment; the builder receives the
/// flattened text and markers wholesale. On failure the builder's previous
/// text and markers are left untouched.
pub fn generate(
    builder: &mut CodeBuilder,
    templates: &AHashMap<String, Box<dyn NodeTemplate>>,
    graph: &NormalizedGraph,
    language: &dyn Language,
) -> Result<(), GenerateError> {
    let order = emission_order(graph)?;
    trace!("generating code for {} nodes", order.len());

    let mut inline_exprs: AHashMap<&str, Fragment> = AHashMap::new();
    let mut statements: Vec<Fragment> = Vec::new();

    for node_id in &order {
        let Some(node) = graph.get(node_id) else {
            continue;
        };
        let template =
            templates
                .get(&node.node_type)
                .ok_or_else(|| GenerateError::UnknownNodeType {
                    node_id: (*node_id).clone(),
                    type_name: node.node_type.clone(),
                })?;

        let inputs: Vec<Option<Fragment>> = node
            .inputs
            .iter()
            .map(|(_, input)| match input {
                ResolvedInput::Literal(value) => {
                    Some(Fragment::from_text(language.literal(value)))
                }
                ResolvedInput::Reference(source) => inline_exprs.get(source.as_str()).cloned(),
                ResolvedInput::Missing => None,
            })
            .collect();

        let mut context = RenderContext {
            node_id,
            node,
            language,
            inputs,
            statements: Vec::new(),
            inline: None,
        };
        template.render(&mut context)?;

        for statement in context.statements {
            let mut line = Fragment::node((*node_id).clone(), statement);
            line.text("\n");
            statements.push(line);
        }
        if let Some(inline) = context.inline {
            inline_exprs.insert(node_id.as_str(), inline);
        }
    }

    builder.install(&statements);
    Ok(())
}

/// Kahn's algorithm with a `BTreeSet` ready queue: among nodes whose
/// dependencies are all emitted, the lexicographically smallest id goes
/// first. Leftover nodes mean a dependency cycle, which validation should
/// already have excluded.
fn emission_order(graph: &NormalizedGraph) -> Result<Vec<&NodeId>, GenerateError> {
    let mut indegree: AHashMap<&str, usize> = graph
        .iter()
        .map(|(id, node)| {
            let references = node
                .inputs
                .iter()
                .filter(|(_, input)| matches!(input, ResolvedInput::Reference(_)))
                .count();
            (id.as_str(), references)
        })
        .collect();

    let mut ready: BTreeSet<&NodeId> = graph
        .iter()
        .filter(|(id, _)| indegree.get(id.as_str()) == Some(&0))
        .map(|(id, _)| id)
        .collect();

    let mut order: Vec<&NodeId> = Vec::with_capacity(graph.len());
    while let Some(node_id) = ready.pop_first() {
        order.push(node_id);
        let Some(node) = graph.get(node_id) else {
            continue;
        };
        for consumer in &node.consumers {
            if let Some(remaining) = indegree.get_mut(consumer.as_str()) {
                *remaining -= 1;
                if *remaining == 0
                    && let Some((id, _)) = graph.iter().find(|(id, _)| *id == consumer)
                {
                    ready.insert(id);
                }
            }
        }
    }

    if order.len() != graph.len() {
        let emitted: AHashSet<&str> = order.iter().map(|id| id.as_str()).collect();
        let mut cycle: Vec<NodeId> = graph
            .iter()
            .filter(|(id, _)| !emitted.contains(id.as_str()))
            .map(|(id, _)| id.clone())
            .collect();
        cycle.sort();
        return Err(GenerateError::CircularDependency { cycle });
    }
    Ok(order)
}
