//! A small built-in adapter/language pair ("DemoScript") used by the test
//! suites and as a reference implementation of the adapter contract. It
//! emits a pseudo-imperative statement language: named values become
//! `let` bindings, everything else is inlined into its consumer.

use super::{Adapter, Language, NodeTemplate};
use crate::codegen::{Fragment, RenderContext};
use crate::error::GenerateError;
use crate::graph::{NodeId, NormalizedGraph, RawGraph, ResolvedInput};
use crate::validate::{Diagnostic, DiagnosticKind};
use ahash::{AHashMap, AHashSet};

/// Emits either a `let` binding plus a variable reference (when the node
/// carries a variable name) or the bare expression for inlining, wrapped in
/// a node span so the inlined range still maps back to its node.
fn bind_or_inline(context: &mut RenderContext<'_>, expr: Fragment) {
    if let Some(name) = context.variable_name() {
        let name = name.to_string();
        let node_id = context.node_id().clone();
        let mut binding = Fragment::new();
        binding.text("let ");
        binding.variable(node_id.clone(), name.clone());
        binding.text(" = ");
        binding.extend(expr);
        binding.text(";");
        context.emit_statement(binding);
        context.set_inline(Fragment::variable_ref(node_id, name));
    } else {
        context.set_inline(Fragment::node(context.node_id().clone(), expr));
    }
}

struct NumberTemplate;

impl NodeTemplate for NumberTemplate {
    fn type_key(&self) -> &str {
        "number"
    }

    fn render(&self, context: &mut RenderContext<'_>) -> Result<(), GenerateError> {
        let value = context
            .attr("value")
            .cloned()
            .unwrap_or_else(|| serde_json::json!(0));
        let expr = Fragment::from_text(context.language().literal(&value));
        bind_or_inline(context, expr);
        Ok(())
    }
}

struct InputTemplate;

impl NodeTemplate for InputTemplate {
    fn type_key(&self) -> &str {
        "input"
    }

    fn render(&self, context: &mut RenderContext<'_>) -> Result<(), GenerateError> {
        let name = context
            .attr("name")
            .and_then(|v| v.as_str())
            .unwrap_or("unnamed")
            .to_string();
        let expr = Fragment::from_text(format!("${name}"));
        bind_or_inline(context, expr);
        Ok(())
    }
}

struct PrintTemplate;

impl NodeTemplate for PrintTemplate {
    fn type_key(&self) -> &str {
        "print"
    }

    fn render(&self, context: &mut RenderContext<'_>) -> Result<(), GenerateError> {
        let value = context.input(0)?.clone();
        let mut statement = Fragment::new();
        statement.text("print(");
        statement.extend(value);
        statement.text(");");
        context.emit_statement(statement);
        Ok(())
    }
}

/// Defines the operator templates and their registration in one place, so a
/// new operator is a single added line.
macro_rules! define_operator_templates {
    ( $( ($unary_struct:ident, $unary_key:expr, Unary, $unary_symbol:expr) ),* $(,)? ;
      $( ($binary_struct:ident, $binary_key:expr, Binary, $binary_symbol:expr) ),* $(,)? ) => {
        $(
            struct $unary_struct;
            impl NodeTemplate for $unary_struct {
                fn type_key(&self) -> &str { $unary_key }
                fn render(&self, context: &mut RenderContext<'_>) -> Result<(), GenerateError> {
                    let value = context.input(0)?.clone();
                    let mut expr = Fragment::new();
                    expr.text(concat!("(", $unary_symbol));
                    expr.extend(value);
                    expr.text(")");
                    bind_or_inline(context, expr);
                    Ok(())
                }
            }
        )*
        $(
            struct $binary_struct;
            impl NodeTemplate for $binary_struct {
                fn type_key(&self) -> &str { $binary_key }
                fn render(&self, context: &mut RenderContext<'_>) -> Result<(), GenerateError> {
                    let left = context.input(0)?.clone();
                    let right = context.input(1)?.clone();
                    let mut expr = Fragment::new();
                    expr.text("(");
                    expr.extend(left);
                    expr.text(concat!(" ", $binary_symbol, " "));
                    expr.extend(right);
                    expr.text(")");
                    bind_or_inline(context, expr);
                    Ok(())
                }
            }
        )*

        fn register_default_templates(registry: &mut AHashMap<String, Box<dyn NodeTemplate>>) {
            registry.insert("number".to_string(), Box::new(NumberTemplate));
            registry.insert("input".to_string(), Box::new(InputTemplate));
            registry.insert("print".to_string(), Box::new(PrintTemplate));
            $( registry.insert($unary_key.to_string(), Box::new($unary_struct)); )*
            $( registry.insert($binary_key.to_string(), Box::new($binary_struct)); )*
        }
    };
}

define_operator_templates! {
    (NotTemplate, "not", Unary, "!"),
    (NegTemplate, "neg", Unary, "-"),

    ;

    (AddTemplate, "add", Binary, "+"),
    (SubTemplate, "sub", Binary, "-"),
    (MulTemplate, "mul", Binary, "*"),
    (GtTemplate, "gt", Binary, ">"),
    (LtTemplate, "lt", Binary, "<"),
    (AndTemplate, "and", Binary, "&&"),
    (OrTemplate, "or", Binary, "||"),
}

/// What a node type produces, for the structural type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Number,
    Bool,
}

fn output_kind(node_type: &str) -> Option<ValueKind> {
    match node_type {
        "number" | "input" | "add" | "sub" | "mul" | "neg" => Some(ValueKind::Number),
        "gt" | "lt" | "and" | "or" | "not" => Some(ValueKind::Bool),
        _ => None,
    }
}

fn expected_input_kind(node_type: &str) -> Option<ValueKind> {
    match node_type {
        "add" | "sub" | "mul" | "neg" | "gt" | "lt" => Some(ValueKind::Number),
        "and" | "or" | "not" => Some(ValueKind::Bool),
        _ => None,
    }
}

pub struct DemoAdapter {
    templates: AHashMap<String, Box<dyn NodeTemplate>>,
}

impl DemoAdapter {
    pub fn new() -> Self {
        let mut templates: AHashMap<String, Box<dyn NodeTemplate>> = AHashMap::new();
        register_default_templates(&mut templates);
        Self { templates }
    }
}

impl Default for DemoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for DemoAdapter {
    fn name(&self) -> &str {
        "demo"
    }

    fn node_templates(&self) -> &AHashMap<String, Box<dyn NodeTemplate>> {
        &self.templates
    }

    fn is_type_input(&self, node_type: &str) -> bool {
        matches!(node_type, "number" | "input")
    }

    fn validate_graph(
        &self,
        _raw: &RawGraph,
        normalized: &NormalizedGraph,
        _inputs: &[NodeId],
        _language: &dyn Language,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (id, node) in normalized.iter() {
            let Some(expected) = expected_input_kind(&node.node_type) else {
                continue;
            };
            for (port, input) in &node.inputs {
                let found = match input {
                    ResolvedInput::Reference(source) => normalized
                        .get(source)
                        .and_then(|upstream| output_kind(&upstream.node_type)),
                    ResolvedInput::Literal(value) if value.is_boolean() => Some(ValueKind::Bool),
                    ResolvedInput::Literal(value) if value.is_number() => Some(ValueKind::Number),
                    _ => None,
                };
                if let Some(found) = found
                    && found != expected
                {
                    diagnostics.push(
                        Diagnostic::error(
                            DiagnosticKind::TypeMismatch,
                            format!(
                                "Port '{}' of node '{}' expects a {:?} value but receives a {:?}",
                                port, id, expected, found
                            ),
                            7,
                        )
                        .anchored_to(id.clone()),
                    );
                }
            }
        }
        diagnostics
    }
}

pub struct DemoLanguage;

impl Language for DemoLanguage {
    fn id(&self) -> &str {
        "demoscript"
    }

    fn name(&self) -> &str {
        "DemoScript"
    }

    fn highlight_mode(&self) -> &str {
        "javascript"
    }

    fn name_node(&self, template: &dyn NodeTemplate, used_variables: &AHashSet<String>) -> String {
        let base: String = template
            .label()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        let base = if base.is_empty() { "value".to_string() } else { base };

        if !used_variables.contains(&base) {
            return base;
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{base}{counter}");
            if !used_variables.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}
