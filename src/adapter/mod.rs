use crate::codegen::{self, CodeBuilder, RenderContext};
use crate::error::GenerateError;
use crate::graph::{NodeId, NormalizedGraph, RawGraph};
use crate::validate::Diagnostic;
use ahash::{AHashMap, AHashSet};

mod demo;

pub use demo::{DemoAdapter, DemoLanguage};

/// Renders the code fragment for one node type. Selected by type key from
/// the adapter's template catalog; new node types register an
/// implementation instead of extending a central branch.
pub trait NodeTemplate: Send + Sync {
    /// The type key this template is registered under.
    fn type_key(&self) -> &str;

    /// Human-readable label, also the seed for generated variable names.
    fn label(&self) -> &str {
        self.type_key()
    }

    fn render(&self, context: &mut RenderContext<'_>) -> Result<(), GenerateError>;
}

/// A target output language: variable naming and editor metadata.
pub trait Language {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Syntax-highlighting mode identifier for the text surface.
    fn highlight_mode(&self) -> &str;

    /// Proposes a variable name for a node instantiated from `template`,
    /// disjoint from the names already in use.
    fn name_node(&self, template: &dyn NodeTemplate, used_variables: &AHashSet<String>) -> String;

    /// Renders a literal port default as source text.
    fn literal(&self, value: &serde_json::Value) -> String {
        value.to_string()
    }
}

/// The external collaborator supplying node templates, validation rules and
/// the code-generation strategy for one target language/framework.
pub trait Adapter {
    fn name(&self) -> &str;

    /// The template catalog, keyed by node type.
    fn node_templates(&self) -> &AHashMap<String, Box<dyn NodeTemplate>>;

    /// Whether nodes of this type act as graph inputs.
    fn is_type_input(&self, node_type: &str) -> bool;

    /// Adapter-specific structural and type checks, run between the
    /// dangling-port pass and cycle detection.
    fn validate_graph(
        &self,
        raw: &RawGraph,
        normalized: &NormalizedGraph,
        inputs: &[NodeId],
        language: &dyn Language,
    ) -> Vec<Diagnostic>;

    /// Emits source text and markers into the builder. The default is the
    /// topological emission over the template catalog; adapters with a
    /// different strategy may replace it.
    fn generate_code(
        &self,
        builder: &mut CodeBuilder,
        normalized: &NormalizedGraph,
        _inputs: &[NodeId],
        _used_variables: &AHashSet<String>,
        language: &dyn Language,
    ) -> Result<(), GenerateError> {
        codegen::generate(builder, self.node_templates(), normalized, language)
    }
}
