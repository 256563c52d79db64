use crate::adapter::{Adapter, Language};
use crate::codegen::{CodeBuilder, Marker};
use crate::command::{Command, CommandBatch};
use crate::error::{GenerateError, SessionError};
use crate::graph::{self, Position, RawGraph, RawLink};
use crate::highlight::{Destination, HighlightBoard, HighlightEvent, HighlightKind};
use crate::registry::{PortRegistry, policy};
use crate::sync::{EditOutcome, MarkerSync, TextEdit};
use crate::validate::{self, Diagnostic, DiagnosticKind, Severity};
use ahash::AHashSet;
use log::{debug, trace};

/// What a [`DocumentSession::refresh`] pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The code view is hidden; generation only happens when it has to.
    Hidden,
    /// The fingerprint matched the previous pass: no code-relevant change,
    /// nothing re-validated or regenerated.
    Unchanged,
    /// Diagnostics were found; generation did not run and the previously
    /// generated text and markers are preserved untouched.
    Invalid,
    /// The graph validated cleanly and code was (re)generated.
    Regenerated,
}

/// The per-document context object owning everything this core derives
/// from one open document: the raw graph, the occupied-ports table, the
/// used-variable set, highlights, generated code and live markers.
///
/// All operations are synchronous, same-turn computations; the canvas and
/// the text view observe this state read-only and feed user gestures back
/// in as commands.
pub struct DocumentSession {
    graph: RawGraph,
    adapter: Box<dyn Adapter>,
    language: Box<dyn Language>,
    used_variables: AHashSet<String>,
    show_code_view: bool,
    registry: PortRegistry,
    highlights: HighlightBoard,
    builder: CodeBuilder,
    sync: MarkerSync,
    fingerprint: Option<u64>,
    diagnostics: Vec<Diagnostic>,
}

impl DocumentSession {
    pub fn new(graph: RawGraph, adapter: Box<dyn Adapter>, language: Box<dyn Language>) -> Self {
        let registry = PortRegistry::derive_from(&graph);
        let used_variables = graph.used_variable_names().map(str::to_string).collect();
        Self {
            graph,
            adapter,
            language,
            used_variables,
            show_code_view: true,
            registry,
            highlights: HighlightBoard::new(),
            builder: CodeBuilder::new(),
            sync: MarkerSync::new(),
            fingerprint: None,
            diagnostics: Vec::new(),
        }
    }

    /// Re-derives everything downstream of the graph: normalize,
    /// fingerprint-gate, validate, and (only when clean) regenerate code
    /// and markers. The fingerprint is the sole de-duplication mechanism:
    /// view-only changes never trigger re-validation or regeneration.
    pub fn refresh(&mut self) -> Result<RefreshOutcome, SessionError> {
        if !self.show_code_view {
            return Ok(RefreshOutcome::Hidden);
        }

        let (normalized, inputs) =
            graph::normalize(&self.graph, |t| self.adapter.is_type_input(t))?;
        let fingerprint = graph::fingerprint(&normalized);
        if self.fingerprint == Some(fingerprint) {
            trace!("fingerprint unchanged, skipping regeneration");
            return Ok(RefreshOutcome::Unchanged);
        }
        self.fingerprint = Some(fingerprint);

        let diagnostics = validate::validate(
            &self.graph,
            &normalized,
            &inputs,
            self.adapter.as_ref(),
            self.language.as_ref(),
        );
        if !diagnostics.is_empty() {
            debug!("validation found {} diagnostics", diagnostics.len());
            self.diagnostics = diagnostics;
            self.project_error_highlights();
            return Ok(RefreshOutcome::Invalid);
        }

        match self.adapter.generate_code(
            &mut self.builder,
            &normalized,
            &inputs,
            &self.used_variables,
            self.language.as_ref(),
        ) {
            Ok(()) => {
                let had_errors = !self.diagnostics.is_empty();
                self.diagnostics.clear();
                if had_errors {
                    self.highlights.clear();
                }
                if self.builder.did_code_change() {
                    self.sync.rebind(self.builder.markers(), self.builder.code());
                }
                debug!(
                    "regenerated {} bytes, {} markers",
                    self.builder.code().len(),
                    self.builder.markers().len()
                );
                Ok(RefreshOutcome::Regenerated)
            }
            // Belt and suspenders: validation should already have excluded
            // cycles, but a template may still report one.
            Err(err @ GenerateError::CircularDependency { .. }) => {
                self.diagnostics = vec![Diagnostic {
                    node_id: None,
                    kind: DiagnosticKind::CircularDependency,
                    message: err.to_string(),
                    severity: Severity::Error,
                    importance: 10,
                }];
                self.project_error_highlights();
                Ok(RefreshOutcome::Invalid)
            }
            // Any other template failure is fatal for this pass; the
            // previous text and markers stay displayed unchanged.
            Err(other) => Err(other.into()),
        }
    }

    /// Applies a command batch as one atomic unit: a caller observing the
    /// session between `apply` calls never sees a link mutation without
    /// its paired variable-name and port changes.
    pub fn apply(&mut self, batch: CommandBatch) -> Result<(), SessionError> {
        for command in batch {
            match command {
                Command::AddLink(link) => self.graph.add_link(link),
                Command::RemoveLink { link_id } => {
                    self.graph.remove_link(&link_id);
                }
                Command::SetVariable { node_id, name } => {
                    if let Some(node) = self.graph.node_mut(&node_id) {
                        if let Some(old) = node.variable_name.take() {
                            self.used_variables.remove(&old);
                        }
                        node.variable_name = Some(name.clone());
                        self.used_variables.insert(name);
                    }
                }
                Command::RemoveVariable { node_id } => {
                    if let Some(node) = self.graph.node_mut(&node_id)
                        && let Some(old) = node.variable_name.take()
                    {
                        self.used_variables.remove(&old);
                    }
                }
                Command::ReservePort { node_id, port } => {
                    self.registry.reserve(&node_id, &port)?;
                }
                Command::ReleasePort { node_id, port } => {
                    self.registry.release(&node_id, &port);
                }
                Command::MoveNode { node_id, x, y } => {
                    if let Some(node) = self.graph.node_mut(&node_id) {
                        node.position = Position { x, y };
                    }
                }
                Command::DeleteNode { node_id } => {
                    if let Some((node, _)) = self.graph.remove_node(&node_id) {
                        if let Some(old) = node.variable_name {
                            self.used_variables.remove(&old);
                        }
                        self.registry.forget_node(&node_id);
                    }
                }
            }
        }
        Ok(())
    }

    /// Connects a new link after connection-time validation, applying the
    /// naming policy batch atomically with it.
    pub fn connect(&mut self, link: RawLink) -> Result<(), SessionError> {
        policy::can_connect(
            &self.graph,
            &self.registry,
            &link.source,
            &link.target,
            &link.target_port,
        )
        .map_err(|reason| SessionError::ConnectionRejected { reason })?;
        let batch = policy::plan_link_add(
            &self.graph,
            link,
            self.adapter.as_ref(),
            self.language.as_ref(),
            &self.used_variables,
        );
        self.apply(batch)
    }

    /// Removes a link together with the variable-name changes the removal
    /// policy pairs with it.
    pub fn disconnect(&mut self, link_id: &str) -> Result<(), SessionError> {
        let batch = policy::plan_link_removal(&self.graph, link_id)?;
        self.apply(batch)
    }

    /// Deletes a node, cascading to its incident links and any
    /// then-orphaned variable names.
    pub fn delete_node(&mut self, node_id: &str) -> Result<(), SessionError> {
        let batch = policy::plan_node_delete(&self.graph, node_id);
        self.apply(batch)
    }

    pub fn move_node(&mut self, node_id: &str, x: f64, y: f64) -> Result<(), SessionError> {
        self.apply(
            vec![Command::MoveNode {
                node_id: node_id.to_string(),
                x,
                y,
            }]
            .into(),
        )
    }

    /// Renames a node's variable, e.g. from the canvas-side name input.
    pub fn rename_variable(&mut self, node_id: &str, name: &str) -> Result<(), SessionError> {
        self.apply(
            vec![Command::SetVariable {
                node_id: node_id.to_string(),
                name: name.to_string(),
            }]
            .into(),
        )
    }

    /// Offers a text-surface edit to the synchronizer. An accepted edit is
    /// dispatched as a rename and suppresses the change report of the next
    /// regeneration, so the text surface is not clobbered mid-typing.
    pub fn handle_text_edit(&mut self, edit: &TextEdit) -> Result<EditOutcome, SessionError> {
        let outcome = self.sync.apply_edit(edit);
        if let EditOutcome::VariableRenamed { node_id, new_name } = &outcome {
            self.builder.suppress_next_change_report();
            self.apply(
                vec![Command::SetVariable {
                    node_id: node_id.clone(),
                    name: new_name.clone(),
                }]
                .into(),
            )?;
        }
        Ok(outcome)
    }

    /// Relays a cursor move from the text surface, updating the highlight
    /// board with the resulting active-node switch.
    pub fn cursor_moved(&mut self, offset: usize) -> Vec<HighlightEvent> {
        let events = self.sync.cursor_moved(offset);
        for event in &events {
            self.highlights.apply(event);
        }
        events
    }

    pub fn add_highlight(&mut self, node_id: &str, kind: HighlightKind, destination: Destination) {
        self.highlights.add(node_id.to_string(), kind, destination);
    }

    pub fn remove_highlight(
        &mut self,
        node_id: &str,
        kind: HighlightKind,
        destination: Destination,
    ) {
        self.highlights.remove(node_id, kind, destination);
    }

    /// Tab switch away/back: highlights reset and the fingerprint is
    /// dropped so the next refresh regenerates from scratch.
    pub fn on_tab_switched(&mut self) {
        self.highlights.clear();
        self.fingerprint = None;
    }

    pub fn set_code_view_visible(&mut self, visible: bool) {
        self.show_code_view = visible;
    }

    fn project_error_highlights(&mut self) {
        self.highlights.clear();
        for diagnostic in &self.diagnostics {
            if let Some(node_id) = &diagnostic.node_id {
                self.highlights
                    .add(node_id.clone(), HighlightKind::Error, Destination::Canvas);
            }
        }
    }

    pub fn graph(&self) -> &RawGraph {
        &self.graph
    }

    pub fn code(&self) -> &str {
        self.builder.code()
    }

    pub fn markers(&self) -> &[Marker] {
        self.builder.markers()
    }

    pub fn did_code_change(&self) -> bool {
        self.builder.did_code_change()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn highlights(&self) -> &HighlightBoard {
        &self.highlights
    }

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    pub fn used_variables(&self) -> &AHashSet<String> {
        &self.used_variables
    }

    pub fn sync(&self) -> &MarkerSync {
        &self.sync
    }

    pub fn variable_name(&self, node_id: &str) -> Option<&str> {
        self.graph
            .node(node_id)
            .and_then(|n| n.variable_name.as_deref())
    }
}
