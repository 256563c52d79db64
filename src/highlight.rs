use crate::graph::NodeId;

/// Visual emphasis kinds a node can carry on a display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    Hover,
    Active,
    Selected,
    Error,
}

/// The display surface a highlight is destined for. The canvas and the
/// code view only ever talk to each other through this indirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Canvas,
    CodeView,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Highlight {
    pub node_id: NodeId,
    pub kind: HighlightKind,
}

/// An add/remove highlight notification raised toward a display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightEvent {
    Add {
        node_id: NodeId,
        kind: HighlightKind,
        destination: Destination,
    },
    Remove {
        node_id: NodeId,
        kind: HighlightKind,
        destination: Destination,
    },
}

/// Per-document state of active highlights, keyed by destination surface.
///
/// Pure state container, no I/O. For a given destination at most one HOVER
/// highlight is active at a time: adding a hover for a different node
/// implicitly removes the previous one. ACTIVE/SELECTED/ERROR highlights
/// coexist and are keyed by exact (node, kind), so removal must match both.
#[derive(Debug, Clone, Default)]
pub struct HighlightBoard {
    canvas: Vec<Highlight>,
    code_view: Vec<Highlight>,
}

impl HighlightBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node_id: NodeId, kind: HighlightKind, destination: Destination) {
        let list = self.surface_mut(destination);
        if kind == HighlightKind::Hover {
            list.retain(|h| h.kind != HighlightKind::Hover);
        }
        let highlight = Highlight { node_id, kind };
        if !list.contains(&highlight) {
            list.push(highlight);
        }
    }

    pub fn remove(&mut self, node_id: &str, kind: HighlightKind, destination: Destination) {
        self.surface_mut(destination)
            .retain(|h| h.node_id != node_id || h.kind != kind);
    }

    pub fn apply(&mut self, event: &HighlightEvent) {
        match event {
            HighlightEvent::Add {
                node_id,
                kind,
                destination,
            } => self.add(node_id.clone(), *kind, *destination),
            HighlightEvent::Remove {
                node_id,
                kind,
                destination,
            } => self.remove(node_id, *kind, *destination),
        }
    }

    pub fn list(&self, destination: Destination) -> &[Highlight] {
        match destination {
            Destination::Canvas => &self.canvas,
            Destination::CodeView => &self.code_view,
        }
    }

    /// Drops every highlight, e.g. on a document/tab switch.
    pub fn clear(&mut self) {
        self.canvas.clear();
        self.code_view.clear();
    }

    fn surface_mut(&mut self, destination: Destination) -> &mut Vec<Highlight> {
        match destination {
            Destination::Canvas => &mut self.canvas,
            Destination::CodeView => &mut self.code_view,
        }
    }
}
