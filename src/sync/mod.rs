//! The protocol that keeps the text surface's live markers consistent while
//! the generated text is edited in place (variable renames) or wholesale
//! regenerated (structural graph edits).
//!
//! Offsets are byte offsets into the generated text; the text-surface shell
//! converts to and from its own row/column coordinates.

use crate::codegen::{Marker, MarkerKind};
use crate::graph::NodeId;
use crate::highlight::{Destination, HighlightEvent, HighlightKind};

/// One in-place mutation of the text surface: `deleted` bytes at `offset`
/// replaced by `inserted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub offset: usize,
    pub deleted: usize,
    pub inserted: String,
}

/// What became of a text edit offered to the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edit did not fall inside a variable-name range. The text surface
    /// is read-only everywhere else, so the edit must not be applied.
    Rejected,
    /// The edit renamed a variable in place. The owner should dispatch this
    /// as a variable-rename command.
    VariableRenamed { node_id: NodeId, new_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Markers match the current text exactly.
    #[default]
    Clean,
    /// A variable range was edited by direct keystrokes; marker offsets
    /// have floated with the edits since the last regeneration.
    LocallyEdited,
}

#[derive(Debug, Clone)]
struct AnchoredMarker {
    kind: MarkerKind,
    node_id: NodeId,
    start: usize,
    end: usize,
    /// Right-sticky end: an insertion exactly at the end boundary extends
    /// the range, so the tracked range always covers the live name.
    sticky_end: bool,
}

/// Per-document marker state machine over the generated text. Returns to
/// [`SyncState::Clean`] only on a full cold regeneration via
/// [`MarkerSync::rebind`].
#[derive(Debug, Clone, Default)]
pub struct MarkerSync {
    text: String,
    markers: Vec<AnchoredMarker>,
    state: SyncState,
    active_node: Option<NodeId>,
}

impl MarkerSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts freshly generated text and markers after a cold regeneration.
    pub fn rebind(&mut self, markers: &[Marker], code: &str) {
        self.text = code.to_string();
        self.markers = markers
            .iter()
            .map(|m| AnchoredMarker {
                kind: m.kind,
                node_id: m.node_id.clone(),
                start: m.start,
                end: m.end,
                sticky_end: m.kind == MarkerKind::Variable,
            })
            .collect();
        self.state = SyncState::Clean;
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// The live text as the synchronizer tracks it, edits included.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn active_node(&self) -> Option<&NodeId> {
        self.active_node.as_ref()
    }

    /// Whether an edit (or paste/cut) targeting this range may be applied:
    /// it must fall entirely inside one variable-name range.
    pub fn edit_allowed(&self, offset: usize, deleted: usize) -> bool {
        self.containing_variable(offset, deleted).is_some()
    }

    /// Offers a keystroke/paste/cut edit to the synchronizer. Accepted
    /// edits float every marker by the edit delta and yield the rename for
    /// the owning document to dispatch.
    pub fn apply_edit(&mut self, edit: &TextEdit) -> EditOutcome {
        let Some(index) = self.containing_variable(edit.offset, edit.deleted) else {
            return EditOutcome::Rejected;
        };

        self.text
            .replace_range(edit.offset..edit.offset + edit.deleted, &edit.inserted);
        for marker in &mut self.markers {
            marker.start = transform_boundary(marker.start, false, edit);
            marker.end = transform_boundary(marker.end, marker.sticky_end, edit);
        }

        let marker = &self.markers[index];
        let new_name = self.text[marker.start..marker.end].to_string();
        self.state = SyncState::LocallyEdited;
        EditOutcome::VariableRenamed {
            node_id: marker.node_id.clone(),
            new_name,
        }
    }

    /// Recomputes which node contains the cursor and switches the single
    /// "active" canvas highlight atomically: the old one is removed in the
    /// same batch that adds the new one, so observers never see zero or two
    /// active highlights during a switch.
    pub fn cursor_moved(&mut self, offset: usize) -> Vec<HighlightEvent> {
        let node = self.node_at(offset).cloned();
        if node == self.active_node {
            return Vec::new();
        }

        let mut events = Vec::new();
        if let Some(old) = self.active_node.take() {
            events.push(HighlightEvent::Remove {
                node_id: old,
                kind: HighlightKind::Active,
                destination: Destination::Canvas,
            });
        }
        if let Some(new) = node {
            events.push(HighlightEvent::Add {
                node_id: new.clone(),
                kind: HighlightKind::Active,
                destination: Destination::Canvas,
            });
            self.active_node = Some(new);
        }
        events
    }

    /// The innermost node marker containing `offset`, e.g. for resolving a
    /// pointer position in the code view to a node for hover highlighting.
    pub fn node_at(&self, offset: usize) -> Option<&NodeId> {
        self.markers
            .iter()
            .filter(|m| {
                m.kind == MarkerKind::Node && m.start <= offset && offset < m.end
            })
            .min_by_key(|m| m.end - m.start)
            .map(|m| &m.node_id)
    }

    fn containing_variable(&self, offset: usize, deleted: usize) -> Option<usize> {
        self.markers.iter().position(|m| {
            m.kind == MarkerKind::Variable && m.start <= offset && offset + deleted <= m.end
        })
    }
}

/// Applies an edit delta to a marker boundary: deletion first (boundaries
/// inside the removed range clamp to its start), then insertion (boundaries
/// after the point shift right; a boundary exactly at the point shifts only
/// when right-sticky).
fn transform_boundary(boundary: usize, sticky: bool, edit: &TextEdit) -> usize {
    let point = edit.offset;
    let after_delete = if boundary <= point {
        boundary
    } else if boundary >= point + edit.deleted {
        boundary - edit.deleted
    } else {
        point
    };

    let inserted = edit.inserted.len();
    if after_delete > point || (after_delete == point && sticky) {
        after_delete + inserted
    } else {
        after_delete
    }
}
