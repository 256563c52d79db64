use super::{Fragment, Marker, MarkerKind, Span};

/// Owns the generated text and its source-position markers.
///
/// Regeneration replaces both wholesale (the cold path); the warm path is a
/// variable rename originating from a live text anchor, for which
/// [`CodeBuilder::suppress_next_change_report`] makes the next
/// [`CodeBuilder::did_code_change`] report `false` so the consumer does not
/// reapply the text and clobber the cursor.
#[derive(Debug, Clone, Default)]
pub struct CodeBuilder {
    code: String,
    markers: Vec<Marker>,
    changed: bool,
    suppress_next: bool,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently generated text.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Markers over [`CodeBuilder::code`], ordered by start offset (outer
    /// ranges before the ranges they contain).
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Whether the last generation produced text different from the text
    /// before it. Lets a consumer skip reapplying identical text, which
    /// would disturb cursor and undo state.
    pub fn did_code_change(&self) -> bool {
        self.changed
    }

    /// Warm-path handshake: the next generation reports no change even if
    /// the text differs, because the difference originated from the text
    /// surface itself.
    pub fn suppress_next_change_report(&mut self) {
        self.suppress_next = true;
    }

    /// Replaces text and markers from flattened statement fragments.
    pub(crate) fn install(&mut self, statements: &[Fragment]) {
        let mut text = String::new();
        let mut markers = Vec::new();
        for statement in statements {
            flatten(statement.spans(), &mut text, &mut markers);
        }
        markers.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        self.changed = if self.suppress_next {
            self.suppress_next = false;
            false
        } else {
            text != self.code
        };
        self.code = text;
        self.markers = markers;
    }
}

fn flatten(spans: &[Span], text: &mut String, markers: &mut Vec<Marker>) {
    for span in spans {
        match span {
            Span::Text(piece) => text.push_str(piece),
            Span::Variable { node_id, name } => {
                let start = text.len();
                text.push_str(name);
                markers.push(Marker {
                    kind: MarkerKind::Variable,
                    node_id: node_id.clone(),
                    start,
                    end: text.len(),
                });
            }
            Span::Node { node_id, children } => {
                let start = text.len();
                flatten(children, text, markers);
                markers.push(Marker {
                    kind: MarkerKind::Node,
                    node_id: node_id.clone(),
                    start,
                    end: text.len(),
                });
            }
        }
    }
}
