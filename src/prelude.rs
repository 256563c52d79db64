//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types and traits of the crate, so a
//! consumer can bring the whole surface in with a single `use`.

// Document session
pub use crate::session::{DocumentSession, RefreshOutcome};

// Graph model and normalization
pub use crate::graph::{
    LinkId, NodeId, NormalizedGraph, NormalizedNode, Position, RawGraph, RawLink, RawNode,
    ResolvedInput, fingerprint, normalize,
};

// Commands and the port/variable registry
pub use crate::command::{Command, CommandBatch};
pub use crate::registry::PortRegistry;
pub use crate::registry::policy::{can_connect, plan_link_add, plan_link_removal, plan_node_delete};

// Validation
pub use crate::validate::{Diagnostic, DiagnosticKind, Severity, validate};

// Code generation and markers
pub use crate::codegen::{CodeBuilder, Fragment, Marker, MarkerKind, RenderContext, Span};

// Marker synchronization
pub use crate::sync::{EditOutcome, MarkerSync, SyncState, TextEdit};

// Highlights
pub use crate::highlight::{
    Destination, Highlight, HighlightBoard, HighlightEvent, HighlightKind,
};

// Adapter and language contracts
pub use crate::adapter::{Adapter, DemoAdapter, DemoLanguage, Language, NodeTemplate};

// Error types
pub use crate::error::{GenerateError, GraphError, RegistryError, SessionError};
