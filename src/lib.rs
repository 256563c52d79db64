//! # Tsunagi - Graph-to-Code Translation and Synchronization Core
//!
//! **Tsunagi** is the translation and synchronization core of a visual
//! node-graph editor: it turns an arbitrary, mutable, possibly-cyclic
//! visual graph into a validated intermediate representation, deterministic
//! generated source text with position markers, and a live mapping between
//! graph nodes/variables and ranges of that text, kept consistent while
//! both the graph and the text are edited.
//!
//! The drawing surface and the text widget are external collaborators:
//! this crate owns everything between them.
//!
//! ## Core Workflow
//!
//! 1.  **Load the graph**: deserialize the editor shell's adapter-opaque
//!     JSON into a [`graph::RawGraph`].
//! 2.  **Open a session**: a [`session::DocumentSession`] owns the
//!     per-document state (occupied ports, used variable names,
//!     highlights, generated code, live markers). There are no ambient
//!     singletons.
//! 3.  **Refresh**: every qualifying state change runs normalize →
//!     fingerprint gate → validate → generate. Diagnostics block
//!     generation and drive error highlighting; clean graphs produce text
//!     plus markers.
//! 4.  **Relay gestures**: link connects/disconnects, node deletes, text
//!     edits and cursor moves all come back through the session as
//!     commands, applied atomically with their paired variable-name and
//!     port bookkeeping.
//!
//! ## Quick Start
//!
//! ```rust
//! use tsunagi::prelude::*;
//!
//! let graph = RawGraph::from_json(
//!     r#"{
//!         "nodes": [
//!             { "id": "n1", "nodeType": "number", "outPorts": ["out"],
//!               "attributes": { "value": 3 } },
//!             { "id": "p1", "nodeType": "print", "inPorts": ["value"] }
//!         ],
//!         "links": [
//!             { "id": "l1", "source": "n1", "target": "p1", "targetPort": "value" }
//!         ]
//!     }"#,
//! )
//! .unwrap();
//!
//! let mut session = DocumentSession::new(
//!     graph,
//!     Box::new(DemoAdapter::new()),
//!     Box::new(DemoLanguage),
//! );
//!
//! let outcome = session.refresh().unwrap();
//! assert_eq!(outcome, RefreshOutcome::Regenerated);
//! assert_eq!(session.code(), "print(3);\n");
//!
//! // Every marker maps a text range back to its node.
//! for marker in session.markers() {
//!     println!("{:?} {} -> {:?}", marker.kind, marker.node_id,
//!              &session.code()[marker.start..marker.end]);
//! }
//! ```

pub mod adapter;
pub mod codegen;
pub mod command;
pub mod error;
pub mod graph;
pub mod highlight;
pub mod prelude;
pub mod registry;
pub mod session;
pub mod sync;
pub mod validate;
