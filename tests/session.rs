//! End-to-end document session tests: refresh gating, the naming policy
//! applied through connect/disconnect, text-edit renames and highlights.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use tsunagi::prelude::*;

#[test]
fn refresh_generates_code_and_markers() {
    let mut session = demo_session(simple_graph());

    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Regenerated);
    assert_eq!(session.code(), "print(3);\n");
    assert!(session.did_code_change());
    assert_eq!(session.sync().state(), SyncState::Clean);
    assert_eq!(session.sync().text(), session.code());
}

#[test]
fn refresh_is_skipped_while_the_fingerprint_matches() {
    let mut session = demo_session(simple_graph());
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Regenerated);
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Unchanged);

    // Moving a node is a view-only change.
    session.move_node("n1", 420.0, -17.0).unwrap();
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Unchanged);
}

#[test]
fn hidden_code_view_suspends_generation() {
    let mut session = demo_session(simple_graph());
    session.set_code_view_visible(false);

    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Hidden);
    assert_eq!(session.code(), "");

    session.set_code_view_visible(true);
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Regenerated);
}

#[test]
fn invalid_graph_preserves_the_stale_output() {
    let mut session = demo_session(simple_graph());
    session.refresh().unwrap();
    let stale_code = session.code().to_string();
    let stale_markers = session.markers().to_vec();

    session.disconnect("l1").unwrap();
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Invalid);

    // Generation did not run: text and markers are byte-identical.
    assert_eq!(session.code(), stale_code);
    assert_eq!(session.markers(), stale_markers.as_slice());
    assert_eq!(session.diagnostics()[0].kind, DiagnosticKind::DanglingPort);
    assert_eq!(
        session.highlights().list(Destination::Canvas),
        &[Highlight {
            node_id: "p1".to_string(),
            kind: HighlightKind::Error,
        }]
    );
}

#[test]
fn fixing_the_graph_clears_diagnostics_and_error_highlights() {
    let mut session = demo_session(simple_graph());
    session.refresh().unwrap();
    session.disconnect("l1").unwrap();
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Invalid);

    session.connect(link("l1", "n1", "p1", "value")).unwrap();
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Regenerated);
    assert!(session.diagnostics().is_empty());
    assert!(session.highlights().list(Destination::Canvas).is_empty());
}

#[test]
fn second_consumer_names_the_source_and_removal_reverts_it() {
    let mut session = demo_session(fanout_graph());
    session.refresh().unwrap();
    assert_eq!(session.code(), "print(3);\nprint(0);\n");

    session.connect(link("l2", "a", "c", "value")).unwrap();
    assert_eq!(session.variable_name("a"), Some("number"));
    assert!(session.used_variables().contains("number"));
    assert!(session.registry().is_occupied("c", "value"));

    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Regenerated);
    assert_eq!(
        session.code(),
        "let number = 3;\nprint(number);\nprint(number);\n"
    );

    session.disconnect("l2").unwrap();
    assert_eq!(session.variable_name("a"), None);
    assert!(session.used_variables().is_empty());
    assert!(!session.registry().is_occupied("c", "value"));
    assert!(session.registry().matches(session.graph()));

    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Regenerated);
    assert_eq!(session.code(), "print(3);\nprint(0);\n");
}

#[test]
fn connecting_into_an_occupied_port_is_rejected() {
    let mut session = demo_session(simple_graph());
    let links_before = session.graph().links.len();

    let result = session.connect(link("l9", "n1", "p1", "value"));
    assert!(matches!(
        result,
        Err(SessionError::ConnectionRejected { .. })
    ));
    assert_eq!(session.graph().links.len(), links_before);
}

#[test]
fn deleting_a_consumer_cascades_through_the_naming_policy() {
    let mut session = demo_session(named_fanout_graph());

    session.delete_node("c").unwrap();
    assert!(session.graph().node("c").is_none());
    assert!(session.graph().link("l2").is_none());
    assert_eq!(session.variable_name("a"), None);
    assert!(session.used_variables().is_empty());
    assert!(session.registry().matches(session.graph()));
}

#[test]
fn text_edit_renames_the_variable_without_clobbering_the_surface() {
    let mut session = demo_session(fanout_graph());
    session.connect(link("l2", "a", "c", "value")).unwrap();
    session.refresh().unwrap();
    assert_eq!(
        session.code(),
        "let number = 3;\nprint(number);\nprint(number);\n"
    );

    // Typing "s" at the end of the binding's name.
    let outcome = session
        .handle_text_edit(&TextEdit {
            offset: 10,
            deleted: 0,
            inserted: "s".to_string(),
        })
        .unwrap();
    assert_eq!(
        outcome,
        EditOutcome::VariableRenamed {
            node_id: "a".to_string(),
            new_name: "numbers".to_string(),
        }
    );
    assert_eq!(session.variable_name("a"), Some("numbers"));
    assert!(session.used_variables().contains("numbers"));
    assert!(!session.used_variables().contains("number"));

    // The rename regenerates, but the change report is suppressed so the
    // text surface keeps its cursor; markers stay locally edited.
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Regenerated);
    assert!(!session.did_code_change());
    assert_eq!(
        session.code(),
        "let numbers = 3;\nprint(numbers);\nprint(numbers);\n"
    );
    assert_eq!(session.sync().state(), SyncState::LocallyEdited);
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Unchanged);

    // The next structural change regenerates cold and rebinds.
    session.disconnect("l2").unwrap();
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Regenerated);
    assert!(session.did_code_change());
    assert_eq!(session.sync().state(), SyncState::Clean);
}

#[test]
fn rejected_text_edit_changes_nothing() {
    let mut session = demo_session(simple_graph());
    session.refresh().unwrap();

    let outcome = session
        .handle_text_edit(&TextEdit {
            offset: 0,
            deleted: 5,
            inserted: "show".to_string(),
        })
        .unwrap();
    assert_eq!(outcome, EditOutcome::Rejected);
    assert_eq!(session.code(), "print(3);\n");
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Unchanged);
}

#[test]
fn cursor_moves_drive_the_active_canvas_highlight() {
    let mut session = demo_session(simple_graph());
    session.refresh().unwrap();

    // Offset 6 sits inside the inlined number, the innermost marker.
    let events = session.cursor_moved(6);
    assert_eq!(events.len(), 1);
    assert_eq!(
        session.highlights().list(Destination::Canvas),
        &[Highlight {
            node_id: "n1".to_string(),
            kind: HighlightKind::Active,
        }]
    );

    session.cursor_moved(0);
    assert_eq!(
        session.highlights().list(Destination::Canvas),
        &[Highlight {
            node_id: "p1".to_string(),
            kind: HighlightKind::Active,
        }]
    );
}

#[test]
fn at_most_one_hover_highlight_per_destination() {
    let mut session = demo_session(simple_graph());
    session.add_highlight("n1", HighlightKind::Error, Destination::CodeView);
    session.add_highlight("n1", HighlightKind::Hover, Destination::CodeView);
    session.add_highlight("p1", HighlightKind::Hover, Destination::CodeView);

    // The new hover displaced the old one; the error highlight coexists.
    assert_eq!(
        session.highlights().list(Destination::CodeView),
        &[
            Highlight {
                node_id: "n1".to_string(),
                kind: HighlightKind::Error,
            },
            Highlight {
                node_id: "p1".to_string(),
                kind: HighlightKind::Hover,
            },
        ]
    );

    session.remove_highlight("p1", HighlightKind::Hover, Destination::CodeView);
    assert_eq!(session.highlights().list(Destination::CodeView).len(), 1);
}

#[test]
fn tab_switch_resets_highlights_and_forces_regeneration() {
    let mut session = demo_session(simple_graph());
    session.refresh().unwrap();
    session.add_highlight("n1", HighlightKind::Hover, Destination::Canvas);

    session.on_tab_switched();
    assert!(session.highlights().list(Destination::Canvas).is_empty());

    // The fingerprint was dropped, so the pass runs again; the output is
    // identical, so no change is reported to the text surface.
    assert_eq!(session.refresh().unwrap(), RefreshOutcome::Regenerated);
    assert!(!session.did_code_change());
}
