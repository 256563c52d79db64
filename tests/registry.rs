//! Occupied-ports registry and link-mutation planner tests.

mod common;

use ahash::AHashSet;
use common::*;
use pretty_assertions::assert_eq;
use tsunagi::prelude::*;

#[test]
fn derives_occupied_ports_from_links() {
    let graph = simple_graph();
    let registry = PortRegistry::derive_from(&graph);

    assert!(registry.is_occupied("p1", "value"));
    assert!(!registry.is_occupied("n1", "out"));
    assert!(registry.matches(&graph));
}

#[test]
fn reserve_then_release_round_trips() {
    let mut registry = PortRegistry::new();
    registry.reserve("p", "value").unwrap();
    assert!(registry.is_occupied("p", "value"));

    let second = registry.reserve("p", "value");
    assert!(matches!(
        second,
        Err(RegistryError::PortAlreadyOccupied { node_id, port })
            if node_id == "p" && port == "value"
    ));

    assert!(registry.release("p", "value"));
    assert!(!registry.is_occupied("p", "value"));
    assert!(!registry.release("p", "value"));
}

#[test]
fn forget_node_drops_all_its_ports() {
    let mut registry = PortRegistry::new();
    registry.reserve("x", "a").unwrap();
    registry.reserve("x", "b").unwrap();
    registry.forget_node("x");
    assert!(!registry.is_occupied("x", "a"));
    assert!(!registry.is_occupied("x", "b"));
}

#[test]
fn can_connect_rejects_invalid_connections() {
    let graph = fanout_graph();
    let registry = PortRegistry::derive_from(&graph);

    // Self-loop.
    assert!(can_connect(&graph, &registry, "a", "a", "value").is_err());
    // Port already occupied by l1.
    assert!(can_connect(&graph, &registry, "a", "b", "value").is_err());
    // Port the target never declared.
    assert!(can_connect(&graph, &registry, "a", "c", "mode").is_err());
    // Unknown endpoint.
    assert!(can_connect(&graph, &registry, "ghost", "c", "value").is_err());

    assert!(can_connect(&graph, &registry, "a", "c", "value").is_ok());
}

#[test]
fn first_consumer_does_not_name_the_source() {
    let mut graph = fanout_graph();
    graph.remove_link("l1").unwrap();

    let batch = plan_link_add(
        &graph,
        link("l1", "a", "b", "value"),
        &DemoAdapter::new(),
        &DemoLanguage,
        &AHashSet::new(),
    );
    let commands: Vec<Command> = batch.into_iter().collect();
    assert_eq!(
        commands,
        vec![
            Command::ReservePort {
                node_id: "b".to_string(),
                port: "value".to_string(),
            },
            Command::AddLink(link("l1", "a", "b", "value")),
        ]
    );
}

#[test]
fn second_consumer_names_the_source_atomically() {
    let graph = fanout_graph();

    let batch = plan_link_add(
        &graph,
        link("l2", "a", "c", "value"),
        &DemoAdapter::new(),
        &DemoLanguage,
        &AHashSet::new(),
    );
    let commands: Vec<Command> = batch.into_iter().collect();
    assert_eq!(
        commands,
        vec![
            Command::ReservePort {
                node_id: "c".to_string(),
                port: "value".to_string(),
            },
            Command::SetVariable {
                node_id: "a".to_string(),
                name: "number".to_string(),
            },
            Command::AddLink(link("l2", "a", "c", "value")),
        ]
    );
}

#[test]
fn generated_name_avoids_names_already_in_use() {
    let graph = fanout_graph();
    let used: AHashSet<String> = ["number".to_string(), "number2".to_string()]
        .into_iter()
        .collect();

    let batch = plan_link_add(
        &graph,
        link("l2", "a", "c", "value"),
        &DemoAdapter::new(),
        &DemoLanguage,
        &used,
    );
    assert!(batch.commands().iter().any(|c| matches!(
        c,
        Command::SetVariable { name, .. } if name == "number3"
    )));
}

#[test]
fn already_named_source_is_not_renamed() {
    let mut graph = fanout_graph();
    graph.node_mut("a").unwrap().variable_name = Some("x".to_string());

    let batch = plan_link_add(
        &graph,
        link("l2", "a", "c", "value"),
        &DemoAdapter::new(),
        &DemoLanguage,
        &AHashSet::new(),
    );
    assert!(
        !batch
            .commands()
            .iter()
            .any(|c| matches!(c, Command::SetVariable { .. }))
    );
}

#[test]
fn losing_the_second_consumer_clears_the_source_name() {
    let mut graph = fanout_graph();
    graph.node_mut("a").unwrap().variable_name = Some("number".to_string());
    graph.add_link(link("l2", "a", "c", "value"));

    let batch = plan_link_removal(&graph, "l2").unwrap();
    let commands: Vec<Command> = batch.into_iter().collect();
    assert_eq!(
        commands,
        vec![
            Command::RemoveVariable {
                node_id: "a".to_string(),
            },
            Command::RemoveLink {
                link_id: "l2".to_string(),
            },
            Command::ReleasePort {
                node_id: "c".to_string(),
                port: "value".to_string(),
            },
        ]
    );
}

#[test]
fn removing_the_only_inbound_link_of_a_named_target_clears_it_too() {
    let mut graph = RawGraph::default();
    graph.add_node(number("a", 1));
    let mut negate = node("t", "neg", &["a"]);
    negate.variable_name = Some("tval".to_string());
    graph.add_node(negate);
    graph.add_link(link("l1", "a", "t", "a"));

    let batch = plan_link_removal(&graph, "l1").unwrap();
    let commands: Vec<Command> = batch.into_iter().collect();
    assert_eq!(
        commands,
        vec![
            Command::RemoveVariable {
                node_id: "t".to_string(),
            },
            Command::RemoveLink {
                link_id: "l1".to_string(),
            },
            Command::ReleasePort {
                node_id: "t".to_string(),
                port: "a".to_string(),
            },
        ]
    );
}

#[test]
fn removing_a_missing_link_is_an_error() {
    let graph = simple_graph();
    assert!(matches!(
        plan_link_removal(&graph, "nope"),
        Err(GraphError::LinkNotFound(id)) if id == "nope"
    ));
}

#[test]
fn deleting_a_consumer_applies_the_link_removal_policy() {
    let mut graph = fanout_graph();
    graph.node_mut("a").unwrap().variable_name = Some("number".to_string());
    graph.add_link(link("l2", "a", "c", "value"));

    let batch = plan_node_delete(&graph, "c");
    let commands: Vec<Command> = batch.into_iter().collect();
    assert_eq!(
        commands,
        vec![
            Command::RemoveVariable {
                node_id: "a".to_string(),
            },
            Command::RemoveLink {
                link_id: "l2".to_string(),
            },
            Command::DeleteNode {
                node_id: "c".to_string(),
            },
        ]
    );
}

#[test]
fn deleting_a_source_releases_every_consumer_port() {
    let mut graph = fanout_graph();
    graph.add_link(link("l2", "a", "c", "value"));

    let batch = plan_node_delete(&graph, "a");
    let commands: Vec<Command> = batch.into_iter().collect();
    assert_eq!(
        commands,
        vec![
            Command::RemoveLink {
                link_id: "l1".to_string(),
            },
            Command::ReleasePort {
                node_id: "b".to_string(),
                port: "value".to_string(),
            },
            Command::RemoveLink {
                link_id: "l2".to_string(),
            },
            Command::ReleasePort {
                node_id: "c".to_string(),
                port: "value".to_string(),
            },
            Command::DeleteNode {
                node_id: "a".to_string(),
            },
        ]
    );
}
