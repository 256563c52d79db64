//! Common test utilities for building raw graphs and document sessions.
use tsunagi::prelude::*;

/// Creates a bare node with the given inbound ports and a single "out" port.
#[allow(dead_code)]
pub fn node(id: &str, node_type: &str, in_ports: &[&str]) -> RawNode {
    RawNode {
        id: id.to_string(),
        node_type: node_type.to_string(),
        position: Position::default(),
        variable_name: None,
        in_ports: in_ports.iter().map(|p| p.to_string()).collect(),
        out_ports: vec!["out".to_string()],
        defaults: Default::default(),
        attributes: serde_json::Value::Null,
    }
}

/// A "number" source node with a literal value.
#[allow(dead_code)]
pub fn number(id: &str, value: i64) -> RawNode {
    let mut node = node(id, "number", &[]);
    node.attributes = serde_json::json!({ "value": value });
    node
}

/// A "print" sink node with a single "value" port.
#[allow(dead_code)]
pub fn print_node(id: &str) -> RawNode {
    node(id, "print", &["value"])
}

/// A binary operator node with ports "a" and "b".
#[allow(dead_code)]
pub fn op(id: &str, node_type: &str) -> RawNode {
    node(id, node_type, &["a", "b"])
}

#[allow(dead_code)]
pub fn link(id: &str, source: &str, target: &str, port: &str) -> RawLink {
    RawLink {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        target_port: port.to_string(),
    }
}

/// `n1` (number 3) feeding `p1` (print).
#[allow(dead_code)]
pub fn simple_graph() -> RawGraph {
    let mut graph = RawGraph::default();
    graph.add_node(number("n1", 3));
    graph.add_node(print_node("p1"));
    graph.add_link(link("l1", "n1", "p1", "value"));
    graph
}

/// `a` (number 3) with a single consumer `b`; `c` is present but not yet
/// connected, for exercising the 1 -> 2 fan-out naming transition. `c`
/// carries a port default so the graph validates in both states.
#[allow(dead_code)]
pub fn fanout_graph() -> RawGraph {
    let mut graph = RawGraph::default();
    graph.add_node(number("a", 3));
    graph.add_node(print_node("b"));
    let mut spare = print_node("c");
    spare.defaults.insert("value".to_string(), serde_json::json!(0));
    graph.add_node(spare);
    graph.add_link(link("l1", "a", "b", "value"));
    graph
}

/// [`fanout_graph`] with the second consumer connected and the source
/// carrying the variable name "x".
#[allow(dead_code)]
pub fn named_fanout_graph() -> RawGraph {
    let mut graph = fanout_graph();
    graph.node_mut("a").unwrap().variable_name = Some("x".to_string());
    graph.add_link(link("l2", "a", "c", "value"));
    graph
}

/// Two "add" nodes feeding each other: a genuine dependency cycle. Port
/// "b" of each carries a literal default so the cycle is the only problem.
#[allow(dead_code)]
pub fn cycle_graph() -> RawGraph {
    let mut graph = RawGraph::default();
    let mut x = op("x", "add");
    x.defaults.insert("b".to_string(), serde_json::json!(1));
    let mut y = op("y", "add");
    y.defaults.insert("b".to_string(), serde_json::json!(1));
    graph.add_node(x);
    graph.add_node(y);
    graph.add_link(link("l1", "x", "y", "a"));
    graph.add_link(link("l2", "y", "x", "a"));
    graph
}

#[allow(dead_code)]
pub fn demo_session(graph: RawGraph) -> DocumentSession {
    let _ = env_logger::builder().is_test(true).try_init();
    DocumentSession::new(graph, Box::new(DemoAdapter::new()), Box::new(DemoLanguage))
}

/// Normalizes with the demo adapter's input predicate.
#[allow(dead_code)]
pub fn demo_normalize(graph: &RawGraph) -> (NormalizedGraph, Vec<NodeId>) {
    let adapter = DemoAdapter::new();
    normalize(graph, |t| adapter.is_type_input(t)).expect("normalization failed")
}
