// crates/contract-gate-core/tests/graph.rs
// ============================================================================
// Module: Dependency Graph Tests
// Description: Tests for reverse edges, cycles, and missing references.
// ============================================================================
//! ## Overview
//! Validates that dependents are always derived from dependency lists, that
//! every independent cycle is reported, and that dangling references surface
//! per node.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use contract_gate_core::ContractGraph;
use contract_gate_core::GraphNode;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn node(key: &str, dependencies: &[&str]) -> GraphNode {
    GraphNode::new(key, dependencies.iter().map(|dep| (*dep).to_string()).collect())
}

// ============================================================================
// SECTION: Reverse Edges
// ============================================================================

/// Tests dependents are derived from dependency lists and sorted.
#[test]
fn reverse_edges_are_derived_and_sorted() {
    let mut graph = ContractGraph::new();
    graph.insert(node("billing.invoice", &["users.profile"]));
    graph.insert(node("audit.log", &["users.profile"]));
    graph.insert(node("users.profile", &[]));

    graph.build_reverse_edges();

    let profile = graph.get("users.profile").unwrap();
    assert_eq!(
        profile.dependents,
        vec!["audit.log".to_string(), "billing.invoice".to_string()]
    );
}

/// Tests rebuilding clears stale dependents entirely.
#[test]
fn rebuild_clears_stale_dependents() {
    let mut graph = ContractGraph::new();
    graph.insert(node("a", &["b"]));
    graph.insert(node("b", &[]));
    graph.build_reverse_edges();
    assert_eq!(graph.get("b").unwrap().dependents, vec!["a".to_string()]);

    graph.insert(node("a", &[]));
    graph.build_reverse_edges();
    assert!(graph.get("b").unwrap().dependents.is_empty());
}

// ============================================================================
// SECTION: Cycle Detection
// ============================================================================

/// Tests a three-node cycle is reported with its full path.
#[test]
fn detects_three_node_cycle() {
    let mut graph = ContractGraph::new();
    graph.insert(node("a", &["b"]));
    graph.insert(node("b", &["c"]));
    graph.insert(node("c", &["a"]));

    let cycles = graph.detect_cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].first(), cycles[0].last());
    assert_eq!(cycles[0].len(), 4);
}

/// Tests independent cycles are all reported.
#[test]
fn detects_independent_cycles() {
    let mut graph = ContractGraph::new();
    graph.insert(node("a", &["b"]));
    graph.insert(node("b", &["a"]));
    graph.insert(node("x", &["y"]));
    graph.insert(node("y", &["x"]));
    graph.insert(node("lone", &[]));

    let cycles = graph.detect_cycles();
    assert_eq!(cycles.len(), 2);
}

/// Tests an acyclic graph reports no cycles.
#[test]
fn acyclic_graph_has_no_cycles() {
    let mut graph = ContractGraph::new();
    graph.insert(node("a", &["b", "c"]));
    graph.insert(node("b", &["c"]));
    graph.insert(node("c", &[]));

    assert!(graph.detect_cycles().is_empty());
}

/// Tests a self-referencing node is reported as a cycle.
#[test]
fn self_reference_is_a_cycle() {
    let mut graph = ContractGraph::new();
    graph.insert(node("a", &["a"]));

    let cycles = graph.detect_cycles();
    assert_eq!(cycles, vec![vec!["a".to_string(), "a".to_string()]]);
}

// ============================================================================
// SECTION: Missing References
// ============================================================================

/// Tests dangling dependencies are grouped per node.
#[test]
fn missing_dependencies_group_per_node() {
    let mut graph = ContractGraph::new();
    graph.insert(node("a", &["b", "ghost"]));
    graph.insert(node("b", &["phantom"]));

    let missing = graph.find_missing_dependencies();
    assert_eq!(missing.len(), 2);
    assert_eq!(missing["a"], vec!["ghost".to_string()]);
    assert_eq!(missing["b"], vec!["phantom".to_string()]);
}

/// Tests DOT output lists nodes and edges.
#[test]
fn dot_output_lists_edges() {
    let mut graph = ContractGraph::new();
    graph.insert(node("a", &["b"]).with_file("src/a.ts"));
    graph.insert(node("b", &[]));

    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph contracts {"));
    assert!(dot.contains("\"a\" -> \"b\";"));
    assert!(dot.ends_with("}\n"));
}
