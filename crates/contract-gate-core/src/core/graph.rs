// crates/contract-gate-core/src/core/graph.rs
// ============================================================================
// Module: Contract Gate Dependency Graph
// Description: Reverse edges, cycle detection, and missing-reference analysis.
// Purpose: Analyze contract key references across a spec corpus.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The contract graph holds one node per contract key with an authored
//! dependency list. Dependents are derived, never authored: they are always
//! recomputed from the dependency lists of all nodes. Cycle detection reports
//! every independent cycle, not just the first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Graph Types
// ============================================================================

/// One node in the contract dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Contract key.
    pub key: String,
    /// Source file the contract was extracted from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Contract keys this node references.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Contract keys referencing this node; derived by
    /// [`ContractGraph::build_reverse_edges`].
    #[serde(default)]
    pub dependents: Vec<String>,
}

impl GraphNode {
    /// Creates a node with the given key and dependency list.
    #[must_use]
    pub fn new(key: impl Into<String>, dependencies: Vec<String>) -> Self {
        Self {
            key: key.into(),
            file: None,
            dependencies,
            dependents: Vec::new(),
        }
    }

    /// Sets the source file of the node.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Contract dependency graph keyed by contract key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractGraph {
    /// Nodes in deterministic key order.
    nodes: BTreeMap<String, GraphNode>,
}

// ============================================================================
// SECTION: Graph Construction
// ============================================================================

impl ContractGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, replacing any previous node with the same key.
    pub fn insert(&mut self, node: GraphNode) {
        self.nodes.insert(node.key.clone(), node);
    }

    /// Returns the node for a contract key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&GraphNode> {
        self.nodes.get(key)
    }

    /// Returns the nodes in deterministic key order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recomputes every `dependents` list from scratch.
    ///
    /// All dependents are cleared first, then re-derived from every
    /// `(node, dependency)` pair and sorted lexicographically for
    /// deterministic output.
    pub fn build_reverse_edges(&mut self) {
        for node in self.nodes.values_mut() {
            node.dependents.clear();
        }

        let edges: Vec<(String, String)> = self
            .nodes
            .values()
            .flat_map(|node| {
                node.dependencies.iter().map(|dep| (dep.clone(), node.key.clone()))
            })
            .collect();

        for (dep, dependent) in edges {
            if let Some(target) = self.nodes.get_mut(&dep) {
                target.dependents.push(dependent);
            }
        }

        for node in self.nodes.values_mut() {
            node.dependents.sort();
        }
    }
}

// ============================================================================
// SECTION: Graph Analysis
// ============================================================================

impl ContractGraph {
    /// Detects every dependency cycle in the graph.
    ///
    /// Each reported cycle is the path slice from the first occurrence of the
    /// revisited node through the current node, followed by the repeated
    /// start node. Traversal continues after a cycle is found so independent
    /// cycles are all reported.
    #[must_use]
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut visited = BTreeSet::new();
        let mut cycles = Vec::new();

        for key in self.nodes.keys() {
            if !visited.contains(key.as_str()) {
                let mut stack = Vec::new();
                self.visit(key, &mut visited, &mut stack, &mut cycles);
            }
        }

        cycles
    }

    /// Depth-first traversal recording cycles found on the active stack.
    fn visit(
        &self,
        key: &str,
        visited: &mut BTreeSet<String>,
        stack: &mut Vec<String>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        if let Some(position) = stack.iter().position(|entry| entry == key) {
            let mut cycle: Vec<String> = stack[position ..].to_vec();
            cycle.push(key.to_string());
            cycles.push(cycle);
            return;
        }
        if visited.contains(key) {
            return;
        }
        visited.insert(key.to_string());

        let Some(node) = self.nodes.get(key) else {
            return;
        };

        stack.push(key.to_string());
        for dep in &node.dependencies {
            self.visit(dep, visited, stack, cycles);
        }
        stack.pop();
    }

    /// Returns, per node, the dependencies not present as any node key.
    #[must_use]
    pub fn find_missing_dependencies(&self) -> BTreeMap<String, Vec<String>> {
        let mut missing = BTreeMap::new();
        for node in self.nodes.values() {
            let absent: Vec<String> = node
                .dependencies
                .iter()
                .filter(|dep| !self.nodes.contains_key(dep.as_str()))
                .cloned()
                .collect();
            if !absent.is_empty() {
                missing.insert(node.key.clone(), absent);
            }
        }
        missing
    }

    /// Renders the graph in DOT format for external visualization.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph contracts {\n");
        for node in self.nodes.values() {
            let _ = writeln!(out, "  \"{}\";", node.key);
            for dep in &node.dependencies {
                let _ = writeln!(out, "  \"{}\" -> \"{dep}\";", node.key);
            }
        }
        out.push_str("}\n");
        out
    }
}
