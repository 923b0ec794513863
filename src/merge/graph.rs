//! Merged graph builder and snapshot
//!
//! The builder exists only to deduplicate: node and arc insertion is
//! idempotent, and `build()` freezes the accumulated sets into an
//! immutable snapshot with per-node successor and predecessor adjacency.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Append-only accumulator for resolved nodes and arcs.
#[derive(Debug, Default)]
pub struct MergedGraphBuilder {
    nodes: BTreeSet<u64>,
    arcs: BTreeSet<(u64, u64)>,
}

impl MergedGraphBuilder {
    pub fn new() -> Self {
        MergedGraphBuilder::default()
    }

    /// Insert a node. Duplicate insertions are no-ops.
    pub fn add_node(&mut self, id: u64) {
        self.nodes.insert(id);
    }

    /// Insert an arc, inserting both endpoints first. Idempotent.
    pub fn add_arc(&mut self, source: u64, target: u64) {
        self.nodes.insert(source);
        self.nodes.insert(target);
        self.arcs.insert((source, target));
    }

    /// Number of arcs accumulated so far.
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Freeze into an immutable snapshot.
    pub fn build(self) -> MergedGraph {
        let mut successors: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
        let mut predecessors: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
        // BTreeSet iteration is lexicographic, so adjacency lists come out
        // sorted without a separate pass
        for &(source, target) in &self.arcs {
            successors.entry(source).or_default().push(target);
            predecessors.entry(target).or_default().push(source);
        }
        MergedGraph {
            nodes: self.nodes.into_iter().collect(),
            arcs: self.arcs.into_iter().collect(),
            successors: successors.into_iter().collect(),
            predecessors: predecessors.into_iter().collect(),
        }
    }
}

/// Immutable resolved call graph.
///
/// Nodes are callable ids; no further metadata is carried. Successor and
/// predecessor lists are precomputed for O(1) access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedGraph {
    nodes: Vec<u64>,
    arcs: Vec<(u64, u64)>,
    successors: HashMap<u64, Vec<u64>>,
    predecessors: HashMap<u64, Vec<u64>>,
}

impl MergedGraph {
    /// All node ids, ascending.
    pub fn nodes(&self) -> &[u64] {
        &self.nodes
    }

    /// All arcs, lexicographically ordered.
    pub fn arcs(&self) -> &[(u64, u64)] {
        &self.arcs
    }

    /// Successors of one node, ascending. Empty for unknown nodes.
    pub fn successors(&self, node: u64) -> &[u64] {
        self.successors.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Predecessors of one node, ascending. Empty for unknown nodes.
    pub fn predecessors(&self, node: u64) -> &[u64] {
        self.predecessors
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn has_arc(&self, source: u64, target: u64) -> bool {
        self.arcs.binary_search(&(source, target)).is_ok()
    }

    /// Serializable form: ascending nodes, lexicographic arcs.
    pub fn to_export(&self) -> GraphExport {
        GraphExport {
            nodes: self.nodes.clone(),
            arcs: self.arcs.iter().map(|&(s, t)| [s, t]).collect(),
        }
    }
}

/// JSON shape of a merged graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<u64>,
    pub arcs: Vec<[u64; 2]>,
}
