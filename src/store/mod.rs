//! External store contracts
//!
//! The merger consumes three read-only stores: package/callable metadata
//! ([`DependencyStore`]), partial call graphs ([`GraphStore`]), and
//! per-edge invocation sites ([`EdgeMetadataStore`]). Implementations are
//! pluggable behind trait objects; [`sqlite::SqliteStores`] backs all three
//! with one database file and [`memory::MemoryStores`] keeps everything in
//! maps for tests.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::coordinate::Coordinate;

/// Invocation kinds distinguished by the edge metadata.
///
/// Wire values: virtual=0, interface=1, special=2, static=3, dynamic=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    /// Virtual dispatch through a class receiver
    Virtual,
    /// Dispatch through an interface receiver
    Interface,
    /// Constructor / super dispatch (`invokespecial`)
    Special,
    /// Static call with an exact receiver
    Static,
    /// `invokedynamic`; not resolvable by CHA
    Dynamic,
}

impl CallKind {
    /// Decode a wire value. Unknown values degrade to [`CallKind::Static`]
    /// with a warning.
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => CallKind::Virtual,
            1 => CallKind::Interface,
            2 => CallKind::Special,
            3 => CallKind::Static,
            4 => CallKind::Dynamic,
            other => {
                tracing::warn!(kind = other, "unknown invocation kind, treating as static");
                CallKind::Static
            }
        }
    }

    /// Encode to the wire value.
    pub fn to_wire(self) -> u8 {
        match self {
            CallKind::Virtual => 0,
            CallKind::Interface => 1,
            CallKind::Special => 2,
            CallKind::Static => 3,
            CallKind::Dynamic => 4,
        }
    }
}

/// One invocation instruction within a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationSite {
    /// Source line of the call site
    pub source_line: i32,
    /// Invocation kind
    pub kind: CallKind,
    /// Declared receiver type URI
    pub receiver_type: String,
}

/// One metadata row: the invocation sites recorded for a (source, target)
/// edge of a partial graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcRow {
    pub source: u64,
    pub target: u64,
    /// Ordered list of sites, length >= 1 for well-formed rows
    pub sites: Vec<InvocationSite>,
}

/// A callable id paired with its stored URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableRow {
    pub id: u64,
    pub uri: String,
}

/// Hierarchy metadata for one module: the types it declares and their
/// direct supertypes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyRow {
    /// Type URI of the declaring module's type
    pub namespace: String,
    /// Direct superclasses, type URIs
    pub super_classes: Vec<String>,
    /// Direct superinterfaces, type URIs
    pub super_interfaces: Vec<String>,
}

/// A per-artifact partial call graph.
///
/// Internal nodes are callables defined by the artifact; external nodes are
/// symbolic references into dependencies. The two sets are disjoint and
/// every edge endpoint belongs to one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialGraph {
    pub internal_nodes: BTreeSet<u64>,
    pub external_nodes: BTreeSet<u64>,
    pub successors: BTreeMap<u64, BTreeSet<u64>>,
}

impl PartialGraph {
    /// True if the node is a symbolic reference into a dependency.
    pub fn is_external(&self, node: u64) -> bool {
        self.external_nodes.contains(&node)
    }

    /// All node ids, internal and external, ascending.
    pub fn nodes(&self) -> impl Iterator<Item = u64> + '_ {
        // Both sets are ordered and disjoint; chain preserves no global
        // order but callers that need one sort or re-collect
        self.internal_nodes
            .iter()
            .chain(self.external_nodes.iter())
            .copied()
    }

    /// All (source, target) edges in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.successors
            .iter()
            .flat_map(|(source, targets)| targets.iter().map(move |t| (*source, *t)))
    }

    /// Record an edge, inserting endpoints into neither node set; callers
    /// maintain set membership.
    pub fn add_edge(&mut self, source: u64, target: u64) {
        self.successors.entry(source).or_default().insert(target);
    }
}

/// Package/callable metadata lookups.
pub trait DependencyStore {
    /// Map coordinates to package-version ids. Deduplicates; coordinates
    /// missing under the target forge are silently absent from the result.
    fn ids_by_coordinates(&self, coordinates: &[Coordinate]) -> Result<BTreeSet<u64>>;

    /// Internal (non-external) callable ids of the given package-versions.
    fn callable_ids_of(&self, package_versions: &BTreeSet<u64>) -> Result<Vec<u64>>;

    /// Fetch stored URIs for a set of callables. Batched.
    fn callables_by_id(&self, callables: &BTreeSet<u64>) -> Result<Vec<CallableRow>>;

    /// Hierarchy metadata of every module owning at least one of the given
    /// callables. One row per module.
    fn module_hierarchy_of(&self, callables: &BTreeSet<u64>) -> Result<Vec<HierarchyRow>>;
}

/// Partial call graph blobs, keyed by package-version id.
pub trait GraphStore {
    /// Fetch the partial graph of one package-version, or `None` when the
    /// artifact has no stored graph.
    fn partial_graph(&self, package_version: u64) -> Result<Option<PartialGraph>>;
}

/// Invocation-site metadata, keyed by (source, target) pairs.
pub trait EdgeMetadataStore {
    /// Fetch the sites of every listed edge in one batched query. Pairs
    /// without stored metadata are absent from the result.
    fn edges(&self, pairs: &[(u64, u64)]) -> Result<Vec<ArcRow>>;
}
