//! In-memory store implementation
//!
//! Backs all three store contracts with plain maps. Used by unit and
//! integration tests and by callers that assemble closures programmatically.

use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::coordinate::Coordinate;

use super::{
    ArcRow, CallableRow, DependencyStore, EdgeMetadataStore, GraphStore, HierarchyRow,
    InvocationSite, PartialGraph,
};

/// Map-backed implementation of all three store contracts.
#[derive(Debug, Default)]
pub struct MemoryStores {
    package_versions: HashMap<Coordinate, u64>,
    graphs: HashMap<u64, PartialGraph>,
    /// callable id -> (owning package-version, stored URI)
    callables: BTreeMap<u64, (u64, String)>,
    /// module rows per package-version
    hierarchies: HashMap<u64, Vec<HierarchyRow>>,
    edge_sites: HashMap<(u64, u64), Vec<InvocationSite>>,
    /// package-versions whose graph fetch should fail, for failure-path tests
    poisoned: BTreeSet<u64>,
}

impl MemoryStores {
    pub fn new() -> Self {
        MemoryStores::default()
    }

    /// Register a package-version under a coordinate.
    pub fn add_package_version(&mut self, coordinate: &str, id: u64) {
        let coordinate = Coordinate::parse(coordinate).expect("well-formed test coordinate");
        self.package_versions.insert(coordinate, id);
    }

    /// Store the partial graph of a package-version.
    pub fn add_graph(&mut self, package_version: u64, graph: PartialGraph) {
        self.graphs.insert(package_version, graph);
    }

    /// Register a callable with its stored URI.
    pub fn add_callable(&mut self, package_version: u64, id: u64, uri: &str) {
        self.callables.insert(id, (package_version, uri.to_string()));
    }

    /// Attach a hierarchy row to a package-version.
    pub fn add_hierarchy(&mut self, package_version: u64, row: HierarchyRow) {
        self.hierarchies.entry(package_version).or_default().push(row);
    }

    /// Record the invocation sites of one edge.
    pub fn add_edge_sites(&mut self, source: u64, target: u64, sites: Vec<InvocationSite>) {
        self.edge_sites.insert((source, target), sites);
    }

    /// Make every graph fetch for the package-version fail.
    pub fn poison_graph(&mut self, package_version: u64) {
        self.poisoned.insert(package_version);
    }
}

impl DependencyStore for MemoryStores {
    fn ids_by_coordinates(&self, coordinates: &[Coordinate]) -> Result<BTreeSet<u64>> {
        Ok(coordinates
            .iter()
            .filter_map(|c| self.package_versions.get(c).copied())
            .collect())
    }

    fn callable_ids_of(&self, package_versions: &BTreeSet<u64>) -> Result<Vec<u64>> {
        // Internal callables only: membership in the owning graph's
        // internal node set decides
        let mut out = Vec::new();
        for pv in package_versions {
            if self.poisoned.contains(pv) {
                return Err(anyhow!("graph data unavailable for package-version {pv}"));
            }
            let graph = self
                .graphs
                .get(pv)
                .ok_or_else(|| anyhow!("no graph for package-version {pv}"))?;
            out.extend(graph.internal_nodes.iter().copied());
        }
        Ok(out)
    }

    fn callables_by_id(&self, callables: &BTreeSet<u64>) -> Result<Vec<CallableRow>> {
        Ok(callables
            .iter()
            .filter_map(|id| {
                self.callables.get(id).map(|(_, uri)| CallableRow {
                    id: *id,
                    uri: uri.clone(),
                })
            })
            .collect())
    }

    fn module_hierarchy_of(&self, callables: &BTreeSet<u64>) -> Result<Vec<HierarchyRow>> {
        let owners: BTreeSet<u64> = callables
            .iter()
            .filter_map(|id| self.callables.get(id).map(|(pv, _)| *pv))
            .collect();
        Ok(owners
            .iter()
            .flat_map(|pv| self.hierarchies.get(pv).cloned().unwrap_or_default())
            .collect())
    }
}

impl GraphStore for MemoryStores {
    fn partial_graph(&self, package_version: u64) -> Result<Option<PartialGraph>> {
        if self.poisoned.contains(&package_version) {
            return Err(anyhow!(
                "graph data unavailable for package-version {package_version}"
            ));
        }
        Ok(self.graphs.get(&package_version).cloned())
    }
}

impl EdgeMetadataStore for MemoryStores {
    fn edges(&self, pairs: &[(u64, u64)]) -> Result<Vec<ArcRow>> {
        Ok(pairs
            .iter()
            .filter_map(|pair| {
                self.edge_sites.get(pair).map(|sites| ArcRow {
                    source: pair.0,
                    target: pair.1,
                    sites: sites.clone(),
                })
            })
            .collect())
    }
}
