//! Node typing and edge harvesting for the focal graph
//!
//! Resolution needs two projections of the focal partial graph: a map from
//! node id to its (type, signature) decomposition, and the list of arcs
//! that still need resolving together with their invocation sites.

use anyhow::Result;
use std::collections::HashMap;

use crate::report::MergeReport;
use crate::store::{ArcRow, DependencyStore, EdgeMetadataStore, PartialGraph};
use crate::uri::{self, Node};

/// Resolve every node of the focal graph to its type and signature.
///
/// Callables whose stored URI is missing or unparsable are dropped and
/// counted; arcs touching them are later skipped.
pub fn type_map(
    graph: &PartialGraph,
    dependencies: &dyn DependencyStore,
    report: &mut MergeReport,
) -> Result<HashMap<u64, Node>> {
    let node_ids = graph.nodes().collect();
    let rows = dependencies.callables_by_id(&node_ids)?;

    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        match uri::parse_node(&row.uri) {
            Ok(node) => {
                map.insert(row.id, node);
            }
            Err(error) => {
                tracing::warn!(
                    callable = row.id,
                    %error,
                    "dropping focal node with unparsable URI"
                );
                report.callables_dropped += 1;
            }
        }
    }
    Ok(map)
}

/// Arcs of the focal graph that need resolution, with their sites.
///
/// Selection: an endpoint is external, or the arc is a self-loop (those can
/// hide super-constructor calls). Sites come back in one batched fetch;
/// pairs without stored metadata are not harvested. Rows are sorted by
/// (source, target) so downstream iteration is deterministic.
pub fn harvest(
    graph: &PartialGraph,
    edges: &dyn EdgeMetadataStore,
) -> Result<Vec<ArcRow>> {
    let pairs: Vec<(u64, u64)> = graph
        .edges()
        .filter(|&(source, target)| {
            graph.is_external(source) || graph.is_external(target) || source == target
        })
        .collect();

    let mut rows = edges.edges(&pairs)?;
    rows.sort_by_key(|row| (row.source, row.target));
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStores;
    use crate::store::{CallKind, InvocationSite};
    use std::collections::BTreeSet;

    fn site(kind: CallKind) -> InvocationSite {
        InvocationSite {
            source_line: 1,
            kind,
            receiver_type: "/ns/A".to_string(),
        }
    }

    #[test]
    fn test_harvest_selects_external_and_self_loops() {
        let mut graph = PartialGraph::default();
        graph.internal_nodes = BTreeSet::from([1, 2]);
        graph.external_nodes = BTreeSet::from([10]);
        graph.add_edge(1, 2); // internal-internal: not harvested
        graph.add_edge(1, 10); // external target
        graph.add_edge(10, 2); // external source
        graph.add_edge(2, 2); // self-loop

        let mut stores = MemoryStores::new();
        stores.add_edge_sites(1, 10, vec![site(CallKind::Virtual)]);
        stores.add_edge_sites(10, 2, vec![site(CallKind::Virtual)]);
        stores.add_edge_sites(2, 2, vec![site(CallKind::Special)]);
        stores.add_edge_sites(1, 2, vec![site(CallKind::Virtual)]);

        let rows = harvest(&graph, &stores).unwrap();
        let pairs: Vec<(u64, u64)> = rows.iter().map(|r| (r.source, r.target)).collect();
        assert_eq!(pairs, vec![(1, 10), (2, 2), (10, 2)]);
    }

    #[test]
    fn test_type_map_drops_bad_uris() {
        let mut graph = PartialGraph::default();
        graph.internal_nodes = BTreeSet::from([1, 2]);

        let mut stores = MemoryStores::new();
        stores.add_callable(100, 1, "/ns/A.m()%2Fns%2FV");
        stores.add_callable(100, 2, "garbage");

        let mut report = MergeReport::default();
        let map = type_map(&graph, &stores, &mut report).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&1].type_uri, "/ns/A");
        assert_eq!(report.callables_dropped, 1);
    }
}
