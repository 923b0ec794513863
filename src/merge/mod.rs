//! Cross-artifact call graph merging
//!
//! Orchestrates one merge invocation: resolve the closure, build the
//! universal hierarchy and type dictionary, load the focal partial graph,
//! harvest unresolved arcs, and run CHA resolution into an immutable
//! merged graph.
//!
//! Phases run to completion in order; the only blocking happens at the
//! store boundaries. The resolver polls a cancellation flag between arcs.

mod arcs;
mod dictionary;
mod graph;
mod hierarchy;
mod intern;
mod resolver;

pub use dictionary::TypeDictionary;
pub use graph::{GraphExport, MergedGraph, MergedGraphBuilder};
pub use hierarchy::{TypeSetIter, UniversalHierarchy};
pub use intern::{TypeId, TypeInterner};
pub use resolver::ResolutionContext;

use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;

use crate::config::{MergeConfig, MissingDepPolicy};
use crate::coordinate::Coordinate;
use crate::error::MergeError;
use crate::report::MergeReport;
use crate::store::{DependencyStore, EdgeMetadataStore, GraphStore};

/// Result of a successful merge: the resolved graph plus drop counters.
#[derive(Debug)]
pub struct MergeOutcome {
    pub graph: MergedGraph,
    pub report: MergeReport,
}

/// One-shot merger over three read-only store handles.
///
/// The universal hierarchy and type dictionary are built per invocation
/// and dropped with it; nothing is cached across merges.
pub struct Merger<'a> {
    dependencies: &'a dyn DependencyStore,
    graphs: &'a dyn GraphStore,
    edges: &'a dyn EdgeMetadataStore,
    config: MergeConfig,
}

impl<'a> Merger<'a> {
    pub fn new(
        dependencies: &'a dyn DependencyStore,
        graphs: &'a dyn GraphStore,
        edges: &'a dyn EdgeMetadataStore,
    ) -> Self {
        Merger {
            dependencies,
            graphs,
            edges,
            config: MergeConfig::default(),
        }
    }

    pub fn with_config(
        dependencies: &'a dyn DependencyStore,
        graphs: &'a dyn GraphStore,
        edges: &'a dyn EdgeMetadataStore,
        config: MergeConfig,
    ) -> Self {
        Merger {
            dependencies,
            graphs,
            edges,
            config,
        }
    }

    /// Merge the focal artifact's partial graph with its dependencies.
    pub fn merge(
        &self,
        artifact: &str,
        dependencies: &[String],
    ) -> Result<MergeOutcome, MergeError> {
        let never = AtomicBool::new(false);
        self.merge_cancellable(artifact, dependencies, &never)
    }

    /// Merge with a cooperative cancellation flag, polled between arcs.
    /// On abort the partial output is discarded.
    pub fn merge_cancellable(
        &self,
        artifact: &str,
        dependencies: &[String],
        cancel: &AtomicBool,
    ) -> Result<MergeOutcome, MergeError> {
        let start = std::time::Instant::now();
        let mut report = MergeReport::default();

        let focal = Coordinate::parse(artifact)?;
        let focal_id = self
            .dependencies
            .ids_by_coordinates(std::slice::from_ref(&focal))
            .map_err(MergeError::StoreUnavailable)?
            .into_iter()
            .next()
            .ok_or_else(|| MergeError::FocalArtifactMissing(artifact.to_string()))?;

        // Load the focal graph before the heavy index builds so a missing
        // graph fails fast
        let focal_graph = self
            .graphs
            .partial_graph(focal_id)
            .map_err(MergeError::StoreUnavailable)?
            .ok_or_else(|| MergeError::FocalGraphMissing(artifact.to_string()))?;

        let closure = self.resolve_closure(focal_id, dependencies, &mut report)?;
        let callables = self.closure_callables(focal_id, &closure, &mut report)?;

        let callable_rows = self
            .dependencies
            .callables_by_id(&callables)
            .map_err(MergeError::StoreUnavailable)?;
        let hierarchy_rows = self
            .dependencies
            .module_hierarchy_of(&callables)
            .map_err(MergeError::StoreUnavailable)?;

        let mut interner = TypeInterner::new();
        let hierarchy = UniversalHierarchy::build(
            &hierarchy_rows,
            &mut interner,
            self.config.intern_type_uris,
        );
        let dictionary = TypeDictionary::build(&callable_rows, &mut interner, &mut report);

        let type_map = arcs::type_map(&focal_graph, self.dependencies, &mut report)
            .map_err(MergeError::StoreUnavailable)?;
        let harvested = arcs::harvest(&focal_graph, self.edges)
            .map_err(MergeError::StoreUnavailable)?;
        tracing::info!(arcs = harvested.len(), "harvested unresolved arcs");

        let mut builder = MergedGraphBuilder::new();

        // Internal-to-internal edges are already resolved; emit them (and
        // every internal node) verbatim
        for node in &focal_graph.internal_nodes {
            builder.add_node(*node);
        }
        for (source, target) in focal_graph.edges() {
            if !focal_graph.is_external(source) && !focal_graph.is_external(target) {
                builder.add_arc(source, target);
            }
        }

        let ctx = ResolutionContext {
            graph: &focal_graph,
            type_map: &type_map,
            hierarchy: &hierarchy,
            dictionary: &dictionary,
            interner: &interner,
            config: &self.config,
        };
        resolver::resolve_all(&ctx, &harvested, cancel, &mut builder, &mut report)?;

        let graph = builder.build();
        tracing::info!(
            nodes = graph.node_count(),
            arcs = graph.arc_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "stitched call graph"
        );
        Ok(MergeOutcome { graph, report })
    }

    /// Resolve dependency coordinates to package-version ids. The closure
    /// always contains the focal artifact. Unresolvable coordinates are
    /// dropped or fatal per the missing-dep policy.
    fn resolve_closure(
        &self,
        focal_id: u64,
        dependencies: &[String],
        report: &mut MergeReport,
    ) -> Result<BTreeSet<u64>, MergeError> {
        let mut closure = BTreeSet::from([focal_id]);
        let unique: BTreeSet<&String> = dependencies.iter().collect();
        for raw in unique {
            let coordinate = match Coordinate::parse(raw) {
                Ok(c) => c,
                Err(error) => {
                    if self.config.missing_dep_policy == MissingDepPolicy::Fail {
                        return Err(MergeError::DependencyFetchFailed {
                            dependency: raw.clone(),
                            source: error.into(),
                        });
                    }
                    tracing::warn!(dependency = %raw, %error, "dropping malformed dependency");
                    report.dependencies_dropped += 1;
                    continue;
                }
            };
            let ids = self
                .dependencies
                .ids_by_coordinates(std::slice::from_ref(&coordinate))
                .map_err(MergeError::StoreUnavailable)?;
            match ids.into_iter().next() {
                Some(id) => {
                    closure.insert(id);
                }
                None => {
                    if self.config.missing_dep_policy == MissingDepPolicy::Fail {
                        return Err(MergeError::DependencyFetchFailed {
                            dependency: raw.clone(),
                            source: anyhow::anyhow!("coordinate not found under forge"),
                        });
                    }
                    tracing::warn!(dependency = %raw, "dependency not found, merging without it");
                    report.dependencies_dropped += 1;
                }
            }
        }
        Ok(closure)
    }

    /// Internal callable ids of every closure member. Per-dependency fetch
    /// failures drop the dependency; a failure on the focal artifact is
    /// fatal.
    fn closure_callables(
        &self,
        focal_id: u64,
        closure: &BTreeSet<u64>,
        report: &mut MergeReport,
    ) -> Result<BTreeSet<u64>, MergeError> {
        let mut callables = BTreeSet::new();
        for &pv in closure {
            let single = BTreeSet::from([pv]);
            match self.dependencies.callable_ids_of(&single) {
                Ok(ids) => callables.extend(ids),
                Err(error) => {
                    if pv == focal_id {
                        return Err(MergeError::StoreUnavailable(error));
                    }
                    if self.config.missing_dep_policy == MissingDepPolicy::Fail {
                        return Err(MergeError::DependencyFetchFailed {
                            dependency: pv.to_string(),
                            source: error,
                        });
                    }
                    tracing::warn!(package_version = pv, %error, "dropping dependency after failed callable fetch");
                    report.dependencies_dropped += 1;
                }
            }
        }
        Ok(callables)
    }
}
