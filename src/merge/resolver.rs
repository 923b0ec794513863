//! Call-site resolution
//!
//! The hot loop of the merge: for every harvested arc and every invocation
//! site, apply CHA against the universal hierarchy and type dictionary and
//! emit resolved arcs into the output builder.
//!
//! Direction handling: when the arc's source is external and its target
//! internal, the call enters the focal artifact rather than leaving it, and
//! every resolved arc is emitted with endpoints swapped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{DynamicSitePolicy, MergeConfig};
use crate::error::MergeError;
use crate::report::MergeReport;
use crate::store::{ArcRow, CallKind, PartialGraph};
use crate::uri::Node;

use super::dictionary::TypeDictionary;
use super::graph::MergedGraphBuilder;
use super::hierarchy::UniversalHierarchy;
use super::intern::TypeInterner;

/// Read-only snapshots the resolver dispatches against.
pub struct ResolutionContext<'a> {
    pub graph: &'a PartialGraph,
    pub type_map: &'a HashMap<u64, Node>,
    pub hierarchy: &'a UniversalHierarchy,
    pub dictionary: &'a TypeDictionary,
    pub interner: &'a TypeInterner,
    pub config: &'a MergeConfig,
}

/// Resolve every harvested arc into `builder`.
///
/// The cancellation flag is polled once per arc; on abort the partial
/// builder is discarded by the caller.
pub fn resolve_all(
    ctx: &ResolutionContext<'_>,
    arcs: &[ArcRow],
    cancel: &AtomicBool,
    builder: &mut MergedGraphBuilder,
    report: &mut MergeReport,
) -> Result<(), MergeError> {
    for arc in arcs {
        if cancel.load(Ordering::Relaxed) {
            return Err(MergeError::Cancelled);
        }
        resolve_arc(ctx, arc, builder, report)?;
    }
    Ok(())
}

/// Resolve one arc: pick the type context, expand constructors, then
/// dispatch each site on its invocation kind.
fn resolve_arc(
    ctx: &ResolutionContext<'_>,
    arc: &ArcRow,
    builder: &mut MergedGraphBuilder,
    report: &mut MergeReport,
) -> Result<(), MergeError> {
    // The external endpoint names the method being resolved. When the
    // target is internal the call comes in from outside and is a callback.
    let (node, is_callback) = if ctx.graph.is_external(arc.target) {
        (ctx.type_map.get(&arc.target), false)
    } else {
        (
            ctx.type_map.get(&arc.source),
            ctx.graph.is_external(arc.source),
        )
    };
    let Some(node) = node else {
        // URI of the endpoint was dropped during node typing
        tracing::debug!(source = arc.source, target = arc.target, "skipping untyped arc");
        return Ok(());
    };

    if node.is_constructor() {
        // Implicit super-constructor and static-initializer calls are not
        // recorded as explicit sites
        resolve_constructor_chain(ctx, arc.source, node, is_callback, builder);
    }

    for site in &arc.sites {
        match site.kind {
            CallKind::Virtual | CallKind::Interface => {
                let mut emitted = 0usize;
                if let Some(receiver) = ctx.interner.get(&site.receiver_type) {
                    for subtype in ctx.hierarchy.descendants(receiver) {
                        for target in ctx.dictionary.targets(subtype, &node.signature) {
                            add_resolved(builder, arc.source, target, is_callback);
                            emitted += 1;
                        }
                    }
                }
                if emitted == 0 {
                    report.sites_resolved_zero += 1;
                }
            }
            CallKind::Special => {
                let emitted =
                    resolve_constructor_chain(ctx, arc.source, node, is_callback, builder);
                if emitted == 0 {
                    report.sites_resolved_zero += 1;
                }
            }
            CallKind::Static => {
                let mut emitted = 0usize;
                if let Some(receiver) = ctx.interner.get(&site.receiver_type) {
                    for target in ctx.dictionary.targets(receiver, &node.signature) {
                        add_resolved(builder, arc.source, target, is_callback);
                        emitted += 1;
                    }
                }
                if emitted == 0 {
                    report.sites_resolved_zero += 1;
                }
            }
            CallKind::Dynamic => {
                report.dynamic_sites_unresolved += 1;
                match ctx.config.dynamic_site_policy {
                    DynamicSitePolicy::Warn => {
                        tracing::warn!(
                            source = arc.source,
                            target = arc.target,
                            line = site.source_line,
                            "dynamic invocation site left unresolved"
                        );
                    }
                    DynamicSitePolicy::Drop => {}
                    DynamicSitePolicy::Fail => {
                        return Err(MergeError::DynamicSite {
                            source_id: arc.source,
                            target_id: arc.target,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Emit edges for a constructor: the same-signature constructor and the
/// `<clinit>` initializer of every ancestor (reflexive, so the type's own
/// entries are included). Returns the number of edges emitted.
fn resolve_constructor_chain(
    ctx: &ResolutionContext<'_>,
    source: u64,
    node: &Node,
    is_callback: bool,
    builder: &mut MergedGraphBuilder,
) -> usize {
    let Some(type_id) = ctx.interner.get(&node.type_uri) else {
        return 0;
    };
    let clinit = node.clinit_signature();
    let mut emitted = 0usize;
    for ancestor in ctx.hierarchy.ancestors(type_id) {
        for target in ctx.dictionary.targets(ancestor, &node.signature) {
            add_resolved(builder, source, target, is_callback);
            emitted += 1;
        }
        for target in ctx.dictionary.targets(ancestor, &clinit) {
            add_resolved(builder, source, target, is_callback);
            emitted += 1;
        }
    }
    emitted
}

/// Idempotent arc emission, inverting direction for callbacks.
fn add_resolved(builder: &mut MergedGraphBuilder, source: u64, target: u64, is_callback: bool) {
    if is_callback {
        builder.add_arc(target, source);
    } else {
        builder.add_arc(source, target);
    }
}
