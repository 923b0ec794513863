//! Top-level merge error kinds
//!
//! A merge either returns a merged graph or exactly one of these errors.
//! Non-fatal drops (skipped dependencies, unparsable callables, unresolved
//! dynamic sites) never surface here; they are counted in
//! [`crate::report::MergeReport`].

use crate::coordinate::CoordinateError;
use thiserror::Error;

/// Fatal merge failures.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The focal coordinate failed to split into three components
    #[error(transparent)]
    CoordinateMalformed(#[from] CoordinateError),

    /// The focal artifact is not present in the dependency store
    #[error("focal artifact '{0}' not found in the dependency store")]
    FocalArtifactMissing(String),

    /// The focal artifact has no partial call graph
    #[error("no partial call graph for focal artifact '{0}'")]
    FocalGraphMissing(String),

    /// A dependency could not be fetched and missing-dep-policy is `fail`
    #[error("failed to fetch dependency '{dependency}': {source}")]
    DependencyFetchFailed {
        dependency: String,
        #[source]
        source: anyhow::Error,
    },

    /// A dynamic invocation site was encountered and dynamic-site-policy is
    /// `fail`
    #[error("unresolvable dynamic invocation site on arc {source_id} -> {target_id}")]
    DynamicSite { source_id: u64, target_id: u64 },

    /// Unrecoverable failure of an external store during a batched fetch
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),

    /// Cooperative cancellation fired between resolver arcs
    #[error("merge cancelled")]
    Cancelled,
}
