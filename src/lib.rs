//! Stitcher: deterministic cross-artifact call graph merging
//!
//! Stitcher takes the partial call graph of one package revision plus the
//! partial graphs and hierarchy metadata of its dependency closure and
//! resolves every external call edge with Class Hierarchy Analysis,
//! producing one merged, immutable call graph over callable ids.
//!
//! # Pipeline
//!
//! 1. Resolve `group:artifact:version` coordinates to package-version ids.
//! 2. Build the universal class hierarchy (super/sub closures over every
//!    type in the closure) and the type dictionary
//!    ((type, signature) -> callable ids).
//! 3. Load the focal partial graph, type its nodes, and harvest the arcs
//!    that still need resolution (external endpoint or self-loop).
//! 4. Resolve each invocation site by its kind (virtual, interface,
//!    special/constructor, static) and emit arcs idempotently; dynamic
//!    sites are skipped per policy.
//!
//! The emitted edge set is a pure function of the inputs; serialized
//! output is byte-identical across runs.
//!
//! # Stores
//!
//! The merger reads three store contracts ([`store::DependencyStore`],
//! [`store::GraphStore`], [`store::EdgeMetadataStore`]). A SQLite file
//! backs all three in [`store::sqlite::SqliteStores`];
//! [`store::memory::MemoryStores`] is the in-memory equivalent for tests
//! and programmatic closures.

pub mod config;
pub mod coordinate;
pub mod error;
pub mod error_codes;
pub mod merge;
pub mod output;
pub mod report;
pub mod store;
pub mod uri;
pub mod version;

pub use config::{DynamicSitePolicy, MergeConfig, MissingDepPolicy};
pub use coordinate::{Coordinate, CoordinateError};
pub use error::MergeError;
pub use merge::{MergedGraph, MergedGraphBuilder, MergeOutcome, Merger};
pub use output::{JsonResponse, OutputFormat};
pub use report::MergeReport;
pub use store::{
    ArcRow, CallKind, CallableRow, DependencyStore, EdgeMetadataStore, GraphStore, HierarchyRow,
    InvocationSite, PartialGraph,
};
pub use uri::{MethodUri, Node, UriError};
