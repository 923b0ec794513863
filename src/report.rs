//! Merge report
//!
//! Side channel for non-fatal drops during a merge. The counters are
//! serialized alongside the merged graph so callers can judge how complete
//! the result is.

use serde::{Deserialize, Serialize};

/// Counters for everything a merge skipped rather than failed on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Dependencies dropped from the closure (unresolvable coordinate or
    /// failed graph fetch)
    pub dependencies_dropped: usize,
    /// Callables whose URI failed to parse and were left out of the type
    /// dictionary or focal type map
    pub callables_dropped: usize,
    /// Dynamic invocation sites skipped as unresolvable
    pub dynamic_sites_unresolved: usize,
    /// Non-dynamic sites whose resolution produced zero targets
    pub sites_resolved_zero: usize,
}

impl MergeReport {
    /// True if the merge dropped nothing.
    pub fn is_clean(&self) -> bool {
        *self == MergeReport::default()
    }
}
