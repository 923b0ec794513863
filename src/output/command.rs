//! JSON output types for CLI commands
//!
//! Every JSON response is wrapped in an envelope carrying a schema version
//! for parsing stability and an execution id for traceability.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::merge::GraphExport;
use crate::report::MergeReport;

/// Current JSON output schema version
pub const STITCHER_JSON_SCHEMA_VERSION: &str = "1.0.0";

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    Pretty,
    /// Plain text for terminals
    Human,
}

impl OutputFormat {
    /// Parse from CLI string form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "pretty" => Some(OutputFormat::Pretty),
            "text" | "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }
}

/// Wrapper for all JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    /// Schema version for parsing stability
    pub schema_version: String,
    /// Unique execution ID for this run
    pub execution_id: String,
    /// Response data
    pub data: T,
}

impl<T> JsonResponse<T> {
    pub fn new(data: T, execution_id: &str) -> Self {
        JsonResponse {
            schema_version: STITCHER_JSON_SCHEMA_VERSION.to_string(),
            execution_id: execution_id.to_string(),
            data,
        }
    }
}

/// Response payload of `stitcher merge`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResponse {
    /// Focal coordinate as given
    pub artifact: String,
    /// Dependency coordinates as given
    pub dependencies: Vec<String>,
    /// Resolved graph, ascending nodes and lexicographic arcs
    pub graph: GraphExport,
    /// SHA-256 over the serialized graph, for reproducibility checks
    pub graph_digest: String,
    /// Non-fatal drop counters
    pub report: MergeReport,
}

/// Response payload of `stitcher status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub packages: usize,
    pub package_versions: usize,
    pub modules: usize,
    pub callables: usize,
    pub edges: usize,
}

/// Error payload with a stable error code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Digest of a serialized graph: SHA-256 hex over the compact JSON form.
///
/// Two runs over identical inputs produce identical digests.
pub fn graph_digest(export: &GraphExport) -> String {
    let serialized = serde_json::to_string(export).expect("graph export serializes");
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Generate a unique execution ID from timestamp and process id.
pub fn generate_execution_id() -> String {
    use std::process;
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let pid = process::id();

    format!("{:x}-{:x}", timestamp, pid)
}

/// Output JSON to stdout
pub fn output_json<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    let json = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(data)?,
        _ => serde_json::to_string(data)?,
    };
    println!("{}", json);
    Ok(())
}
