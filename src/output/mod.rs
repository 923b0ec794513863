//! JSON output module for CLI commands
//!
//! Provides schema-versioned response types for the merge and status
//! commands.

pub mod command;

pub use command::{
    generate_execution_id, graph_digest, output_json, ErrorResponse, JsonResponse, MergeResponse,
    OutputFormat, StatusResponse, STITCHER_JSON_SCHEMA_VERSION,
};
