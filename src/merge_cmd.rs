//! Merge command implementation
//!
//! Usage: stitcher merge --db <FILE> --artifact <G:A:V> [--dependency <G:A:V>]...

use anyhow::Result;
use std::path::PathBuf;
use stitcher::error_codes;
use stitcher::output::{
    generate_execution_id, graph_digest, output_json, ErrorResponse, JsonResponse, MergeResponse,
    OutputFormat,
};
use stitcher::store::sqlite::SqliteStores;
use stitcher::{MergeConfig, Merger};

/// Run the merge command against a SQLite store database.
pub fn run_merge(
    db_path: PathBuf,
    artifact: String,
    dependencies: Vec<String>,
    config: MergeConfig,
    output_format: OutputFormat,
) -> Result<()> {
    let stores = SqliteStores::open(&db_path)?;
    let merger = Merger::with_config(&stores, &stores, &stores, config);
    let exec_id = generate_execution_id();

    let outcome = match merger.merge(&artifact, &dependencies) {
        Ok(outcome) => outcome,
        Err(error) => {
            let code = error_codes::code_for(&error);
            if output_format != OutputFormat::Human {
                let response = JsonResponse::new(
                    ErrorResponse {
                        code: code.to_string(),
                        message: error.to_string(),
                    },
                    &exec_id,
                );
                output_json(&response, output_format)?;
            }
            return Err(anyhow::anyhow!("[{}] {}", code, error));
        }
    };

    let export = outcome.graph.to_export();
    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = JsonResponse::new(
                MergeResponse {
                    artifact,
                    dependencies,
                    graph_digest: graph_digest(&export),
                    graph: export,
                    report: outcome.report,
                },
                &exec_id,
            );
            output_json(&response, output_format)?;
        }
        OutputFormat::Human => {
            println!("artifact: {}", artifact);
            println!("nodes: {}", outcome.graph.node_count());
            println!("arcs: {}", outcome.graph.arc_count());
            println!("digest: {}", graph_digest(&export));
            if !outcome.report.is_clean() {
                println!(
                    "dropped: {} dependencies, {} callables",
                    outcome.report.dependencies_dropped, outcome.report.callables_dropped
                );
                println!(
                    "unresolved: {} dynamic sites, {} zero-target sites",
                    outcome.report.dynamic_sites_unresolved, outcome.report.sites_resolved_zero
                );
            }
        }
    }

    Ok(())
}
