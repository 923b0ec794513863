//! Status command implementation
//!
//! Usage: stitcher status --db <FILE>

use anyhow::Result;
use std::path::PathBuf;
use stitcher::output::{
    generate_execution_id, output_json, JsonResponse, OutputFormat, StatusResponse,
};
use stitcher::store::sqlite::SqliteStores;

/// Run the status command: row counts per store table.
pub fn run_status(db_path: PathBuf, output_format: OutputFormat) -> Result<()> {
    let stores = SqliteStores::open(&db_path)?;

    let response = StatusResponse {
        packages: stores.count("packages")?,
        package_versions: stores.count("package_versions")?,
        modules: stores.count("modules")?,
        callables: stores.count("callables")?,
        edges: stores.count("edges")?,
    };

    match output_format {
        OutputFormat::Json | OutputFormat::Pretty => {
            let exec_id = generate_execution_id();
            let json_response = JsonResponse::new(response, &exec_id);
            output_json(&json_response, output_format)?;
        }
        OutputFormat::Human => {
            println!("packages: {}", response.packages);
            println!("package_versions: {}", response.package_versions);
            println!("modules: {}", response.modules);
            println!("callables: {}", response.callables);
            println!("edges: {}", response.edges);
        }
    }

    Ok(())
}
