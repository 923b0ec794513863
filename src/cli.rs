//! CLI argument parsing for Stitcher
//!
//! Defines the Command enum and parse_args() function for all CLI commands.

use anyhow::Result;
use std::path::PathBuf;
use stitcher::{DynamicSitePolicy, MergeConfig, MissingDepPolicy, OutputFormat};

pub fn print_usage() {
    eprintln!("Stitcher - Cross-artifact call graph merging");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  stitcher <command> [arguments]");
    eprintln!("  stitcher --help");
    eprintln!();
    eprintln!("  stitcher merge --db <FILE> --artifact <G:A:V> [--dependency <G:A:V>]... [options]");
    eprintln!("  stitcher status --db <FILE> [--output <FORMAT>]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  merge    Resolve a partial call graph against its dependency closure");
    eprintln!("  status   Show store database statistics");
    eprintln!();
    eprintln!("Merge arguments:");
    eprintln!("  --db <FILE>            Path to the store database");
    eprintln!("  --artifact <G:A:V>     Focal coordinate (group:artifact:version)");
    eprintln!("  --dependency <G:A:V>   Dependency coordinate (repeatable)");
    eprintln!("  --dynamic-sites <P>    Policy for dynamic sites: warn (default), drop, or fail");
    eprintln!("  --missing-deps <P>     Policy for missing dependencies: skip (default) or fail");
    eprintln!("  --no-intern            Keep hierarchy closures as hash sets instead of sorted id vectors");
    eprintln!("  --output <FORMAT>      Output format: json (default), pretty, or text");
    eprintln!();
    eprintln!("Status arguments:");
    eprintln!("  --db <FILE>            Path to the store database");
    eprintln!("  --output <FORMAT>      Output format: text (default), json, or pretty");
}

pub enum Command {
    Merge {
        db_path: PathBuf,
        artifact: String,
        dependencies: Vec<String>,
        config: MergeConfig,
        output_format: OutputFormat,
    },
    Status {
        db_path: PathBuf,
        output_format: OutputFormat,
    },
}

/// Parse CLI arguments into a Command
///
/// For the --version and -V flags, prints the version and exits. For
/// --help and -h, prints usage and exits. The version display is passed
/// in as a closure to avoid a circular dependency with the version module.
pub fn parse_args_impl<F>(print_version: F) -> Result<Command>
where
    F: FnOnce(),
{
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        return Err(anyhow::anyhow!("Missing command"));
    }

    let command = &args[1];

    if command == "--version" || command == "-V" {
        print_version();
        std::process::exit(0);
    }

    if command == "--help" || command == "-h" {
        print_usage();
        std::process::exit(0);
    }

    match command.as_str() {
        "merge" => {
            let mut db_path: Option<PathBuf> = None;
            let mut artifact: Option<String> = None;
            let mut dependencies: Vec<String> = Vec::new();
            let mut config = MergeConfig::default();
            let mut output_format = OutputFormat::Json;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--db" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--db requires an argument"));
                        }
                        db_path = Some(PathBuf::from(&args[i + 1]));
                        i += 2;
                    }
                    "--artifact" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--artifact requires an argument"));
                        }
                        artifact = Some(args[i + 1].clone());
                        i += 2;
                    }
                    "--dependency" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--dependency requires an argument"));
                        }
                        dependencies.push(args[i + 1].clone());
                        i += 2;
                    }
                    "--dynamic-sites" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--dynamic-sites requires an argument"));
                        }
                        config.dynamic_site_policy = DynamicSitePolicy::from_str(&args[i + 1])
                            .ok_or_else(|| {
                                anyhow::anyhow!(
                                    "Invalid dynamic-site policy: {} (expected warn, drop, or fail)",
                                    args[i + 1]
                                )
                            })?;
                        i += 2;
                    }
                    "--missing-deps" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--missing-deps requires an argument"));
                        }
                        config.missing_dep_policy = MissingDepPolicy::from_str(&args[i + 1])
                            .ok_or_else(|| {
                                anyhow::anyhow!(
                                    "Invalid missing-dep policy: {} (expected skip or fail)",
                                    args[i + 1]
                                )
                            })?;
                        i += 2;
                    }
                    "--no-intern" => {
                        config.intern_type_uris = false;
                        i += 1;
                    }
                    "--output" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--output requires an argument"));
                        }
                        output_format = OutputFormat::from_str(&args[i + 1]).ok_or_else(|| {
                            anyhow::anyhow!(
                                "Invalid output format: {} (expected json, pretty, or text)",
                                args[i + 1]
                            )
                        })?;
                        i += 2;
                    }
                    other => {
                        return Err(anyhow::anyhow!("Unknown merge argument: {}", other));
                    }
                }
            }

            Ok(Command::Merge {
                db_path: db_path.ok_or_else(|| anyhow::anyhow!("merge requires --db"))?,
                artifact: artifact.ok_or_else(|| anyhow::anyhow!("merge requires --artifact"))?,
                dependencies,
                config,
                output_format,
            })
        }
        "status" => {
            let mut db_path: Option<PathBuf> = None;
            let mut output_format = OutputFormat::Human;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--db" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--db requires an argument"));
                        }
                        db_path = Some(PathBuf::from(&args[i + 1]));
                        i += 2;
                    }
                    "--output" => {
                        if i + 1 >= args.len() {
                            return Err(anyhow::anyhow!("--output requires an argument"));
                        }
                        output_format = OutputFormat::from_str(&args[i + 1]).ok_or_else(|| {
                            anyhow::anyhow!("Invalid output format: {}", args[i + 1])
                        })?;
                        i += 2;
                    }
                    other => {
                        return Err(anyhow::anyhow!("Unknown status argument: {}", other));
                    }
                }
            }

            Ok(Command::Status {
                db_path: db_path.ok_or_else(|| anyhow::anyhow!("status requires --db"))?,
                output_format,
            })
        }
        other => Err(anyhow::anyhow!("Unknown command: {}", other)),
    }
}
