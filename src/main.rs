//! Stitcher CLI - Cross-artifact call graph merging
//!
//! Usage: stitcher <command> [arguments]

mod cli;
mod merge_cmd;
mod status_cmd;

use cli::{parse_args_impl, print_usage, Command};
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match parse_args_impl(|| println!("{}", stitcher::version::version())) {
        Ok(Command::Merge {
            db_path,
            artifact,
            dependencies,
            config,
            output_format,
        }) => {
            if let Err(e) =
                merge_cmd::run_merge(db_path, artifact, dependencies, config, output_format)
            {
                eprintln!("Error: {}", e);
                return ExitCode::from(1);
            }
            ExitCode::SUCCESS
        }
        Ok(Command::Status {
            db_path,
            output_format,
        }) => {
            if let Err(e) = status_cmd::run_status(db_path, output_format) {
                eprintln!("Error: {}", e);
                return ExitCode::from(1);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            ExitCode::from(1)
        }
    }
}
