//! # SQL Query Vet
//!
//! Rule-based vetting for sqlc query files.
//!
//! `sql-query-vet` reads an sqlc configuration, loads the queries of every
//! SQL group and checks each query against user-defined rules written as
//! boolean CEL expressions. Rules can additionally require that the query
//! prepares on a live database, or inspect the query plan returned by
//! `EXPLAIN` on PostgreSQL and MySQL.
//!
//! # Quick Start
//!
//! ```bash
//! # Vet using ./sqlc.yaml
//! sql-query-vet vet
//!
//! # Explicit config, no database round-trips
//! sql-query-vet vet -c path/to/sqlc.yaml --no-database
//!
//! # Machine-readable results
//! sql-query-vet vet -f json > vet.json
//! ```
//!
//! # Configuration
//!
//! ```yaml
//! version: "2"
//! sql:
//!   - engine: postgresql
//!     schema: schema.sql
//!     queries: query.sql
//!     database:
//!       uri: postgresql://localhost:5432/app?password=${PG_PASSWORD}
//!     rules:
//!       - sqlc/db-prepare
//!       - no-seq-scan
//! rules:
//!   - name: no-seq-scan
//!     rule: postgresql.explain.plan.node_type == "Seq Scan"
//!     message: query performs a sequential scan
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Every query passed every rule
//! - `1` - At least one rule tripped, a prepare/EXPLAIN check failed or a group
//!   failed to load
//! - `2` - Fatal error (configuration, rule compilation or evaluation,
//!   connection failure, cancellation)
//!
//! # Logging
//!
//! Logs go to stderr and are controlled by `RUST_LOG` (default `warn`,
//! `debug` with `--verbose`).

use std::process;

use clap::Parser;
use sql_query_vet::{
    app::{VetParams, run_vet},
    cli::{Cli, Commands},
    error::{AppResult, error_message, file_read_error}
};
use tokio::main;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", error_message(&e));
            process::exit(2);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> AppResult<i32> {
    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            signal.cancel();
        }
    });

    match cli.command {
        Commands::Vet {
            file,
            no_database,
            output_format,
            no_color
        } => {
            let working_dir =
                std::env::current_dir().map_err(|e| file_read_error("current directory", e))?;
            let params = VetParams {
                config_file: file,
                working_dir,
                no_database,
                output_format,
                no_color
            };
            let result = run_vet(params, cancel).await?;
            if result.to_stderr {
                eprint!("{}", result.output);
            } else {
                println!("{}", result.output);
            }
            Ok(result.exit_code)
        }
    }
}
