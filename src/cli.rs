use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// SQL Query Vet - Check sqlc queries against user-defined rules
#[derive(Parser, Debug)]
#[command(name = "sql-query-vet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Vet queries against the rules in the sqlc configuration
    Vet {
        /// Path to the configuration file (default: sqlc.yaml, sqlc.yml,
        /// sqlc.json or sqlc.toml in the working directory)
        #[arg(short = 'c', long)]
        file: Option<PathBuf>,

        /// Never open database connections
        #[arg(long, env = "SQLC_VET_NO_DATABASE")]
        no_database: bool,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
