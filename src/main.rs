use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use sqlgate::commands;
use sqlgate::display;

/// sqlgate CLI - table lineage and freshness gate for SQL pipelines
#[derive(Parser)]
#[clap(
    name = "sqlgate",
    about = "sqlgate - table lineage extraction and freshness validation",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract table lineage from a SQL file or a directory of SQL files
    Extract {
        /// Path to the SQL file or directory
        #[clap(short, long)]
        sql_path: Option<PathBuf>,

        /// Output format for the report (text, json, csv, dot)
        #[clap(short, long)]
        format: Option<String>,

        /// Path to the sqlgate.yaml configuration file
        #[clap(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            sql_path,
            format,
            config,
        } => {
            if let Err(err) = commands::extract::extract_command(sql_path, format, config) {
                eprintln!("Error: {:#}", err);
                process::exit(1);
            }
        }
        Command::Version => {
            display::display_version();
        }
    }
}
