pub mod dispatch;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// `planwright` - compile symbolic plans into dependency graphs and run them.
#[derive(Parser, Debug)]
#[command(name = "planwright")]
#[command(version = "0.1.0")]
#[command(about = "Compile and execute symbolic task plans.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.planwright/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a plan document and print its execution graph
    Graph {
        /// Plan document (JSON)
        plan: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = GraphFormat::Json)]
        format: GraphFormat,
    },

    /// Execute a plan document against a simulated world
    Run {
        /// Plan document (JSON)
        plan: PathBuf,

        /// Downgrade condition failures to warnings
        #[arg(long)]
        dry_run: bool,

        /// Log condition-evaluation counts per node
        #[arg(long)]
        verbose: bool,

        /// Run concurrent siblings in parallel
        #[arg(long)]
        parallel: bool,

        /// Print the dispatch report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Json,
    Dot,
}
