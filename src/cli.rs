use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// saio-provision - bootstrap a Swift all-in-one dev cluster
#[derive(Parser)]
#[command(name = "saio-provision")]
#[command(about = "Provision a multi-node Swift object-storage cluster on this machine")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// Guards are still evaluated so the preview reflects what a real run
    /// would skip; actions are logged instead of performed.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the plan and execute it against this machine
    Provision {
        /// Path to a cluster configuration file (defaults to the stock SAIO topology)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Build the plan and print it without executing anything
    Plan {
        /// Path to a cluster configuration file (defaults to the stock SAIO topology)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a cluster configuration file
    Validate {
        /// Path to the configuration file to validate
        config: PathBuf,
    },
    /// Write a default cluster configuration file
    Init {
        /// Where to write the configuration
        path: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
