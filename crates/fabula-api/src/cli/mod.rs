//! CLI command definitions for the `fabula` binary.
//!
//! Uses clap derive macros for argument parsing. The binary has three
//! verbs: `serve` (the REST API), `sync` (config file push/pull through
//! the document store), and `completions`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chinese novel writing assistant: REST API server and config tooling.
#[derive(Parser)]
#[command(name = "fabula", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Export spans to stdout via OpenTelemetry.
        #[arg(long)]
        otel: bool,
    },

    /// Copy the config file into or out of the document store.
    Sync {
        #[command(subcommand)]
        direction: SyncDirection,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SyncDirection {
    /// Upload the local config file to the store.
    Push {
        /// Config file to upload.
        #[arg(long, default_value = "config/base.yaml")]
        file: PathBuf,
    },

    /// Download the stored config file.
    Pull {
        /// Where to write the downloaded config.
        #[arg(long, default_value = "config/base.yaml")]
        file: PathBuf,
    },
}
