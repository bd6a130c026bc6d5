//! CLI argument definitions using clap
//!
//! Commands:
//! - tableaccess invoke --handler <name> [--config <path>]
//! - tableaccess upload-url [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::handlers::HandlerKind;

/// Local invocation harness for the record handlers
#[derive(Parser, Debug)]
#[command(name = "tableaccess")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one transport request per stdin line through a handler
    Invoke {
        /// Path to configuration file; environment only when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// get, get-many, insert, update or delete
        #[arg(long)]
        handler: HandlerKind,
    },

    /// Print a signed upload URL response
    UploadUrl {
        /// Path to configuration file; environment only when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
