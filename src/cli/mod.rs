//! CLI module for tableaccess
//!
//! Provides a local harness for:
//! - invoke: run transport requests from stdin through a record handler
//! - upload-url: issue a signed upload URL

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{invoke, run, run_command, serve_lines, upload_url};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_response, LineError};
