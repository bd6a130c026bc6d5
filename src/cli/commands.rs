//! CLI command implementations

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use crate::config::AppConfig;
use crate::handlers::HandlerKind;
use crate::middleware::{Pipeline, TransportResponse};
use crate::observability::Logger;
use crate::store::InMemoryStore;
use crate::table::Table;
use crate::upload::{upload_image, UploadUrlGenerator};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_response, LineError};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Invoke { config, handler } => invoke(config.as_deref(), handler),
        Command::UploadUrl { config } => upload_url(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_env()?,
    };
    Logger::set_min_severity(config.severity()?);
    Logger::set_all_to_stderr(true);
    Ok(config)
}

/// Serve stdin requests through one handler against an in-memory table
/// that lives for the whole process
pub fn invoke(config_path: Option<&Path>, handler: HandlerKind) -> CliResult<()> {
    let config = load_config(config_path)?;

    let store = Arc::new(InMemoryStore::with_tables([config.actor_table.as_str()]));
    let table = Arc::new(Table::new(config.actor_table.clone(), store)?);
    let pipeline = handler.pipeline(table);

    Logger::info(
        "HARNESS_READY",
        &[
            ("handler", handler.as_str()),
            ("table", &config.actor_table),
            ("endpoint", config.endpoint_url.as_deref().unwrap_or("in-memory")),
        ],
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::setup_failed(format!("Failed to create tokio runtime: {}", e)))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    rt.block_on(serve_lines(&pipeline, stdin.lock(), &mut stdout.lock()))
}

/// Run each request line through `pipeline`, one response line each.
/// A malformed line gets a 400 response; a read failure stops the loop.
pub async fn serve_lines<R: BufRead, W: Write>(
    pipeline: &Pipeline,
    input: R,
    output: &mut W,
) -> CliResult<()> {
    for line in read_requests(input) {
        let response = match line {
            Ok(request) => match pipeline.invoke(request).await {
                Ok(response) => response,
                Err(handled) => handled.response,
            },
            Err(LineError::Malformed(message)) => TransportResponse::json(
                400,
                &json!({ "message": format!("Malformed request line: {}", message) }),
            ),
            Err(LineError::Io(e)) => return Err(e),
        };
        write_response(output, &response)?;
    }
    Ok(())
}

/// Print one signed upload URL response
pub fn upload_url(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let expiry = i64::try_from(config.upload_expiry_secs)
        .map_err(|_| CliError::setup_failed("upload_expiry_secs out of range"))?;

    let generator = UploadUrlGenerator::new(
        config.upload_bucket,
        config.upload_base_url,
        config.upload_signing_secret.as_bytes(),
        Duration::seconds(expiry),
    )?;

    write_response(&mut io::stdout().lock(), &upload_image(&generator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Cursor;

    fn pipeline(kind: HandlerKind) -> (Pipeline, Arc<Table>) {
        let store = Arc::new(InMemoryStore::with_tables(["actors"]));
        let table = Arc::new(Table::new("actors", store).unwrap());
        (kind.pipeline(table.clone()), table)
    }

    fn responses(out: Vec<u8>) -> Vec<Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_serve_lines_one_response_per_request() {
        let (insert, table) = pipeline(HandlerKind::Insert);
        let input = Cursor::new(concat!(
            "{\"body\":{\"id\":\"u1\",\"name\":\"Ann\"}}\n",
            "\n",
            "{\"body\":{\"id\":\"u1\"}}\n",
            "garbage\n",
        ));
        let mut out = Vec::new();

        serve_lines(&insert, input, &mut out).await.unwrap();

        let lines = responses(out);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["statusCode"], 200);
        assert_eq!(lines[1]["statusCode"], 409);
        assert_eq!(lines[2]["statusCode"], 400);
        assert!(table.fetch_one("u1", None).await.unwrap().is_found());
    }

    #[tokio::test]
    async fn test_serve_lines_non_object_body() {
        let (get, _) = pipeline(HandlerKind::Get);
        let mut out = Vec::new();

        serve_lines(&get, Cursor::new("{\"body\":[1,2]}\n"), &mut out)
            .await
            .unwrap();

        let lines = responses(out);
        assert_eq!(lines[0]["statusCode"], 400);
    }

    #[tokio::test]
    async fn test_serve_lines_null_markers_reach_handler() {
        let (get, _) = pipeline(HandlerKind::Get);
        let mut out = Vec::new();

        serve_lines(
            &get,
            Cursor::new("{\"body\":\"null\",\"queryStringParameters\":\"null\"}\n"),
            &mut out,
        )
        .await
        .unwrap();

        let lines = responses(out);
        let body: Value = serde_json::from_str(lines[0]["body"].as_str().unwrap()).unwrap();
        assert_eq!(lines[0]["statusCode"], 400);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
