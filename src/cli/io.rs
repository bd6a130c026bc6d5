//! Line-delimited JSON I/O
//!
//! - Input: one transport request per line; blank lines are skipped
//! - Output: one transport response per line

use std::io::{BufRead, Write};

use crate::middleware::{TransportRequest, TransportResponse};

use super::errors::{CliError, CliResult};

/// A request line that could not be read or parsed
#[derive(Debug)]
pub enum LineError {
    /// Reading failed; no further lines can be read
    Io(CliError),
    /// The line is not a transport request
    Malformed(String),
}

/// Read transport requests from `input`
pub fn read_requests<R: BufRead>(
    input: R,
) -> impl Iterator<Item = Result<TransportRequest, LineError>> {
    input
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|line| {
            let line = line.map_err(|e| LineError::Io(CliError::from(e)))?;
            serde_json::from_str(&line).map_err(|e| LineError::Malformed(e.to_string()))
        })
}

/// Write one response line
pub fn write_response<W: Write>(output: &mut W, response: &TransportResponse) -> CliResult<()> {
    serde_json::to_writer(&mut *output, response)?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_skips_blank_lines() {
        let input = Cursor::new("{\"body\":{\"id\":\"u1\"}}\n\n   \nnot json\n");
        let lines: Vec<_> = read_requests(input).collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].is_ok());
        assert!(matches!(lines[1], Err(LineError::Malformed(_))));
    }

    #[test]
    fn test_write_response_line() {
        let mut out = Vec::new();
        write_response(&mut out, &TransportResponse::text(200, "ok")).unwrap();

        let line = String::from_utf8(out).unwrap();
        assert_eq!(line, "{\"statusCode\":200,\"body\":\"ok\"}\n");
    }
}
