//! JSON output for the CLI
//!
//! - One JSON object per command on stdout
//! - `{"status": "ok", "data": ...}` or `{"status": "error", "code", "message"}`
//! - Logs go to stdout/stderr as separate lines; the response is always last

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::CliResult;

fn write_line(mut out: impl Write, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Build a success response
pub fn ok_response(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

/// Build an error response
pub fn error_response(code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(io::stdout().lock(), &ok_response(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(io::stdout().lock(), &error_response(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shapes() {
        let ok = ok_response(json!({"checked": 3}));
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["data"]["checked"], 3);

        let err = error_response("FIXITY_CLI_IO_ERROR", "closed");
        assert_eq!(err["status"], "error");
        assert_eq!(err["code"], "FIXITY_CLI_IO_ERROR");
    }

    #[test]
    fn test_write_line_appends_newline() {
        let mut buf = Vec::new();
        write_line(&mut buf, &ok_response(json!(null))).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
    }
}
