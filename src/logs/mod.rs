//! Access log ingestion.
//!
//! Parses the Apache/nginx Combined Log Format:
//!
//! ```text
//! 127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /index.html HTTP/1.0" 200 2326 "http://ref" "Mozilla/5.0"
//! ```
//!
//! Malformed lines are skipped with a debug log rather than failing the whole
//! file; real log files routinely contain truncated or garbage lines.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use chrono::DateTime;
use regex::Regex;

use slaq_core::LogRecord;

use crate::error::{AppError, AppResult};

const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

fn line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^(\S+) \S+ \S+ \[([^\]]+)\] "(\S+) (\S+)(?: (\S+))?" (\d{3}|-) (\d+|-)(?: "([^"]*)" "([^"]*)")?\s*$"#,
        )
        .expect("log line regex is valid")
    })
}

/// Parse one Combined Log Format line. Returns `None` if the line does not
/// match the format or carries an unparseable timestamp.
pub fn parse_line(line: &str) -> Option<LogRecord> {
    let caps = line_regex().captures(line)?;

    let timestamp = DateTime::parse_from_str(&caps[2], TIMESTAMP_FORMAT)
        .ok()?
        .naive_local();

    // "-" means no data; status without data is useless, size becomes 0
    let status: i64 = caps[6].parse().ok()?;
    let size: i64 = match &caps[7] {
        "-" => 0,
        s => s.parse().ok()?,
    };

    Some(LogRecord {
        ip: caps[1].to_string(),
        timestamp,
        method: caps[3].to_string(),
        url: caps[4].to_string(),
        protocol: caps.get(5).map_or(String::new(), |m| m.as_str().to_string()),
        status,
        size,
        referer: caps.get(8).map_or_else(|| "-".to_string(), |m| m.as_str().to_string()),
        user_agent: caps.get(9).map_or_else(|| "-".to_string(), |m| m.as_str().to_string()),
    })
}

/// Load every parseable record from a log file.
pub fn load_file(path: &Path) -> AppResult<Vec<LogRecord>> {
    if !path.is_file() {
        return Err(AppError::LogFileNotFound(path.display().to_string()));
    }
    let reader = BufReader::new(File::open(path)?);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                tracing::debug!(line = number + 1, "skipping malformed log line");
            }
        }
    }
    tracing::info!(
        path = %path.display(),
        records = records.len(),
        skipped,
        "loaded access log"
    );
    Ok(records)
}
