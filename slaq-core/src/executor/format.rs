//! Result rendering: aligned text table, CSV, and JSON.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::QueryResult;
use crate::error::{SlaqError, SlaqResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = SlaqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(SlaqError::ExecutionError(format!(
                "unknown output format: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl QueryResult {
    pub fn render(&self, format: OutputFormat) -> SlaqResult<String> {
        match format {
            OutputFormat::Table => Ok(self.to_table()),
            OutputFormat::Csv => self.to_csv(),
            OutputFormat::Json => self.to_json(),
        }
    }

    /// Fixed-width table with a header rule and a row-count footer.
    pub fn to_table(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if cell.len() > widths[i] {
                    widths[i] = cell.len();
                }
            }
        }

        let mut out = String::new();
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                out.push_str("  ");
            }
            out.push_str(&format!("{:<width$}", column, width = widths[i]));
        }
        out.push('\n');
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                out.push_str("  ");
            }
            out.push_str(&"-".repeat(*width));
        }
        out.push('\n');
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    out.push_str("  ");
                }
                out.push_str(&format!("{:<width$}", cell, width = widths[i]));
            }
            out.push('\n');
        }
        out.push_str(&format!(
            "\n{} row{}\n",
            self.count,
            if self.count == 1 { "" } else { "s" }
        ));
        out
    }

    /// CSV with a header row. Quoting and quote doubling follow RFC 4180.
    pub fn to_csv(&self) -> SlaqResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .map_err(|e| SlaqError::ExecutionError(format!("CSV write failed: {}", e)))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writer
                .write_record(&cells)
                .map_err(|e| SlaqError::ExecutionError(format!("CSV write failed: {}", e)))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SlaqError::ExecutionError(format!("CSV write failed: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| SlaqError::ExecutionError(format!("CSV output not UTF-8: {}", e)))
    }

    pub fn to_json(&self) -> SlaqResult<String> {
        #[derive(Serialize)]
        struct JsonResult<'a> {
            count: usize,
            columns: &'a [String],
            rows: &'a [Vec<crate::value::Value>],
        }
        let payload = JsonResult {
            count: self.count,
            columns: &self.columns,
            rows: &self.rows,
        };
        serde_json::to_string_pretty(&payload)
            .map_err(|e| SlaqError::ExecutionError(format!("JSON encoding failed: {}", e)))
    }
}
