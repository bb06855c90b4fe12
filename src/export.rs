//! Export decoded tables
//!
//! Supports CSV (header row, one line per row), a JSON document of the form
//! `{"file": ..., "columns": [...], "data": [{column: value}, ...]}`, and
//! JSON Lines (one `{column: value}` object per line).

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, ResultExt, TraceError};
use crate::frame::{Frame, RowRef};
use crate::types::Value;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    #[serde(rename = "jsonl")]
    JsonLines,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::JsonLines => write!(f, "JSON Lines"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "jsonl" | "ndjson" => Ok(ExportFormat::JsonLines),
            other => Err(format!("unknown format '{}' (expected csv, json or jsonl)", other)),
        }
    }
}

/// JSON document wrapping one table
#[derive(Debug, Serialize)]
pub struct FrameDocument<'a> {
    pub file: &'a str,
    pub columns: &'a [String],
    pub data: Vec<RowRef<'a>>,
}

impl<'a> FrameDocument<'a> {
    pub fn new(file: &'a str, frame: &'a Frame) -> Self {
        Self {
            file,
            columns: frame.columns(),
            data: frame.rows().collect(),
        }
    }
}

/// Write `frame` to `writer`; `file` names the source in JSON documents
pub fn write_frame<W: Write>(
    frame: &Frame,
    file: &str,
    format: ExportFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(frame, writer),
        ExportFormat::Json => write_json(frame, file, writer),
        ExportFormat::JsonLines => write_jsonl(frame, writer),
    }
}

/// Write `frame` to a new file at `path`
pub fn export_to_path(
    frame: &Frame,
    file: &str,
    format: ExportFormat,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let out = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(out);
    write_frame(frame, file, format, &mut writer)?;
    writer.flush().with_context(|| format!("Failed to write {:?}", path))?;
    tracing::info!("Exported {} rows to {:?} as {}", frame.len(), path, format);
    Ok(())
}

pub fn write_csv<W: Write>(frame: &Frame, writer: &mut W) -> Result<()> {
    let header: Vec<String> = frame.columns().iter().map(|c| csv_field(c)).collect();
    writeln!(writer, "{}", header.join(","))?;

    for row in frame.rows() {
        let line: Vec<String> = row.values().iter().map(csv_cell).collect();
        writeln!(writer, "{}", line.join(","))?;
    }
    Ok(())
}

pub fn write_json<W: Write>(frame: &Frame, file: &str, writer: &mut W) -> Result<()> {
    serde_json::to_writer(&mut *writer, &FrameDocument::new(file, frame))
        .map_err(|e| TraceError::Serialization(format!("Failed to write JSON: {}", e)))?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_jsonl<W: Write>(frame: &Frame, writer: &mut W) -> Result<()> {
    for row in frame.rows() {
        serde_json::to_writer(&mut *writer, &row)
            .map_err(|e| TraceError::Serialization(format!("Failed to write JSON line: {}", e)))?;
        writeln!(writer)?;
    }
    Ok(())
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Text(s) => csv_field(s),
        other => other.to_string(),
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
