use std::fmt::Write;

use csv::WriterBuilder;

use crate::error::{DangerError, Result};

use super::event::EVENT_DATE_FORMAT;
use super::AttendanceRecord;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HEADERS: [&str; 10] = [
    "player_id",
    "player_name",
    "status",
    "points",
    "session_name",
    "event_type",
    "legion",
    "event_date",
    "marked_at",
    "marked_by",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Html => "html",
        }
    }
}

fn fields(record: &AttendanceRecord) -> [String; 10] {
    [
        record.player_id.to_string(),
        record.player_name.clone(),
        record.status.as_str().to_string(),
        record.points.to_string(),
        record.session_name.clone(),
        record.event_type.as_str().to_string(),
        record.legion.map(|l| l.as_str().to_string()).unwrap_or_default(),
        record.event_date.map(|d| d.format(EVENT_DATE_FORMAT).to_string()).unwrap_or_default(),
        record.marked_at.format(DATETIME_FORMAT).to_string(),
        record.marked_by.username.clone(),
    ]
}

/// Serializes records for download.
pub fn export_records(records: &[AttendanceRecord], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => delimited(records, b','),
        ExportFormat::Tsv => delimited(records, b'\t'),
        ExportFormat::Html => Ok(html(records).into_bytes()),
    }
}

fn delimited(records: &[AttendanceRecord], delimiter: u8) -> Result<Vec<u8>> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    wtr.write_record(HEADERS)?;
    for record in records {
        wtr.write_record(fields(record))?;
    }

    wtr.into_inner()
        .map_err(|e| DangerError::Other(format!("Unable to finish export: {}", e)))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn html(records: &[AttendanceRecord]) -> String {
    let title = records
        .first()
        .map(|r| format!("{} - {}", r.alliance_name, r.session_name))
        .unwrap_or_else(|| "Attendance".to_string());

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape(&title));
    out.push_str("</head>\n<body>\n");
    let _ = writeln!(out, "<h1>{}</h1>", escape(&title));
    out.push_str("<table border=\"1\">\n<tr>");
    for header in HEADERS {
        let _ = write!(out, "<th>{}</th>", header);
    }
    out.push_str("</tr>\n");

    for record in records {
        out.push_str("<tr>");
        for field in fields(record) {
            let _ = write!(out, "<td>{}</td>", escape(&field));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</table>\n</body>\n</html>\n");
    out
}
