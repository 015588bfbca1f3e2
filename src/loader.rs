//! Tick CSV ingestion.
//!
//! Every caller re-reads the file; nothing is cached between requests.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use crate::error::{LoadError, ParseError};
use crate::model::tick::{TickPoint, TickRecord};
use crate::timestamp::normalize_timestamp;

/// Values pandas-style readers treat as missing.
const NA_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickColumns {
    pub timestamp: String,
    pub bid: String,
}

impl Default for TickColumns {
    fn default() -> Self {
        Self {
            timestamp: "jst".to_string(),
            bid: "bid".to_string(),
        }
    }
}

/// Where ticks come from: a CSV path plus the names of the two columns we read.
#[derive(Debug, Clone)]
pub struct TickSource {
    pub path: PathBuf,
    pub columns: TickColumns,
}

impl TickSource {
    pub fn new(path: impl Into<PathBuf>, columns: TickColumns) -> Self {
        Self {
            path: path.into(),
            columns,
        }
    }

    pub fn load_table(&self) -> Result<TickTable, LoadError> {
        load_table(&self.path)
    }

    pub fn load_chart_records(&self) -> Result<Vec<TickRecord>, LoadError> {
        load_chart_records(&self.path, &self.columns)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub timestamp: usize,
    pub bid: usize,
}

/// The raw file, headers plus string rows in file order.
#[derive(Debug, Clone)]
pub struct TickTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl TickTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &StringRecord> {
        self.rows.iter()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_columns(&self, columns: &TickColumns) -> Result<ColumnIndex, LoadError> {
        match (
            self.column_index(&columns.timestamp),
            self.column_index(&columns.bid),
        ) {
            (Some(timestamp), Some(bid)) => Ok(ColumnIndex { timestamp, bid }),
            _ => Err(LoadError::MissingColumn {
                timestamp: columns.timestamp.clone(),
                bid: columns.bid.clone(),
            }),
        }
    }
}

pub fn load_table(path: &Path) -> Result<TickTable, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);
    let headers = reader.headers().map_err(csv_err)?.clone();
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err)?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "Loaded tick table");
    Ok(TickTable { headers, rows })
}

/// Load, require both columns, normalize, and drop incomplete rows.
pub fn load_chart_records(path: &Path, columns: &TickColumns) -> Result<Vec<TickRecord>, LoadError> {
    let table = load_table(path)?;
    let index = table.require_columns(columns)?;
    let records: Vec<TickRecord> = table
        .rows()
        .map(|row| tick_record(row, index))
        .filter(TickRecord::is_complete)
        .collect();

    let dropped = table.len() - records.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = records.len(), "Dropped incomplete tick rows");
    }
    Ok(records)
}

pub fn tick_record(row: &StringRecord, index: ColumnIndex) -> TickRecord {
    let timestamp_raw = row.get(index.timestamp).unwrap_or_default().to_string();
    let timestamp_ms = normalize_timestamp(&timestamp_raw).ok();
    TickRecord {
        timestamp_raw,
        timestamp_ms,
        bid: parse_bid(row.get(index.bid).unwrap_or_default()),
    }
}

/// Strict conversion used by the stream: a bad row is an error, not a skip.
/// `row_number` is the zero-based data row, used only for reporting.
/// An empty or non-finite bid ends the stream here rather than going out as a
/// NaN/null `y` and carrying on.
pub fn tick_point(row: &StringRecord, index: ColumnIndex, row_number: usize) -> Result<TickPoint, ParseError> {
    let raw_ts = row.get(index.timestamp).unwrap_or_default();
    let x = normalize_timestamp(raw_ts).map_err(|source| ParseError::Timestamp {
        row: row_number,
        source,
    })?;
    let raw_bid = row.get(index.bid).unwrap_or_default();
    let y = parse_bid(raw_bid).ok_or_else(|| ParseError::Bid {
        row: row_number,
        raw: raw_bid.to_string(),
    })?;
    Ok(TickPoint { x, y })
}

pub fn parse_bid(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if NA_VALUES.contains(&raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bid_treats_na_markers_as_missing() {
        assert_eq!(parse_bid(" 71.25 "), Some(71.25));
        assert_eq!(parse_bid(""), None);
        assert_eq!(parse_bid("NaN"), None);
        assert_eq!(parse_bid("N/A"), None);
        assert_eq!(parse_bid("abc"), None);
        assert_eq!(parse_bid("inf"), None);
        assert_eq!(parse_bid("-infinity"), None);
    }

    #[test]
    fn tick_point_reports_row_number() {
        let row = StringRecord::from(vec!["2024-01-01T00:00:00", ""]);
        let index = ColumnIndex {
            timestamp: 0,
            bid: 1,
        };
        let err = tick_point(&row, index, 7).unwrap_err();
        assert!(matches!(err, ParseError::Bid { row: 7, .. }));
    }
}
