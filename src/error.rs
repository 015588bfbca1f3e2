use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid allowed origin '{0}'")]
    Origin(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("empty timestamp")]
    Empty,

    #[error("invalid ISO-8601 timestamp '{0}'")]
    Invalid(String),

    #[error("invalid UTC offset '{0}'")]
    Offset(String),

    #[error("timestamp '{0}' is outside the nanosecond range")]
    OutOfRange(String),
}

/// Failure while reading the tick CSV from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Missing '{timestamp}' or '{bid}' column")]
    MissingColumn { timestamp: String, bid: String },
}

/// A single row that could not be turned into a wire tick.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Missing '{timestamp}' or '{bid}' column")]
    MissingColumn { timestamp: String, bid: String },

    #[error("row {row}: {source}")]
    Timestamp {
        row: usize,
        #[source]
        source: TimestampError,
    },

    #[error("row {row}: missing or non-numeric bid '{raw}'")]
    Bid { row: usize, raw: String },

    #[error("failed to encode tick: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("io error: {0}")]
    Io(String),
}

impl StreamError {
    pub fn kind(&self) -> &'static str {
        match self {
            StreamError::Parse(_) => "parse",
            StreamError::Transport(_) => "transport",
            StreamError::Io(_) => "io",
        }
    }
}

impl From<LoadError> for StreamError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::MissingColumn { timestamp, bid } => {
                StreamError::Parse(ParseError::MissingColumn { timestamp, bid })
            }
            other => StreamError::Io(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("chart render failed: {0}")]
    Render(String),

    #[error("chart encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ChartError {
    /// Missing columns are the caller's problem; everything else is ours.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ChartError::Load(LoadError::MissingColumn { .. }))
    }
}
