use std::path::PathBuf;

use thiserror::Error;

/// A value outside one of the closed enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Rejections at the CSV ingestion boundary.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("line {line}: {source}")]
    Field {
        line: u64,
        #[source]
        source: ParseEnumError,
    },
    #[error("line {line}: invalid date `{value}`")]
    Date { line: u64, value: String },
    #[error("line {line}: empty {field}")]
    Empty { line: u64, field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("an account for {0} already exists")]
    DuplicateEmail(String),
    #[error("student accounts need a student number")]
    MissingStudentNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveError {
    #[error("no leave request with id {0}")]
    NotFound(String),
    #[error("leave request {id} was already {status}")]
    AlreadyDecided { id: String, status: String },
    #[error("leave ends before it starts")]
    InvalidRange,
    #[error("no student with id {0}")]
    UnknownStudent(String),
    #[error("log in to see leave requests")]
    NotLoggedIn,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    #[error("max_absence_ratio must be within 0..=1, got {0}")]
    AbsenceRatio(f64),
    #[error("fallback {session} attended {attended} exceeds total {total}")]
    Fallback {
        session: &'static str,
        attended: u32,
        total: u32,
    },
    #[error("fallback totals {theoretical} + {practical} do not fit in a class count")]
    FallbackOverflow { theoretical: u32, practical: u32 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session cache io at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session cache at {} is corrupt", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
