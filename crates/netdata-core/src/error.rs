//! Error types for netdata-core

use crate::normalize::NormalizationError;
use crate::parser::{column_letter, HeaderViolation, RowShapeMismatch};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in netdata-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but has no header row
    #[error("file {} is empty", .path.display())]
    EmptyFile { path: PathBuf },

    /// The file is not valid UTF-8
    #[error(
        "file {} is not valid UTF-8:\n  Invalid byte 0x{byte:02X} at global byte offset {offset}\n  Line {line}, column {column}\n  Decoder error: {detail}",
        .path.display()
    )]
    Encoding {
        path: PathBuf,
        byte: u8,
        offset: usize,
        line: usize,
        column: usize,
        detail: String,
    },

    /// The file contains a character outside the allowed set
    #[error(
        "unexpected unicode character in {}:\n  '{ch}' (U+{:04X}, {name})\n  Line {line}, column {column}",
        .path.display(),
        code_point(.ch)
    )]
    UnicodePolicy {
        path: PathBuf,
        ch: char,
        name: String,
        line: usize,
        column: usize,
    },

    /// Blank or duplicate header cells
    #[error(
        "{}: header validation failed:\n{}\nFull header: {}",
        .path.display(),
        format_lines(.violations),
        annotate_header(.header)
    )]
    Header {
        path: PathBuf,
        violations: Vec<HeaderViolation>,
        header: Vec<String>,
    },

    /// Data rows whose width differs from the header
    #[error("CSV validation failed for {}:\n{}", .path.display(), format_lines(.mismatches))]
    RowShape {
        path: PathBuf,
        mismatches: Vec<RowShapeMismatch>,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Malformed JSON-looking cells found during a document pass
    #[error("errors while normalizing {source_name}:\n{}", format_lines(.errors))]
    Normalization {
        source_name: String,
        errors: Vec<NormalizationError>,
    },

    /// A generated document does not have the expected shape
    #[error("invalid document '{path}': {message}")]
    InvalidDocument { path: PathBuf, message: String },

    /// The schema could not be compiled
    #[error("invalid schema: {0}")]
    Schema(String),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_lines<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| format!("  - {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn code_point(ch: &char) -> u32 {
    u32::from(*ch)
}

fn annotate_header(header: &[String]) -> String {
    header
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}:{}", column_letter(i), name))
        .collect::<Vec<_>>()
        .join(", ")
}
