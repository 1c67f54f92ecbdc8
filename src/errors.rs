//! Error types for the studylog application.
//!
//! This module defines custom error types that categorize the failures
//! that can occur while logging sessions, keeping the journal, and running
//! the break timer.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the studylog application.
#[derive(Error, Debug)]
pub enum StudyError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to JSON serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors raised while reading or writing the CSV record files.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A numeric field (XP, minutes) could not be parsed.
    #[error("{field} must be a non-negative whole number, got \"{value}\"")]
    InvalidNumber { field: String, value: String },

    /// A required text field was empty.
    #[error("{field} cannot be empty")]
    MissingField { field: String },

    /// Subject is already in the subjects list.
    #[error("\"{name}\" is already in the list")]
    DuplicateSubject { name: String },

    /// Journal entry was not found.
    #[error("Journal entry not found: {id}")]
    EntryNotFound { id: String },

    /// A display row does not exist in the current view.
    #[error("Row {row} is out of range (showing {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    /// Break duration outside the supported range.
    #[error("Invalid break duration: {message}")]
    InvalidDuration { message: String },

    /// Attachment path cannot be stored.
    #[error("Invalid attachment {path}: {message}")]
    InvalidAttachment { path: PathBuf, message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// file not found
    #[error("File not found: {file_path}")]
    FileNotFound { file_path: String },

    #[error("{message}")]
    EditorError { message: String },

    /// Alarm playback could not be started.
    #[error("Alarm error: {message}")]
    AlarmError { message: String },
}
