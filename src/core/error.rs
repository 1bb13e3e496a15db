//! Error types for Robant operations.
//!
//! This module defines the canonical error type used throughout Robant.
//! All subsystems return `Result<T, RobantError>` for error handling.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tag distinguishing the seven diagnostic-carrying error kinds.
///
/// Kept separate from `RobantError` itself so that call sites can match
/// on the kind without destructuring a `Diagnostic`, and so the kind
/// survives formatting unambiguously (never recovered by string
/// matching on the rendered message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Repository,
    Hierarchy,
    ModelPartition,
    ModelValidity,
    ModelSatisfaction,
    ProjectState,
    ProjectIdentity,
    ProjectChronology,
    ProjectSatisfaction,
    Parse,
}

/// A single positioned diagnostic: a file, an optional line, an
/// optional column, and a message.
///
/// Column is only ever present alongside a line. Rendering picks one
/// of three `Failed validation: ...` formats based on which positional
/// fields are set.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            file: file.into(),
            line: None,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_column(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn repository(dir: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorKind::Repository, dir, message)
    }

    pub fn hierarchy(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorKind::Hierarchy, path, message)
    }

    pub fn model_partition(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorKind::ModelPartition, file, message)
    }

    pub fn model_validity(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorKind::ModelValidity, file, message)
    }

    pub fn model_satisfaction(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorKind::ModelSatisfaction, file, message)
    }

    pub fn project_state(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorKind::ProjectState, file, message)
    }

    pub fn project_identity(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorKind::ProjectIdentity, file, message)
    }

    pub fn project_chronology(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorKind::ProjectChronology, file, message)
    }

    pub fn project_satisfaction(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorKind::ProjectSatisfaction, file, message)
    }

    pub fn parse(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Diagnostic::new(ErrorKind::Parse, file, message)
    }

    /// Render one of the three `Failed validation: ...` single-line
    /// forms, chosen by which positional fields are present.
    pub fn render(&self) -> String {
        let file = self.file.display();
        match (self.line, self.column) {
            (Some(line), Some(col)) => {
                format!("Failed validation: {file}:{line}:{col}: {}", self.message)
            }
            (Some(line), None) => format!("Failed validation: {file}:{line}: {}", self.message),
            (None, _) => format!("Failed validation: {file}: {}", self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl std::error::Error for Diagnostic {}

/// Canonical error type for all Robant operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait
/// implementations. Every positioned failure flows through
/// `Diagnostic`; `Io` exists only for filesystem failures that precede
/// any parsing (the root directory itself unreadable, etc).
#[derive(Error, Debug)]
pub enum RobantError {
    /// I/O error (auto-converts from `std::io::Error`)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A positioned validation or parse failure.
    #[error(transparent)]
    Diagnostic(#[from] Diagnostic),

    /// Feature not yet implemented (e.g. `robant add`).
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl RobantError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            RobantError::Diagnostic(d) => Some(d.kind),
            _ => None,
        }
    }
}

pub fn diagnostic_io_error(path: &Path, err: io::Error) -> RobantError {
    RobantError::Diagnostic(Diagnostic::hierarchy(path, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_only_format() {
        let d = Diagnostic::hierarchy("PLANS.rst", "Missing project plans file");
        assert_eq!(
            d.render(),
            "Failed validation: PLANS.rst: Missing project plans file"
        );
    }

    #[test]
    fn test_line_format() {
        let d = Diagnostic::project_satisfaction("PLANS.rst", "START: 1 <= WORK <= 1")
            .with_line(7);
        assert_eq!(
            d.render(),
            "Failed validation: PLANS.rst:7: START: 1 <= WORK <= 1"
        );
    }

    #[test]
    fn test_column_format() {
        let d = Diagnostic::parse("METADATA.yml", "unexpected mapping key").with_column(3, 12);
        assert_eq!(
            d.render(),
            "Failed validation: METADATA.yml:3:12: unexpected mapping key"
        );
    }

    #[test]
    fn test_not_implemented_display() {
        let err = RobantError::NotImplemented("add".to_string());
        assert_eq!(format!("{}", err), "Not implemented: add");
    }

    #[test]
    fn test_kind_roundtrip() {
        let d = Diagnostic::model_satisfaction("STATES.yml", "unreachable: START");
        let err: RobantError = d.into();
        assert_eq!(err.kind(), Some(ErrorKind::ModelSatisfaction));
    }
}
