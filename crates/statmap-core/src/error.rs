use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Why a single schema field failed to map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// A required source key was absent from the input document.
    MissingField,
    /// The source value's primitive kind is not convertible to the target.
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// A soft per-field mapping error. Aggregated, never aborts traversal.
///
/// `path` is always absolute from the input document root, so diagnostics
/// for deeply nested payloads name the exact offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldErrorKind::MissingField,
        }
    }

    pub fn mismatch(path: impl Into<String>, expected: &'static str, actual: &'static str) -> Self {
        Self {
            path: path.into(),
            kind: FieldErrorKind::TypeMismatch { expected, actual },
        }
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FieldErrorKind::MissingField => "mapping.missing_field",
            FieldErrorKind::TypeMismatch { .. } => "mapping.type_mismatch",
        }
    }

    /// Re-root the error path under a parent source key.
    pub(crate) fn prefixed(mut self, prefix: &str) -> Self {
        self.path = format!("{prefix}.{}", self.path);
        self
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FieldErrorKind::MissingField => {
                write!(f, "required field '{}' is missing from the payload", self.path)
            }
            FieldErrorKind::TypeMismatch { expected, actual } => {
                write!(
                    f,
                    "field '{}' expected {expected}, found {actual}",
                    self.path
                )
            }
        }
    }
}

impl std::error::Error for FieldError {}

/// Aggregate over the ordered soft errors of one schema application.
///
/// Callers that receive this still hold the best-effort output document;
/// whether an aggregate of known-optional gaps is acceptable to dispatch is
/// their call, not the engine's.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema mapping failed for {} field(s)", errors.len())]
pub struct MappingError {
    pub errors: Vec<FieldError>,
}

impl MappingError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }
}
