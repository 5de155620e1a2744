use std::sync::Mutex;

use thiserror::Error;

use statmap_core::MappingError;

use crate::assembler::AssemblyError;
use crate::metadata::CycleId;

/// Everything that can go wrong in one collection cycle.
///
/// `Mapping` is the only soft variant: the cycle keeps its best-effort
/// output and continues. Every other variant is hard and short-circuits the
/// cycle — no downstream step runs, no event is produced.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("payload decode failed: {0}")]
    Decode(String),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error("event dispatch failed: {0}")]
    Dispatch(String),
}

impl CollectError {
    /// Hard errors abort the cycle; soft errors accompany a usable event.
    pub const fn is_hard(&self) -> bool {
        !matches!(self, Self::Mapping(_))
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "collect.decode_failure",
            Self::Mapping(_) => "collect.mapping_incomplete",
            Self::Assembly(_) => "collect.assembly_failure",
            Self::Dispatch(_) => "collect.dispatch_failure",
        }
    }
}

/// Sink for per-cycle errors, decoupled from the cycle's return value so
/// callers can abort or continue independently of observability. The
/// collector invokes it exactly once per error and never depends on its
/// outcome.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, cycle: CycleId, error: &CollectError);
}

/// Reporter emitting structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, cycle: CycleId, error: &CollectError) {
        if error.is_hard() {
            tracing::error!(cycle = %cycle, code = error.code(), "collection cycle failed: {error}");
        } else {
            tracing::warn!(cycle = %cycle, code = error.code(), "collection cycle incomplete: {error}");
        }
    }
}

/// One recorded reporter entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub cycle: CycleId,
    pub code: &'static str,
    pub message: String,
}

/// Reporter that records entries in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    entries: Mutex<Vec<ReportedError>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<ReportedError> {
        match self.entries.lock() {
            Ok(mut entries) => std::mem::take(&mut *entries),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, cycle: CycleId, error: &CollectError) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(ReportedError {
                cycle,
                code: error.code(),
                message: error.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statmap_core::FieldError;

    #[test]
    fn mapping_errors_are_soft() {
        let error = CollectError::from(MappingError::new(vec![FieldError::missing("a")]));
        assert!(!error.is_hard());
        assert_eq!(error.code(), "collect.mapping_incomplete");
    }

    #[test]
    fn decode_and_assembly_errors_are_hard() {
        assert!(CollectError::Decode("bad json".to_owned()).is_hard());
        let assembly = CollectError::from(AssemblyError::PatchFailure {
            path: "process.memory".to_owned(),
        });
        assert!(assembly.is_hard());
        assert_eq!(assembly.code(), "collect.assembly_failure");
    }

    #[test]
    fn recording_reporter_collects_entries() {
        let reporter = RecordingReporter::new();
        let cycle = CycleId::new();
        reporter.report(cycle, &CollectError::Decode("truncated".to_owned()));

        let entries = reporter.take();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].cycle, cycle);
        assert_eq!(entries[0].code, "collect.decode_failure");
        assert!(reporter.is_empty());
    }
}
