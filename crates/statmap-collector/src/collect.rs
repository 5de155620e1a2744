//! # Collection cycle
//!
//! One cycle turns a raw payload body into a dispatched event:
//!
//! 1. decode the body into a document (hard failure aborts);
//! 2. apply the module's schema (soft errors are reported, the best-effort
//!    output is kept);
//! 3. extract metadata and manual patches from the raw document (hard);
//! 4. assemble the event and hand it to the dispatcher (hard).
//!
//! Every error, soft or hard, also goes to the error reporter for
//! observability, independent of control flow. A failed cycle leaves no
//! state behind: subsequent cycles are unaffected.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use statmap_core::{Document, MappingError, Schema};

use crate::assembler::{assemble, AssemblyError, FieldPatch, OutputEvent};
use crate::decode::decode_document;
use crate::metadata::{CycleId, EventMetadata};
use crate::report::{CollectError, ErrorReporter};
use crate::routing::IndexRouter;

/// One monitored product's contribution to the cycle: its schema, and how
/// to derive metadata and manual patches from the raw payload.
pub trait StatsModule: Send + Sync {
    fn schema(&self) -> &Schema;

    fn metadata(&self, raw: &Document) -> Result<EventMetadata, AssemblyError>;

    /// Manually extracted values the schema language cannot express.
    fn patches(&self, raw: &Document) -> Result<Vec<FieldPatch>, AssemblyError> {
        let _ = raw;
        Ok(Vec::new())
    }
}

/// Dispatch failure surfaced by a publish/ship pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub message: String,
}

impl DispatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Hands a completed event to a publish pipeline.
pub trait Dispatcher: Send + Sync {
    fn emit(&self, event: OutputEvent) -> Result<(), DispatchError>;
}

/// Dispatcher that buffers events in memory, for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryDispatcher {
    events: Mutex<Vec<OutputEvent>>,
}

impl MemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<OutputEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Dispatcher for MemoryDispatcher {
    fn emit(&self, event: OutputEvent) -> Result<(), DispatchError> {
        self.events
            .lock()
            .map_err(|_| DispatchError::new("dispatcher buffer poisoned"))?
            .push(event);
        Ok(())
    }
}

/// Runs collection cycles for stats modules against a reporter, a
/// dispatcher, and an index router.
pub struct Collector {
    reporter: Arc<dyn ErrorReporter>,
    dispatcher: Arc<dyn Dispatcher>,
    router: Arc<dyn IndexRouter>,
}

impl Collector {
    pub fn new(
        reporter: Arc<dyn ErrorReporter>,
        dispatcher: Arc<dyn Dispatcher>,
        router: Arc<dyn IndexRouter>,
    ) -> Self {
        Self {
            reporter,
            dispatcher,
            router,
        }
    }

    /// Run one collection cycle over a raw payload body.
    ///
    /// Returns the dispatched event, or the first hard error. Soft mapping
    /// errors are reported but do not fail the cycle — a payload with an
    /// optional subsystem disabled still produces a usable event.
    pub fn collect(
        &self,
        module: &dyn StatsModule,
        body: &[u8],
    ) -> Result<OutputEvent, CollectError> {
        let cycle = CycleId::new();

        let raw = decode_document(body).map_err(|error| self.fail(cycle, error))?;

        let (mapped, field_errors) = module.schema().apply(&raw).into_parts();
        if !field_errors.is_empty() {
            self.reporter
                .report(cycle, &CollectError::from(MappingError::new(field_errors)));
        }

        let meta = module
            .metadata(&raw)
            .map_err(|error| self.fail(cycle, error.into()))?;
        let patches = module
            .patches(&raw)
            .map_err(|error| self.fail(cycle, error.into()))?;

        let event = assemble(mapped, &patches, &meta, self.router.as_ref())
            .map_err(|error| self.fail(cycle, error.into()))?;

        self.dispatcher
            .emit(event.clone())
            .map_err(|error| self.fail(cycle, CollectError::Dispatch(error.to_string())))?;

        tracing::debug!(cycle = %cycle, index = %event.index, "collection cycle complete");
        Ok(event)
    }

    fn fail(&self, cycle: CycleId, error: CollectError) -> CollectError {
        self.reporter.report(cycle, &error);
        error
    }
}
