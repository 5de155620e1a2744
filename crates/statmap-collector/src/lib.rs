//! Collection-cycle plumbing for statmap.
//!
//! This crate contains:
//! - Event assembly: schema output + manual patches + metadata stamping
//! - The decoder and dispatcher boundaries
//! - The error reporter side-channel and index routing
//! - The [`Collector`] driving one cycle per collected payload
//!
//! The engine itself lives in `statmap-core`; everything here is the
//! recurring pattern around it.

pub mod assembler;
pub mod collect;
pub mod decode;
pub mod metadata;
pub mod report;
pub mod routing;

pub use assembler::{assemble, required_f64, required_str, AssemblyError, FieldPatch, OutputEvent};
pub use collect::{Collector, DispatchError, Dispatcher, MemoryDispatcher, StatsModule};
pub use decode::decode_document;
pub use metadata::{CycleId, EventMetadata, MetadataError, UtcDateTime};
pub use report::{
    CollectError, ErrorReporter, RecordingReporter, ReportedError, TracingReporter,
};
pub use routing::{IndexRouter, MonitoringIndexRouter, StaticIndexRouter};
