//! Core engine for statmap.
//!
//! This crate contains:
//! - The dynamic [`Document`] type and dotted-path resolution
//! - The declarative [`Schema`] description (leaf and nested nodes)
//! - The applier: traversal, coercion, and soft-error aggregation
//!
//! Schemas are pure data built once and shared read-only across
//! arbitrarily many concurrent applications; every apply call owns its
//! output exclusively, so thread safety follows from ownership rather
//! than synchronization.

pub mod applier;
pub mod document;
pub mod error;
pub mod schema;

pub use applier::Mapping;
pub use document::{value_kind, Document};
pub use error::{FieldError, FieldErrorKind, MappingError};
pub use schema::{
    boolean, dict, float, int, string, DictNode, LeafKind, LeafNode, Schema, SchemaBuilder,
    SchemaError, SchemaNode,
};
