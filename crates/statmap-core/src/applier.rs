//! The traversal engine: walks a [`Schema`] over an input [`Document`],
//! resolving required/optional presence and coercing primitive kinds, and
//! accumulates a best-effort output document plus an ordered error list.
//!
//! Partial success is the designed norm: telemetry collection must not be
//! defeated by one absent optional subsystem, so a failed field never
//! suppresses its siblings and the output document is always returned.

use serde_json::{Map, Number, Value};

use crate::document::{lookup_path, value_kind, Document};
use crate::error::{FieldError, MappingError};
use crate::schema::{LeafKind, Schema, SchemaNode};

/// Result of applying a schema: the normalized output document and the
/// ordered soft errors encountered on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub output: Document,
    pub errors: Vec<FieldError>,
}

impl Mapping {
    /// True when every schema node resolved cleanly.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_parts(self) -> (Document, Vec<FieldError>) {
        (self.output, self.errors)
    }

    /// Collapse into a strict result, discarding the best-effort output
    /// when any field failed. Callers that tolerate partial mappings should
    /// use [`Mapping::into_parts`] instead.
    pub fn into_result(self) -> Result<Document, MappingError> {
        if self.errors.is_empty() {
            Ok(self.output)
        } else {
            Err(MappingError::new(self.errors))
        }
    }
}

impl Schema {
    /// Apply the schema to an input document.
    ///
    /// Neither the schema nor the input is mutated; applying the same
    /// schema to the same input always yields identical output and an
    /// identical ordered error list. Error paths are absolute from the
    /// input document root.
    pub fn apply(&self, input: &Document) -> Mapping {
        let mut output = Document::new();
        let mut errors = Vec::new();
        apply_nodes(self, input.as_map(), &mut output, &mut errors);
        Mapping { output, errors }
    }
}

fn apply_nodes(
    schema: &Schema,
    input: &Map<String, Value>,
    output: &mut Document,
    errors: &mut Vec<FieldError>,
) {
    for (field_name, node) in schema.nodes() {
        match node {
            SchemaNode::Leaf(leaf) => {
                match lookup_path(input, &leaf.source_key) {
                    None => {
                        if leaf.required {
                            errors.push(FieldError::missing(&leaf.source_key));
                        }
                    }
                    Some(value) => match coerce(value, leaf.kind) {
                        Ok(coerced) => output.put_path(&node.target_or(field_name), coerced),
                        // Never write a best-effort wrong-typed value.
                        Err(actual) => errors.push(FieldError::mismatch(
                            &leaf.source_key,
                            leaf.kind.as_str(),
                            actual,
                        )),
                    },
                }
            }
            SchemaNode::Dict(nested) => match lookup_path(input, &nested.source_key) {
                None => {
                    if nested.required {
                        errors.push(FieldError::missing(&nested.source_key));
                    }
                }
                Some(Value::Object(sub_document)) => {
                    let mut child_output = Document::new();
                    let mut child_errors = Vec::new();
                    apply_nodes(&nested.schema, sub_document, &mut child_output, &mut child_errors);
                    errors.extend(
                        child_errors
                            .into_iter()
                            .map(|error| error.prefixed(&nested.source_key)),
                    );
                    output.put_path(&node.target_or(field_name), Value::from(child_output));
                }
                Some(other) => errors.push(FieldError::mismatch(
                    &nested.source_key,
                    "document",
                    value_kind(other),
                )),
            },
        }
    }
}

fn coerce(value: &Value, kind: LeafKind) -> Result<Value, &'static str> {
    match (kind, value) {
        (LeafKind::Int, Value::Number(number)) => match coerce_int(number) {
            Some(int) => Ok(Value::from(int)),
            None => Err("number"),
        },
        (LeafKind::Float, Value::Number(number)) => match number.as_f64() {
            Some(float) => Ok(Value::from(float)),
            None => Err("number"),
        },
        (LeafKind::Str, Value::String(text)) => Ok(Value::from(text.clone())),
        (LeafKind::Bool, Value::Bool(flag)) => Ok(Value::from(*flag)),
        (_, other) => Err(value_kind(other)),
    }
}

/// Smallest f64 strictly greater than every i64; -I64_BOUND is exactly
/// i64::MIN.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Decoded floating telemetry counters are interpreted as integers by
/// truncation toward zero. Out-of-range values are promoted to a type
/// mismatch rather than wrapped or saturated.
fn coerce_int(number: &Number) -> Option<i64> {
    if let Some(int) = number.as_i64() {
        return Some(int);
    }
    if number.is_u64() {
        // u64 above i64::MAX
        return None;
    }
    let float = number.as_f64()?;
    if !float.is_finite() || float >= I64_BOUND || float < -I64_BOUND {
        return None;
    }
    Some(float.trunc() as i64)
}
