use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Primitive target kind of a leaf conversion. A closed set keeps the
/// coercion match exhaustive and statically checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Int,
    Float,
    Str,
    Bool,
}

impl LeafKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::Bool => "bool",
        }
    }
}

impl Display for LeafKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scalar extraction: pull the value at `source_key`, coerce it to
/// `kind`, write it at the node's target path.
#[derive(Debug, Clone)]
pub struct LeafNode {
    pub(crate) source_key: String,
    pub(crate) target_path: Option<String>,
    pub(crate) kind: LeafKind,
    pub(crate) required: bool,
}

/// One recursive descent: apply a child schema to the sub-document at
/// `source_key`, write its output under the node's target path.
#[derive(Debug, Clone)]
pub struct DictNode {
    pub(crate) source_key: String,
    pub(crate) target_path: Option<String>,
    pub(crate) schema: Schema,
    pub(crate) required: bool,
}

/// A single declarative mapping instruction.
///
/// `source_key` may itself be dotted, pulling from a different nesting than
/// the node's output position; the target path may be dotted too, causing
/// the applier to synthesize intermediate output sub-documents.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Leaf(LeafNode),
    Dict(DictNode),
}

/// Required leaf coerced to a 64-bit integer.
pub fn int(source_key: impl Into<String>) -> SchemaNode {
    leaf(source_key, LeafKind::Int)
}

/// Required leaf kept as a float.
pub fn float(source_key: impl Into<String>) -> SchemaNode {
    leaf(source_key, LeafKind::Float)
}

/// Required leaf that must already be a string.
pub fn string(source_key: impl Into<String>) -> SchemaNode {
    leaf(source_key, LeafKind::Str)
}

/// Required leaf that must already be a boolean.
pub fn boolean(source_key: impl Into<String>) -> SchemaNode {
    leaf(source_key, LeafKind::Bool)
}

/// Required descent into a sub-document with a child schema.
pub fn dict(source_key: impl Into<String>, schema: Schema) -> SchemaNode {
    SchemaNode::Dict(DictNode {
        source_key: source_key.into(),
        target_path: None,
        schema,
        required: true,
    })
}

fn leaf(source_key: impl Into<String>, kind: LeafKind) -> SchemaNode {
    SchemaNode::Leaf(LeafNode {
        source_key: source_key.into(),
        target_path: None,
        kind,
        required: true,
    })
}

impl SchemaNode {
    /// Mark the node optional: an absent source key is skipped silently
    /// instead of producing a missing-field error.
    pub fn optional(mut self) -> Self {
        match &mut self {
            Self::Leaf(node) => node.required = false,
            Self::Dict(node) => node.required = false,
        }
        self
    }

    /// Override the output position with an explicit (possibly dotted)
    /// target path. Without this the schema field name is the target.
    pub fn target(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        match &mut self {
            Self::Leaf(node) => node.target_path = Some(path),
            Self::Dict(node) => node.target_path = Some(path),
        }
        self
    }

    pub fn source_key(&self) -> &str {
        match self {
            Self::Leaf(node) => &node.source_key,
            Self::Dict(node) => &node.source_key,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            Self::Leaf(node) => node.required,
            Self::Dict(node) => node.required,
        }
    }

    pub(crate) fn target_or(&self, field_name: &str) -> String {
        let explicit = match self {
            Self::Leaf(node) => node.target_path.as_deref(),
            Self::Dict(node) => node.target_path.as_deref(),
        };
        explicit.unwrap_or(field_name).to_owned()
    }
}

/// Schema construction error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("duplicate schema field '{name}'")]
    DuplicateField { name: String },
    #[error("schema field name cannot be empty")]
    EmptyFieldName,
    #[error("schema source key cannot be empty")]
    EmptySourceKey,
}

/// Ordered, immutable mapping of target field name to [`SchemaNode`] — the
/// declarative artifact consumers author once (typically in a
/// `LazyLock` static) and share read-only across every applied document.
///
/// Declaration order is significant for deterministic error ordering, not
/// for output correctness: output keys are unique.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    nodes: Vec<(String, SchemaNode)>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node))
    }
}

/// Builder validating field uniqueness at construction time.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    nodes: Vec<(String, SchemaNode)>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.nodes.push((name.into(), node));
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        for (index, (name, node)) in self.nodes.iter().enumerate() {
            if name.is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if node.source_key().is_empty() {
                return Err(SchemaError::EmptySourceKey);
            }
            if self.nodes[..index].iter().any(|(seen, _)| seen == name) {
                return Err(SchemaError::DuplicateField { name: name.clone() });
            }
        }
        Ok(Schema { nodes: self.nodes })
    }
}
