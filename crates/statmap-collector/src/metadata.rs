use std::fmt::{self, Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};
use uuid::Uuid;

/// Metadata validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("interval_ms must be greater than zero, got {value}")]
    InvalidInterval { value: i64 },
    #[error("event type cannot be empty")]
    EmptyEventType,
}

/// RFC3339 timestamp guaranteed to be UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Parse an RFC3339 timestamp. Timestamps carrying a non-zero offset
    /// are rejected: every event in a monitoring index is stamped in UTC,
    /// and a local-time capture would silently skew interval math.
    pub fn parse(input: &str) -> Result<Self, MetadataError> {
        let not_utc = || MetadataError::TimestampNotUtc {
            value: input.to_owned(),
        };
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| not_utc())?;
        if parsed.offset() != UtcOffset::UTC {
            return Err(not_utc());
        }
        Ok(Self(parsed))
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .expect("UtcDateTime must be RFC3339 formattable")
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

/// Identifier correlating all reporter output of one collection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleId(Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for CycleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Routing and capture metadata stamped at the root of every assembled
/// event: capture timestamp, collection interval, document type tag, and
/// the correlation identifier tying the event to its cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub timestamp: UtcDateTime,
    pub interval_ms: i64,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_uuid: Option<String>,
}

impl EventMetadata {
    pub fn new(
        timestamp: UtcDateTime,
        interval_ms: i64,
        event_type: impl Into<String>,
    ) -> Result<Self, MetadataError> {
        if interval_ms <= 0 {
            return Err(MetadataError::InvalidInterval { value: interval_ms });
        }

        let event_type = event_type.into();
        if event_type.trim().is_empty() {
            return Err(MetadataError::EmptyEventType);
        }

        Ok(Self {
            timestamp,
            interval_ms,
            event_type,
            cluster_uuid: None,
        })
    }

    pub fn with_cluster_uuid(mut self, cluster_uuid: impl Into<String>) -> Self {
        self.cluster_uuid = Some(cluster_uuid.into());
        self
    }
}
