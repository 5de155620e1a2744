use crate::metadata::EventMetadata;

/// Supplies the destination index of an assembled event. Pure
/// lookup/formatting over metadata — no I/O.
pub trait IndexRouter: Send + Sync {
    fn route(&self, meta: &EventMetadata) -> String;
}

/// Monitoring-style index names of the form `.monitoring-{product}-{version}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringIndexRouter {
    product: String,
    format_version: u32,
}

impl MonitoringIndexRouter {
    pub fn new(product: impl Into<String>, format_version: u32) -> Self {
        Self {
            product: product.into(),
            format_version,
        }
    }
}

impl IndexRouter for MonitoringIndexRouter {
    fn route(&self, _meta: &EventMetadata) -> String {
        format!(".monitoring-{}-{}", self.product, self.format_version)
    }
}

/// Fixed index regardless of metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIndexRouter(String);

impl StaticIndexRouter {
    pub fn new(index: impl Into<String>) -> Self {
        Self(index.into())
    }
}

impl IndexRouter for StaticIndexRouter {
    fn route(&self, _meta: &EventMetadata) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::UtcDateTime;

    fn meta() -> EventMetadata {
        EventMetadata::new(UtcDateTime::now(), 10_000, "kibana_stats")
            .expect("metadata must be valid")
    }

    #[test]
    fn monitoring_router_formats_product_and_version() {
        let router = MonitoringIndexRouter::new("kibana", 7);
        assert_eq!(router.route(&meta()), ".monitoring-kibana-7");
    }

    #[test]
    fn static_router_ignores_metadata() {
        let router = StaticIndexRouter::new("stats-events");
        assert_eq!(router.route(&meta()), "stats-events");
    }
}
