//! Explicit connector registry.
//!
//! The registry is a constructed object handed to the engine by
//! whoever wires the process together. There is no process-global
//! lookup table; everything the engine can reach is what was
//! registered here.

use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::ConnectorKind;
use crate::source::DataSource;

/// Maps connector kinds to their data sources.
#[derive(Default)]
pub struct ConnectorRegistry {
    sources: HashMap<ConnectorKind, Arc<dyn DataSource>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an iterator of sources.
    pub fn with_sources(sources: impl IntoIterator<Item = Arc<dyn DataSource>>) -> Self {
        let mut registry = Self::new();
        for source in sources {
            registry.register(source);
        }
        registry
    }

    /// Register a source under its own kind. A later registration for
    /// the same kind replaces the earlier one.
    pub fn register(&mut self, source: Arc<dyn DataSource>) {
        let kind = source.kind();
        if self.sources.insert(kind, source).is_some() {
            warn!("Connector '{}' re-registered, replacing previous source", kind);
        } else {
            info!("Connector '{}' registered", kind);
        }
    }

    /// Look up the source for a connector kind.
    pub fn get(&self, kind: ConnectorKind) -> Option<&Arc<dyn DataSource>> {
        self.sources.get(&kind)
    }

    /// Kinds with a registered source.
    pub fn kinds(&self) -> Vec<ConnectorKind> {
        self.sources.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ReplaySource;

    #[test]
    fn lookup_returns_registered_source() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(ReplaySource::new(ConnectorKind::Binance, 100.0)));

        assert!(registry.get(ConnectorKind::Binance).is_some());
        assert!(registry.get(ConnectorKind::Alpaca).is_none());
        assert_eq!(registry.kinds(), vec![ConnectorKind::Binance]);
    }

    #[test]
    fn re_registration_replaces() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(ReplaySource::new(ConnectorKind::Binance, 100.0)));
        registry.register(Arc::new(ReplaySource::new(ConnectorKind::Binance, 200.0)));
        assert_eq!(registry.kinds().len(), 1);
    }
}
