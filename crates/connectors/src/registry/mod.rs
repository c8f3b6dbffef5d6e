//! Connector registry.

mod connector_registry;

pub use connector_registry::ConnectorRegistry;
