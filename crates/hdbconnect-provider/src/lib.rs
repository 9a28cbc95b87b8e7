//! SAP HANA data provider: connections, catalog metadata, vector table
//! management and SQL execution over a pooled `hdbconnect_async` backend.

pub mod capability;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod constants;
mod error;
pub mod guard;
pub mod identifier;
pub mod observability;
pub mod pool;
pub mod provider;
pub mod result;
pub mod session;
pub mod settings;
#[cfg(test)]
mod testing;
pub mod types;
pub mod uri;
pub mod value;

pub use capability::{Capabilities, Capability, Privilege};
pub use config::{Config, ConfigBuilder, TelemetryConfig};
pub use connection::{Options, ProviderConnection};
pub use error::{Error, Result};
pub use provider::{HanaProvider, HanaProviderConnection};
pub use result::QueryResult;
pub use settings::{ConnectionSettings, ConnectionStore};
pub use types::{
    Crs, Field, FieldType, GeometryColumnType, LayerProperty, NativeType, SchemaProperty,
    TableFlag, TableFlags, TableProperty, WkbType,
};
pub use uri::DataSourceUri;
