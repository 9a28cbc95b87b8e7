use std::time::Duration;

use thiserror::Error;

use crate::capability::Capability;

#[derive(Error, Debug)]
pub enum Error {
    /// Driver error, message forwarded as the driver reported it.
    #[error("{0}")]
    Database(#[from] hdbconnect::HdbError),

    #[error("{0}")]
    Query(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Operation requires the {0} capability, which this connection does not provide")]
    CapabilityNotSupported(Capability),

    #[error("Could not retrieve {what}: {uri}, {message}")]
    Retrieval {
        what: &'static str,
        uri: String,
        message: String,
    },

    #[error("Error retrieving native types for connection {0}")]
    NativeTypes(String),

    #[error("Table {schema}.{table} does not exist")]
    TableNotFound { schema: String, table: String },

    #[error("An error occurred while creating the vector layer: {0}")]
    CreateVectorTable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection settings error: {0}")]
    Settings(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Query timeout after {0:?}")]
    QueryTimeout(Duration),
}

impl Error {
    /// Wrap a lower-level failure into a catalog retrieval error.
    pub fn retrieval(what: &'static str, uri: impl Into<String>, source: &Self) -> Self {
        Self::Retrieval {
            what,
            uri: uri.into(),
            message: source.to_string(),
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::QueryTimeout(_))
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub const fn is_connection_failed(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::PoolExhausted)
    }

    #[must_use]
    pub const fn is_capability_error(&self) -> bool {
        matches!(self, Self::CapabilityNotSupported(_))
    }

    #[must_use]
    pub const fn is_query(&self) -> bool {
        matches!(self, Self::Query(_) | Self::Database(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
