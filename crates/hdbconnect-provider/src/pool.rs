//! Connection pooling using [`deadpool`].
//!
//! Every provider connection for the same database URL shares one pool, held
//! by the [`PoolRegistry`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use deadpool::managed::{self, Metrics, RecycleError, RecycleResult};
use hdbconnect_async::Connection;
use parking_lot::Mutex;

use crate::constants::VALIDATION_QUERY;
use crate::{Error, Result};

pub type Pool = managed::Pool<ConnectionManager>;
pub type PooledConnection = managed::Object<ConnectionManager>;

#[derive(Debug)]
pub struct ConnectionManager {
    url: String,
}

impl ConnectionManager {
    pub const fn new(url: String) -> Self {
        Self { url }
    }
}

impl managed::Manager for ConnectionManager {
    type Type = Connection;
    type Error = hdbconnect::HdbError;

    async fn create(&self) -> std::result::Result<Connection, hdbconnect::HdbError> {
        let connection = Connection::new(self.url.clone()).await?;
        tracing::debug!("Opened new HANA connection");
        Ok(connection)
    }

    async fn recycle(&self, conn: &mut Connection, _: &Metrics) -> RecycleResult<Self::Error> {
        // A connection left mid-transaction by a failed operation is reset here.
        conn.rollback().await.map_err(RecycleError::Backend)?;
        conn.query(VALIDATION_QUERY)
            .await
            .map_err(RecycleError::Backend)?;
        Ok(())
    }
}

/// Pool sizing and timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_size: usize,
    pub wait_timeout: Duration,
    pub create_timeout: Duration,
    pub recycle_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: 4,
            wait_timeout: Duration::from_secs(10),
            create_timeout: Duration::from_secs(30),
            recycle_timeout: Duration::from_secs(5),
        }
    }
}

pub fn create_pool(url: String, settings: PoolSettings) -> Result<Pool> {
    Pool::builder(ConnectionManager::new(url))
        .max_size(settings.max_size)
        .wait_timeout(Some(settings.wait_timeout))
        .create_timeout(Some(settings.create_timeout))
        .recycle_timeout(Some(settings.recycle_timeout))
        .runtime(deadpool::Runtime::Tokio1)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create connection pool: {e}")))
}

/// Pools keyed by driver URL
#[derive(Debug, Default)]
pub struct PoolRegistry {
    settings: PoolSettings,
    pools: Mutex<HashMap<String, Pool>>,
}

impl PoolRegistry {
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            settings,
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// Pool for `url`, created on first use.
    pub fn pool(&self, url: &str) -> Result<Pool> {
        let mut pools = self.pools.lock();
        if let Some(pool) = pools.get(url) {
            return Ok(pool.clone());
        }
        let pool = create_pool(url.to_string(), self.settings)?;
        pools.insert(url.to_string(), pool.clone());
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.pools.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.lock().is_empty()
    }
}

/// Shared registry handle
pub type SharedPoolRegistry = Arc<PoolRegistry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_settings_default() {
        let settings = PoolSettings::default();
        assert_eq!(settings.max_size, 4);
        assert_eq!(settings.wait_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_registry_reuses_pool_per_url() {
        let registry = PoolRegistry::new(PoolSettings::default());
        assert!(registry.is_empty());

        let first = registry.pool("hdbsql://u:p@host-a:30015").unwrap();
        let again = registry.pool("hdbsql://u:p@host-a:30015").unwrap();
        let other = registry.pool("hdbsql://u:p@host-b:30015").unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(first.status().max_size, again.status().max_size);
        assert_eq!(other.status().size, 0);
    }
}
