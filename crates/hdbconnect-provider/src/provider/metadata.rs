//! Provider entry point

use std::sync::Arc;

use super::HanaProviderConnection;
use crate::Result;
use crate::config::Config;
use crate::connection::Options;
use crate::guard::QueryGuard;
use crate::pool::PoolRegistry;
use crate::session::PooledSessions;
use crate::settings::ConnectionStore;

/// Creates HANA provider connections
///
/// All connections created by one provider share its pool registry, so
/// connections to the same database reuse pooled sessions.
#[derive(Debug, Clone)]
pub struct HanaProvider {
    sessions: PooledSessions,
    store: ConnectionStore,
}

impl HanaProvider {
    pub fn new(config: &Config) -> Self {
        let registry = Arc::new(PoolRegistry::new(config.pool));
        Self {
            sessions: PooledSessions::new(registry, QueryGuard::new(config.query_timeout)),
            store: ConnectionStore::new(config.connections_file.clone()),
        }
    }

    pub const fn store(&self) -> &ConnectionStore {
        &self.store
    }

    /// Connection saved under `name`.
    pub async fn create_connection(&self, name: &str) -> Result<HanaProviderConnection> {
        HanaProviderConnection::from_name(name, self.store.clone(), &self.sessions).await
    }

    pub async fn create_connection_from_uri(
        &self,
        uri: &str,
        configuration: Options,
    ) -> Result<HanaProviderConnection> {
        HanaProviderConnection::from_uri(uri, configuration, self.store.clone(), &self.sessions)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[test]
    fn test_provider_uses_configured_store() {
        let config = ConfigBuilder::new()
            .connections_file("/tmp/hana-connections.toml".into())
            .build()
            .unwrap();
        let provider = HanaProvider::new(&config);
        assert_eq!(
            provider.store().path(),
            std::path::Path::new("/tmp/hana-connections.toml")
        );
    }

    #[tokio::test]
    async fn test_create_connection_unknown_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ConfigBuilder::new()
            .connections_file(dir.path().join("connections.toml"))
            .build()
            .unwrap();
        let provider = HanaProvider::new(&config);

        let err = provider.create_connection("missing").await.unwrap_err();
        assert!(err.to_string().contains("'missing' does not exist"));
    }

    #[tokio::test]
    async fn test_create_connection_rejects_foreign_scheme() {
        let provider = HanaProvider::new(&ConfigBuilder::new().build().unwrap());
        let err = provider
            .create_connection_from_uri("postgres://u:p@localhost/db", Options::new())
            .await
            .unwrap_err();
        assert!(err.is_config());
    }
}
