//! Saved connections
//!
//! Named connections live in a TOML file:
//!
//! ```toml
//! [connections.production]
//! host = "hana.example.com"
//! port = 30015
//! user = "GIS"
//! password = "secret"
//! save_password = true
//! schema = "GIS"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::uri::{DataSourceUri, PARAM_DATABASE};
use crate::{Error, Result};

/// One saved connection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub save_password: bool,
    /// Restrict table listings to this schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Connect with `hdbsqls://`
    #[serde(default)]
    pub tls: bool,
    /// Extra driver URL parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl ConnectionSettings {
    /// Settings for `uri`, password included.
    pub fn from_uri(uri: &DataSourceUri) -> Self {
        let url = uri.connection_url();
        Self {
            host: uri.host().to_string(),
            port: uri.port(),
            database: uri.database(),
            user: uri.username().to_string(),
            password: uri.password().map(ToString::to_string),
            save_password: uri.password().is_some(),
            schema: uri.schema().map(ToString::to_string),
            tls: url.scheme() == "hdbsqls",
            options: url
                .query_pairs()
                .into_owned()
                .filter(|(key, _)| key != PARAM_DATABASE)
                .collect(),
        }
    }

    pub fn to_uri(&self) -> Result<DataSourceUri> {
        let scheme = if self.tls { "hdbsqls" } else { "hdbsql" };
        let mut url = Url::parse(&format!("{scheme}://{}", self.host))
            .map_err(|e| Error::Settings(format!("Invalid host '{}': {e}", self.host)))?;

        url.set_port(self.port)
            .map_err(|()| Error::Settings("Failed to set port".into()))?;
        if !self.user.is_empty() {
            url.set_username(&self.user)
                .map_err(|()| Error::Settings("Failed to set user".into()))?;
        }
        if let Some(password) = self.password.as_deref().filter(|_| self.save_password) {
            url.set_password(Some(password))
                .map_err(|()| Error::Settings("Failed to set password".into()))?;
        }
        if let Some(database) = self.database.as_deref().filter(|db| !db.is_empty()) {
            url.query_pairs_mut().append_pair(PARAM_DATABASE, database);
        }
        if !self.options.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.options);
        }

        let uri = DataSourceUri::from_url(url)?;
        Ok(match &self.schema {
            Some(schema) => uri.with_schema(schema.clone()),
            None => uri,
        })
    }
}

/// Root structure of the connections file
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConnectionsFile {
    #[serde(default)]
    connections: BTreeMap<String, ConnectionSettings>,
}

/// Named connections persisted in a TOML file
///
/// Every call reads the file afresh and writes it back on change; a missing
/// file is an empty store.
#[derive(Debug, Clone)]
pub struct ConnectionStore {
    path: PathBuf,
}

impl ConnectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<BTreeMap<String, ConnectionSettings>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(Error::Settings(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        let file: ConnectionsFile = toml::from_str(&content).map_err(|e| {
            Error::Settings(format!("Failed to parse {}: {e}", self.path.display()))
        })?;
        Ok(file.connections)
    }

    pub fn save(&self, connections: BTreeMap<String, ConnectionSettings>) -> Result<()> {
        let connections = connections
            .into_iter()
            .map(|(name, mut settings)| {
                if !settings.save_password {
                    settings.password = None;
                }
                (name, settings)
            })
            .collect();
        let content = toml::to_string_pretty(&ConnectionsFile { connections })
            .map_err(|e| Error::Settings(format!("Failed to serialize connections: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Settings(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(&self.path, content)
            .map_err(|e| Error::Settings(format!("Failed to write {}: {e}", self.path.display())))
    }

    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }

    pub fn get(&self, name: &str) -> Result<Option<ConnectionSettings>> {
        Ok(self.load()?.remove(name))
    }

    /// Add or replace the entry `name`.
    pub fn insert(&self, name: &str, settings: ConnectionSettings) -> Result<()> {
        let mut connections = self.load()?;
        connections.insert(name.to_string(), settings);
        self.save(connections)?;
        tracing::debug!(name, path = %self.path.display(), "Saved connection");
        Ok(())
    }

    /// Delete the entry `name`; returns whether it existed.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut connections = self.load()?;
        let existed = connections.remove(name).is_some();
        if existed {
            self.save(connections)?;
            tracing::debug!(name, path = %self.path.display(), "Removed connection");
        }
        Ok(existed)
    }
}
