//! Database provider connection abstraction
//!
//! The operations an application performs on a configured database
//! connection, independent of the backend.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::capability::{Capabilities, Capability};
use crate::result::QueryResult;
use crate::types::{Crs, Field, NativeType, TableFlags, TableProperty, WkbType};
use crate::uri::DataSourceUri;
use crate::{Error, Result};

/// Free-form options and configuration values
pub type Options = HashMap<String, Value>;

#[async_trait]
pub trait ProviderConnection: Send + Sync {
    /// Key of the provider backing this connection, e.g. `"hana"`.
    fn provider_key(&self) -> &'static str;

    fn uri(&self) -> &DataSourceUri;

    fn configuration(&self) -> &Options;

    fn capabilities(&self) -> Capabilities;

    /// Fail with [`Error::CapabilityNotSupported`] unless `capability` is set.
    fn check_capability(&self, capability: Capability) -> Result<()> {
        if self.capabilities().contains(capability) {
            Ok(())
        } else {
            Err(Error::CapabilityNotSupported(capability))
        }
    }

    async fn schemas(&self) -> Result<Vec<String>>;

    /// Tables of `schema` matching `flags`; empty flags match every table.
    async fn tables(&self, schema: &str, flags: TableFlags) -> Result<Vec<TableProperty>>;

    async fn table(&self, schema: &str, name: &str) -> Result<TableProperty> {
        self.tables(schema, TableFlags::empty())
            .await?
            .into_iter()
            .find(|table| table.table_name == name)
            .ok_or_else(|| Error::TableNotFound {
                schema: schema.to_string(),
                table: name.to_string(),
            })
    }

    async fn table_exists(&self, schema: &str, name: &str) -> Result<bool> {
        self.check_capability(Capability::TableExists)?;
        Ok(self
            .tables(schema, TableFlags::empty())
            .await?
            .iter()
            .any(|table| table.table_name == name))
    }

    /// Data source URI of a table, without credentials.
    async fn table_uri(&self, schema: &str, name: &str) -> Result<String>;

    #[allow(clippy::too_many_arguments)]
    async fn create_vector_table(
        &self,
        schema: &str,
        name: &str,
        fields: &[Field],
        wkb_type: WkbType,
        crs: &Crs,
        overwrite: bool,
        options: &Options,
    ) -> Result<()>;

    async fn drop_vector_table(&self, schema: &str, name: &str) -> Result<()>;

    async fn rename_vector_table(&self, schema: &str, name: &str, new_name: &str) -> Result<()>;

    async fn create_schema(&self, name: &str) -> Result<()>;

    /// Drop a schema; `force` drops its contents too.
    async fn drop_schema(&self, name: &str, force: bool) -> Result<()>;

    async fn rename_schema(&self, name: &str, new_name: &str) -> Result<()>;

    /// Run arbitrary SQL. A cancelled `feedback` token yields an empty result.
    async fn execute_sql(
        &self,
        sql: &str,
        feedback: Option<&CancellationToken>,
    ) -> Result<QueryResult>;

    async fn native_types(&self) -> Result<Vec<NativeType>>;

    /// Save this connection under `name`, replacing an existing entry.
    async fn store(&self, name: &str) -> Result<()>;

    async fn remove(&self, name: &str) -> Result<()>;
}
