//! SAP HANA provider connection
//!
//! [`HanaProviderConnection`] implements [`ProviderConnection`] by turning
//! each operation into HANA SQL run on a session borrowed for the duration
//! of the call. Nothing is cached between calls.

mod ddl;
mod metadata;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

pub use ddl::{TableLayout, column_type};
pub use metadata::HanaProvider;

use crate::capability::{Capabilities, Capability};
use crate::catalog;
use crate::connection::{Options, ProviderConnection};
use crate::constants::{
    DEFAULT_GEOMETRY_COLUMN, DEFAULT_PRIMARY_KEY, OPTION_GEOMETRY_COLUMN, OPTION_PRIMARY_KEY,
    PROVIDER_KEY,
};
use crate::identifier::{qualified_name, quoted_identifier};
use crate::result::QueryResult;
use crate::session::{RowCursor, Session, SessionSource, SessionSources, StatementOutcome};
use crate::settings::{ConnectionSettings, ConnectionStore};
use crate::types::{
    Crs, Field, NativeType, SchemaProperty, TableFlag, TableFlags, TableProperty, WkbType,
};
use crate::uri::DataSourceUri;
use crate::{Error, Result};

/// Cursor that keeps its session borrowed until the rows are consumed
struct SessionCursor {
    cursor: Box<dyn RowCursor>,
    _session: Box<dyn Session>,
}

#[async_trait]
impl RowCursor for SessionCursor {
    fn column_names(&self) -> Vec<String> {
        self.cursor.column_names()
    }

    async fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        self.cursor.next_row().await
    }
}

fn is_cancelled(feedback: Option<&CancellationToken>) -> bool {
    feedback.is_some_and(CancellationToken::is_cancelled)
}

fn option_text<'a>(options: &'a Options, key: &str) -> Option<&'a str> {
    options
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Capabilities of the user behind `source`
///
/// Starts from [`Capabilities::BASE`] and adds what the effective privileges
/// grant. When the privileges cannot be read, every capability is assumed.
pub async fn resolve_capabilities(source: &dyn SessionSource, uri: &DataSourceUri) -> Capabilities {
    let privileges = match source.acquire().await {
        Ok(mut session) => catalog::privileges(session.as_mut()).await,
        Err(e) => Err(e),
    };

    match privileges {
        Ok(privileges) => {
            let capabilities = Capabilities::from_privileges(&privileges);
            tracing::debug!(
                uri = %uri.connection_info(),
                capabilities = ?capabilities,
                "Resolved capabilities"
            );
            capabilities
        }
        Err(e) => {
            tracing::warn!(
                uri = %uri.connection_info(),
                error = %e,
                "Unable to retrieve user privileges, assuming all capabilities"
            );
            Capabilities::all()
        }
    }
}

/// Connection to one HANA data source
pub struct HanaProviderConnection {
    uri: DataSourceUri,
    configuration: Options,
    capabilities: Capabilities,
    sessions: Arc<dyn SessionSource>,
    store: ConnectionStore,
}

impl std::fmt::Debug for HanaProviderConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HanaProviderConnection")
            .field("uri", &self.uri.connection_info())
            .field("capabilities", &self.capabilities)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl HanaProviderConnection {
    /// Connection saved in `store` under `name`.
    pub async fn from_name(
        name: &str,
        store: ConnectionStore,
        sources: &dyn SessionSources,
    ) -> Result<Self> {
        let settings = store
            .get(name)?
            .ok_or_else(|| Error::Settings(format!("Connection '{name}' does not exist")))?;
        let uri = settings.to_uri()?;
        Self::connect(uri, Options::new(), store, sources).await
    }

    pub async fn from_uri(
        uri: &str,
        configuration: Options,
        store: ConnectionStore,
        sources: &dyn SessionSources,
    ) -> Result<Self> {
        let uri = DataSourceUri::parse(uri)?;
        Self::connect(uri, configuration, store, sources).await
    }

    async fn connect(
        uri: DataSourceUri,
        configuration: Options,
        store: ConnectionStore,
        sources: &dyn SessionSources,
    ) -> Result<Self> {
        let sessions = sources.source_for(&uri)?;
        let capabilities = resolve_capabilities(sessions.as_ref(), &uri).await;
        Ok(Self {
            uri,
            configuration,
            capabilities,
            sessions,
            store,
        })
    }

    async fn acquire(&self) -> Result<Box<dyn Session>> {
        self.sessions.acquire().await
    }

    /// Execute a statement and commit.
    pub async fn execute_sql_statement(&self, sql: &str) -> Result<()> {
        let mut session = self.acquire().await?;
        session.execute(sql).await
    }

    async fn execute_ddl(&self, operation: &'static str, sql: &str) -> Result<()> {
        self.execute_sql_statement(sql).await?;
        tracing::info!(operation, uri = %self.uri.connection_info(), "DDL executed");
        Ok(())
    }

    pub async fn drop_table(&self, schema: &str, name: &str) -> Result<()> {
        let sql = format!("DROP TABLE {}", qualified_name(schema, name));
        self.execute_ddl("drop_table", &sql).await
    }

    pub async fn rename_table(&self, schema: &str, name: &str, new_name: &str) -> Result<()> {
        let sql = format!(
            "RENAME TABLE {} TO {}",
            qualified_name(schema, name),
            qualified_name(schema, new_name)
        );
        self.execute_ddl("rename_table", &sql).await
    }

    /// Schemas with their owners, limited to those owned by `owner`.
    pub async fn schema_properties(&self, owner: Option<&str>) -> Result<Vec<SchemaProperty>> {
        self.check_capability(Capability::Schemas)?;
        let mut session = self.acquire().await?;
        catalog::schemas(session.as_mut(), owner)
            .await
            .map_err(|e| Error::retrieval("schemas", self.uri.connection_info(), &e))
    }

    /// Like [`tables`](ProviderConnection::tables), restricted to schemas owned
    /// by the connected user.
    pub async fn user_tables(&self, schema: &str, flags: TableFlags) -> Result<Vec<TableProperty>> {
        self.list_tables(schema, flags, true).await
    }

    async fn list_tables(
        &self,
        schema: &str,
        flags: TableFlags,
        user_tables_only: bool,
    ) -> Result<Vec<TableProperty>> {
        self.check_capability(Capability::Tables)?;
        let mut session = self.acquire().await?;
        self.read_tables(session.as_mut(), schema, flags, user_tables_only)
            .await
            .map_err(|e| Error::retrieval("tables", self.uri.connection_info(), &e))
    }

    async fn read_tables(
        &self,
        session: &mut dyn Session,
        schema: &str,
        flags: TableFlags,
        user_tables_only: bool,
    ) -> Result<Vec<TableProperty>> {
        let schema = Some(schema).filter(|s| !s.is_empty());
        let layers = catalog::layers(
            session,
            schema,
            flags.contains(TableFlag::Aspatial),
            user_tables_only,
        )
        .await?;

        let mut tables = Vec::with_capacity(layers.len());
        for layer in layers {
            let layer_flags: TableFlags = if layer.is_view {
                TableFlag::View.into()
            } else if !layer.geometry_column.is_empty() {
                TableFlag::Vector.into()
            } else {
                TableFlag::Aspatial.into()
            };
            if !flags.matches(layer_flags) {
                continue;
            }

            let crs = catalog::crs(session, layer.srid).await?;
            let primary_key_columns = if layer.is_view {
                layer.pk_candidates
            } else {
                catalog::primary_key(session, &layer.schema_name, &layer.table_name).await?
            };

            let mut property = TableProperty {
                table_name: layer.table_name,
                schema: layer.schema_name,
                flags: layer_flags,
                geometry_column_count: usize::from(!layer.geometry_column.is_empty()),
                geometry_column: layer.geometry_column,
                primary_key_columns,
                comment: layer.table_comment,
                ..TableProperty::default()
            };
            property.add_geometry_column_type(layer.wkb_type, crs);
            tables.push(property);
        }
        Ok(tables)
    }

    async fn create_table(&self, layout: &TableLayout<'_>, overwrite: bool) -> Result<()> {
        let create_sql = layout.create_table_sql()?;
        let mut session = self.acquire().await?;

        if catalog::table_exists(session.as_mut(), layout.schema, layout.name).await? {
            if !overwrite {
                return Err(Error::CreateVectorTable(format!(
                    "Table {} already exists",
                    qualified_name(layout.schema, layout.name)
                )));
            }
            session
                .execute(&format!(
                    "DROP TABLE {}",
                    qualified_name(layout.schema, layout.name)
                ))
                .await?;
        }

        session.execute(&create_sql).await?;
        for comment_sql in layout.comment_sql() {
            session.execute(&comment_sql).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderConnection for HanaProviderConnection {
    fn provider_key(&self) -> &'static str {
        PROVIDER_KEY
    }

    fn uri(&self) -> &DataSourceUri {
        &self.uri
    }

    fn configuration(&self) -> &Options {
        &self.configuration
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn schemas(&self) -> Result<Vec<String>> {
        let schemas = self.schema_properties(None).await?;
        Ok(schemas.into_iter().map(|schema| schema.name).collect())
    }

    async fn tables(&self, schema: &str, flags: TableFlags) -> Result<Vec<TableProperty>> {
        self.list_tables(schema, flags, false).await
    }

    async fn table_uri(&self, schema: &str, name: &str) -> Result<String> {
        let table = self.table(schema, name).await?;
        Ok(self
            .uri
            .clone()
            .with_schema(schema)
            .with_table(name)
            .with_geometry_column(table.geometry_column)
            .uri(false))
    }

    async fn create_vector_table(
        &self,
        schema: &str,
        name: &str,
        fields: &[Field],
        wkb_type: WkbType,
        crs: &Crs,
        overwrite: bool,
        options: &Options,
    ) -> Result<()> {
        self.check_capability(Capability::CreateVectorTable)?;

        let geometry_column =
            option_text(options, OPTION_GEOMETRY_COLUMN).unwrap_or(DEFAULT_GEOMETRY_COLUMN);
        let primary_key = option_text(options, OPTION_PRIMARY_KEY).unwrap_or(DEFAULT_PRIMARY_KEY);
        let layout = TableLayout {
            schema,
            name,
            fields,
            primary_key,
            geometry: wkb_type
                .has_geometry()
                .then_some((geometry_column, wkb_type, crs.srid)),
        };

        self.create_table(&layout, overwrite)
            .await
            .map_err(|e| match e {
                Error::CreateVectorTable(_) => e,
                other => Error::CreateVectorTable(other.to_string()),
            })?;
        tracing::info!(
            operation = "create_vector_table",
            schema,
            table = name,
            wkb_type = %wkb_type,
            "Vector table created"
        );
        Ok(())
    }

    async fn drop_vector_table(&self, schema: &str, name: &str) -> Result<()> {
        self.check_capability(Capability::DropVectorTable)?;
        self.drop_table(schema, name).await
    }

    async fn rename_vector_table(&self, schema: &str, name: &str, new_name: &str) -> Result<()> {
        self.check_capability(Capability::RenameVectorTable)?;
        self.rename_table(schema, name, new_name).await
    }

    async fn create_schema(&self, name: &str) -> Result<()> {
        self.check_capability(Capability::CreateSchema)?;
        let sql = format!("CREATE SCHEMA {}", quoted_identifier(name));
        self.execute_ddl("create_schema", &sql).await
    }

    async fn drop_schema(&self, name: &str, force: bool) -> Result<()> {
        self.check_capability(Capability::DropSchema)?;
        let mut sql = format!("DROP SCHEMA {}", quoted_identifier(name));
        if force {
            sql.push_str(" CASCADE");
        }
        self.execute_ddl("drop_schema", &sql).await
    }

    async fn rename_schema(&self, name: &str, new_name: &str) -> Result<()> {
        self.check_capability(Capability::RenameSchema)?;
        let sql = format!(
            "RENAME SCHEMA {} TO {}",
            quoted_identifier(name),
            quoted_identifier(new_name)
        );
        self.execute_ddl("rename_schema", &sql).await
    }

    async fn execute_sql(
        &self,
        sql: &str,
        feedback: Option<&CancellationToken>,
    ) -> Result<QueryResult> {
        self.check_capability(Capability::ExecuteSql)?;

        if is_cancelled(feedback) {
            return Ok(QueryResult::empty());
        }
        let mut session = self.acquire().await?;
        if is_cancelled(feedback) {
            return Ok(QueryResult::empty());
        }

        match session.run(sql).await? {
            StatementOutcome::Rows(cursor) => {
                QueryResult::from_cursor(Box::new(SessionCursor {
                    cursor,
                    _session: session,
                }))
                .await
            }
            StatementOutcome::Completed { affected_rows } => {
                session.commit().await?;
                tracing::debug!(affected_rows, "Statement committed");
                Ok(QueryResult::empty())
            }
        }
    }

    async fn native_types(&self) -> Result<Vec<NativeType>> {
        let mut session = self.acquire().await?;
        let types = catalog::native_types(session.as_mut()).await?;
        if types.is_empty() {
            return Err(Error::NativeTypes(self.uri.connection_info()));
        }
        Ok(types)
    }

    async fn store(&self, name: &str) -> Result<()> {
        self.store.remove(name)?;
        let mut settings = ConnectionSettings::from_uri(&self.uri);
        settings.save_password = true;
        self.store.insert(name, settings)
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.store.remove(name)?;
        Ok(())
    }
}
