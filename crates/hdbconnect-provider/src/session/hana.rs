//! Sessions backed by pooled `hdbconnect_async` connections

use std::sync::Arc;

use async_trait::async_trait;
use deadpool::managed::{PoolError, TimeoutType};
use hdbconnect_async::{HdbReturnValue, ResultSet};
use serde_json::Value;

use super::{RowCursor, Session, SessionSource, SessionSources, StatementOutcome};
use crate::guard::QueryGuard;
use crate::pool::{Pool, PooledConnection, SharedPoolRegistry};
use crate::uri::DataSourceUri;
use crate::value::hdb_value_into_json;
use crate::{Error, Result};

/// Lazily fetched HANA result set
pub struct HanaRowCursor {
    result_set: ResultSet,
    columns: Vec<String>,
    guard: QueryGuard,
}

impl HanaRowCursor {
    fn new(result_set: ResultSet, guard: QueryGuard) -> Self {
        let columns = result_set
            .metadata()
            .iter()
            .map(|field| field.columnname().to_string())
            .collect();
        Self {
            result_set,
            columns,
            guard,
        }
    }
}

impl std::fmt::Debug for HanaRowCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HanaRowCursor")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RowCursor for HanaRowCursor {
    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    async fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        let Some(row) = self.guard.execute(self.result_set.next_row()).await? else {
            return Ok(None);
        };
        let mut values = Vec::with_capacity(self.columns.len());
        for value in row {
            values.push(self.guard.execute(hdb_value_into_json(value)).await?);
        }
        Ok(Some(values))
    }
}

/// Session holding one pooled connection
pub struct HanaSession {
    conn: PooledConnection,
    guard: QueryGuard,
}

impl HanaSession {
    pub const fn new(conn: PooledConnection, guard: QueryGuard) -> Self {
        Self { conn, guard }
    }
}

impl std::fmt::Debug for HanaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HanaSession")
            .field("conn", &"<PooledConnection>")
            .field("guard", &self.guard)
            .finish()
    }
}

#[async_trait]
impl Session for HanaSession {
    async fn run(&mut self, sql: &str) -> Result<StatementOutcome> {
        tracing::debug!(sql = %sql, "Executing statement");
        let response = self.guard.execute(self.conn.statement(sql)).await?;

        let mut affected_rows = 0;
        for return_value in response {
            #[allow(unreachable_patterns)]
            match return_value {
                HdbReturnValue::ResultSet(result_set) => {
                    let cursor = HanaRowCursor::new(result_set, self.guard);
                    return Ok(StatementOutcome::Rows(Box::new(cursor)));
                }
                HdbReturnValue::AffectedRows(counts) => {
                    affected_rows += counts.iter().sum::<usize>();
                }
                _ => {}
            }
        }
        Ok(StatementOutcome::Completed { affected_rows })
    }

    async fn commit(&mut self) -> Result<()> {
        self.guard.execute(self.conn.commit()).await
    }
}

/// Session source drawing connections from a [`Pool`]
pub struct PooledSessionSource {
    pool: Pool,
    uri: DataSourceUri,
    guard: QueryGuard,
}

impl PooledSessionSource {
    pub const fn new(pool: Pool, uri: DataSourceUri, guard: QueryGuard) -> Self {
        Self { pool, uri, guard }
    }
}

impl std::fmt::Debug for PooledSessionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledSessionSource")
            .field("pool", &"<Pool>")
            .field("uri", &self.uri.connection_info())
            .field("guard", &self.guard)
            .finish()
    }
}

#[async_trait]
impl SessionSource for PooledSessionSource {
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        match Box::pin(self.pool.get()).await {
            Ok(conn) => Ok(Box::new(HanaSession::new(conn, self.guard))),
            Err(PoolError::Timeout(TimeoutType::Wait)) => {
                tracing::warn!(uri = %self.uri.connection_info(), "Connection pool exhausted");
                Err(Error::PoolExhausted)
            }
            Err(e) => {
                tracing::warn!(
                    uri = %self.uri.connection_info(),
                    error = %e,
                    "Failed to acquire HANA connection"
                );
                Err(Error::ConnectionFailed(self.uri.connection_info()))
            }
        }
    }
}

/// Session sources backed by the shared [`PoolRegistry`](crate::pool::PoolRegistry)
#[derive(Debug, Clone)]
pub struct PooledSessions {
    registry: SharedPoolRegistry,
    guard: QueryGuard,
}

impl PooledSessions {
    pub const fn new(registry: SharedPoolRegistry, guard: QueryGuard) -> Self {
        Self { registry, guard }
    }
}

impl SessionSources for PooledSessions {
    fn source_for(&self, uri: &DataSourceUri) -> Result<Arc<dyn SessionSource>> {
        let pool = self.registry.pool(uri.connection_url().as_str())?;
        Ok(Arc::new(PooledSessionSource::new(pool, uri.clone(), self.guard)))
    }
}
