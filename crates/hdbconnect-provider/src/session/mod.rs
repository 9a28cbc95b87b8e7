//! Database sessions
//!
//! The provider connection talks to HANA only through these traits. The
//! production implementation in [`hana`] wraps pooled `hdbconnect_async`
//! connections; tests use the scripted session from `crate::testing`.

mod hana;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use hana::{HanaRowCursor, HanaSession, PooledSessionSource, PooledSessions};

use crate::Result;
use crate::uri::DataSourceUri;

/// Forward-only cursor over a result set
#[async_trait]
pub trait RowCursor: Send {
    /// Column names of the result set, in order.
    fn column_names(&self) -> Vec<String>;

    /// Fetch the next row, `None` once the result set is exhausted.
    async fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// Result of running a single statement
pub enum StatementOutcome {
    /// The statement produced a result set.
    Rows(Box<dyn RowCursor>),
    /// DDL/DML without a result set.
    Completed { affected_rows: usize },
}

impl std::fmt::Debug for StatementOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rows(cursor) => f
                .debug_struct("Rows")
                .field("columns", &cursor.column_names())
                .finish(),
            Self::Completed { affected_rows } => f
                .debug_struct("Completed")
                .field("affected_rows", affected_rows)
                .finish(),
        }
    }
}

/// A connection borrowed for the duration of one provider operation
#[async_trait]
pub trait Session: Send {
    /// Run one statement and report whether it produced rows.
    async fn run(&mut self, sql: &str) -> Result<StatementOutcome>;

    async fn commit(&mut self) -> Result<()>;

    /// Run a statement and commit. Rows, if any, are discarded.
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.run(sql).await?;
        self.commit().await
    }

    /// Run a query and collect every row.
    async fn query_rows(&mut self, sql: &str) -> Result<Vec<Vec<Value>>> {
        match self.run(sql).await? {
            StatementOutcome::Rows(mut cursor) => {
                let mut rows = Vec::new();
                while let Some(row) = cursor.next_row().await? {
                    rows.push(row);
                }
                Ok(rows)
            }
            StatementOutcome::Completed { .. } => Ok(Vec::new()),
        }
    }
}

/// Hands out sessions for a data source
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Borrow a session. Fails with `Error::ConnectionFailed` when the
    /// database cannot be reached.
    async fn acquire(&self) -> Result<Box<dyn Session>>;
}

/// Resolves the session source serving a data source URI
pub trait SessionSources: Send + Sync {
    fn source_for(&self, uri: &DataSourceUri) -> Result<Arc<dyn SessionSource>>;
}
