//! In-memory scripted database for tests
//!
//! Responses are registered against SQL fragments; a statement gets the
//! response of the most recently registered fragment it contains, or an
//! empty `Completed` outcome. Every statement and commit is recorded.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::session::{RowCursor, Session, SessionSource, SessionSources, StatementOutcome};
use crate::uri::DataSourceUri;
use crate::{Error, Result};

/// Scripted reply to a statement
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Completed(usize),
    Fail(String),
}

#[derive(Debug, Default)]
struct ScriptedState {
    rules: Mutex<Vec<(String, ScriptedResponse)>>,
    executed: Mutex<Vec<String>>,
    commits: AtomicUsize,
    acquired: AtomicUsize,
    unreachable: AtomicBool,
}

impl ScriptedState {
    fn respond(&self, sql: &str) -> ScriptedResponse {
        self.executed.lock().push(sql.to_string());
        self.rules
            .lock()
            .iter()
            .rev()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map_or(ScriptedResponse::Completed(0), |(_, response)| {
                response.clone()
            })
    }
}

/// Shared handle to a scripted database; clones see the same state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDatabase {
    state: Arc<ScriptedState>,
}

impl ScriptedDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, fragment: &str, response: ScriptedResponse) -> Self {
        self.state
            .rules
            .lock()
            .push((fragment.to_string(), response));
        self
    }

    pub fn rows(self, fragment: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let columns = columns.iter().map(ToString::to_string).collect();
        self.respond(fragment, ScriptedResponse::Rows { columns, rows })
    }

    pub fn fail(self, fragment: &str, message: &str) -> Self {
        self.respond(fragment, ScriptedResponse::Fail(message.to_string()))
    }

    /// Make every `acquire` fail as if the server were down.
    pub fn unreachable(self) -> Self {
        self.state.unreachable.store(true, Ordering::SeqCst);
        self
    }

    pub fn session(&self) -> ScriptedSession {
        ScriptedSession {
            state: Arc::clone(&self.state),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.executed.lock().clone()
    }

    pub fn commits(&self) -> usize {
        self.state.commits.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionSource for ScriptedDatabase {
    async fn acquire(&self) -> Result<Box<dyn Session>> {
        if self.state.unreachable.load(Ordering::SeqCst) {
            return Err(Error::ConnectionFailed("hdbsql://scripted".into()));
        }
        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.session()))
    }
}

#[derive(Debug)]
pub struct ScriptedSession {
    state: Arc<ScriptedState>,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn run(&mut self, sql: &str) -> Result<StatementOutcome> {
        match self.state.respond(sql) {
            ScriptedResponse::Rows { columns, rows } => Ok(StatementOutcome::Rows(Box::new(
                ScriptedCursor::new(columns, rows),
            ))),
            ScriptedResponse::Completed(affected_rows) => {
                Ok(StatementOutcome::Completed { affected_rows })
            }
            ScriptedResponse::Fail(message) => Err(Error::Query(message)),
        }
    }

    async fn commit(&mut self) -> Result<()> {
        self.state.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
pub struct ScriptedCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    failure: Option<String>,
}

impl ScriptedCursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
            failure: None,
        }
    }

    /// Fail with `message` once the scripted rows are used up.
    pub fn fail_after_rows(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }
}

#[async_trait]
impl RowCursor for ScriptedCursor {
    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    async fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        if let Some(row) = self.rows.pop_front() {
            return Ok(Some(row));
        }
        match self.failure.take() {
            Some(message) => Err(Error::Query(message)),
            None => Ok(None),
        }
    }
}

impl SessionSources for ScriptedDatabase {
    fn source_for(&self, _uri: &DataSourceUri) -> Result<Arc<dyn SessionSource>> {
        Ok(Arc::new(self.clone()))
    }
}
