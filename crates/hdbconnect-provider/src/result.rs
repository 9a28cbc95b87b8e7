//! Query results
//!
//! [`QueryResult`] pairs the column names of a statement with a lazy row
//! iterator. Rows are pulled from the driver one at a time.

use async_trait::async_trait;
use serde_json::Value;

use crate::session::RowCursor;
use crate::{Error, Result};

/// Row iterator behind a [`QueryResult`]
#[async_trait]
pub trait ResultIterator: Send {
    fn has_next_row(&self) -> bool;

    /// Next row, or an empty list once exhausted.
    async fn next_row(&mut self) -> Result<Vec<Value>>;

    /// Rows handed out so far.
    fn fetched_row_count(&self) -> u64;
}

/// Iterator over a HANA result set
///
/// One row is always buffered: the first row is fetched on construction and
/// every [`next_row`](ResultIterator::next_row) fetches its successor, so
/// [`has_next_row`](ResultIterator::has_next_row) never touches the driver.
/// A failed prefetch is held back until the buffered row has been handed out.
pub struct HanaResultIterator {
    cursor: Box<dyn RowCursor>,
    num_columns: usize,
    next: Option<Vec<Value>>,
    failed: Option<Error>,
    fetched: u64,
}

impl HanaResultIterator {
    pub async fn new(mut cursor: Box<dyn RowCursor>) -> Result<Self> {
        let num_columns = cursor.column_names().len();
        let next = cursor.next_row().await?;
        Ok(Self {
            cursor,
            num_columns,
            next,
            failed: None,
            fetched: 0,
        })
    }
}

impl std::fmt::Debug for HanaResultIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HanaResultIterator")
            .field("num_columns", &self.num_columns)
            .field("has_next_row", &self.has_next_row())
            .field("fetched", &self.fetched)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ResultIterator for HanaResultIterator {
    fn has_next_row(&self) -> bool {
        self.next.is_some() || self.failed.is_some()
    }

    async fn next_row(&mut self) -> Result<Vec<Value>> {
        let Some(mut row) = self.next.take() else {
            return self.failed.take().map_or_else(|| Ok(Vec::new()), Err);
        };
        row.resize(self.num_columns, Value::Null);
        self.fetched += 1;
        match self.cursor.next_row().await {
            Ok(next) => self.next = next,
            Err(e) => self.failed = Some(e),
        }
        Ok(row)
    }

    fn fetched_row_count(&self) -> u64 {
        self.fetched
    }
}

/// Iterator for statements without a result set
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyResultIterator;

#[async_trait]
impl ResultIterator for EmptyResultIterator {
    fn has_next_row(&self) -> bool {
        false
    }

    async fn next_row(&mut self) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }

    fn fetched_row_count(&self) -> u64 {
        0
    }
}

/// Result of [`execute_sql`](crate::ProviderConnection::execute_sql)
pub struct QueryResult {
    columns: Vec<String>,
    iterator: Box<dyn ResultIterator>,
}

impl QueryResult {
    pub fn new(iterator: Box<dyn ResultIterator>) -> Self {
        Self {
            columns: Vec::new(),
            iterator,
        }
    }

    /// Result with no columns and no rows.
    pub fn empty() -> Self {
        Self::new(Box::new(EmptyResultIterator))
    }

    /// Lazy result over an open cursor, columns taken from the cursor.
    pub async fn from_cursor(cursor: Box<dyn RowCursor>) -> Result<Self> {
        let columns = cursor.column_names();
        let mut result = Self::new(Box::new(HanaResultIterator::new(cursor).await?));
        for column in columns {
            result.append_column(column);
        }
        Ok(result)
    }

    pub fn append_column(&mut self, column: impl Into<String>) {
        self.columns.push(column.into());
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_next_row(&self) -> bool {
        self.iterator.has_next_row()
    }

    pub async fn next_row(&mut self) -> Result<Vec<Value>> {
        self.iterator.next_row().await
    }

    pub fn fetched_row_count(&self) -> u64 {
        self.iterator.fetched_row_count()
    }

    /// Drain up to `limit` remaining rows.
    pub async fn rows(&mut self, limit: Option<usize>) -> Result<Vec<Vec<Value>>> {
        let mut rows = Vec::new();
        while self.has_next_row() && limit.is_none_or(|max| rows.len() < max) {
            rows.push(self.next_row().await?);
        }
        Ok(rows)
    }
}

impl std::fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResult")
            .field("columns", &self.columns)
            .field("has_next_row", &self.iterator.has_next_row())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::ScriptedCursor;

    fn cursor(rows: Vec<Vec<Value>>) -> Box<dyn RowCursor> {
        Box::new(ScriptedCursor::new(vec!["ID".into(), "NAME".into()], rows))
    }

    #[tokio::test]
    async fn test_empty_iterator() {
        let mut result = QueryResult::empty();
        assert!(result.columns().is_empty());
        assert!(!result.has_next_row());
        assert!(result.next_row().await.unwrap().is_empty());
        assert_eq!(result.fetched_row_count(), 0);
    }

    #[tokio::test]
    async fn test_iterates_rows_lazily() {
        let mut result = QueryResult::from_cursor(cursor(vec![
            vec![json!(1), json!("Main St")],
            vec![json!(2), json!("Harbour Rd")],
        ]))
        .await
        .unwrap();

        assert_eq!(result.columns(), ["ID", "NAME"]);
        assert!(result.has_next_row());
        assert_eq!(
            result.next_row().await.unwrap(),
            vec![json!(1), json!("Main St")]
        );
        assert!(result.has_next_row());
        assert_eq!(
            result.next_row().await.unwrap(),
            vec![json!(2), json!("Harbour Rd")]
        );
        assert!(!result.has_next_row());
        assert!(result.next_row().await.unwrap().is_empty());
        assert_eq!(result.fetched_row_count(), 2);
    }

    #[tokio::test]
    async fn test_no_rows_has_columns() {
        let result = QueryResult::from_cursor(cursor(Vec::new())).await.unwrap();
        assert_eq!(result.columns().len(), 2);
        assert!(!result.has_next_row());
    }

    #[tokio::test]
    async fn test_short_rows_padded_to_column_count() {
        let mut result = QueryResult::from_cursor(cursor(vec![vec![json!(7)]]))
            .await
            .unwrap();
        assert_eq!(result.next_row().await.unwrap(), vec![json!(7), Value::Null]);
    }

    #[tokio::test]
    async fn test_rows_with_limit() {
        let mut result = QueryResult::from_cursor(cursor(vec![
            vec![json!(1), json!("a")],
            vec![json!(2), json!("b")],
            vec![json!(3), json!("c")],
        ]))
        .await
        .unwrap();

        let first = result.rows(Some(2)).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(result.has_next_row());
        let rest = result.rows(None).await.unwrap();
        assert_eq!(rest, vec![vec![json!(3), json!("c")]]);
    }

    #[tokio::test]
    async fn test_driver_error_after_buffered_row() {
        let failing = ScriptedCursor::new(vec!["ID".into()], vec![vec![json!(1)]])
            .fail_after_rows("connection reset by peer");
        let mut result = QueryResult::from_cursor(Box::new(failing)).await.unwrap();

        assert_eq!(result.next_row().await.unwrap(), vec![json!(1)]);
        assert_eq!(result.fetched_row_count(), 1);
        assert!(result.has_next_row());

        let err = result.next_row().await.unwrap_err();
        assert!(matches!(err, Error::Query(_)));
        assert_eq!(err.to_string(), "connection reset by peer");
        assert!(!result.has_next_row());
        assert!(result.next_row().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rows_keeps_error_for_last_call() {
        let failing = ScriptedCursor::new(
            vec!["ID".into()],
            vec![vec![json!(1)], vec![json!(2)]],
        )
        .fail_after_rows("connection reset by peer");
        let mut result = QueryResult::from_cursor(Box::new(failing)).await.unwrap();

        assert_eq!(
            result.rows(Some(2)).await.unwrap(),
            vec![vec![json!(1)], vec![json!(2)]]
        );
        assert!(result.rows(None).await.is_err());
    }
}
