//! The external row store interface and an in-memory reference store.
//!
//! The real backing store (a document database behind an API layer) is
//! an out-of-scope collaborator; the sheet engine reaches it only
//! through [`RowStore`]. [`MemoryRowStore`] is the reference
//! implementation used by tests and demos, with a write log and an
//! injectable per-row failure switch for exercising rollback paths.

use std::collections::HashSet;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use waybook_engine::engine::{CellValue, ColumnId, Row};

/// Stable row key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        RowId(id.into())
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        RowId(id.to_string())
    }
}

/// One stored row.
#[derive(Debug, Clone)]
pub struct RowRecord {
    pub id: RowId,
    pub fields: Row,
}

/// A push notification of an external row mutation (insert or update).
#[derive(Debug, Clone)]
pub struct RowChange {
    pub row: RowId,
    pub fields: Row,
}

/// Failure reported by a row store operation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        StoreError {
            message: message.into(),
        }
    }
}

/// Atomic multi-field row updates plus initial load.
///
/// External change notifications are delivered by the host calling
/// [`crate::Sheet::apply_row_change`] with each [`RowChange`] it
/// receives from its subscription.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn all_rows(&self) -> Result<Vec<RowRecord>, StoreError>;

    /// Write all given fields of one row atomically.
    async fn write_fields(&self, row: &RowId, fields: Row) -> Result<(), StoreError>;
}

/// In-memory [`RowStore`] with a write counter and failure injection.
#[derive(Default)]
pub struct MemoryRowStore {
    rows: DashMap<RowId, Row>,
    writes: AtomicUsize,
    failing: RwLock<HashSet<RowId>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row without counting it as a write.
    pub fn seed(&self, id: RowId, fields: Row) {
        self.rows.insert(id, fields);
    }

    pub fn row(&self, id: &RowId) -> Option<Row> {
        self.rows.get(id).map(|r| r.clone())
    }

    pub fn field(&self, id: &RowId, column: &ColumnId) -> Option<CellValue> {
        self.rows.get(id).and_then(|r| r.get(column).cloned())
    }

    /// Number of `write_fields` calls accepted so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every future write for the given row fail.
    pub fn fail_writes_for(&self, id: RowId) {
        self.failing
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn all_rows(&self) -> Result<Vec<RowRecord>, StoreError> {
        Ok(self
            .rows
            .iter()
            .map(|entry| RowRecord {
                id: entry.key().clone(),
                fields: entry.value().clone(),
            })
            .collect())
    }

    async fn write_fields(&self, row: &RowId, fields: Row) -> Result<(), StoreError> {
        let failing = self
            .failing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(row);
        if failing {
            return Err(StoreError::new(format!("write rejected for row {row}")));
        }

        let mut entry = self.rows.entry(row.clone()).or_default();
        for (column, value) in fields {
            entry.insert(column, value);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_fields_merges_and_counts() {
        let store = MemoryRowStore::new();
        let id = RowId::from("1");

        let mut first = Row::new();
        first.insert(ColumnId::from("a"), CellValue::Number(1.0));
        store.write_fields(&id, first).await.unwrap();

        let mut second = Row::new();
        second.insert(ColumnId::from("b"), CellValue::Number(2.0));
        store.write_fields(&id, second).await.unwrap();

        assert_eq!(store.write_count(), 2);
        let row = store.row(&id).unwrap();
        assert_eq!(row.get(&ColumnId::from("a")), Some(&CellValue::Number(1.0)));
        assert_eq!(row.get(&ColumnId::from("b")), Some(&CellValue::Number(2.0)));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryRowStore::new();
        let id = RowId::from("1");
        store.fail_writes_for(id.clone());

        let err = store.write_fields(&id, Row::new()).await.unwrap_err();
        assert!(err.to_string().contains("row 1"));
        assert_eq!(store.write_count(), 0);
    }
}
