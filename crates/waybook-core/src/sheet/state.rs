//! Sheet engine state and schema management.

use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use waybook_engine::engine::{ColumnDef, ColumnId, DependencyGraph, Row};
use waybook_engine::functions::{FunctionCompiler, FunctionResolver};

use crate::config::SheetConfig;
use crate::error::Result;
use crate::store::{RowId, RowStore};
use crate::writer::{FieldWriter, WriteFailure};

use super::RowCache;

/// One bookings sheet: column schema, dependency graph, optimistic row
/// cache, function resolver and persistence writer, owned as explicit
/// constructor-injected state so independent sheets can coexist.
pub struct Sheet {
    columns: RwLock<Arc<Vec<ColumnDef>>>,
    graph: RwLock<Arc<DependencyGraph>>,
    pub(crate) cache: RowCache,
    pub(crate) resolver: FunctionResolver,
    pub(crate) writer: FieldWriter,
}

impl Sheet {
    /// Create a sheet with an empty cache. Must be called inside a tokio
    /// runtime (the persistence writer task is spawned here). Returns
    /// the sheet and the write-failure stream the UI should drain.
    pub fn new(
        config: &SheetConfig,
        columns: Vec<ColumnDef>,
        store: Arc<dyn RowStore>,
        compiler: Arc<dyn FunctionCompiler>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<WriteFailure>)> {
        let graph = DependencyGraph::build(&columns)?;
        let cache: RowCache = Arc::new(DashMap::new());
        let (writer, failures) = FieldWriter::spawn(store, cache.clone(), config.debounce());

        let sheet = Sheet {
            columns: RwLock::new(Arc::new(columns)),
            graph: RwLock::new(Arc::new(graph)),
            cache,
            resolver: FunctionResolver::new(compiler),
            writer,
        };
        Ok((sheet, failures))
    }

    /// Create a sheet and populate the cache from the store.
    pub async fn load(
        config: &SheetConfig,
        columns: Vec<ColumnDef>,
        store: Arc<dyn RowStore>,
        compiler: Arc<dyn FunctionCompiler>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<WriteFailure>)> {
        let rows = store.all_rows().await?;
        let (sheet, failures) = Self::new(config, columns, store, compiler)?;
        for record in rows {
            sheet.cache.insert(record.id, record.fields);
        }
        Ok((sheet, failures))
    }

    /// Replace the column set, rebuilding the dependency graph eagerly.
    /// A cyclic column set is rejected and the previous schema kept.
    pub fn set_columns(&self, columns: Vec<ColumnDef>) -> Result<()> {
        let graph = DependencyGraph::build(&columns)?;
        debug!(
            columns = columns.len(),
            sources = graph.source_count(),
            "rebuilt dependency graph"
        );
        // The slots only ever hold fully built Arcs, so a poisoned lock
        // carries no partial state and is safe to keep using.
        *self
            .graph
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(graph);
        *self
            .columns
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(columns);
        // Function definitions may have changed alongside the columns.
        self.resolver.invalidate();
        Ok(())
    }

    /// Current column set, in order.
    pub fn columns(&self) -> Arc<Vec<ColumnDef>> {
        self.columns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn graph(&self) -> Arc<DependencyGraph> {
        self.graph
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of one row for rendering.
    pub fn row(&self, id: &RowId) -> Option<Row> {
        self.cache.get(id).map(|r| r.clone())
    }

    /// Snapshot of all rows for rendering.
    pub fn rows(&self) -> Vec<(RowId, Row)> {
        self.cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.cache.len()
    }

    /// Flush pending field writes now instead of waiting for the
    /// debounce window.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    pub(crate) fn column_by_id(&self, id: &ColumnId) -> Option<ColumnDef> {
        self.columns().iter().find(|c| &c.id == id).cloned()
    }
}
