//! Edits, external change intake, and change propagation.
//!
//! Every field change (user edit, computed result, external
//! notification) lands in the row cache immediately; user-origin and
//! computed-origin changes also queue a persistence write. Propagation
//! walks the dependency graph breadth-first from the changed column's
//! name, recomputing each dependent at most once per pass for the row
//! and feeding its result back into the frontier so chained computed
//! columns see fresh inputs.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use waybook_engine::engine::{CellValue, ColumnDef, ColumnId, Row, build_arguments};
use waybook_engine::error::Result as EngineResult;

use crate::store::{RowChange, RowId};

use super::state::Sheet;

impl Sheet {
    /// Entry point for user edits: coerce the raw input by the column's
    /// declared data type, update the cache optimistically, queue a
    /// persistence write, and propagate to dependent computed columns.
    ///
    /// An edit against a column that no longer exists is a no-op.
    pub async fn field_changed(&self, row_id: &RowId, column_id: &ColumnId, raw: &str) {
        let Some(column) = self.column_by_id(column_id) else {
            debug!(row = %row_id, column = %column_id, "edit against unknown column ignored");
            return;
        };
        let value = CellValue::coerce(raw, column.data_type);
        self.apply_field(row_id, column_id, value.clone(), true);
        self.propagate(row_id, &column, value).await;
    }

    /// Intake for the store's push notifications. The change is already
    /// persisted, so the cache is updated without queueing writes;
    /// dependent computed columns are then recomputed per changed field
    /// (their results do queue writes).
    pub async fn apply_row_change(&self, change: RowChange) {
        let columns = self.columns();
        let mut changed = Vec::new();
        {
            let mut row = self.cache.entry(change.row.clone()).or_default();
            for (column_id, value) in change.fields {
                if row.get(&column_id) != Some(&value) {
                    row.insert(column_id.clone(), value.clone());
                    changed.push((column_id, value));
                }
            }
        }

        for (column_id, value) in changed {
            if let Some(column) = columns.iter().find(|c| c.id == column_id) {
                self.propagate(&change.row, column, value).await;
            }
        }
    }

    /// A row insert is an external change with a fresh row id.
    pub async fn insert_row(&self, row_id: RowId, fields: Row) {
        self.apply_row_change(RowChange {
            row: row_id,
            fields,
        })
        .await;
    }

    /// "Delete" a row: clear its fields but preserve the row identity.
    /// The cleared fields are queued for persistence, then propagated so
    /// dependent computed columns re-evaluate against the emptied row.
    pub async fn clear_row(&self, row_id: &RowId) {
        let Some(mut entry) = self.cache.get_mut(row_id) else {
            return;
        };
        let cleared = std::mem::take(&mut *entry);
        drop(entry);

        for (column_id, prior) in &cleared {
            self.writer.queue(
                row_id.clone(),
                column_id.clone(),
                CellValue::Null,
                Some(prior.clone()),
            );
        }

        let columns = self.columns();
        for column_id in cleared.into_keys() {
            if let Some(column) = columns.iter().find(|c| c.id == column_id) {
                self.propagate(row_id, column, CellValue::Null).await;
            }
        }
    }

    /// Write one field into the cache, returning the prior value.
    /// Queues a persistence write when the change is of local origin.
    pub(crate) fn apply_field(
        &self,
        row_id: &RowId,
        column_id: &ColumnId,
        value: CellValue,
        queue: bool,
    ) -> Option<CellValue> {
        let prior = {
            let mut row = self.cache.entry(row_id.clone()).or_default();
            row.insert(column_id.clone(), value.clone())
        };
        if queue {
            self.writer
                .queue(row_id.clone(), column_id.clone(), value, prior.clone());
        }
        prior
    }

    /// Breadth-first propagation pass for one row, starting from the
    /// changed column's name.
    async fn propagate(&self, row_id: &RowId, changed: &ColumnDef, new_value: CellValue) {
        let columns = self.columns();
        let graph = self.graph();

        // Working snapshot of the row with the changed field overridden.
        let mut row = self.row(row_id).unwrap_or_default();
        row.insert(changed.id.clone(), new_value);

        let mut frontier = VecDeque::from([changed.name.clone()]);
        let mut visited: HashSet<ColumnId> = HashSet::new();

        while let Some(name) = frontier.pop_front() {
            for dependent in graph.dependents_of(&name) {
                if !visited.insert(dependent.id.clone()) {
                    continue;
                }
                match self.compute_cell(row_id, &row, dependent, &columns).await {
                    Ok(Some(value)) => {
                        row.insert(dependent.id.clone(), value);
                        frontier.push_back(dependent.name.clone());
                    }
                    // Unchanged results still reach their own dependents;
                    // the visited set keeps the pass bounded.
                    Ok(None) => frontier.push_back(dependent.name.clone()),
                    // A failing cell keeps its prior value and does not
                    // feed a value onward; siblings are unaffected.
                    Err(err) => {
                        warn!(row = %row_id, column = %dependent.id, error = %err,
                            "computed column failed during propagation");
                    }
                }
            }
        }
    }

    /// Evaluate one computed column for one row against the given row
    /// snapshot.
    ///
    /// Returns `Ok(Some(value))` when the result changed (cache updated,
    /// write queued), `Ok(None)` when the result structurally equals the
    /// stored value (no cache update, no write).
    pub(crate) async fn compute_cell(
        &self,
        row_id: &RowId,
        row: &Row,
        column: &ColumnDef,
        columns: &[ColumnDef],
    ) -> EngineResult<Option<CellValue>> {
        let Some(spec) = column.computed_spec() else {
            return Ok(None);
        };

        let callable = self.resolver.resolve(&spec.function).await?;
        let args = build_arguments(spec, row, columns);
        let value = callable.call(args).await?;

        let unchanged = match row.get(&column.id) {
            Some(current) => *current == value,
            None => value.is_null(),
        };
        if unchanged {
            return Ok(None);
        }

        self.apply_field(row_id, &column.id, value.clone(), true);
        Ok(Some(value))
    }
}
