//! Batched, debounced persistence writer.
//!
//! A dedicated single-writer task owns the pending-writes buffer, so no
//! locks guard it: the sheet talks to it over an mpsc channel. Writes
//! for the same `(row, column)` collapse last-value-wins until a flush
//! converts each row's pending entries into one multi-field store
//! update.
//!
//! The debounce timer arms on the first enqueue after a flush and is
//! left running (not reset by later enqueues), which bounds flush
//! latency under continuous edits. `flush()` is independently callable
//! for "flush now" semantics after bulk operations.
//!
//! When a row's flush fails, that row's optimistic values are reverted
//! in the cache to the value each field held when its first pending
//! write was queued, and a [`WriteFailure`] naming the affected fields
//! is emitted for the UI layer. The engine does not retry; re-queueing
//! is the UI's decision.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

use waybook_engine::engine::{CellValue, ColumnId, Row};

use crate::sheet::RowCache;
use crate::store::{RowId, RowStore};

/// Notification that a row's pending writes could not be persisted.
#[derive(Debug, Clone)]
pub struct WriteFailure {
    pub row: RowId,
    /// The field values that failed to persist (and were reverted).
    pub fields: Row,
    pub error: String,
}

enum WriterCmd {
    Queue {
        row: RowId,
        column: ColumnId,
        value: CellValue,
        prior: Option<CellValue>,
    },
    Flush {
        ack: oneshot::Sender<()>,
    },
}

/// Handle to the writer task.
pub struct FieldWriter {
    tx: mpsc::UnboundedSender<WriterCmd>,
}

impl FieldWriter {
    /// Spawn the writer task. Returns the handle and the failure
    /// notification stream the UI layer should drain.
    pub fn spawn(
        store: Arc<dyn RowStore>,
        cache: RowCache,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<WriteFailure>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (failure_tx, failure_rx) = mpsc::unbounded_channel();
        tokio::spawn(writer_task(rx, store, cache, debounce, failure_tx));
        (FieldWriter { tx }, failure_rx)
    }

    /// Queue one field update; coalesces with any pending write for the
    /// same key. `prior` is the cache value being optimistically
    /// replaced, kept for rollback on flush failure.
    pub fn queue(&self, row: RowId, column: ColumnId, value: CellValue, prior: Option<CellValue>) {
        let _ = self.tx.send(WriterCmd::Queue {
            row,
            column,
            value,
            prior,
        });
    }

    /// Flush all pending writes now and wait for completion.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriterCmd::Flush { ack }).is_ok() {
            let _ = done.await;
        }
    }
}

struct PendingField {
    value: CellValue,
    /// Cache value before the *first* pending write for this key, so a
    /// rollback undoes the whole coalesced run of edits.
    prior: Option<CellValue>,
}

async fn writer_task(
    mut rx: mpsc::UnboundedReceiver<WriterCmd>,
    store: Arc<dyn RowStore>,
    cache: RowCache,
    debounce: Duration,
    failure_tx: mpsc::UnboundedSender<WriteFailure>,
) {
    let mut pending: HashMap<RowId, HashMap<ColumnId, PendingField>> = HashMap::new();
    let mut deadline: Option<Instant> = None;

    loop {
        let timer = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(WriterCmd::Queue { row, column, value, prior }) => {
                    let fields = pending.entry(row).or_default();
                    match fields.get_mut(&column) {
                        Some(field) => field.value = value,
                        None => {
                            fields.insert(column, PendingField { value, prior });
                        }
                    }
                    if deadline.is_none() {
                        deadline = Some(Instant::now() + debounce);
                    }
                }
                Some(WriterCmd::Flush { ack }) => {
                    flush_pending(&mut pending, &store, &cache, &failure_tx).await;
                    deadline = None;
                    let _ = ack.send(());
                }
                None => {
                    // Sheet dropped; persist what is left and stop.
                    flush_pending(&mut pending, &store, &cache, &failure_tx).await;
                    break;
                }
            },
            _ = timer => {
                flush_pending(&mut pending, &store, &cache, &failure_tx).await;
                deadline = None;
            }
        }
    }
}

async fn flush_pending(
    pending: &mut HashMap<RowId, HashMap<ColumnId, PendingField>>,
    store: &Arc<dyn RowStore>,
    cache: &RowCache,
    failure_tx: &mpsc::UnboundedSender<WriteFailure>,
) {
    if pending.is_empty() {
        return;
    }
    debug!(rows = pending.len(), "flushing pending field writes");

    for (row_id, fields) in pending.drain() {
        let values: Row = fields
            .iter()
            .map(|(column, field)| (column.clone(), field.value.clone()))
            .collect();

        match store.write_fields(&row_id, values.clone()).await {
            Ok(()) => {}
            Err(err) => {
                warn!(row = %row_id, error = %err, "flush failed; reverting row fields");
                if let Some(mut row) = cache.get_mut(&row_id) {
                    for (column, field) in &fields {
                        match &field.prior {
                            Some(value) => {
                                row.insert(column.clone(), value.clone());
                            }
                            None => {
                                row.remove(column);
                            }
                        }
                    }
                }
                let _ = failure_tx.send(WriteFailure {
                    row: row_id,
                    fields: values,
                    error: err.to_string(),
                });
            }
        }
    }
}
