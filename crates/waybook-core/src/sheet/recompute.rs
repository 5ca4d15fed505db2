//! Full recompute: every computed column for every row.
//!
//! A one-shot maintenance pass (e.g. after bulk import) that reuses the
//! per-row computation primitive without graph pruning. Per-cell
//! failures are logged and skipped, and pending writes are flushed
//! immediately at the end rather than waiting out the debounce window.

use tracing::{info, warn};

use super::state::Sheet;

/// Outcome counts of one full recompute pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputeSummary {
    pub evaluated: usize,
    pub changed: usize,
    pub failed: usize,
}

impl Sheet {
    /// Recompute every computed column for every cached row, then flush.
    pub async fn recompute_all(&self) -> RecomputeSummary {
        let columns = self.columns();
        let computed: Vec<_> = columns.iter().filter(|c| c.is_computed()).collect();
        let row_ids: Vec<_> = self.cache.iter().map(|e| e.key().clone()).collect();

        let mut summary = RecomputeSummary::default();
        for row_id in row_ids {
            // Per-row snapshot so later columns in the pass observe
            // earlier recomputed values for the same row.
            let mut row = self.row(&row_id).unwrap_or_default();
            for column in &computed {
                summary.evaluated += 1;
                match self.compute_cell(&row_id, &row, column, &columns).await {
                    Ok(Some(value)) => {
                        row.insert(column.id.clone(), value);
                        summary.changed += 1;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        summary.failed += 1;
                        warn!(row = %row_id, column = %column.id, error = %err,
                            "computed column failed during full recompute");
                    }
                }
            }
        }

        self.flush().await;
        info!(
            evaluated = summary.evaluated,
            changed = summary.changed,
            failed = summary.failed,
            "full recompute finished"
        );
        summary
    }
}
