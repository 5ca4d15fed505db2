//! The sheet engine facade.

mod ops;
mod recompute;
mod state;

use std::sync::Arc;

use dashmap::DashMap;

use crate::store::RowId;
use waybook_engine::engine::Row;

/// Optimistic in-memory mirror of all rows (DashMap is internally
/// Arc-based, clones are cheap).
pub type RowCache = Arc<DashMap<RowId, Row>>;

pub use recompute::RecomputeSummary;
pub use state::Sheet;
