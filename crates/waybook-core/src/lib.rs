//! waybook-core - the bookings-sheet engine.
//!
//! Wires the computed-column machinery from `waybook-engine` to a row
//! store: an optimistic in-memory row cache, breadth-first change
//! propagation over the dependency graph, a debounced single-writer
//! persistence task, and a full-recompute maintenance pass.

pub mod config;
pub mod error;
pub mod sheet;
pub mod store;
pub mod writer;

pub use config::SheetConfig;
pub use error::{Result, SheetError};
pub use sheet::{RecomputeSummary, Sheet};
pub use store::{MemoryRowStore, RowChange, RowId, RowRecord, RowStore, StoreError};
pub use writer::{FieldWriter, WriteFailure};

pub use waybook_engine::engine::{CellValue, ColumnDef, ColumnId, Row};
