//! Computed-column engine API.
//!
//! - [`ColumnDef`], [`ColumnKind`], [`DataType`] - column metadata
//! - [`CellValue`], [`Row`] - field values and input coercion
//! - [`DependencyGraph`] - direct-dependent lookup per source column name
//! - [`detect_cycle`] - circular dependency detection over a column set
//! - [`build_arguments`] - resolve a computed column's bindings against a row

mod args;
mod column;
mod cycle;
mod deps;
mod value;

pub use args::build_arguments;
pub use column::{ArgBinding, ColumnDef, ColumnId, ColumnKind, ComputedSpec, FunctionRef};
pub use cycle::detect_cycle;
pub use deps::DependencyGraph;
pub use value::{CellValue, DataType, Row};
