//! waybook-engine - UI-agnostic computed-column model.
//!
//! This crate holds everything a bookings sheet needs to describe and
//! evaluate user-defined function columns, independent of any row store
//! or UI:
//!
//! - [`ColumnDef`], [`ColumnKind`], [`DataType`] - column metadata
//! - [`CellValue`] - field values and input coercion
//! - [`DependencyGraph`] - source column name -> dependent computed columns
//! - [`build_arguments`] - argument binding resolution against a row
//! - [`FunctionCompiler`] / [`Callable`] - the narrow capability interface
//!   a function-compilation service implements
//! - [`FunctionResolver`] - memoizing resolver over a compiler
//! - [`RhaiFunctions`] - in-process Rhai-backed execution strategy

pub mod engine;
pub mod error;
pub mod functions;
pub mod scripting;

pub use engine::{
    ArgBinding, CellValue, ColumnDef, ColumnId, ColumnKind, ComputedSpec, DataType,
    DependencyGraph, FunctionRef, Row, build_arguments, detect_cycle,
};
pub use error::{EngineError, Result};
pub use functions::{Callable, FunctionCompiler, FunctionResolver};
pub use scripting::RhaiFunctions;
