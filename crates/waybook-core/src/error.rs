//! Error types for waybook core.

use thiserror::Error;

use crate::store::StoreError;
use waybook_engine::EngineError;

/// Errors surfaced by the sheet engine.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("row store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SheetError>;
