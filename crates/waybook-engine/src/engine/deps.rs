//! The dependency graph: source column name -> direct dependent computed columns.
//!
//! Rebuilt eagerly on every column-set change (cheap relative to row
//! count). Only direct dependents are stored; transitive reach is walked
//! by the change propagator at propagation time. Dependents of the same
//! source keep the column set's insertion order.

use std::collections::HashMap;

use crate::error::{EngineError, Result};

use super::column::ColumnDef;
use super::cycle::detect_cycle;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    dependents: HashMap<String, Vec<ColumnDef>>,
}

impl DependencyGraph {
    /// Build the graph from a column set.
    ///
    /// Rejects cyclic column sets so that propagation is bounded by the
    /// number of computed columns by construction.
    pub fn build(columns: &[ColumnDef]) -> Result<Self> {
        if let Some(path) = detect_cycle(columns) {
            return Err(EngineError::Cycle { path });
        }

        let mut dependents: HashMap<String, Vec<ColumnDef>> = HashMap::new();
        for column in columns.iter().filter(|c| c.is_computed()) {
            for source in column.referenced_names() {
                let entry = dependents.entry(source.to_string()).or_default();
                // A column referencing the same source via several bindings
                // is still a single dependent.
                if !entry.iter().any(|c| c.id == column.id) {
                    entry.push(column.clone());
                }
            }
        }

        Ok(DependencyGraph { dependents })
    }

    /// Direct dependents of a source column name, in insertion order.
    pub fn dependents_of(&self, source_name: &str) -> &[ColumnDef] {
        self.dependents
            .get(source_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Number of source columns with at least one dependent.
    pub fn source_count(&self) -> usize {
        self.dependents.len()
    }
}
