//! Column metadata.
//!
//! Columns are mutable metadata owned by an external column editor; the
//! engine only reads them. A computed column names a versioned function
//! plus an ordered list of argument bindings that point at other columns
//! by *name* (the identity used in dependency references), while the
//! column *id* is the stable field key on rows.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::{CellValue, DataType};

/// Stable column identifier, used as the field key on rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(pub String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        ColumnId(id.into())
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(id: &str) -> Self {
        ColumnId(id.to_string())
    }
}

/// Reference to a named, versioned callable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionRef {
    pub name: String,
    pub version: u32,
}

impl FunctionRef {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        FunctionRef {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.name, self.version)
    }
}

/// One argument binding of a computed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgBinding {
    /// A literal passed through unchanged.
    Literal(CellValue),
    /// A single column reference, by column name.
    Column(String),
    /// An ordered list of column references (fan-in).
    Columns(Vec<String>),
}

/// The computed half of a function column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedSpec {
    pub function: FunctionRef,
    pub arguments: Vec<ArgBinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Plain,
    Computed(ComputedSpec),
}

/// A column definition: plain, or computed from other columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub id: ColumnId,
    /// Human label; also the identity used in dependency references.
    pub name: String,
    pub data_type: DataType,
    pub kind: ColumnKind,
}

impl ColumnDef {
    pub fn plain(id: impl Into<ColumnId>, name: impl Into<String>, data_type: DataType) -> Self {
        ColumnDef {
            id: id.into(),
            name: name.into(),
            data_type,
            kind: ColumnKind::Plain,
        }
    }

    pub fn computed(
        id: impl Into<ColumnId>,
        name: impl Into<String>,
        data_type: DataType,
        function: FunctionRef,
        arguments: Vec<ArgBinding>,
    ) -> Self {
        ColumnDef {
            id: id.into(),
            name: name.into(),
            data_type,
            kind: ColumnKind::Computed(ComputedSpec {
                function,
                arguments,
            }),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.kind, ColumnKind::Computed(_))
    }

    pub fn computed_spec(&self) -> Option<&ComputedSpec> {
        match &self.kind {
            ColumnKind::Computed(spec) => Some(spec),
            ColumnKind::Plain => None,
        }
    }

    /// Column names this column reads as arguments (empty for plain columns).
    pub fn referenced_names(&self) -> Vec<&str> {
        let Some(spec) = self.computed_spec() else {
            return Vec::new();
        };
        let mut names = Vec::new();
        for binding in &spec.arguments {
            match binding {
                ArgBinding::Literal(_) => {}
                ArgBinding::Column(name) => names.push(name.as_str()),
                ArgBinding::Columns(list) => names.extend(list.iter().map(String::as_str)),
            }
        }
        names
    }
}

impl From<String> for ColumnId {
    fn from(id: String) -> Self {
        ColumnId(id)
    }
}
