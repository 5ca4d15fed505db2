//! Argument binding resolution.
//!
//! Resolves a computed column's ordered bindings against one row:
//! literals pass through, column references read the referenced column's
//! field by id, fan-in references read an ordered list of such values.
//! A reference to a column that no longer exists in the registry is
//! skipped rather than treated as fatal.

use super::column::{ArgBinding, ColumnDef, ComputedSpec};
use super::value::{CellValue, Row};

/// Build the ordered argument list for one computed column and one row.
pub fn build_arguments(spec: &ComputedSpec, row: &Row, columns: &[ColumnDef]) -> Vec<CellValue> {
    let mut args = Vec::with_capacity(spec.arguments.len());
    for binding in &spec.arguments {
        match binding {
            ArgBinding::Literal(value) => args.push(value.clone()),
            ArgBinding::Column(name) => {
                if let Some(value) = read_field(name, row, columns) {
                    args.push(value);
                }
            }
            ArgBinding::Columns(names) => {
                let values: Vec<CellValue> = names
                    .iter()
                    .filter_map(|name| read_field(name, row, columns))
                    .collect();
                args.push(CellValue::List(values));
            }
        }
    }
    args
}

/// Read `row[column.id]` for the column with the given name.
/// Returns None when the name resolves to no column; a known column with
/// no stored field yields `Null`.
fn read_field(name: &str, row: &Row, columns: &[ColumnDef]) -> Option<CellValue> {
    let column = columns.iter().find(|c| c.name == name)?;
    Some(row.get(&column.id).cloned().unwrap_or(CellValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ColumnId, DataType, FunctionRef};

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::plain("col_p", "price", DataType::Currency),
            ColumnDef::plain("col_d", "discount", DataType::Currency),
        ]
    }

    fn spec(arguments: Vec<ArgBinding>) -> ComputedSpec {
        ComputedSpec {
            function: FunctionRef::new("f", 1),
            arguments,
        }
    }

    #[test]
    fn test_literal_passes_through() {
        let spec = spec(vec![ArgBinding::Literal(CellValue::Number(7.0))]);
        let args = build_arguments(&spec, &Row::new(), &columns());
        assert_eq!(args, vec![CellValue::Number(7.0)]);
    }

    #[test]
    fn test_column_reference_reads_by_id() {
        let mut row = Row::new();
        row.insert(ColumnId::from("col_p"), CellValue::Number(100.0));

        let spec = spec(vec![ArgBinding::Column("price".into())]);
        let args = build_arguments(&spec, &row, &columns());
        assert_eq!(args, vec![CellValue::Number(100.0)]);
    }

    #[test]
    fn test_missing_field_reads_null() {
        let spec = spec(vec![ArgBinding::Column("discount".into())]);
        let args = build_arguments(&spec, &Row::new(), &columns());
        assert_eq!(args, vec![CellValue::Null]);
    }

    #[test]
    fn test_missing_column_reference_is_skipped() {
        let spec = spec(vec![
            ArgBinding::Column("ghost".into()),
            ArgBinding::Literal(CellValue::Bool(true)),
        ]);
        let args = build_arguments(&spec, &Row::new(), &columns());
        assert_eq!(args, vec![CellValue::Bool(true)]);
    }

    #[test]
    fn test_fan_in_keeps_order_and_drops_missing_members() {
        let mut row = Row::new();
        row.insert(ColumnId::from("col_p"), CellValue::Number(1.0));
        row.insert(ColumnId::from("col_d"), CellValue::Number(2.0));

        let spec = spec(vec![ArgBinding::Columns(vec![
            "price".into(),
            "ghost".into(),
            "discount".into(),
        ])]);
        let args = build_arguments(&spec, &row, &columns());
        assert_eq!(
            args,
            vec![CellValue::List(vec![
                CellValue::Number(1.0),
                CellValue::Number(2.0)
            ])]
        );
    }
}
