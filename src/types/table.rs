//! Row-major payload tables.

use crate::error::MediatorError;

/// Rows of string cells. Column `i` of every row belongs to attribute `i`
/// of whatever name list accompanies the table.
pub type Table = Vec<Vec<String>>;

/// Fail with `SchemaMismatch` unless every row has `columns` cells.
pub(crate) fn check_columns(table: &Table, columns: usize, what: &str) -> Result<(), MediatorError> {
    if let Some((index, row)) = table.iter().enumerate().find(|(_, row)| row.len() != columns) {
        return Err(MediatorError::SchemaMismatch(format!(
            "{what}: row {index} has {} columns, expected {columns}",
            row.len()
        )));
    }
    Ok(())
}

/// Pick `columns` (by index, repeats allowed) out of every row.
pub(crate) fn project(table: &Table, columns: &[usize]) -> Table {
    table
        .iter()
        .map(|row| columns.iter().map(|&i| row[i].clone()).collect())
        .collect()
}
