use serde::{Deserialize, Serialize};

use super::model::{CellValue, Table};

// ---------------------------------------------------------------------------
// Column type classification
// ---------------------------------------------------------------------------

/// Inferred column type, resolved once per load and stable for the life of
/// the loaded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Column name plus its inferred type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
}

/// Classify every column of the table.
///
/// A column is `Numeric` iff every non-null cell is a number; anything else
/// makes it `Categorical`. A column of only nulls counts as numeric; the
/// filter builder then marks it non-filterable since it has no observed range.
pub fn classify_columns(table: &Table) -> Vec<ColumnDescriptor> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let numeric = table
                .column_values(idx)
                .all(|cell| matches!(cell, CellValue::Number(_) | CellValue::Null));
            ColumnDescriptor {
                name: name.clone(),
                kind: if numeric {
                    ColumnKind::Numeric
                } else {
                    ColumnKind::Categorical
                },
            }
        })
        .collect()
}
