use std::collections::BTreeSet;

use crate::data::classify::{classify_columns, ColumnDescriptor};
use crate::data::export::{export_filename, export_xlsx};
use crate::data::filter::{evaluate, evaluate_indices, FilterSet};
use crate::data::loader::load_named;
use crate::data::model::{CellValue, Table};
use crate::error::SiftError;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One interactive session: a single loaded table and its filter set,
/// independent of any rendering layer.
///
/// Single-threaded and synchronous. A new upload replaces everything; a
/// rejected predicate leaves the previously valid filter set in effect.
#[derive(Debug, Default)]
pub struct Session {
    /// Loaded dataset (None until the user uploads a file).
    table: Option<Table>,

    /// Name of the uploaded file, kept for the export filename.
    source_name: String,

    /// Per-column types, derived once per load.
    descriptors: Vec<ColumnDescriptor>,

    /// Active predicates for the current table.
    filters: FilterSet,

    /// Row indices passing the current filters (cached).
    visible_indices: Vec<usize>,
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }

    /// Ingest an uploaded file: parse, classify, rebuild default filters.
    /// On failure the previous session state is left untouched.
    pub fn load(&mut self, bytes: &[u8], name: &str) -> Result<(), SiftError> {
        let table = load_named(bytes, name)?;
        self.descriptors = classify_columns(&table);
        self.filters = FilterSet::defaults(&table, &self.descriptors);
        self.visible_indices = (0..table.len()).collect();
        self.source_name = name.to_string();
        self.table = Some(table);
        Ok(())
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.descriptors
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Narrow a numeric column, then refilter.
    pub fn set_range_filter(&mut self, column: &str, min: f64, max: f64) -> Result<(), SiftError> {
        self.filters.set_range(column, min, max)?;
        self.refilter();
        Ok(())
    }

    /// Narrow a categorical column, then refilter.
    pub fn set_category_filter(
        &mut self,
        column: &str,
        allowed: BTreeSet<CellValue>,
    ) -> Result<(), SiftError> {
        self.filters.set_allowed(column, allowed)?;
        self.refilter();
        Ok(())
    }

    /// Set or clear the free-text search, then refilter.
    pub fn set_search(&mut self, columns: Vec<String>, term: &str) {
        self.filters.set_search(columns, term);
        self.refilter();
    }

    /// Drop all narrowing and go back to the defaults for the current table.
    pub fn reset_filters(&mut self) {
        if let Some(table) = &self.table {
            self.filters = FilterSet::defaults(table, &self.descriptors);
            self.visible_indices = (0..table.len()).collect();
        }
    }

    /// Recompute the visible row cache after a filter change.
    fn refilter(&mut self) {
        if let Some(table) = &self.table {
            self.visible_indices = evaluate_indices(table, &self.filters);
        }
    }

    /// Source row indices passing the current filters.
    pub fn visible_indices(&self) -> &[usize] {
        &self.visible_indices
    }

    /// Materialize the current filtered view. Transient: derived from the
    /// table and filter set, never stored.
    pub fn filtered_table(&self) -> Option<Table> {
        self.table.as_ref().map(|t| evaluate(t, &self.filters))
    }

    /// Encode the current filtered view for download, with its filename.
    pub fn export(&self) -> Result<(String, Vec<u8>), SiftError> {
        let Some(filtered) = self.filtered_table() else {
            return Err(SiftError::Serialization("no table loaded".to_string()));
        };
        let bytes = export_xlsx(&filtered)?;
        Ok((export_filename(&self.source_name), bytes))
    }
}
