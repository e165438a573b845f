use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::classify::{ColumnDescriptor, ColumnKind};
use super::model::{CellValue, Table};
use crate::error::SiftError;

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Per-column predicate. At most one per column; which variant a column can
/// carry is fixed by its [`ColumnKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnFilter {
    /// Keep rows where `min <= value <= max`, inclusive on both ends.
    Range { min: f64, max: f64 },
    /// Keep rows whose value is in the allowed set.
    Set { allowed: BTreeSet<CellValue> },
}

/// Observed bounds of a column, captured when defaults are built. Setters
/// validate narrowing against this; the UI also reads it for slider bounds
/// and multi-select options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnDomain {
    Numeric { min: f64, max: f64 },
    Categorical { values: BTreeSet<CellValue> },
}

/// Free-text search across one or more columns. An empty `columns` list
/// means "search every column" (the whole-row fuzzy mode). The term is
/// matched as literal text, case-insensitively, never as a pattern, so
/// terms like `Dubai (UAE)` behave as typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub columns: Vec<String>,
    pub term: String,
}

/// Notice that a column is exempt from filtering (not an error): a numeric
/// column with a single distinct value, or a column with no observed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub column: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// FilterSet
// ---------------------------------------------------------------------------

/// The complete collection of active predicates for one loaded table.
///
/// Built from a table via [`FilterSet::defaults`] (where every predicate
/// matches everything), then narrowed in place through the setters. Rebuilt
/// from scratch when the table is reloaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    filters: BTreeMap<String, ColumnFilter>,
    domains: BTreeMap<String, ColumnDomain>,
    search: Option<SearchFilter>,
    advisories: Vec<Advisory>,
}

impl FilterSet {
    /// Build the default filter set: full observed range per numeric column,
    /// full distinct value set per categorical column. Degenerate columns
    /// (single distinct numeric value, or nothing observed at all) get no
    /// predicate and are reported as advisories.
    pub fn defaults(table: &Table, descriptors: &[ColumnDescriptor]) -> FilterSet {
        let mut set = FilterSet::default();

        for desc in descriptors {
            let Some(idx) = table.column_index(&desc.name) else {
                continue;
            };
            match desc.kind {
                ColumnKind::Numeric => {
                    let mut observed = table.column_values(idx).filter_map(CellValue::as_f64);
                    let Some(first) = observed.next() else {
                        set.advise(&desc.name, "no observed values");
                        continue;
                    };
                    let (min, max) = observed.fold((first, first), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                    if min == max {
                        set.advise(&desc.name, "single distinct value, range filter exempt");
                        continue;
                    }
                    set.domains
                        .insert(desc.name.clone(), ColumnDomain::Numeric { min, max });
                    set.filters
                        .insert(desc.name.clone(), ColumnFilter::Range { min, max });
                }
                ColumnKind::Categorical => {
                    let values: BTreeSet<CellValue> = table
                        .column_values(idx)
                        .filter(|cell| !cell.is_null())
                        .cloned()
                        .collect();
                    if values.is_empty() {
                        set.advise(&desc.name, "no observed values");
                        continue;
                    }
                    set.domains.insert(
                        desc.name.clone(),
                        ColumnDomain::Categorical {
                            values: values.clone(),
                        },
                    );
                    set.filters
                        .insert(desc.name.clone(), ColumnFilter::Set { allowed: values });
                }
            }
        }
        set
    }

    fn advise(&mut self, column: &str, reason: &str) {
        self.advisories.push(Advisory {
            column: column.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Narrow a numeric column to `[min, max]`. Rejects unknown or
    /// non-range-filterable columns, inverted bounds, and bounds outside the
    /// observed domain.
    pub fn set_range(&mut self, column: &str, min: f64, max: f64) -> Result<(), SiftError> {
        let Some(ColumnDomain::Numeric {
            min: dom_min,
            max: dom_max,
        }) = self.domains.get(column)
        else {
            return Err(SiftError::invalid_predicate(
                column,
                "not a range-filterable column",
            ));
        };
        if min > max {
            return Err(SiftError::invalid_predicate(
                column,
                format!("min {min} is greater than max {max}"),
            ));
        }
        if min < *dom_min || max > *dom_max {
            return Err(SiftError::invalid_predicate(
                column,
                format!("[{min}, {max}] is outside the observed range [{dom_min}, {dom_max}]"),
            ));
        }
        self.filters
            .insert(column.to_string(), ColumnFilter::Range { min, max });
        Ok(())
    }

    /// Narrow a categorical column to the given allowed values. Every value
    /// must be one the column actually contains. An empty set is allowed and
    /// matches nothing.
    pub fn set_allowed(
        &mut self,
        column: &str,
        allowed: BTreeSet<CellValue>,
    ) -> Result<(), SiftError> {
        let Some(ColumnDomain::Categorical { values }) = self.domains.get(column) else {
            return Err(SiftError::invalid_predicate(
                column,
                "not a set-filterable column",
            ));
        };
        if let Some(outsider) = allowed.iter().find(|v| !values.contains(*v)) {
            return Err(SiftError::invalid_predicate(
                column,
                format!("value '{outsider}' is not in the column's observed values"),
            ));
        }
        self.filters
            .insert(column.to_string(), ColumnFilter::Set { allowed });
        Ok(())
    }

    /// Set or clear the free-text search. A blank term clears it; an empty
    /// column list targets every column.
    pub fn set_search(&mut self, columns: Vec<String>, term: &str) {
        let term = term.trim();
        self.search = if term.is_empty() {
            None
        } else {
            Some(SearchFilter {
                columns,
                term: term.to_string(),
            })
        };
    }

    pub fn search(&self) -> Option<&SearchFilter> {
        self.search.as_ref()
    }

    /// The active predicate for a column, if it carries one.
    pub fn filter_for(&self, column: &str) -> Option<&ColumnFilter> {
        self.filters.get(column)
    }

    /// Observed bounds/value set for a column (slider limits, select options).
    pub fn domain(&self, column: &str) -> Option<&ColumnDomain> {
        self.domains.get(column)
    }

    /// Columns exempt from filtering, surfaced when defaults were built.
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Whether a column's predicate actually narrows anything. A predicate
    /// still at its full observed domain is a no-op and is skipped during
    /// evaluation, so rows with missing values in that column survive it.
    fn is_active(&self, column: &str, filter: &ColumnFilter) -> bool {
        match (filter, self.domains.get(column)) {
            (ColumnFilter::Range { min, max }, Some(ColumnDomain::Numeric { min: d0, max: d1 })) => {
                min > d0 || max < d1
            }
            (ColumnFilter::Set { allowed }, Some(ColumnDomain::Categorical { values })) => {
                allowed != values
            }
            // No recorded domain: treat as active and let the predicate decide.
            _ => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Apply a filter set to a table, producing the filtered view.
///
/// A row is retained iff every active predicate passes (logical AND) and the
/// search, if present, matches at least one of its target columns. Rows are
/// only ever subset: order is preserved and nothing is duplicated. The
/// result is a transient derived table; the input is untouched.
pub fn evaluate(table: &Table, filters: &FilterSet) -> Table {
    let rows = evaluate_indices(table, filters)
        .into_iter()
        .map(|i| table.rows[i].clone())
        .collect();

    Table {
        headers: table.headers.clone(),
        rows,
    }
}

/// Indices of the rows passing all active filters, in source order.
pub fn evaluate_indices(table: &Table, filters: &FilterSet) -> Vec<usize> {
    // Resolve column names to indices once, not per row.
    let active: Vec<(usize, &ColumnFilter)> = filters
        .filters
        .iter()
        .filter(|(col, f)| filters.is_active(col, f))
        .filter_map(|(col, f)| table.column_index(col).map(|idx| (idx, f)))
        .collect();

    let search = filters.search.as_ref().map(|s| {
        let indices: Vec<usize> = if s.columns.is_empty() {
            (0..table.headers.len()).collect()
        } else {
            s.columns
                .iter()
                .filter_map(|c| table.column_index(c))
                .collect()
        };
        (indices, s.term.to_lowercase())
    });

    let kept: Vec<usize> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            for (idx, filter) in &active {
                if !cell_passes(&row[*idx], filter) {
                    return false;
                }
            }
            match &search {
                Some((indices, term)) => indices
                    .iter()
                    .any(|idx| row[*idx].to_string().to_lowercase().contains(term.as_str())),
                None => true,
            }
        })
        .map(|(i, _)| i)
        .collect();

    log::debug!("filter pass kept {} of {} rows", kept.len(), table.len());
    kept
}

fn cell_passes(cell: &CellValue, filter: &ColumnFilter) -> bool {
    match filter {
        ColumnFilter::Range { min, max } => match cell.as_f64() {
            Some(v) => *min <= v && v <= *max,
            None => false,
        },
        ColumnFilter::Set { allowed } => allowed.contains(cell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::classify::classify_columns;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    fn num(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    /// The Country/Traffic table from the design notes.
    fn sample_table() -> Table {
        Table::new(
            vec!["Country".into(), "Traffic".into()],
            vec![
                vec![text("USA"), num(100.0)],
                vec![text("India"), num(5000.0)],
                vec![text("USA"), num(50.0)],
            ],
        )
        .unwrap()
    }

    fn defaults_for(table: &Table) -> FilterSet {
        FilterSet::defaults(table, &classify_columns(table))
    }

    #[test]
    fn default_filters_match_every_row() {
        let table = sample_table();
        let filters = defaults_for(&table);
        assert_eq!(evaluate(&table, &filters), table);
    }

    #[test]
    fn range_and_set_conjunction() {
        let table = sample_table();
        let mut filters = defaults_for(&table);
        filters.set_range("Traffic", 60.0, 5000.0).unwrap();
        filters
            .set_allowed("Country", [text("USA")].into_iter().collect())
            .unwrap();

        let result = evaluate(&table, &filters);
        assert_eq!(result.rows, vec![vec![text("USA"), num(100.0)]]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let table = sample_table();
        let mut filters = defaults_for(&table);
        filters.set_range("Traffic", 100.0, 5000.0).unwrap();

        let result = evaluate(&table, &filters);
        // 100 sits exactly on min and must be retained.
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[0][1], num(100.0));
    }

    #[test]
    fn search_is_case_insensitive() {
        let table = sample_table();
        let mut filters = defaults_for(&table);
        filters.set_search(vec!["Country".into()], "ind");

        let result = evaluate(&table, &filters);
        assert_eq!(result.rows, vec![vec![text("India"), num(5000.0)]]);
    }

    #[test]
    fn search_term_with_parentheses_matches_literally() {
        let table = Table::new(
            vec!["Geo".into()],
            vec![vec![text("Dubai (UAE)")], vec![text("Dubai")], vec![text("UAE")]],
        )
        .unwrap();
        let mut filters = defaults_for(&table);
        filters.set_search(vec![], "dubai (uae)");

        let result = evaluate(&table, &filters);
        assert_eq!(result.rows, vec![vec![text("Dubai (UAE)")]]);
    }

    #[test]
    fn search_across_all_columns_when_none_named() {
        let table = sample_table();
        let mut filters = defaults_for(&table);
        filters.set_search(vec![], "5000");

        let result = evaluate(&table, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0][0], text("India"));
    }

    #[test]
    fn evaluation_preserves_row_order() {
        let table = sample_table();
        let mut filters = defaults_for(&table);
        filters
            .set_allowed("Country", [text("USA")].into_iter().collect())
            .unwrap();

        let result = evaluate(&table, &filters);
        assert_eq!(
            result.rows,
            vec![vec![text("USA"), num(100.0)], vec![text("USA"), num(50.0)]]
        );
    }

    #[test]
    fn evaluation_is_idempotent() {
        let table = sample_table();
        let mut filters = defaults_for(&table);
        filters.set_range("Traffic", 50.0, 100.0).unwrap();

        let once = evaluate(&table, &filters);
        let twice = evaluate(&once, &filters);
        assert_eq!(once, twice);
    }

    #[test]
    fn single_distinct_numeric_column_is_exempt() {
        let table = Table::new(
            vec!["Score".into(), "Site".into()],
            vec![
                vec![num(7.0), text("a.com")],
                vec![CellValue::Null, text("b.com")],
                vec![num(7.0), text("c.com")],
            ],
        )
        .unwrap();
        let filters = defaults_for(&table);

        // Exempt column: advisory raised, no predicate, nothing excluded.
        assert!(filters.advisories().iter().any(|a| a.column == "Score"));
        assert!(filters.filter_for("Score").is_none());
        assert_eq!(evaluate(&table, &filters).len(), 3);
    }

    #[test]
    fn narrowed_range_drops_rows_with_missing_values() {
        let table = Table::new(
            vec!["Traffic".into()],
            vec![vec![num(10.0)], vec![CellValue::Null], vec![num(90.0)]],
        )
        .unwrap();
        let mut filters = defaults_for(&table);

        // Default = identity, nulls included.
        assert_eq!(evaluate(&table, &filters).len(), 3);

        filters.set_range("Traffic", 10.0, 50.0).unwrap();
        let result = evaluate(&table, &filters);
        assert_eq!(result.rows, vec![vec![num(10.0)]]);
    }

    #[test]
    fn invalid_predicates_are_rejected() {
        let table = sample_table();
        let mut filters = defaults_for(&table);

        // min > max
        assert!(matches!(
            filters.set_range("Traffic", 200.0, 100.0),
            Err(SiftError::InvalidPredicate { .. })
        ));
        // outside observed domain
        assert!(matches!(
            filters.set_range("Traffic", 0.0, 5000.0),
            Err(SiftError::InvalidPredicate { .. })
        ));
        // range on a categorical column
        assert!(matches!(
            filters.set_range("Country", 0.0, 1.0),
            Err(SiftError::InvalidPredicate { .. })
        ));
        // unknown value for a set filter
        assert!(matches!(
            filters.set_allowed("Country", [text("Atlantis")].into_iter().collect()),
            Err(SiftError::InvalidPredicate { .. })
        ));
        // unknown column
        assert!(matches!(
            filters.set_range("Nope", 0.0, 1.0),
            Err(SiftError::InvalidPredicate { .. })
        ));

        // Rejections leave the previously valid set intact.
        assert_eq!(evaluate(&table, &filters), table);
    }

    #[test]
    fn empty_allowed_set_matches_nothing() {
        let table = sample_table();
        let mut filters = defaults_for(&table);
        filters.set_allowed("Country", BTreeSet::new()).unwrap();
        assert!(evaluate(&table, &filters).is_empty());
    }

    #[test]
    fn blank_search_term_clears_the_search() {
        let table = sample_table();
        let mut filters = defaults_for(&table);
        filters.set_search(vec![], "usa");
        assert_eq!(evaluate(&table, &filters).len(), 2);

        filters.set_search(vec![], "   ");
        assert_eq!(evaluate(&table, &filters), table);
    }
}
