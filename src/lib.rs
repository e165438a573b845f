//! Filter core for website/backlink spreadsheets.
//!
//! Load a CSV or XLSX upload into an in-memory [`Table`], classify each
//! column as numeric or categorical, build a default [`FilterSet`] that
//! matches everything, narrow it with range / category / search predicates,
//! evaluate the conjunction over rows, and export the filtered view as a
//! single-sheet XLSX workbook.
//!
//! The rendering layer is the caller's business: a UI translates each
//! control's value into a predicate, submits the filter set to the pure
//! [`evaluate`] function, and rerenders from its return value. [`Session`]
//! bundles that lifecycle for the common one-upload-at-a-time case.

pub mod data;
pub mod error;
pub mod session;

pub use data::classify::{classify_columns, ColumnDescriptor, ColumnKind};
pub use data::export::{export_filename, export_xlsx, XLSX_MIME};
pub use data::filter::{
    evaluate, evaluate_indices, Advisory, ColumnDomain, ColumnFilter, FilterSet, SearchFilter,
};
pub use data::loader::{load_named, load_table, TableFormat};
pub use data::model::{CellValue, Table};
pub use error::SiftError;
pub use session::Session;
