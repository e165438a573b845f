/// Data layer: core types, loading, classification, filtering, and export.
///
/// Architecture:
/// ```text
///  .csv / .xlsx
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ classify  │  Table → numeric | categorical per column
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  build defaults, narrow, evaluate → filtered Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  filtered Table → single-sheet XLSX bytes
///   └──────────┘
/// ```

pub mod classify;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
