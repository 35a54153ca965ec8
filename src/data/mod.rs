/// Data layer: core types, loading, and selection.
///
/// Architecture:
/// ```text
///  .csv / .txt  (written by the external programs)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → DataSeries / NumericTable / ResultTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  metric substring / function grouping → plot series
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
