/// Data layer: core types, loading, filtering, aggregation and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Dataset (once per process)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset  │  Vec<Record>, column index, unique values
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  topic ∧ years ∧ locations → WorkingSubset (row indices)
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌───────────┐  ┌──────────┐
///   │ aggregate │  │  export  │  subset → CSV
///   └───────────┘  └──────────┘
/// ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
