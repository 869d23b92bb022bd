/// Data layer: core types, loading, normalization, and aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .ods / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → RawTable (headers + cells)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  clean headers, rename, default categories,
///   └───────────┘  Gasto_Total, Fecha_Instalacion → Año
///        │
///        ▼
///   ┌────────────────────┐
///   │ MaintenanceDataset │  immutable Vec<MaintenanceRecord>
///   └────────────────────┘
///        │
///        ▼
///   ┌─────────────────┐
///   │ filter / stats   │  equipment rows, category totals, top-N, per year
///   └─────────────────┘
/// ```
///
/// `cache` memoizes loads per path and modification time.

pub mod cache;
pub mod error;
pub mod filter;
pub mod header;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod stats;
