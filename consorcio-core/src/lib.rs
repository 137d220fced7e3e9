pub mod config;
pub mod error;
pub mod plan;

pub use config::{load_catalog_config, CatalogConfig, DEFAULT_STORAGE_KEY};
pub use error::{ConfigError, Result};
pub use plan::{
    estimate_bid, example_catalog, Category, ComparisonField, ComparisonTable, ComparisonValue,
    DirectorySink, DraftIssue, ExportSink, FilterCriteria, FormatError, ImportSummary,
    KeyValueStorage, LoadSource, MemoryKeyValueStore, Plan, PlanDraft, PlanError, PlanResult,
    PlanStore, PlanStoreOptions, SelectionChange, SelectionSet, SqliteKeyValueStore,
    SqliteKeyValueStoreBuilder, SELECTION_CAPACITY,
};
