pub mod codec;
pub mod comparison;
pub mod error;
pub mod filter;
pub mod models;
pub mod selection;
pub mod storage;
pub mod store;

pub use codec::{DirectorySink, ExportSink, FormatError};
pub use comparison::{
    estimate_bid, ComparisonColumn, ComparisonField, ComparisonRow, ComparisonTable,
    ComparisonValue,
};
pub use error::{PlanError, PlanResult};
pub use filter::FilterCriteria;
pub use models::{Category, DraftIssue, Plan, PlanDraft};
pub use selection::{SelectionChange, SelectionSet, SELECTION_CAPACITY};
pub use storage::{
    KeyValueStorage, MemoryKeyValueStore, SqliteKeyValueStore, SqliteKeyValueStoreBuilder,
};
pub use store::{example_catalog, ImportSummary, LoadSource, PlanStore, PlanStoreOptions};
