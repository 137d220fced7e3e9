pub mod exchange;
pub mod lance;
pub mod plan;
pub mod search;

pub use exchange::{ExportArgs, ImportArgs};
pub use lance::{CompletionsArgs, LanceArgs};
pub use plan::{CategoryArg, DeleteArgs, EditArgs, PlanFieldArgs, PlanIdArgs};
pub use search::{CompareArgs, SearchArgs};
