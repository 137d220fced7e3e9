use std::path::PathBuf;

use thiserror::Error;

use super::codec::FormatError;
use super::models::DraftIssue;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("plan {plan_id} not found")]
    NotFound { plan_id: String },
    #[error("plan rejected: {}", join_issues(.issues))]
    ValidationRejected { issues: Vec<DraftIssue> },
    #[error("import failed: {0}")]
    Format(#[from] FormatError),
    #[error("storage path not configured")]
    MissingStore,
    #[error("failed to open database at {path}: {source}")]
    OpenDatabase {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[error("failed to write export {path}: {source}")]
    Export {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn join_issues(issues: &[DraftIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;
