//! Exchange format of the catalog: a JSON array of plan objects.
//!
//! Decoding is lenient. Each record goes through [`normalize_record`], which
//! coerces every field to its typed form instead of rejecting the document:
//! unknown categories fall back to [`Category::Automobile`], unreadable
//! numbers become zero and missing ids or timestamps are generated. Only a
//! document that is not a JSON array of objects is a [`FormatError`].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::models::{Category, Plan};
use super::{PlanError, PlanResult};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("expected a JSON array of plans, found {found}")]
    NotAnArray { found: &'static str },
    #[error("record {index} is not a JSON object (found {found})")]
    InvalidRecord { index: usize, found: &'static str },
}

/// Exchange field names paired with the Portuguese names written by older
/// versions of the catalog. When a record carries both, the first one wins.
const ADMINISTRATOR: [&str; 2] = ["administrator", "administradora"];
const CATEGORY: [&str; 2] = ["category", "tipo"];
const CREDIT_VALUE: [&str; 2] = ["creditValue", "valorCarta"];
const INSTALLMENT_VALUE: [&str; 2] = ["installmentValue", "valorParcela"];
const TERM_MONTHS: [&str; 2] = ["termMonths", "prazo"];
const ADMIN_FEE_PERCENT: [&str; 2] = ["adminFeePercent", "taxaAdm"];
const AVERAGE_BID_PERCENT: [&str; 2] = ["averageBidPercent", "mediaLance"];
const GROUP: [&str; 2] = ["group", "grupo"];
const NOTES: [&str; 2] = ["notes", "observacoes"];
const UPDATED_AT: [&str; 2] = ["updatedAt", "atualizadoEm"];

/// First non-null value among `keys`.
fn field<'a>(record: &'a Map<String, Value>, keys: [&str; 2]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

/// Serializes the whole catalog as a pretty-printed JSON array.
pub fn encode(plans: &[Plan]) -> PlanResult<String> {
    Ok(serde_json::to_string_pretty(plans)?)
}

/// Parses and normalizes an exchange document.
pub fn decode(raw: &str) -> Result<Vec<Plan>, FormatError> {
    decode_at(raw, Utc::now())
}

/// [`decode`] with an explicit clock, used for generated timestamps.
pub fn decode_at(raw: &str, now: DateTime<Utc>) -> Result<Vec<Plan>, FormatError> {
    let document: Value = serde_json::from_str(raw)?;
    let records = match document {
        Value::Array(records) => records,
        other => {
            return Err(FormatError::NotAnArray {
                found: json_kind(&other),
            })
        }
    };

    let mut plans = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| normalize_record(index, record, now))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique_ids(&mut plans);
    Ok(plans)
}

/// Gives a fresh id to every plan whose id already appeared earlier in the slice.
pub fn ensure_unique_ids(plans: &mut [Plan]) {
    let mut seen = HashSet::with_capacity(plans.len());
    for (index, plan) in plans.iter_mut().enumerate() {
        if !seen.insert(plan.id.clone()) {
            let fresh = fresh_id(|candidate| seen.contains(candidate));
            warn!(index, duplicate = %plan.id, id = %fresh, "duplicate plan id regenerated");
            plan.id = fresh;
            seen.insert(plan.id.clone());
        }
    }
}

/// Coerces one untyped record into a [`Plan`].
pub fn normalize_record(
    index: usize,
    record: Value,
    now: DateTime<Utc>,
) -> Result<Plan, FormatError> {
    let record = match record {
        Value::Object(record) => record,
        other => {
            return Err(FormatError::InvalidRecord {
                index,
                found: json_kind(&other),
            })
        }
    };

    let id = record
        .get("id")
        .and_then(coerce_id)
        .unwrap_or_else(|| fresh_id(|_| false));
    let category = match field(&record, CATEGORY) {
        Some(Value::String(label)) => label.parse().unwrap_or_else(|_| {
            warn!(index, category = %label, "unknown category, using default");
            Category::default()
        }),
        _ => Category::default(),
    };
    let updated_at = match field(&record, UPDATED_AT) {
        Some(Value::String(text)) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|err| {
                warn!(index, updated_at = %text, error = %err, "unreadable timestamp");
                now
            }),
        _ => now,
    };

    Ok(Plan {
        id,
        administrator: field(&record, ADMINISTRATOR)
            .map(coerce_text)
            .unwrap_or_default(),
        category,
        credit_value: coerce_amount(field(&record, CREDIT_VALUE)),
        installment_value: coerce_amount(field(&record, INSTALLMENT_VALUE)),
        term_months: coerce_amount(field(&record, TERM_MONTHS)).min(f64::from(u32::MAX)) as u32,
        admin_fee_percent: coerce_amount(field(&record, ADMIN_FEE_PERCENT)),
        average_bid_percent: coerce_amount(field(&record, AVERAGE_BID_PERCENT)),
        group: coerce_optional_text(field(&record, GROUP)),
        notes: coerce_optional_text(field(&record, NOTES)),
        updated_at,
    })
}

fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Numeric coercion: numbers as-is, numeric strings parsed, booleans as 1/0.
/// Anything else, and any negative or non-finite result, is zero.
fn coerce_amount(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                0.0
            } else {
                text.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(flag)) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };
    if number.is_finite() && number > 0.0 {
        number
    } else {
        0.0
    }
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

/// Optional text is kept only when the source value is truthy.
fn coerce_optional_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Short random id that `taken` does not reject.
pub fn fresh_id<F>(taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    loop {
        let candidate = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        if !taken(&candidate) {
            return candidate;
        }
    }
}

/// `planos-consorcio-<YYYY-MM-DD>.json`
pub fn export_filename(date: NaiveDate) -> String {
    format!("planos-consorcio-{}.json", date.format("%Y-%m-%d"))
}

/// Delivers an exported document somewhere the user can pick it up.
pub trait ExportSink {
    fn deliver(&mut self, payload: &[u8], filename: &str) -> PlanResult<PathBuf>;
}

/// Writes exports into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&mut self, payload: &[u8], filename: &str) -> PlanResult<PathBuf> {
        let path = self.dir.join(filename);
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&path, payload))
            .map_err(|source| PlanError::Export {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Reads an import file without blocking the caller's runtime.
pub async fn read_import_file(path: impl AsRef<Path>) -> PlanResult<String> {
    Ok(tokio::fs::read_to_string(path.as_ref()).await?)
}
