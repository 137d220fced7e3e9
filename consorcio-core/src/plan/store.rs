use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{CatalogConfig, DEFAULT_STORAGE_KEY};

use super::codec::{self, ExportSink};
use super::comparison::{self, ComparisonTable};
use super::filter::{self, FilterCriteria};
use super::models::{Category, Plan, PlanDraft};
use super::selection::{SelectionChange, SelectionSet};
use super::storage::KeyValueStorage;
use super::{PlanError, PlanResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStoreOptions {
    pub storage_key: String,
    pub seed_when_empty: bool,
}

impl Default for PlanStoreOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            seed_when_empty: true,
        }
    }
}

impl From<&CatalogConfig> for PlanStoreOptions {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            storage_key: config.storage.storage_key.clone(),
            seed_when_empty: config.catalog.seed_when_empty,
        }
    }
}

/// Where the catalog came from when the store was opened.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LoadSource {
    Stored { plans: usize },
    Seeded { plans: usize },
    Empty,
    /// Stored state existed but was not a plan array; nothing was overwritten.
    Unreadable,
}

/// Outcome of an import that replaced the catalog.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub previous: usize,
    pub imported: usize,
}

/// The plan catalog: an ordered, persisted collection of plans plus the
/// comparison selection.
///
/// Every successful mutation writes the full collection back to storage under
/// the configured key.
#[derive(Debug)]
pub struct PlanStore<S> {
    storage: S,
    options: PlanStoreOptions,
    plans: Vec<Plan>,
    selection: SelectionSet,
    load_source: LoadSource,
}

impl<S: KeyValueStorage> PlanStore<S> {
    pub fn open(storage: S) -> PlanResult<Self> {
        Self::open_with(storage, PlanStoreOptions::default())
    }

    pub fn open_with(storage: S, options: PlanStoreOptions) -> PlanResult<Self> {
        let mut store = Self {
            storage,
            options,
            plans: Vec::new(),
            selection: SelectionSet::new(),
            load_source: LoadSource::Empty,
        };
        store.load_source = store.load()?;
        Ok(store)
    }

    fn load(&mut self) -> PlanResult<LoadSource> {
        match self.storage.get(&self.options.storage_key)? {
            Some(raw) => match codec::decode(&raw) {
                Ok(plans) => {
                    info!(plans = plans.len(), key = %self.options.storage_key, "catalog loaded");
                    self.plans = plans;
                    Ok(LoadSource::Stored {
                        plans: self.plans.len(),
                    })
                }
                Err(err) => {
                    warn!(
                        key = %self.options.storage_key,
                        error = %err,
                        "stored catalog unreadable, starting empty"
                    );
                    Ok(LoadSource::Unreadable)
                }
            },
            None if self.options.seed_when_empty => {
                self.plans = example_catalog(Utc::now());
                self.persist()?;
                info!(plans = self.plans.len(), "catalog seeded with examples");
                Ok(LoadSource::Seeded {
                    plans: self.plans.len(),
                })
            }
            None => Ok(LoadSource::Empty),
        }
    }

    fn persist(&mut self) -> PlanResult<()> {
        let payload = serde_json::to_string(&self.plans)?;
        self.storage.set(&self.options.storage_key, &payload)?;
        debug!(plans = self.plans.len(), bytes = payload.len(), "catalog persisted");
        Ok(())
    }

    pub fn load_source(&self) -> LoadSource {
        self.load_source
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn list(&self) -> &[Plan] {
        &self.plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn position(&self, id: &str) -> PlanResult<usize> {
        self.plans
            .iter()
            .position(|plan| plan.id == id)
            .ok_or_else(|| PlanError::NotFound {
                plan_id: id.to_string(),
            })
    }

    /// Validates the draft and prepends it as a new plan.
    pub fn create(&mut self, draft: PlanDraft) -> PlanResult<Plan> {
        let issues = draft.validate();
        if !issues.is_empty() {
            debug!(?issues, "plan draft rejected");
            return Err(PlanError::ValidationRejected { issues });
        }
        let id = codec::fresh_id(|candidate| self.contains(candidate));
        let plan = Plan::from_draft(id, draft, Utc::now());
        self.plans.insert(0, plan.clone());
        self.persist()?;
        info!(plan_id = %plan.id, administrator = %plan.administrator, "plan created");
        Ok(plan)
    }

    /// Replaces every field but the id, keeping the plan's position.
    pub fn update(&mut self, id: &str, draft: PlanDraft) -> PlanResult<Plan> {
        let index = self.position(id)?;
        let issues = draft.validate();
        if !issues.is_empty() {
            debug!(plan_id = %id, ?issues, "plan edit rejected");
            return Err(PlanError::ValidationRejected { issues });
        }
        let previous = self.plans[index].updated_at;
        let updated_at = monotonic_now(previous);
        let plan = Plan::from_draft(id, draft, updated_at);
        self.plans[index] = plan.clone();
        self.persist()?;
        info!(plan_id = %id, "plan updated");
        Ok(plan)
    }

    /// Removes the plan and evicts it from the selection. Unknown ids are a no-op.
    pub fn delete(&mut self, id: &str) -> PlanResult<bool> {
        let before = self.plans.len();
        self.plans.retain(|plan| plan.id != id);
        self.selection.remove(id);
        if self.plans.len() == before {
            debug!(plan_id = %id, "delete ignored, plan not found");
            return Ok(false);
        }
        self.persist()?;
        info!(plan_id = %id, "plan deleted");
        Ok(true)
    }

    /// Wholesale replacement of the catalog. Selected ids that no longer exist
    /// are dropped from the selection.
    pub fn replace_all(&mut self, mut plans: Vec<Plan>) -> PlanResult<()> {
        codec::ensure_unique_ids(&mut plans);
        self.plans = plans;
        let plans = &self.plans;
        self.selection.retain(|id| plans.iter().any(|plan| plan.id == id));
        self.persist()?;
        info!(plans = self.plans.len(), "catalog replaced");
        Ok(())
    }

    /// Parses an exchange document and replaces the catalog with it. On any
    /// format error the catalog is left untouched.
    pub fn import(&mut self, raw: &str) -> PlanResult<ImportSummary> {
        let plans = codec::decode(raw).map_err(|err| {
            warn!(error = %err, "import rejected");
            err
        })?;
        let summary = ImportSummary {
            previous: self.plans.len(),
            imported: plans.len(),
        };
        self.replace_all(plans)?;
        info!(previous = summary.previous, imported = summary.imported, "catalog imported");
        Ok(summary)
    }

    pub async fn import_file(&mut self, path: impl AsRef<Path>) -> PlanResult<ImportSummary> {
        let raw = codec::read_import_file(path.as_ref()).await?;
        self.import(&raw)
    }

    /// Full catalog as a pretty-printed exchange document.
    pub fn export_document(&self) -> PlanResult<String> {
        codec::encode(&self.plans)
    }

    pub fn export_to<K: ExportSink>(&self, sink: &mut K, date: NaiveDate) -> PlanResult<PathBuf> {
        let document = self.export_document()?;
        let filename = codec::export_filename(date);
        let path = sink.deliver(document.as_bytes(), &filename)?;
        info!(plans = self.plans.len(), path = %path.display(), "catalog exported");
        Ok(path)
    }

    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<&Plan> {
        filter::apply(&self.plans, criteria)
    }

    pub fn administrators(&self) -> Vec<String> {
        filter::available_administrators(&self.plans)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Toggles a catalog plan in or out of the comparison selection.
    pub fn toggle_selection(&mut self, id: &str) -> PlanResult<SelectionChange> {
        if !self.contains(id) {
            return Err(PlanError::NotFound {
                plan_id: id.to_string(),
            });
        }
        let change = self.selection.toggle(id);
        if change == SelectionChange::Ignored {
            debug!(plan_id = %id, "selection full, toggle ignored");
        }
        Ok(change)
    }

    /// Selected plans in selection order.
    pub fn selected_plans(&self) -> Vec<&Plan> {
        self.selection
            .ids()
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    pub fn compare(&self) -> ComparisonTable {
        comparison::project(self.selected_plans())
    }
}

fn monotonic_now(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

/// The four example plans a fresh catalog starts with.
pub fn example_catalog(now: DateTime<Utc>) -> Vec<Plan> {
    #[rustfmt::skip]
    let examples = [
        ("Rodobens", Category::Automobile, 60_000.0, 980.0, 72, 16.0, 25.0, "A123", "Plano popular"),
        ("Porto Seguro", Category::Automobile, 100_000.0, 1_620.0, 84, 17.0, 30.0, "PS-09", "Carta alta flex"),
        ("Porto Seguro", Category::RealEstate, 300_000.0, 2_850.0, 200, 18.0, 35.0, "IM-22", "Residencial"),
        ("Rodobens", Category::Motorcycle, 22_000.0, 420.0, 60, 15.0, 18.0, "M-7", "Entry"),
    ];
    let mut plans: Vec<Plan> = Vec::with_capacity(examples.len());
    for (administrator, category, credit, installment, term, fee, bid, group, notes) in examples {
        let id = codec::fresh_id(|candidate| plans.iter().any(|plan| plan.id == candidate));
        let draft = PlanDraft {
            administrator: administrator.to_string(),
            category,
            credit_value: credit,
            installment_value: installment,
            term_months: term,
            admin_fee_percent: fee,
            average_bid_percent: bid,
            group: Some(group.to_string()),
            notes: Some(notes.to_string()),
        };
        plans.push(Plan::from_draft(id, draft, now));
    }
    plans
}
