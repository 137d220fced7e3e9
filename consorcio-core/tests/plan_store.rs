use consorcio_core::{
    Category, FilterCriteria, KeyValueStorage, LoadSource, MemoryKeyValueStore, PlanDraft,
    PlanError, PlanStore, PlanStoreOptions, SelectionChange, SqliteKeyValueStore,
    DEFAULT_STORAGE_KEY,
};
use tempfile::TempDir;

fn memory_store() -> PlanStore<MemoryKeyValueStore> {
    PlanStore::open(MemoryKeyValueStore::new()).unwrap()
}

fn empty_store() -> PlanStore<MemoryKeyValueStore> {
    PlanStore::open_with(
        MemoryKeyValueStore::new(),
        PlanStoreOptions {
            seed_when_empty: false,
            ..PlanStoreOptions::default()
        },
    )
    .unwrap()
}

fn draft(administrator: &str, credit: f64) -> PlanDraft {
    PlanDraft {
        credit_value: credit,
        installment_value: 500.0,
        term_months: 48,
        group: Some("G-1".into()),
        ..PlanDraft::new(administrator, Category::Services)
    }
}

#[test]
fn fresh_storage_is_seeded_and_persisted() {
    let store = memory_store();
    assert_eq!(store.load_source(), LoadSource::Seeded { plans: 4 });

    let summary: Vec<(&str, Category, f64)> = store
        .list()
        .iter()
        .map(|plan| (plan.administrator.as_str(), plan.category, plan.credit_value))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Rodobens", Category::Automobile, 60_000.0),
            ("Porto Seguro", Category::Automobile, 100_000.0),
            ("Porto Seguro", Category::RealEstate, 300_000.0),
            ("Rodobens", Category::Motorcycle, 22_000.0),
        ]
    );
    assert_eq!(store.storage().writes(), 1);
    assert!(store.storage().get(DEFAULT_STORAGE_KEY).unwrap().is_some());
}

#[test]
fn seed_category_filter_keeps_order() {
    let store = memory_store();
    let automobiles = store.filter(&FilterCriteria::new().category(Category::Automobile));
    let ids: Vec<&str> = automobiles.iter().map(|plan| plan.id.as_str()).collect();
    let expected: Vec<&str> = store.list()[..2].iter().map(|plan| plan.id.as_str()).collect();
    assert_eq!(ids, expected);
}

#[test]
fn search_finds_portuguese_category_labels() {
    let store = memory_store();
    let real_estate = store.filter(&FilterCriteria::new().search("imóvel"));
    assert_eq!(real_estate.len(), 1);
    assert_eq!(real_estate[0].category, Category::RealEstate);

    let automobiles = store.filter(&FilterCriteria::new().search("automóvel"));
    assert_eq!(automobiles.len(), 2);
    assert!(automobiles
        .iter()
        .all(|plan| plan.category == Category::Automobile));
}

#[test]
fn create_prepends_with_fresh_id() {
    let mut store = memory_store();
    let existing: Vec<String> = store.list().iter().map(|plan| plan.id.clone()).collect();

    let created = store.create(draft("Embracon", 45_000.0)).unwrap();
    let first = &store.list()[0];
    assert_eq!(first, &created);
    assert_eq!(first.administrator, "Embracon");
    assert_eq!(first.category, Category::Services);
    assert_eq!(first.credit_value, 45_000.0);
    assert_eq!(first.group.as_deref(), Some("G-1"));
    assert!(!existing.contains(&first.id));
    assert_eq!(store.len(), 5);
    assert_eq!(store.storage().writes(), 2);
}

#[test]
fn invalid_draft_is_rejected_without_side_effects() {
    let mut store = memory_store();
    let before = store.list().to_vec();
    let writes = store.storage().writes();

    let err = store
        .create(PlanDraft {
            term_months: 0,
            ..draft("", 0.0)
        })
        .unwrap_err();
    match err {
        PlanError::ValidationRejected { issues } => {
            let fields: Vec<&str> = issues.iter().map(|issue| issue.field()).collect();
            assert_eq!(fields, vec!["administrator", "creditValue", "termMonths"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.list(), before.as_slice());
    assert_eq!(store.storage().writes(), writes);
}

#[test]
fn update_keeps_id_and_position() {
    let mut store = memory_store();
    let target = store.list()[2].clone();

    let updated = store
        .update(&target.id, draft("Porto Seguro Imóveis", 320_000.0))
        .unwrap();
    assert_eq!(updated.id, target.id);
    assert_eq!(store.list()[2], updated);
    assert_eq!(store.list()[2].credit_value, 320_000.0);
    assert_eq!(store.list()[2].notes, None);
    assert!(updated.updated_at >= target.updated_at);
    assert_eq!(store.len(), 4);
}

#[test]
fn update_requires_existing_id_and_valid_draft() {
    let mut store = memory_store();
    assert!(matches!(
        store.update("missing", draft("X", 1.0)),
        Err(PlanError::NotFound { .. })
    ));

    let id = store.list()[0].id.clone();
    let before = store.list()[0].clone();
    assert!(matches!(
        store.update(&id, draft("X", -5.0)),
        Err(PlanError::ValidationRejected { .. })
    ));
    assert_eq!(store.list()[0], before);
}

#[test]
fn delete_removes_plan_and_selection() {
    let mut store = memory_store();
    let id = store.list()[1].id.clone();
    assert_eq!(store.toggle_selection(&id).unwrap(), SelectionChange::Added);

    assert!(store.delete(&id).unwrap());
    assert!(store.get(&id).is_none());
    assert!(!store.selection().contains(&id));

    let writes = store.storage().writes();
    assert!(!store.delete(&id).unwrap());
    assert_eq!(store.storage().writes(), writes);
    assert_eq!(store.len(), 3);
}

#[test]
fn selection_caps_at_four_and_rejects_unknown_ids() {
    let mut store = memory_store();
    store.create(draft("Embracon", 45_000.0)).unwrap();
    let ids: Vec<String> = store.list().iter().map(|plan| plan.id.clone()).collect();
    assert_eq!(ids.len(), 5);

    for id in &ids[..4] {
        assert_eq!(store.toggle_selection(id).unwrap(), SelectionChange::Added);
    }
    assert_eq!(store.toggle_selection(&ids[4]).unwrap(), SelectionChange::Ignored);
    assert_eq!(store.selection().ids(), &ids[..4]);
    assert!(matches!(
        store.toggle_selection("nope"),
        Err(PlanError::NotFound { .. })
    ));
}

#[test]
fn comparison_uses_selection_order() {
    let mut store = memory_store();
    let ids: Vec<String> = store.list().iter().map(|plan| plan.id.clone()).collect();
    store.toggle_selection(&ids[3]).unwrap();
    store.toggle_selection(&ids[0]).unwrap();

    let table = store.compare();
    let columns: Vec<&str> = table.columns.iter().map(|c| c.plan_id.as_str()).collect();
    assert_eq!(columns, vec![ids[3].as_str(), ids[0].as_str()]);

    let bid = table
        .row(consorcio_core::ComparisonField::AverageBid)
        .unwrap();
    assert_eq!(
        bid.values[1],
        consorcio_core::ComparisonValue::Bid {
            percent: 25.0,
            amount: 15_000.0
        }
    );
}

#[test]
fn administrators_are_listed_once() {
    let store = memory_store();
    assert_eq!(
        store.administrators(),
        vec!["Porto Seguro".to_string(), "Rodobens".to_string()]
    );
}

#[test]
fn unreadable_state_starts_empty_without_overwriting() {
    let storage = MemoryKeyValueStore::with_entry(DEFAULT_STORAGE_KEY, "not json");
    let store = PlanStore::open(storage).unwrap();
    assert_eq!(store.load_source(), LoadSource::Unreadable);
    assert!(store.is_empty());
    assert_eq!(store.storage().writes(), 0);
    assert_eq!(
        store.storage().get(DEFAULT_STORAGE_KEY).unwrap().as_deref(),
        Some("not json")
    );
}

#[test]
fn seeding_can_be_disabled() {
    let store = empty_store();
    assert_eq!(store.load_source(), LoadSource::Empty);
    assert!(store.is_empty());
    assert_eq!(store.storage().writes(), 0);
}

#[test]
fn sqlite_catalog_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("consorcio.sqlite");
    let storage = SqliteKeyValueStore::builder()
        .path(&path)
        .create_if_missing(true)
        .build()
        .unwrap();
    storage.initialize().unwrap();

    let mut store = PlanStore::open(storage).unwrap();
    let created = store.create(draft("Embracon", 45_000.0)).unwrap();
    let snapshot = store.list().to_vec();
    drop(store);

    let reopened = PlanStore::open(SqliteKeyValueStore::new(&path).unwrap()).unwrap();
    assert_eq!(reopened.load_source(), LoadSource::Stored { plans: 5 });
    assert_eq!(reopened.list(), snapshot.as_slice());
    assert_eq!(reopened.list()[0].id, created.id);
}
