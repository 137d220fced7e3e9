use chrono::NaiveDate;
use consorcio_core::{
    Category, DirectorySink, FormatError, ImportSummary, KeyValueStorage, MemoryKeyValueStore,
    PlanDraft, PlanError, PlanStore, PlanStoreOptions, DEFAULT_STORAGE_KEY,
};
use tempfile::TempDir;

fn seeded() -> PlanStore<MemoryKeyValueStore> {
    PlanStore::open(MemoryKeyValueStore::new()).unwrap()
}

fn empty() -> PlanStore<MemoryKeyValueStore> {
    PlanStore::open_with(
        MemoryKeyValueStore::new(),
        PlanStoreOptions {
            seed_when_empty: false,
            ..PlanStoreOptions::default()
        },
    )
    .unwrap()
}

#[test]
fn export_then_import_round_trips() {
    let mut source = seeded();
    source
        .create(PlanDraft {
            credit_value: 1_234.56,
            term_months: 12,
            installment_value: 0.0,
            ..PlanDraft::new("Ademicon", Category::Truck)
        })
        .unwrap();
    let document = source.export_document().unwrap();

    let mut target = empty();
    let summary = target.import(&document).unwrap();
    assert_eq!(
        summary,
        ImportSummary {
            previous: 0,
            imported: 5
        }
    );
    assert_eq!(target.list(), source.list());
}

#[test]
fn object_document_leaves_store_unchanged() {
    let mut store = seeded();
    let before = store.list().to_vec();
    let writes = store.storage().writes();

    let err = store.import(r#"{"a":1}"#).unwrap_err();
    assert!(matches!(
        err,
        PlanError::Format(FormatError::NotAnArray { .. })
    ));
    assert_eq!(store.list(), before.as_slice());
    assert_eq!(store.storage().writes(), writes);
}

#[test]
fn broken_json_leaves_store_unchanged() {
    let mut store = seeded();
    let before = store.list().to_vec();
    assert!(matches!(
        store.import("[{\"id\":"),
        Err(PlanError::Format(FormatError::Syntax(_)))
    ));
    assert_eq!(store.list(), before.as_slice());
}

#[test]
fn record_with_both_field_names_is_imported() {
    let mut store = seeded();
    let summary = store
        .import(
            r#"[{"administrator":"Rodobens","administradora":"Rodobens","category":"Truck","tipo":"Caminhão","creditValue":90000,"valorCarta":90000,"termMonths":100}]"#,
        )
        .unwrap();
    assert_eq!(summary.imported, 1);
    let plan = &store.list()[0];
    assert_eq!(plan.administrator, "Rodobens");
    assert_eq!(plan.category, Category::Truck);
    assert_eq!(plan.credit_value, 90_000.0);
}

#[test]
fn import_replaces_instead_of_merging() {
    let mut store = seeded();
    let kept = store.list()[0].id.clone();
    let dropped = store.list()[1].id.clone();
    store.toggle_selection(&kept).unwrap();
    store.toggle_selection(&dropped).unwrap();

    let document = format!(
        r#"[{{"id":"{kept}","administrator":"Rodobens","category":"Truck","creditValue":90000,"termMonths":100}}]"#
    );
    store.import(&document).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.list()[0].category, Category::Truck);
    assert_eq!(store.selection().ids(), [kept]);

    let persisted = store.storage().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    assert!(persisted.contains("\"Truck\""));
}

#[test]
fn export_goes_to_dated_file() {
    let dir = TempDir::new().unwrap();
    let store = seeded();
    let mut sink = DirectorySink::new(dir.path().join("exports"));
    let date = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();

    let path = store.export_to(&mut sink, date).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "planos-consorcio-2025-06-30.json"
    );
    let written = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 4);
    assert_eq!(value[0]["administrator"], "Rodobens");
    assert_eq!(value[0]["creditValue"], 60_000.0);
}

#[tokio::test]
async fn import_file_reads_then_replaces() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("planos.json");
    std::fs::write(
        &path,
        r#"[{"administradora":"Porto Seguro","tipo":"Caminhão","valorCarta":"250000","prazo":120}]"#,
    )
    .unwrap();

    let mut store = seeded();
    let summary = store.import_file(&path).await.unwrap();
    assert_eq!(summary.previous, 4);
    assert_eq!(summary.imported, 1);
    let plan = &store.list()[0];
    assert_eq!(plan.administrator, "Porto Seguro");
    assert_eq!(plan.category, Category::Truck);
    assert_eq!(plan.credit_value, 250_000.0);
    assert_eq!(plan.term_months, 120);
}

#[tokio::test]
async fn missing_import_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded();
    let err = store
        .import_file(dir.path().join("absent.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlanError::Io(_)));
    assert_eq!(store.len(), 4);
}
