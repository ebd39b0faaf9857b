//! Integration test: artifact pair persistence

use diabetes_triage::artifacts::{load_metrics, load_pipeline, ArtifactStore};
use diabetes_triage::dataset::Dataset;
use diabetes_triage::training::{train, ModelFamily, TrainConfig};
use diabetes_triage::TriageError;

fn trained_pair() -> (
    diabetes_triage::pipeline::Pipeline,
    diabetes_triage::artifacts::MetricsRecord,
) {
    let ds = Dataset::builtin();
    train(&ds, &TrainConfig::new("v0.2", ModelFamily::Linear)).unwrap()
}

#[test]
fn test_save_pair_writes_both_files_and_no_temp_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, metrics) = trained_pair();

    let store = ArtifactStore::new(dir.path());
    store.save_pair(&pipeline, &metrics).unwrap();

    assert!(store.model_path("v0.2").exists());
    assert!(store.metrics_path("v0.2").exists());

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
}

#[test]
fn test_pair_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, metrics) = trained_pair();

    let store = ArtifactStore::new(dir.path());
    store.save_pair(&pipeline, &metrics).unwrap();

    let loaded_metrics = load_metrics(&store.metrics_path("v0.2")).unwrap();
    assert_eq!(loaded_metrics.version, "v0.2");
    assert_eq!(loaded_metrics.model_type, "linear");
    assert_eq!(loaded_metrics.rmse, metrics.rmse);
    assert_eq!(loaded_metrics.y_train_min, metrics.y_train_min);
    assert_eq!(loaded_metrics.y_train_max, metrics.y_train_max);

    let loaded_pipeline = load_pipeline(&store.model_path("v0.2")).unwrap();
    let ds = Dataset::builtin();
    let sample = ds.select_rows(&[0, 1, 2]);
    assert_eq!(
        pipeline.predict(&sample.x).unwrap(),
        loaded_pipeline.predict(&sample.x).unwrap()
    );
}

#[test]
fn test_overwriting_a_version_key_replaces_the_pair() {
    let dir = tempfile::tempdir().unwrap();
    let ds = Dataset::builtin();
    let store = ArtifactStore::new(dir.path());

    let (p1, m1) = train(&ds, &TrainConfig::new("v0.2", ModelFamily::Linear)).unwrap();
    store.save_pair(&p1, &m1).unwrap();

    let (p2, m2) = train(&ds, &TrainConfig::new("v0.2", ModelFamily::Ridge)).unwrap();
    store.save_pair(&p2, &m2).unwrap();

    let loaded = load_metrics(&store.metrics_path("v0.2")).unwrap();
    assert_eq!(loaded.model_type, "ridge");
    assert_eq!(loaded.rmse, m2.rmse);
}

#[test]
fn test_loading_missing_artifact_is_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());

    let err = load_pipeline(&store.model_path("v9.9")).unwrap_err();
    assert!(matches!(err, TriageError::PersistenceError(_)));
    let err = load_metrics(&store.metrics_path("v9.9")).unwrap_err();
    assert!(matches!(err, TriageError::PersistenceError(_)));
}

#[test]
fn test_loading_truncated_artifact_is_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(store.model_path("v0.2"), "{\"scaler\":").unwrap();

    let err = load_pipeline(&store.model_path("v0.2")).unwrap_err();
    assert!(matches!(err, TriageError::PersistenceError(_)));
}
