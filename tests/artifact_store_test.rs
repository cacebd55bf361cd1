mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::{write_artifact_dir, TAG_TERMS, TEXT_TERMS};
use jobscam::classifier::OnnxClassifier;
use jobscam::{
    ArtifactKind, ArtifactManager, ArtifactManifest, ArtifactStore, ClassifierError,
    FraudDetector, Label, RuntimeConfig,
};
use sha2::{Digest, Sha256};

fn sha256_file(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

fn manifest_for(dir: &Path) -> Result<ArtifactManifest, Box<dyn std::error::Error>> {
    manifest_with_paths(dir, &[])
}

/// Builds a manifest for the files in `dir`, with some kinds stored at custom paths
fn manifest_with_paths(
    dir: &Path,
    paths: &[(ArtifactKind, &str)],
) -> Result<ArtifactManifest, Box<dyn std::error::Error>> {
    let mut entries = Vec::new();
    for kind in ArtifactKind::ALL {
        let custom = paths.iter().find(|(k, _)| *k == kind).map(|(_, p)| *p);
        let relative = custom.unwrap_or(kind.default_path());
        let hash = sha256_file(&dir.join(relative))?;
        let mut entry = serde_json::json!({
            "kind": kind,
            "sha256": hash,
        });
        if let Some(path) = custom {
            entry["path"] = serde_json::json!(path);
        }
        entries.push(entry);
    }
    let json = serde_json::json!({
        "name": "fixture",
        "version": "1",
        "artifacts": entries,
    });
    Ok(ArtifactManifest::from_json(&json.to_string())?)
}

#[test]
fn test_load_from_directory() -> Result<(), Box<dyn std::error::Error>> {
    common::init_logging();
    let dir = tempfile::tempdir()?;
    write_artifact_dir(dir.path())?;

    let store = ArtifactStore::load(dir.path())?;
    let info = store.info();
    assert_eq!(info.classifier_kind, "logistic-json");
    assert_eq!(info.text_vocabulary_size, TEXT_TERMS.len());
    assert_eq!(info.tag_vocabulary_size, TAG_TERMS.len());
    assert_eq!(info.feature_width, TEXT_TERMS.len() + TAG_TERMS.len());
    assert!(info.artifact_dir.is_some());

    let detector = FraudDetector::new(Arc::new(store));
    let outcome = detector.handle("Work from home and earn easy money fast with daily cash")?;
    assert_eq!(outcome.verdict().map(|v| v.label), Some(Label::Fraudulent));
    Ok(())
}

#[test]
fn test_loaded_store_matches_in_memory_store() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_artifact_dir(dir.path())?;

    let from_disk = FraudDetector::new(Arc::new(ArtifactStore::load(dir.path())?));
    let in_memory = FraudDetector::new(Arc::new(common::store_with(Arc::new(
        common::CountingClassifier::new(),
    ))));

    for text in [
        "We are hiring a software engineer with team experience",
        "money money money cash cash easy work home now",
        "Zzyzx qwrtp vlorb snarf glemp",
    ] {
        assert_eq!(from_disk.handle(text)?, in_memory.handle(text)?);
    }
    Ok(())
}

#[test]
fn test_missing_artifact_fails_load() -> Result<(), Box<dyn std::error::Error>> {
    for kind in ArtifactKind::ALL {
        let dir = tempfile::tempdir()?;
        write_artifact_dir(dir.path())?;
        fs::remove_file(dir.path().join(kind.default_path()))?;

        let result = ArtifactStore::load(dir.path());
        assert!(
            matches!(result, Err(ClassifierError::ArtifactLoadError(_))),
            "removing {} gave {:?}",
            kind,
            result.err()
        );
    }
    Ok(())
}

#[test]
fn test_corrupt_artifact_fails_load() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_artifact_dir(dir.path())?;
    fs::write(dir.path().join("countvectorizer_text.json"), "{ not json")?;

    let result = ArtifactStore::load(dir.path());
    assert!(matches!(result, Err(ClassifierError::ArtifactLoadError(_))));
    Ok(())
}

#[test]
fn test_width_skew_fails_load() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_artifact_dir(dir.path())?;
    let skewed = serde_json::json!({ "coef": [0.1, 0.2, 0.3], "intercept": 0.0 });
    fs::write(dir.path().join("logistic_model.json"), skewed.to_string())?;

    match ArtifactStore::load(dir.path()) {
        Err(ClassifierError::ArtifactLoadError(msg)) => assert!(msg.contains("3 features")),
        other => panic!("expected a width error, got {:?}", other.map(|s| s.info())),
    }
    Ok(())
}

#[test]
fn test_explicit_paths_override_directory() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_artifact_dir(dir.path())?;
    let elsewhere = tempfile::tempdir()?;
    let text_path = elsewhere.path().join("text.json");
    fs::rename(dir.path().join("countvectorizer_text.json"), &text_path)?;

    let store = ArtifactStore::builder()
        .with_text_vectorizer_path(&text_path)?
        .with_artifact_dir(dir.path())?
        .build()?;
    assert_eq!(store.info().text_vocabulary_size, TEXT_TERMS.len());
    Ok(())
}

#[test]
fn test_missing_onnx_classifier() {
    let result = OnnxClassifier::from_file(
        "/nonexistent/logistic_model.onnx",
        &RuntimeConfig::default(),
        Some(20),
    );
    assert!(matches!(result, Err(ClassifierError::ArtifactLoadError(_))));
}

#[test]
fn test_manifest_verification() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_artifact_dir(dir.path())?;
    let manifest = manifest_for(dir.path())?;
    let manager = ArtifactManager::new(dir.path())?;

    assert!(manager.is_present(&manifest));
    assert!(manager.verify(&manifest)?);

    fs::write(dir.path().join("tagger").join("classes.json"), "[\"NN\"]")?;
    assert!(manager.is_present(&manifest));
    assert!(!manager.verify(&manifest)?);
    Ok(())
}

#[tokio::test]
async fn test_ensure_artifacts_with_local_copies() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_artifact_dir(dir.path())?;
    let manifest = manifest_for(dir.path())?;
    let manager = ArtifactManager::new(dir.path())?;

    manager.ensure_artifacts(&manifest).await?;
    let store = ArtifactStore::load(manager.artifacts_dir())?;
    assert_eq!(store.info().feature_width, TEXT_TERMS.len() + TAG_TERMS.len());
    Ok(())
}

#[tokio::test]
async fn test_relocated_artifacts_load_through_manifest() -> Result<(), Box<dyn std::error::Error>> {
    common::init_logging();
    let dir = tempfile::tempdir()?;
    write_artifact_dir(dir.path())?;
    fs::create_dir_all(dir.path().join("models"))?;
    fs::rename(dir.path().join("logistic_model.json"), dir.path().join("models/lr.json"))?;
    fs::rename(
        dir.path().join("tagger").join("weights.json"),
        dir.path().join("models/tagger-weights.json"),
    )?;
    let manifest = manifest_with_paths(
        dir.path(),
        &[
            (ArtifactKind::Classifier, "models/lr.json"),
            (ArtifactKind::TaggerWeights, "models/tagger-weights.json"),
        ],
    )?;

    let manager = ArtifactManager::new(dir.path())?;
    manager.ensure_artifacts(&manifest).await?;
    assert!(matches!(
        ArtifactStore::load(manager.artifacts_dir()),
        Err(ClassifierError::ArtifactLoadError(_))
    ));

    let store = ArtifactStore::builder()
        .with_manifest(manager.artifacts_dir(), &manifest)?
        .build()?;
    assert_eq!(store.info().feature_width, TEXT_TERMS.len() + TAG_TERMS.len());

    let detector = FraudDetector::new(Arc::new(store));
    let outcome = detector.handle("Work from home and earn easy money fast with daily cash")?;
    assert_eq!(outcome.verdict().map(|v| v.label), Some(Label::Fraudulent));
    Ok(())
}

#[test]
fn test_manifest_conflicts_with_explicit_paths() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_artifact_dir(dir.path())?;
    let manifest = manifest_for(dir.path())?;

    let result = ArtifactStore::builder()
        .with_classifier_path(dir.path().join("logistic_model.json"))?
        .with_manifest(dir.path(), &manifest);
    assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    Ok(())
}
