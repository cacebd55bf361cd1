use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};

use super::error::ClassifierError;
use super::model::{BinaryClassifier, LogisticRegression, OnnxClassifier};
use super::preprocess::PosTagger;
use super::store::ArtifactStore;
use super::tagger::PerceptronTagger;
use super::vectorizer::CountVectorizer;
use crate::manifest::{ArtifactKind, ArtifactManifest, ONNX_CLASSIFIER_FILE, TAGGER_DIR};
use crate::runtime::RuntimeConfig;

#[derive(Debug)]
struct TaggerFiles {
    weights: PathBuf,
    tagdict: PathBuf,
    classes: PathBuf,
}

/// A builder for constructing an [`ArtifactStore`] with a fluent interface.
///
/// Paths can be set one by one or all at once from an artifact directory; explicitly set
/// paths always win over the directory defaults regardless of call order.
#[derive(Default, Debug)]
pub struct ArtifactStoreBuilder {
    artifact_dir: Option<PathBuf>,
    classifier_path: Option<PathBuf>,
    text_vectorizer_path: Option<PathBuf>,
    pos_vectorizer_path: Option<PathBuf>,
    tagger_dir: Option<PathBuf>,
    tagger_files: Option<TaggerFiles>,
    tagger: Option<Arc<dyn PosTagger>>,
    runtime_config: RuntimeConfig,
}

impl ArtifactStoreBuilder {
    /// Creates a new empty builder with the default runtime configuration
    ///
    /// # Example
    /// ```
    /// use jobscam::ArtifactStoreBuilder;
    ///
    /// let builder = ArtifactStoreBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration used if the classifier is an ONNX model
    ///
    /// # Example
    /// ```
    /// use jobscam::{ArtifactStoreBuilder, RuntimeConfig};
    ///
    /// let builder = ArtifactStoreBuilder::new()
    ///     .with_runtime_config(RuntimeConfig::default());
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Uses `dir` as the source of every artifact not set explicitly.
    ///
    /// Expected layout:
    /// - `logistic_model.json` or `logistic_model.onnx`
    /// - `countvectorizer_text.json`
    /// - `countvectorizer_pos.json`
    /// - `tagger/` with the perceptron tagger files
    ///
    /// # Errors
    /// - `ValidationError` if an artifact directory was already set
    /// - `ArtifactLoadError` if `dir` does not exist
    pub fn with_artifact_dir(mut self, dir: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        if self.artifact_dir.is_some() {
            return Err(ClassifierError::ValidationError(
                "Artifact directory already set".to_string(),
            ));
        }
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ClassifierError::ArtifactLoadError(format!(
                "Artifact directory not found: {}",
                dir.display()
            )));
        }
        self.artifact_dir = Some(dir.to_path_buf());
        Ok(self)
    }

    /// Takes every artifact path from `manifest`, resolved against `dir`.
    ///
    /// This is the layout [`ArtifactManager`](crate::ArtifactManager) downloads and verifies,
    /// so entries with a custom `path` load from where they were fetched.
    ///
    /// # Errors
    /// - `ValidationError` if the manifest is invalid or a path was already set
    /// - `ArtifactLoadError` if `dir` does not exist
    pub fn with_manifest(
        self,
        dir: impl AsRef<Path>,
        manifest: &ArtifactManifest,
    ) -> Result<Self, ClassifierError> {
        manifest
            .validate()
            .map_err(|e| ClassifierError::ValidationError(e.to_string()))?;
        let dir = dir.as_ref();
        let path_of = |kind: ArtifactKind| -> Result<PathBuf, ClassifierError> {
            manifest
                .entry(kind)
                .map(|entry| dir.join(entry.relative_path()))
                .ok_or_else(|| {
                    ClassifierError::ValidationError(format!("Manifest has no entry for {}", kind))
                })
        };

        self.with_artifact_dir(dir)?
            .with_classifier_path(path_of(ArtifactKind::Classifier)?)?
            .with_text_vectorizer_path(path_of(ArtifactKind::TextVectorizer)?)?
            .with_pos_vectorizer_path(path_of(ArtifactKind::PosVectorizer)?)?
            .with_tagger_files(
                path_of(ArtifactKind::TaggerWeights)?,
                path_of(ArtifactKind::TaggerTagdict)?,
                path_of(ArtifactKind::TaggerClasses)?,
            )
    }

    /// Sets the classifier artifact; `.onnx` files run on ONNX Runtime, anything else is
    /// read as a JSON logistic model
    pub fn with_classifier_path(self, path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        Self::set_path(self, path, |b| &mut b.classifier_path, "Classifier")
    }

    pub fn with_text_vectorizer_path(self, path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        Self::set_path(self, path, |b| &mut b.text_vectorizer_path, "Text vectorizer")
    }

    pub fn with_pos_vectorizer_path(self, path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        Self::set_path(self, path, |b| &mut b.pos_vectorizer_path, "POS vectorizer")
    }

    /// Sets the directory holding the perceptron tagger files
    pub fn with_tagger_dir(self, dir: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        if self.tagger.is_some() || self.tagger_files.is_some() {
            return Err(ClassifierError::ValidationError(
                "A tagger instance is already set".to_string(),
            ));
        }
        Self::set_path(self, dir, |b| &mut b.tagger_dir, "Tagger directory")
    }

    /// Sets the three perceptron tagger files individually
    pub fn with_tagger_files(
        mut self,
        weights: impl AsRef<Path>,
        tagdict: impl AsRef<Path>,
        classes: impl AsRef<Path>,
    ) -> Result<Self, ClassifierError> {
        if self.tagger_dir.is_some() || self.tagger_files.is_some() || self.tagger.is_some() {
            return Err(ClassifierError::ValidationError(
                "Tagger already set".to_string(),
            ));
        }
        self.tagger_files = Some(TaggerFiles {
            weights: weights.as_ref().to_path_buf(),
            tagdict: tagdict.as_ref().to_path_buf(),
            classes: classes.as_ref().to_path_buf(),
        });
        Ok(self)
    }

    /// Uses an already-constructed tagger instead of loading one from disk
    pub fn with_tagger(mut self, tagger: Arc<dyn PosTagger>) -> Result<Self, ClassifierError> {
        if self.tagger_dir.is_some() || self.tagger_files.is_some() || self.tagger.is_some() {
            return Err(ClassifierError::ValidationError(
                "Tagger already set".to_string(),
            ));
        }
        self.tagger = Some(tagger);
        Ok(self)
    }

    fn set_path(
        mut self,
        path: impl AsRef<Path>,
        slot: impl Fn(&mut Self) -> &mut Option<PathBuf>,
        what: &str,
    ) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ClassifierError::ValidationError(format!(
                "{} path cannot be empty",
                what
            )));
        }
        let field = slot(&mut self);
        if field.is_some() {
            return Err(ClassifierError::ValidationError(format!(
                "{} path already set",
                what
            )));
        }
        *field = Some(path.to_path_buf());
        Ok(self)
    }

    fn resolve(
        &self,
        explicit: &Option<PathBuf>,
        default: impl FnOnce(&Path) -> PathBuf,
        what: &str,
    ) -> Result<PathBuf, ClassifierError> {
        explicit
            .clone()
            .or_else(|| self.artifact_dir.as_deref().map(default))
            .ok_or_else(|| {
                ClassifierError::ValidationError(format!(
                    "{} path must be set (directly or through an artifact directory)",
                    what
                ))
            })
    }

    fn default_classifier_path(dir: &Path) -> PathBuf {
        let json = dir.join(ArtifactKind::Classifier.default_path());
        let onnx = dir.join(ONNX_CLASSIFIER_FILE);
        if !json.exists() && onnx.exists() {
            onnx
        } else {
            json
        }
    }

    /// Loads every artifact and returns the final ArtifactStore
    ///
    /// # Errors
    /// - `ValidationError` if any artifact path is neither set nor derivable from a directory
    /// - `ArtifactLoadError` if any artifact is missing or unreadable
    /// - `ArtifactLoadError` if the classifier width does not equal text + POS vocabulary size
    ///
    /// # Example
    /// ```no_run
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use jobscam::ArtifactStore;
    ///
    /// let store = ArtifactStore::builder()
    ///     .with_classifier_path("artifacts/logistic_model.json")?
    ///     .with_text_vectorizer_path("artifacts/countvectorizer_text.json")?
    ///     .with_pos_vectorizer_path("artifacts/countvectorizer_pos.json")?
    ///     .with_tagger_dir("artifacts/tagger")?
    ///     .build()?;
    /// println!("{:?}", store.info());
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<ArtifactStore, ClassifierError> {
        let classifier_path =
            self.resolve(&self.classifier_path, Self::default_classifier_path, "Classifier")?;
        let text_path = self.resolve(
            &self.text_vectorizer_path,
            |d| d.join(ArtifactKind::TextVectorizer.default_path()),
            "Text vectorizer",
        )?;
        let pos_path = self.resolve(
            &self.pos_vectorizer_path,
            |d| d.join(ArtifactKind::PosVectorizer.default_path()),
            "POS vectorizer",
        )?;

        let text_vectorizer = CountVectorizer::from_file(&text_path).map_err(log_failure)?;
        info!("Text vectorizer loaded: {} terms", text_vectorizer.width());
        let pos_vectorizer = CountVectorizer::from_file(&pos_path).map_err(log_failure)?;
        info!("POS vectorizer loaded: {} tags", pos_vectorizer.width());

        let tagger: Arc<dyn PosTagger> = match (&self.tagger, &self.tagger_files) {
            (Some(tagger), _) => Arc::clone(tagger),
            (None, Some(files)) => Arc::new(
                PerceptronTagger::from_files(&files.weights, &files.tagdict, &files.classes)
                    .map_err(log_failure)?,
            ),
            (None, None) => {
                let dir = self.resolve(&self.tagger_dir, |d| d.join(TAGGER_DIR), "Tagger directory")?;
                Arc::new(PerceptronTagger::from_dir(&dir).map_err(log_failure)?)
            }
        };

        let expected_width = text_vectorizer.width() + pos_vectorizer.width();
        let classifier: Arc<dyn BinaryClassifier> = if is_onnx(&classifier_path) {
            Arc::new(
                OnnxClassifier::from_file(&classifier_path, &self.runtime_config, Some(expected_width))
                    .map_err(log_failure)?,
            )
        } else {
            Arc::new(LogisticRegression::from_file(&classifier_path).map_err(log_failure)?)
        };

        let mut store = ArtifactStore::from_parts(classifier, text_vectorizer, pos_vectorizer, tagger)
            .map_err(log_failure)?;
        store.artifact_dir = self
            .artifact_dir
            .as_ref()
            .map(|d| d.to_string_lossy().to_string());

        info!(
            "Artifact store ready: {} features ({} classifier)",
            expected_width,
            store.classifier().kind()
        );
        Ok(store)
    }
}

fn is_onnx(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("onnx"))
}

fn log_failure(err: ClassifierError) -> ClassifierError {
    error!("{}", err);
    err
}
