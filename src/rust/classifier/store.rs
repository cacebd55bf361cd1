use std::sync::Arc;

use super::builder::ArtifactStoreBuilder;
use super::encoder::FeatureEncoder;
use super::error::ClassifierError;
use super::model::BinaryClassifier;
use super::preprocess::{PosTagger, Preprocessor};
use super::vectorizer::CountVectorizer;
use super::StoreInfo;

/// The pre-trained objects a detector needs, loaded once and never mutated.
///
/// # Thread Safety
///
/// This type is `Send + Sync`: the classifier and tagger sit behind `Arc<dyn _ + Send + Sync>`
/// and the vocabularies are plain owned data. Share one store across threads with `Arc`:
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use jobscam::{ArtifactStore, FraudDetector};
/// use std::sync::Arc;
/// use std::thread;
///
/// let store = Arc::new(ArtifactStore::load("artifacts")?);
///
/// let detector = FraudDetector::new(Arc::clone(&store));
/// thread::spawn(move || {
///     detector.handle("Earn money fast from home, no experience needed").unwrap();
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArtifactStore {
    pub(crate) artifact_dir: Option<String>,
    classifier: Arc<dyn BinaryClassifier>,
    encoder: FeatureEncoder,
    preprocessor: Preprocessor,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ArtifactStore>();
    }
};

impl ArtifactStore {
    /// Creates a new ArtifactStoreBuilder for fluent construction
    pub fn builder() -> ArtifactStoreBuilder {
        ArtifactStoreBuilder::new()
    }

    /// Loads every artifact from `dir` using the default file names.
    ///
    /// Shorthand for `ArtifactStore::builder().with_artifact_dir(dir)?.build()`.
    pub fn load(dir: impl AsRef<std::path::Path>) -> Result<Self, ClassifierError> {
        Self::builder().with_artifact_dir(dir)?.build()
    }

    /// Assembles a store from components that are already in memory.
    ///
    /// # Errors
    /// - `ArtifactLoadError` if the classifier width differs from the combined vocabulary width
    pub fn from_parts(
        classifier: Arc<dyn BinaryClassifier>,
        text_vectorizer: CountVectorizer,
        pos_vectorizer: CountVectorizer,
        tagger: Arc<dyn PosTagger>,
    ) -> Result<Self, ClassifierError> {
        let encoder = FeatureEncoder::new(text_vectorizer, pos_vectorizer);
        if classifier.input_width() != encoder.width() {
            return Err(ClassifierError::ArtifactLoadError(format!(
                "Classifier expects {} features but the vectorizers produce {} ({} text + {} POS)",
                classifier.input_width(),
                encoder.width(),
                encoder.text_vectorizer().width(),
                encoder.pos_vectorizer().width()
            )));
        }

        Ok(Self {
            artifact_dir: None,
            classifier,
            encoder,
            preprocessor: Preprocessor::new(tagger),
        })
    }

    pub fn classifier(&self) -> &dyn BinaryClassifier {
        self.classifier.as_ref()
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Returns information about the loaded artifacts
    pub fn info(&self) -> StoreInfo {
        StoreInfo {
            artifact_dir: self.artifact_dir.clone(),
            classifier_kind: self.classifier.kind(),
            feature_width: self.classifier.input_width(),
            text_vocabulary_size: self.encoder.text_vectorizer().width(),
            tag_vocabulary_size: self.encoder.pos_vectorizer().width(),
        }
    }
}
