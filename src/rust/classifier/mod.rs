mod error;
mod detector;
mod encoder;
mod explain;
mod model;
mod preprocess;
mod store;
mod tagger;
mod utils;
mod vectorizer;
mod verdict;
pub mod builder;

pub use error::ClassifierError;
pub use detector::{DetectorConfig, FraudDetector, RequestStage, DEFAULT_MIN_WORDS};
pub use encoder::{EncodedFeatures, FeatureEncoder};
pub use explain::{explain, DEFAULT_TOP_K};
pub use model::{BinaryClassifier, LogisticRegression, OnnxClassifier, DECISION_THRESHOLD};
pub use preprocess::{PosTagger, Preprocessor, WordTokenizer};
pub use store::ArtifactStore;
pub use tagger::PerceptronTagger;
pub use vectorizer::{CountVectorizer, SparseVector, Vocabulary};
pub use verdict::{Label, Outcome, Rejection, Verdict, EVIDENCE_NOTE};
pub use builder::ArtifactStoreBuilder;

/// Information about the artifacts a store was loaded from
#[derive(Debug, Clone)]
pub struct StoreInfo {
    /// Directory the artifacts were read from, if loaded through one
    pub artifact_dir: Option<String>,
    /// Backing classifier implementation ("logistic-json" or "onnx")
    pub classifier_kind: &'static str,
    /// Width of the combined feature vector
    pub feature_width: usize,
    /// Number of terms in the text vocabulary
    pub text_vocabulary_size: usize,
    /// Number of tags in the POS vocabulary
    pub tag_vocabulary_size: usize,
}
