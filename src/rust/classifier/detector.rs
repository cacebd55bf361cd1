use std::sync::Arc;

use log::{debug, info};

use super::error::ClassifierError;
use super::explain::{explain, DEFAULT_TOP_K};
use super::store::ArtifactStore;
use super::utils::word_count;
use super::verdict::{Label, Outcome, Rejection, Verdict};

/// Minimum number of words a posting needs before it is scored.
pub const DEFAULT_MIN_WORDS: usize = 5;

/// Stages a classification request moves through.
///
/// `Rejected` is reachable only from `Validating`; every other stage leads to the next one
/// in order, ending at `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Idle,
    Validating,
    Preprocessing,
    Encoding,
    Classifying,
    Explaining,
    Done,
    Rejected,
}

impl RequestStage {
    pub fn can_transition_to(self, next: RequestStage) -> bool {
        use RequestStage::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Rejected)
                | (Validating, Preprocessing)
                | (Preprocessing, Encoding)
                | (Encoding, Classifying)
                | (Classifying, Explaining)
                | (Explaining, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStage::Done | RequestStage::Rejected)
    }
}

/// Tunables for a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Inputs with fewer whitespace-separated words are rejected
    pub min_words: usize,
    /// Maximum number of evidence terms per verdict
    pub top_k: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_words: DEFAULT_MIN_WORDS,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Turns job-posting text into a verdict using a shared [`ArtifactStore`].
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use jobscam::{ArtifactStore, FraudDetector, Outcome};
/// use std::sync::Arc;
///
/// let detector = FraudDetector::new(Arc::new(ArtifactStore::load("artifacts")?));
/// match detector.handle("Looking for experienced backend engineer with distributed systems experience")? {
///     Outcome::Verdict(verdict) => println!("{} {:?}", verdict.summary(), verdict.evidence_terms),
///     Outcome::Rejected(rejection) => println!("{}", rejection.message()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FraudDetector {
    store: Arc<ArtifactStore>,
    config: DetectorConfig,
}

impl FraudDetector {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self {
            store,
            config: DetectorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Returns the rejection for `text`, if it is too short to be scored
    pub fn validate(&self, text: &str) -> Option<Rejection> {
        let words = word_count(text);
        if words < self.config.min_words {
            Some(Rejection {
                word_count: words,
                min_words: self.config.min_words,
            })
        } else {
            None
        }
    }

    /// Scores one job posting.
    ///
    /// Short input yields `Ok(Outcome::Rejected)` without touching the artifacts. Past
    /// validation the request either completes or fails as a whole; no verdict is ever
    /// built from partial features.
    ///
    /// # Errors
    /// - `PreprocessingError` if tokenization or tagging fails
    /// - `DimensionMismatch` if the encoder and classifier disagree on width
    /// - `ModelError` if the classifier runtime fails
    pub fn handle(&self, text: &str) -> Result<Outcome, ClassifierError> {
        let mut stage = RequestStage::Idle;

        advance(&mut stage, RequestStage::Validating);
        if let Some(rejection) = self.validate(text) {
            advance(&mut stage, RequestStage::Rejected);
            info!(
                "Rejected input with {} words (minimum {})",
                rejection.word_count, rejection.min_words
            );
            return Ok(Outcome::Rejected(rejection));
        }

        advance(&mut stage, RequestStage::Preprocessing);
        let tags = self.store.preprocessor().tag(text)?;

        advance(&mut stage, RequestStage::Encoding);
        let features = self.store.encoder().encode(text, &tags)?;

        advance(&mut stage, RequestStage::Classifying);
        let (class, probability) = self.store.classifier().classify(&features.combined)?;

        advance(&mut stage, RequestStage::Explaining);
        let evidence_terms = explain(
            &features.text,
            self.store.encoder().text_vectorizer().vocabulary(),
            self.config.top_k,
        );

        advance(&mut stage, RequestStage::Done);
        let verdict = Verdict {
            label: Label::from_class(class),
            probability,
            evidence_terms,
        };
        info!(
            "Verdict: {} (P(fraud) = {:.4}, {} tags, {} evidence terms)",
            verdict.label,
            verdict.probability,
            tags.len(),
            verdict.evidence_terms.len()
        );
        Ok(Outcome::Verdict(verdict))
    }
}

fn advance(stage: &mut RequestStage, next: RequestStage) {
    debug_assert!(
        stage.can_transition_to(next),
        "illegal request transition {:?} -> {:?}",
        stage,
        next
    );
    if next.is_terminal() {
        debug!("{:?} -> {:?} (request finished)", stage, next);
    } else {
        debug!("{:?} -> {:?}", stage, next);
    }
    *stage = next;
}
