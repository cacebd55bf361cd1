#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jobscam::classifier::{
    BinaryClassifier, CountVectorizer, LogisticRegression, PerceptronTagger, SparseVector,
};
use jobscam::{ArtifactStore, ClassifierError};

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

pub const TEXT_TERMS: [&str; 14] = [
    "apply", "cash", "daily", "earn", "easy", "engineer", "experience", "fast", "from", "home",
    "money", "salary", "team", "work",
];

pub const TAG_TERMS: [&str; 6] = ["cc", "in", "jj", "nn", "prp", "vb"];

pub fn text_vectorizer_json() -> String {
    vectorizer_json(&TEXT_TERMS)
}

pub fn pos_vectorizer_json() -> String {
    vectorizer_json(&TAG_TERMS)
}

fn vectorizer_json(terms: &[&str]) -> String {
    let vocabulary: HashMap<&str, usize> = terms.iter().enumerate().map(|(i, t)| (*t, i)).collect();
    serde_json::json!({ "vocabulary": vocabulary, "lowercase": true }).to_string()
}

/// Scam vocabulary pushes towards fraud, professional vocabulary away from it
pub fn coefficients() -> Vec<f32> {
    let mut coef: Vec<f32> = TEXT_TERMS
        .iter()
        .map(|term| match *term {
            "cash" | "easy" | "money" | "fast" | "earn" | "daily" => 1.2,
            "engineer" | "experience" | "salary" | "team" | "apply" => -1.5,
            _ => 0.0,
        })
        .collect();
    coef.extend([0.0, 0.1, 0.05, -0.02, 0.0, 0.1]);
    coef
}

pub const INTERCEPT: f32 = -0.4;

pub fn classifier_json() -> String {
    serde_json::json!({
        "coef": [coefficients()],
        "intercept": [INTERCEPT],
        "classes": [0, 1],
    })
    .to_string()
}

pub fn tagger() -> PerceptronTagger {
    let mut weights = HashMap::new();
    weights.insert("bias".to_string(), HashMap::from([("NN".to_string(), 1.0)]));
    weights.insert(
        "i suffix ing".to_string(),
        HashMap::from([("VBG".to_string(), 2.0)]),
    );
    weights.insert(
        "i word !HYPHEN".to_string(),
        HashMap::from([("JJ".to_string(), 2.0)]),
    );
    let tagdict = HashMap::from([
        ("and".to_string(), "CC".to_string()),
        ("from".to_string(), "IN".to_string()),
        ("with".to_string(), "IN".to_string()),
        ("we".to_string(), "PRP".to_string()),
        ("earn".to_string(), "VB".to_string()),
        ("easy".to_string(), "JJ".to_string()),
        ("fast".to_string(), "JJ".to_string()),
    ]);
    let classes = ["CC", "IN", "JJ", "NN", "PRP", "VB", "VBG"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    PerceptronTagger::new(weights, tagdict, classes).expect("tagger fixture")
}

/// Wraps a logistic model and counts how often it is asked for a probability
#[derive(Debug)]
pub struct CountingClassifier {
    inner: LogisticRegression,
    calls: AtomicUsize,
}

impl CountingClassifier {
    pub fn new() -> Self {
        Self {
            inner: LogisticRegression::new(coefficients(), INTERCEPT).expect("model fixture"),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BinaryClassifier for CountingClassifier {
    fn input_width(&self) -> usize {
        self.inner.input_width()
    }

    fn kind(&self) -> &'static str {
        "counting"
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<f32, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.predict_proba(features)
    }
}

pub fn store_with(classifier: Arc<dyn BinaryClassifier>) -> ArtifactStore {
    ArtifactStore::from_parts(
        classifier,
        CountVectorizer::from_json(&text_vectorizer_json()).expect("text vectorizer"),
        CountVectorizer::from_json(&pos_vectorizer_json()).expect("pos vectorizer"),
        Arc::new(tagger()),
    )
    .expect("store fixture")
}

/// Writes a complete artifact directory in the default layout
pub fn write_artifact_dir(dir: &Path) -> std::io::Result<()> {
    fs::write(dir.join("logistic_model.json"), classifier_json())?;
    fs::write(dir.join("countvectorizer_text.json"), text_vectorizer_json())?;
    fs::write(dir.join("countvectorizer_pos.json"), pos_vectorizer_json())?;

    let tagger_dir = dir.join("tagger");
    fs::create_dir_all(&tagger_dir)?;
    let weights = serde_json::json!({
        "bias": { "NN": 1.0 },
        "i suffix ing": { "VBG": 2.0 },
        "i word !HYPHEN": { "JJ": 2.0 },
    });
    let tagdict = serde_json::json!({
        "and": "CC", "from": "IN", "with": "IN", "we": "PRP",
        "earn": "VB", "easy": "JJ", "fast": "JJ",
    });
    let classes = serde_json::json!(["CC", "IN", "JJ", "NN", "PRP", "VB", "VBG"]);
    fs::write(tagger_dir.join("weights.json"), weights.to_string())?;
    fs::write(tagger_dir.join("tagdict.json"), tagdict.to_string())?;
    fs::write(tagger_dir.join("classes.json"), classes.to_string())?;
    Ok(())
}
