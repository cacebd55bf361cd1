use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::DeserializeOwned;

use super::error::ClassifierError;
use super::preprocess::PosTagger;

const START: [&str; 2] = ["-START-", "-START2-"];
const END: [&str; 2] = ["-END-", "-END2-"];

/// Greedy averaged-perceptron part-of-speech tagger.
///
/// Decodes left to right with the feature templates of NLTK's default English tagger, so
/// a model exported from NLTK (`weights.json`, `tagdict.json`, `classes.json`) reproduces
/// the Penn Treebank tags the POS vectorizer was fitted on.
///
/// Frequent unambiguous words are tagged straight from the tag dictionary; every other
/// token is scored against all classes, ties going to the alphabetically larger tag.
#[derive(Debug, Clone)]
pub struct PerceptronTagger {
    weights: HashMap<String, HashMap<String, f64>>,
    tagdict: HashMap<String, String>,
    classes: Vec<String>,
}

impl PerceptronTagger {
    /// Creates a tagger from already-loaded model parts.
    ///
    /// # Errors
    /// - `ArtifactLoadError` if `classes` is empty
    pub fn new(
        weights: HashMap<String, HashMap<String, f64>>,
        tagdict: HashMap<String, String>,
        mut classes: Vec<String>,
    ) -> Result<Self, ClassifierError> {
        if classes.is_empty() {
            return Err(ClassifierError::ArtifactLoadError(
                "Tagger model has no classes".into(),
            ));
        }
        classes.sort();
        classes.dedup();
        Ok(Self { weights, tagdict, classes })
    }

    /// Loads the three JSON files of an exported tagger from `dir`.
    ///
    /// Each file is found either under its short name (`weights.json`) or with a model
    /// prefix (`averaged_perceptron_tagger_eng.weights.json`).
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ClassifierError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ClassifierError::ArtifactLoadError(format!(
                "Tagger directory not found: {}",
                dir.display()
            )));
        }

        Self::from_files(
            find_file(dir, "weights.json")?,
            find_file(dir, "tagdict.json")?,
            find_file(dir, "classes.json")?,
        )
    }

    /// Loads an exported tagger from three explicitly named JSON files.
    pub fn from_files(
        weights: impl AsRef<Path>,
        tagdict: impl AsRef<Path>,
        classes: impl AsRef<Path>,
    ) -> Result<Self, ClassifierError> {
        let weights_path = weights.as_ref();
        let weights: HashMap<String, HashMap<String, f64>> = read_json(weights_path)?;
        let tagdict: HashMap<String, String> = read_json(tagdict.as_ref())?;
        let classes: Vec<String> = read_json(classes.as_ref())?;

        info!(
            "Tagger loaded from {:?}: {} features, {} dictionary words, {} classes",
            weights_path,
            weights.len(),
            tagdict.len(),
            classes.len()
        );
        Self::new(weights, tagdict, classes)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    fn normalize(word: &str) -> String {
        let first = word.chars().next();
        if word.contains('-') && first != Some('-') {
            "!HYPHEN".to_string()
        } else if word.chars().count() == 4 && word.chars().all(|c| c.is_ascii_digit()) {
            "!YEAR".to_string()
        } else if first.is_some_and(|c| c.is_ascii_digit()) {
            "!DIGITS".to_string()
        } else {
            word.to_lowercase()
        }
    }

    fn features(i: usize, word: &str, context: &[String], prev: &str, prev2: &str) -> Vec<String> {
        let i = i + START.len();
        let first = word.chars().next().map(String::from).unwrap_or_default();
        vec![
            "bias".to_string(),
            format!("i suffix {}", suffix(word)),
            format!("i pref1 {}", first),
            format!("i-1 tag {}", prev),
            format!("i-2 tag {}", prev2),
            format!("i tag+i-2 tag {} {}", prev, prev2),
            format!("i word {}", context[i]),
            format!("i-1 tag+i word {} {}", prev, context[i]),
            format!("i-1 word {}", context[i - 1]),
            format!("i-1 suffix {}", suffix(&context[i - 1])),
            format!("i-2 word {}", context[i - 2]),
            format!("i+1 word {}", context[i + 1]),
            format!("i+1 suffix {}", suffix(&context[i + 1])),
            format!("i+2 word {}", context[i + 2]),
        ]
    }

    fn predict(&self, features: &[String]) -> String {
        let mut scores: HashMap<&str, f64> = HashMap::new();
        for feature in features {
            if let Some(weights) = self.weights.get(feature) {
                for (label, weight) in weights {
                    *scores.entry(label.as_str()).or_insert(0.0) += weight;
                }
            }
        }

        let mut best = &self.classes[0];
        let mut best_score = scores.get(best.as_str()).copied().unwrap_or(0.0);
        for class in &self.classes[1..] {
            let score = scores.get(class.as_str()).copied().unwrap_or(0.0);
            // classes are sorted ascending, so >= hands ties to the larger tag
            if score >= best_score {
                best = class;
                best_score = score;
            }
        }
        best.clone()
    }
}

impl PosTagger for PerceptronTagger {
    fn tag(&self, tokens: &[String]) -> Result<Vec<String>, ClassifierError> {
        let context: Vec<String> = START
            .iter()
            .map(|s| s.to_string())
            .chain(tokens.iter().map(|w| Self::normalize(w)))
            .chain(END.iter().map(|s| s.to_string()))
            .collect();

        let mut prev = START[0].to_string();
        let mut prev2 = START[1].to_string();
        let mut tags = Vec::with_capacity(tokens.len());

        for (i, word) in tokens.iter().enumerate() {
            let tag = match self.tagdict.get(word) {
                Some(tag) => tag.clone(),
                None => self.predict(&Self::features(i, word, &context, &prev, &prev2)),
            };
            prev2 = std::mem::replace(&mut prev, tag.clone());
            tags.push(tag);
        }

        debug!("Tagged {} tokens", tags.len());
        Ok(tags)
    }
}

fn suffix(word: &str) -> String {
    let len = word.chars().count();
    word.chars().skip(len.saturating_sub(3)).collect()
}

fn find_file(dir: &Path, name: &str) -> Result<PathBuf, ClassifierError> {
    let exact = dir.join(name);
    if exact.is_file() {
        return Ok(exact);
    }

    let suffix = format!(".{}", name);
    let entries = fs::read_dir(dir).map_err(|e| {
        ClassifierError::ArtifactLoadError(format!("Failed to read {}: {}", dir.display(), e))
    })?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&suffix))
        })
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        ClassifierError::ArtifactLoadError(format!(
            "Tagger file '{}' not found in {}",
            name,
            dir.display()
        ))
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ClassifierError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ClassifierError::ArtifactLoadError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        ClassifierError::ArtifactLoadError(format!("Invalid JSON in {}: {}", path.display(), e))
    })
}
