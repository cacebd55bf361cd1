use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use ndarray::Array1;
use serde::Deserialize;

use super::error::ClassifierError;
use super::preprocess::split_words;
use super::utils::dense_from_entries;

/// A sparse vector of feature values over a fixed width.
///
/// Entries are kept sorted by index and never hold explicit zeros, so two vectors with the
/// same counts compare equal regardless of how they were built.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    width: usize,
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    /// Creates an all-zero vector of the given width
    pub fn zeros(width: usize) -> Self {
        Self { width, entries: Vec::new() }
    }

    /// Creates a vector from `(index, value)` pairs.
    ///
    /// Pairs may come in any order; values at the same index are summed and zeros dropped.
    ///
    /// # Errors
    /// - `ValidationError` if any index falls outside `0..width`
    pub fn from_entries(
        width: usize,
        entries: impl IntoIterator<Item = (usize, f32)>,
    ) -> Result<Self, ClassifierError> {
        let mut merged = BTreeMap::new();
        for (index, value) in entries {
            if index >= width {
                return Err(ClassifierError::ValidationError(format!(
                    "Feature index {} out of range for width {}",
                    index, width
                )));
            }
            *merged.entry(index).or_insert(0.0f32) += value;
        }
        Ok(Self {
            width,
            entries: merged.into_iter().filter(|&(_, v)| v != 0.0).collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Non-zero entries in ascending index order
    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> f32 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Horizontal concatenation: `self` occupies the low indices, `other` is shifted by `self.width()`.
    pub fn hstack(&self, other: &SparseVector) -> SparseVector {
        let offset = self.width;
        let mut entries = Vec::with_capacity(self.entries.len() + other.entries.len());
        entries.extend_from_slice(&self.entries);
        entries.extend(other.entries.iter().map(|&(i, v)| (i + offset, v)));
        SparseVector {
            width: self.width + other.width,
            entries,
        }
    }

    pub fn to_dense(&self) -> Array1<f32> {
        dense_from_entries(self.width, &self.entries)
    }
}

/// An immutable term → feature-index mapping.
///
/// Indices are guaranteed to be exactly `0..len()`, which is what makes the vector width
/// equal to the vocabulary size.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from a term → index map, as exported from a fitted count vectorizer.
    ///
    /// # Errors
    /// - `ArtifactLoadError` if the map is empty
    /// - `ArtifactLoadError` if indices are duplicated or not contiguous from zero
    pub fn from_map(index: HashMap<String, usize>) -> Result<Self, ClassifierError> {
        if index.is_empty() {
            return Err(ClassifierError::ArtifactLoadError("Vocabulary is empty".into()));
        }

        let mut slots: Vec<Option<String>> = vec![None; index.len()];
        for (term, &i) in &index {
            let slot = slots.get_mut(i).ok_or_else(|| {
                ClassifierError::ArtifactLoadError(format!(
                    "Vocabulary index {} for term '{}' exceeds vocabulary size {}",
                    i,
                    term,
                    index.len()
                ))
            })?;
            if let Some(existing) = slot {
                return Err(ClassifierError::ArtifactLoadError(format!(
                    "Vocabulary index {} assigned to both '{}' and '{}'",
                    i, existing, term
                )));
            }
            *slot = Some(term.clone());
        }

        // No duplicates and len() slots filled means every slot is Some.
        let terms = slots.into_iter().flatten().collect();
        Ok(Self { terms, index })
    }

    /// Builds a vocabulary that assigns indices in the given term order
    pub fn from_terms<I, S>(terms: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = HashMap::new();
        for term in terms {
            let next = index.len();
            index.entry(term.into()).or_insert(next);
        }
        Self::from_map(index)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct CountVectorizerArtifact {
    vocabulary: HashMap<String, usize>,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
}

fn default_lowercase() -> bool {
    true
}

/// A vocabulary-bounded bag-of-words transform.
///
/// Tokens are maximal runs of two or more word characters, the default token pattern of the
/// vectorizers this crate consumes. Tokens outside the vocabulary contribute nothing.
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    vocabulary: Vocabulary,
    lowercase: bool,
}

impl CountVectorizer {
    pub fn new(vocabulary: Vocabulary, lowercase: bool) -> Self {
        Self { vocabulary, lowercase }
    }

    /// Loads a vectorizer from its JSON export: `{"vocabulary": {term: index}, "lowercase": bool}`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClassifierError::ArtifactLoadError(format!(
                "Failed to read vectorizer {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents).map_err(|e| match e {
            ClassifierError::ArtifactLoadError(msg) => {
                ClassifierError::ArtifactLoadError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let artifact: CountVectorizerArtifact = serde_json::from_str(json).map_err(|e| {
            ClassifierError::ArtifactLoadError(format!("Invalid vectorizer JSON: {}", e))
        })?;
        let vocabulary = Vocabulary::from_map(artifact.vocabulary)?;
        Ok(Self::new(vocabulary, artifact.lowercase))
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Width of every vector this vectorizer produces
    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }

    /// Tokens as the vectorizer sees them, before the vocabulary lookup
    pub fn analyze(&self, text: &str) -> Result<Vec<String>, ClassifierError> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        Ok(split_words(&text)?
            .into_iter()
            .filter(|token| is_countable(token))
            .collect())
    }

    /// Counts in-vocabulary occurrences of each term in `text`
    pub fn transform(&self, text: &str) -> Result<SparseVector, ClassifierError> {
        let tokens = self.analyze(text)?;
        let counts = tokens
            .iter()
            .filter_map(|token| self.vocabulary.index_of(token))
            .map(|index| (index, 1.0));
        SparseVector::from_entries(self.width(), counts)
    }
}

fn is_countable(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(_)) => first.is_alphanumeric() || first == '_',
        _ => false,
    }
}
