use log::debug;

use super::error::ClassifierError;
use super::vectorizer::{CountVectorizer, SparseVector};

/// Feature vectors produced for a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatures {
    /// Word counts over the text vocabulary; also the source of evidence terms
    pub text: SparseVector,
    /// Tag counts over the tag vocabulary
    pub tags: SparseVector,
    /// `[text | tags]`, the vector the classifier scores
    pub combined: SparseVector,
}

/// Maps text and its tag sequence onto the classifier's feature space.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    text_vectorizer: CountVectorizer,
    pos_vectorizer: CountVectorizer,
}

impl FeatureEncoder {
    pub fn new(text_vectorizer: CountVectorizer, pos_vectorizer: CountVectorizer) -> Self {
        Self {
            text_vectorizer,
            pos_vectorizer,
        }
    }

    pub fn text_vectorizer(&self) -> &CountVectorizer {
        &self.text_vectorizer
    }

    pub fn pos_vectorizer(&self) -> &CountVectorizer {
        &self.pos_vectorizer
    }

    /// Width of every combined vector: text vocabulary size plus tag vocabulary size
    pub fn width(&self) -> usize {
        self.text_vectorizer.width() + self.pos_vectorizer.width()
    }

    /// Encodes `text` and its tags.
    ///
    /// The tags are joined with spaces and run through the POS vectorizer the same way its
    /// training documents were, then appended after the text block.
    pub fn encode(&self, text: &str, tags: &[String]) -> Result<EncodedFeatures, ClassifierError> {
        let text_vector = self.text_vectorizer.transform(text)?;
        let tag_vector = self.pos_vectorizer.transform(&tags.join(" "))?;
        let combined = text_vector.hstack(&tag_vector);
        debug!(
            "Encoded {} text and {} tag features into width {}",
            text_vector.nnz(),
            tag_vector.nnz(),
            combined.width()
        );
        Ok(EncodedFeatures {
            text: text_vector,
            tags: tag_vector,
            combined,
        })
    }
}
