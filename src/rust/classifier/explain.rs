use super::vectorizer::{SparseVector, Vocabulary};

/// Number of evidence terms shown with a verdict.
pub const DEFAULT_TOP_K: usize = 5;

/// Picks the `k` most frequent vocabulary terms of the input as illustrative evidence.
///
/// Terms are ranked by count, highest first; equal counts are ordered alphabetically so the
/// result never depends on vocabulary index order. Only terms that actually occur are
/// returned, so the result may be shorter than `k` (or empty for all out-of-vocabulary input).
///
/// This is word presence, not feature attribution: model coefficients play no part.
pub fn explain(text_vector: &SparseVector, vocabulary: &Vocabulary, k: usize) -> Vec<String> {
    let mut ranked: Vec<(&str, f32)> = text_vector
        .entries()
        .iter()
        .filter(|&&(_, count)| count > 0.0)
        .filter_map(|&(index, count)| vocabulary.term(index).map(|term| (term, count)))
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(k)
        .map(|(term, _)| term.to_string())
        .collect()
}
