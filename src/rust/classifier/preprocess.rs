use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

use super::error::ClassifierError;

/// Splits text into runs of word characters and runs of punctuation, dropping whitespace.
///
/// "Earn $500/day!" becomes `["Earn", "$", "500", "/", "day", "!"]`. The count vectorizers
/// analyze text this way; the tagger input goes through [`WordTokenizer`] instead.
pub(crate) fn split_words(text: &str) -> Result<Vec<String>, ClassifierError> {
    let mut pretokenized = PreTokenizedString::from(text);
    Whitespace::default()
        .pre_tokenize(&mut pretokenized)
        .map_err(|e| ClassifierError::PreprocessingError(format!("Failed to split text: {}", e)))?;

    Ok(pretokenized
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(word, _, _)| word.to_string())
        .collect())
}

// Applied in order to each sentence before it is padded with spaces.
const PUNCTUATION_RULES: &[(&str, &str)] = &[
    // opening quotes
    (r"([«“‘„]|`+)", " ${1} "),
    (r#"^""#, "``"),
    (r"(``)", " ${1} "),
    (r#"([ (\[{<])("|'')"#, "${1} `` "),
    // punctuation
    (r#"([^.])(\.)([\])}>"']*)\s*$"#, "${1} ${2} ${3} "),
    (r"([:,])([^\d])", " ${1} ${2}"),
    (r"([:,])$", " ${1} "),
    (r"\.{2,}", " ${0} "),
    (r"[;@#$%&]", " ${0} "),
    (r#"([^.])(\.)([\])}>"']*)\s*$"#, "${1} ${2}${3} "),
    (r"[?!]", " ${0} "),
    (r"([^'])' ", "${1} ' "),
    (r"\*", " ${0} "),
    // brackets and double dashes
    (r"[\]\[(){}<>]", " ${0} "),
    (r"--", " -- "),
];

// Applied after padding: closing quotes, clitics and fused contractions.
const CONTRACTION_RULES: &[(&str, &str)] = &[
    (r"([»”’])", " ${1} "),
    (r"''", " '' "),
    (r#"""#, " '' "),
    (r"\s+", " "),
    (r"([^' ])('[sS]|'[mM]|'[dD]|') ", "${1} ${2} "),
    (r"([^' ])('ll|'LL|'re|'RE|'ve|'VE|n't|N'T) ", "${1} ${2} "),
    (r"(?i)\b(can)(not)\b", " ${1} ${2} "),
    (r"(?i)\b(d)('ye)\b", " ${1} ${2} "),
    (r"(?i)\b(gim)(me)\b", " ${1} ${2} "),
    (r"(?i)\b(gon)(na)\b", " ${1} ${2} "),
    (r"(?i)\b(got)(ta)\b", " ${1} ${2} "),
    (r"(?i)\b(lem)(me)\b", " ${1} ${2} "),
    (r"(?i)\b(more)('n)\b", " ${1} ${2} "),
    (r"(?i)\b(wan)(na)\s", " ${1} ${2} "),
    (r"(?i) ('t)(is)\b", " ${1} ${2} "),
    (r"(?i) ('t)(was)\b", " ${1} ${2} "),
];

#[derive(Debug)]
struct TreebankRules {
    sentence_end: Regex,
    punctuation: Vec<(Regex, &'static str)>,
    contractions: Vec<(Regex, &'static str)>,
}

impl TreebankRules {
    fn compile() -> Result<Self, String> {
        Ok(Self {
            sentence_end: Regex::new(r#"[.?!]+["')\]]*\s+"#).map_err(|e| e.to_string())?,
            punctuation: compile_rules(PUNCTUATION_RULES)?,
            contractions: compile_rules(CONTRACTION_RULES)?,
        })
    }

    /// Splits after terminal punctuation that is followed by a capitalized word or a digit.
    fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for boundary in self.sentence_end.find_iter(text) {
            let opens_sentence = text[boundary.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit());
            if opens_sentence {
                sentences.push(text[start..boundary.end()].trim());
                start = boundary.end();
            }
        }
        sentences.push(text[start..].trim());
        sentences.retain(|s| !s.is_empty());
        sentences
    }

    fn tokenize_sentence(&self, sentence: &str) -> Vec<String> {
        let mut text = sentence.to_string();
        for (rule, replacement) in &self.punctuation {
            text = rule.replace_all(&text, *replacement).into_owned();
        }
        text = format!(" {} ", text);
        for (rule, replacement) in &self.contractions {
            text = rule.replace_all(&text, *replacement).into_owned();
        }
        text.split_whitespace().map(str::to_string).collect()
    }
}

fn compile_rules(rules: &[(&str, &'static str)]) -> Result<Vec<(Regex, &'static str)>, String> {
    rules
        .iter()
        .map(|&(pattern, replacement)| {
            Regex::new(pattern)
                .map(|re| (re, replacement))
                .map_err(|e| format!("Invalid tokenizer rule {:?}: {}", pattern, e))
        })
        .collect()
}

fn treebank_rules() -> Result<&'static TreebankRules, ClassifierError> {
    static RULES: OnceLock<Result<TreebankRules, String>> = OnceLock::new();
    RULES
        .get_or_init(TreebankRules::compile)
        .as_ref()
        .map_err(|e| ClassifierError::PreprocessingError(e.clone()))
}

/// Penn Treebank style word tokenizer feeding the part-of-speech tagger.
///
/// Splits sentence-final periods, most punctuation and clitics (`don't` → `do n't`), while
/// hyphenated words and comma-grouped numbers stay whole, matching the tokens the tagger and
/// the POS vectorizer were trained on.
#[derive(Debug, Clone, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    pub fn new() -> Self {
        Self
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<String>, ClassifierError> {
        let rules = treebank_rules()?;
        Ok(rules
            .sentences(text)
            .into_iter()
            .flat_map(|sentence| rules.tokenize_sentence(sentence))
            .collect())
    }
}

/// Assigns one part-of-speech tag to each token.
///
/// Implementations must be deterministic and must use the tagset the POS vectorizer was
/// fitted on; the rest of the pipeline treats the tagger as a black box.
pub trait PosTagger: Send + Sync + std::fmt::Debug {
    fn tag(&self, tokens: &[String]) -> Result<Vec<String>, ClassifierError>;
}

/// Tokenizer plus tagger: text in, tag sequence out.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    tokenizer: WordTokenizer,
    tagger: Arc<dyn PosTagger>,
}

impl Preprocessor {
    pub fn new(tagger: Arc<dyn PosTagger>) -> Self {
        Self {
            tokenizer: WordTokenizer::new(),
            tagger,
        }
    }

    /// Tokenizes and tags `text`.
    ///
    /// # Errors
    /// - `PreprocessingError` if the text is empty after trimming
    /// - `PreprocessingError` if tokenization fails
    /// - `PreprocessingError` if the tagger returns a sequence of the wrong length
    /// - Any error reported by the tagger itself
    pub fn tag(&self, text: &str) -> Result<Vec<String>, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::PreprocessingError(
                "Cannot tag empty text".into(),
            ));
        }

        let tokens = self.tokenizer.tokenize(text)?;
        let tags = self.tagger.tag(&tokens)?;
        if tags.len() != tokens.len() {
            return Err(ClassifierError::PreprocessingError(format!(
                "Tagger returned {} tags for {} tokens",
                tags.len(),
                tokens.len()
            )));
        }
        Ok(tags)
    }
}
