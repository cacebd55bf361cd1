use std::fmt;

/// Shown under the evidence words of a fraudulent verdict
pub const EVIDENCE_NOTE: &str = "Kata-kata tersebut sering muncul pada iklan palsu berdasarkan pelatihan model, \
seperti janji gaji besar tanpa detail, promosi cepat, atau permintaan transfer uang.";

/// The two classes of the detector, named the way the dashboard shows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// Class 0, "Asli"
    Genuine,
    /// Class 1, "Palsu"
    Fraudulent,
}

impl Label {
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            Self::Fraudulent
        } else {
            Self::Genuine
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Genuine => "Asli",
            Self::Fraudulent => "Palsu",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Result of scoring one job posting.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub label: Label,
    /// Probability of the fraudulent class, in `[0, 1]`
    pub probability: f32,
    /// Up to `top_k` input words, most frequent first
    pub evidence_terms: Vec<String>,
}

impl Verdict {
    /// Probability of the predicted label: P(fraud) for "Palsu", 1 − P(fraud) for "Asli"
    pub fn confidence(&self) -> f32 {
        match self.label {
            Label::Fraudulent => self.probability,
            Label::Genuine => 1.0 - self.probability,
        }
    }

    /// One-line verdict, e.g. `Ini kemungkinan PALSU (87.12%)`
    pub fn summary(&self) -> String {
        format!(
            "Ini kemungkinan {} ({:.2}%)",
            self.label.as_str().to_uppercase(),
            self.confidence() * 100.0
        )
    }

    /// Evidence to show the user. Only a fraudulent verdict is explained.
    pub fn fraud_evidence(&self) -> Option<&[String]> {
        match self.label {
            Label::Fraudulent => Some(self.evidence_terms.as_slice()),
            Label::Genuine => None,
        }
    }

    /// Per-class probabilities in display order: `[("Palsu", p), ("Asli", 1 - p)]`
    pub fn probability_bars(&self) -> [(Label, f32); 2] {
        [
            (Label::Fraudulent, self.probability),
            (Label::Genuine, 1.0 - self.probability),
        ]
    }
}

/// Input refused before scoring because it is too short to analyse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub word_count: usize,
    pub min_words: usize,
}

impl Rejection {
    /// The warning shown to the user
    pub fn message(&self) -> String {
        format!(
            "Input harus terdiri dari setidaknya {} kata agar model dapat melakukan analisis yang akurat.",
            self.min_words
        )
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} kata diberikan)", self.message(), self.word_count)
    }
}

/// What a classification request produces when it does not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Verdict(Verdict),
    Rejected(Rejection),
}

impl Outcome {
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Self::Verdict(v) => Some(v),
            Self::Rejected(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(label: Label, probability: f32) -> Verdict {
        Verdict {
            label,
            probability,
            evidence_terms: vec![],
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Label::from_class(1), Label::Fraudulent);
        assert_eq!(Label::from_class(0), Label::Genuine);
        assert_eq!(Label::Fraudulent.to_string(), "Palsu");
        assert_eq!(format!("[{:<6}]", Label::Genuine), "[Asli  ]");
    }

    #[test]
    fn test_summary_uses_confidence_of_predicted_label() {
        assert_eq!(
            verdict(Label::Fraudulent, 0.875).summary(),
            "Ini kemungkinan PALSU (87.50%)"
        );
        assert_eq!(
            verdict(Label::Genuine, 0.25).summary(),
            "Ini kemungkinan ASLI (75.00%)"
        );
    }

    #[test]
    fn test_only_fraud_is_explained() {
        let mut fraud = verdict(Label::Fraudulent, 0.9);
        fraud.evidence_terms = vec!["cash".to_string(), "transfer".to_string()];
        assert_eq!(fraud.fraud_evidence(), Some(&fraud.evidence_terms[..]));

        let mut genuine = verdict(Label::Genuine, 0.1);
        genuine.evidence_terms = vec!["engineer".to_string()];
        assert_eq!(genuine.fraud_evidence(), None);
        assert!(EVIDENCE_NOTE.contains("permintaan transfer uang"));
    }

    #[test]
    fn test_probability_bars_sum_to_one() {
        let bars = verdict(Label::Genuine, 0.125).probability_bars();
        assert_eq!(bars[0], (Label::Fraudulent, 0.125));
        assert_eq!(bars[1], (Label::Genuine, 0.875));
    }

    #[test]
    fn test_rejection_message() {
        let rejection = Rejection { word_count: 2, min_words: 5 };
        assert!(rejection.message().contains("setidaknya 5 kata"));
        assert!(rejection.to_string().contains("2 kata diberikan"));
    }
}
