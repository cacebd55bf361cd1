use ort::Error as OrtError;
use std::fmt;

/// Represents the different types of errors that can occur while scoring a job posting.
#[derive(Debug)]
pub enum ClassifierError {
    /// One of the serialized artifacts is missing, corrupt or inconsistent with the others
    ArtifactLoadError(String),
    /// Error occurred due to invalid input parameters or builder usage
    ValidationError(String),
    /// Error occurred while tokenizing or tagging the input text
    PreprocessingError(String),
    /// The feature vector width does not match the width the classifier was fit on
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },
    /// Error occurred while running the classifier
    ModelError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArtifactLoadError(msg) => write!(f, "Artifact load error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::PreprocessingError(msg) => write!(f, "Preprocessing error: {}", msg),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "Dimension mismatch: classifier expects {} features, got {}",
                expected, actual
            ),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelError(err.to_string())
    }
}
