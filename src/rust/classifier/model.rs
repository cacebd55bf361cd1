use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use ndarray::Array2;
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};
use serde::Deserialize;

use super::error::ClassifierError;
use super::utils::sigmoid;
use super::vectorizer::SparseVector;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Probability at or above which a posting is labelled fraudulent.
pub const DECISION_THRESHOLD: f32 = 0.5;

/// A pre-trained binary probabilistic model over combined feature vectors.
///
/// Label `1` means "fraudulent". Implementations are immutable after loading and must be
/// safe to call from many threads at once.
pub trait BinaryClassifier: Send + Sync + std::fmt::Debug {
    /// Number of features the model was fit on
    fn input_width(&self) -> usize;

    /// Short name of the backing implementation, for diagnostics
    fn kind(&self) -> &'static str;

    /// Probability of the fraudulent class.
    ///
    /// # Errors
    /// - `DimensionMismatch` if `features.width()` differs from `input_width()`
    /// - `ModelError` if the underlying runtime fails
    fn predict_proba(&self, features: &SparseVector) -> Result<f32, ClassifierError>;

    /// Label and fraud probability, with `label == 1` exactly when the probability reaches
    /// [`DECISION_THRESHOLD`].
    fn classify(&self, features: &SparseVector) -> Result<(u8, f32), ClassifierError> {
        let probability = self.predict_proba(features)?.clamp(0.0, 1.0);
        let label = u8::from(probability >= DECISION_THRESHOLD);
        Ok((label, probability))
    }
}

pub(crate) fn check_width(expected: usize, actual: usize) -> Result<(), ClassifierError> {
    if expected != actual {
        return Err(ClassifierError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coefficients {
    Flat(Vec<f32>),
    Matrix(Vec<Vec<f32>>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Intercept {
    Scalar(f32),
    Vector(Vec<f32>),
}

#[derive(Debug, Deserialize)]
struct LogisticArtifact {
    coef: Coefficients,
    intercept: Intercept,
    #[serde(default = "default_classes")]
    classes: Vec<i64>,
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

/// Binary logistic regression evaluated directly over sparse features.
///
/// Reads the JSON export of a fitted model: `coef` (a row or a `1 × n` matrix), `intercept`
/// (a scalar or a one-element list) and `classes`, which must be `[0, 1]`.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coef: Vec<f32>,
    intercept: f32,
}

impl LogisticRegression {
    pub fn new(coef: Vec<f32>, intercept: f32) -> Result<Self, ClassifierError> {
        if coef.is_empty() {
            return Err(ClassifierError::ArtifactLoadError(
                "Logistic model has no coefficients".into(),
            ));
        }
        Ok(Self { coef, intercept })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ClassifierError::ArtifactLoadError(format!(
                "Failed to read classifier {}: {}",
                path.display(),
                e
            ))
        })?;
        let model = Self::from_json(&contents)?;
        info!(
            "Logistic model loaded from {:?} ({} features)",
            path,
            model.coef.len()
        );
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let artifact: LogisticArtifact = serde_json::from_str(json).map_err(|e| {
            ClassifierError::ArtifactLoadError(format!("Invalid classifier JSON: {}", e))
        })?;

        if artifact.classes != [0, 1] {
            return Err(ClassifierError::ArtifactLoadError(format!(
                "Expected binary classes [0, 1], found {:?}",
                artifact.classes
            )));
        }

        let coef = match artifact.coef {
            Coefficients::Flat(row) => row,
            Coefficients::Matrix(mut rows) if rows.len() == 1 => rows.remove(0),
            Coefficients::Matrix(rows) => {
                return Err(ClassifierError::ArtifactLoadError(format!(
                    "Expected a single coefficient row for a binary model, found {}",
                    rows.len()
                )))
            }
        };
        let intercept = match artifact.intercept {
            Intercept::Scalar(b) => b,
            Intercept::Vector(v) if v.len() == 1 => v[0],
            Intercept::Vector(v) => {
                return Err(ClassifierError::ArtifactLoadError(format!(
                    "Expected a single intercept, found {}",
                    v.len()
                )))
            }
        };

        Self::new(coef, intercept)
    }

    /// Linear score before the sigmoid
    pub fn decision_function(&self, features: &SparseVector) -> Result<f32, ClassifierError> {
        check_width(self.coef.len(), features.width())?;
        Ok(features
            .entries()
            .iter()
            .fold(self.intercept, |acc, &(i, x)| acc + self.coef[i] * x))
    }
}

impl BinaryClassifier for LogisticRegression {
    fn input_width(&self) -> usize {
        self.coef.len()
    }

    fn kind(&self) -> &'static str {
        "logistic-json"
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<f32, ClassifierError> {
        Ok(sigmoid(self.decision_function(features)?))
    }
}

/// How a graph output can be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputKind {
    FloatTensor,
    OtherTensor,
    /// Sequences and maps, e.g. a ZipMap probability output
    NonTensor,
}

impl OutputKind {
    fn of(value_type: &ValueType) -> Self {
        match value_type {
            ValueType::Tensor { ty: TensorElementType::Float32, .. } => Self::FloatTensor,
            ValueType::Tensor { .. } => Self::OtherTensor,
            _ => Self::NonTensor,
        }
    }
}

/// Picks the output carrying class probabilities: a float tensor whose name mentions "prob",
/// else the last float tensor.
fn select_probability_output<'a>(
    outputs: impl IntoIterator<Item = (&'a str, OutputKind)>,
) -> Result<String, ClassifierError> {
    let outputs: Vec<(&str, OutputKind)> = outputs.into_iter().collect();
    let tensors: Vec<&str> = outputs
        .iter()
        .filter(|(_, kind)| *kind == OutputKind::FloatTensor)
        .map(|(name, _)| *name)
        .collect();

    tensors
        .iter()
        .find(|name| name.contains("prob"))
        .or_else(|| tensors.last())
        .map(|name| name.to_string())
        .ok_or_else(|| {
            let zipmap = outputs.iter().any(|(_, kind)| *kind == OutputKind::NonTensor);
            ClassifierError::ArtifactLoadError(if zipmap {
                "ONNX classifier has no float tensor output; export it with zipmap disabled".into()
            } else {
                "ONNX classifier declares no float tensor output".into()
            })
        })
}

/// Reads P(fraud) from one row of the probability output: `[p0, p1]`, or `[p]` for a
/// single-column output.
fn fraud_probability(row: &[f32]) -> Result<f32, ClassifierError> {
    match row {
        [p] => Ok(*p),
        [_, p, ..] => Ok(*p),
        [] => Err(ClassifierError::ModelError(
            "Model returned an empty probability tensor".into(),
        )),
    }
}

/// A classifier exported to ONNX and executed with ONNX Runtime.
///
/// The graph must take one `float [batch, width]` input and expose a float tensor of
/// probabilities of shape `[batch, 2]` (a `[batch, 1]` output is read as P(fraud) directly).
/// scikit-learn models converted with skl2onnx need `zipmap=False`, since the default ZipMap
/// output is a sequence of maps rather than a tensor.
#[derive(Debug)]
pub struct OnnxClassifier {
    model_path: String,
    session: Arc<Session>,
    input_name: String,
    probability_output: String,
    input_width: usize,
}

impl OnnxClassifier {
    /// Loads an ONNX classifier.
    ///
    /// `fallback_width` is used when the graph declares a dynamic feature dimension.
    ///
    /// # Errors
    /// - `ArtifactLoadError` if the file is missing or the graph has the wrong shape
    /// - `ArtifactLoadError` if the width is dynamic and no fallback is given
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        config: &RuntimeConfig,
        fallback_width: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ClassifierError::ArtifactLoadError(format!(
                "Classifier file not found: {}",
                path.display()
            )));
        }

        let session = create_session_builder(config)?
            .commit_from_file(path)
            .map_err(|e| {
                ClassifierError::ArtifactLoadError(format!(
                    "Failed to load ONNX classifier {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let input = session.inputs.first().ok_or_else(|| {
            ClassifierError::ArtifactLoadError("ONNX classifier declares no inputs".into())
        })?;
        let declared_width = match &input.input_type {
            ValueType::Tensor { dimensions, .. } => dimensions
                .get(1)
                .copied()
                .filter(|&d| d > 0)
                .map(|d| d as usize),
            _ => None,
        };
        let input_width = declared_width.or(fallback_width).ok_or_else(|| {
            ClassifierError::ArtifactLoadError(
                "ONNX classifier has a dynamic feature dimension and no width was supplied".into(),
            )
        })?;
        let input_name = input.name.clone();

        let probability_output = select_probability_output(
            session
                .outputs
                .iter()
                .map(|o| (o.name.as_str(), OutputKind::of(&o.output_type))),
        )?;

        info!(
            "ONNX classifier loaded from {:?} (input '{}', output '{}', {} features)",
            path, input_name, probability_output, input_width
        );

        Ok(Self {
            model_path: path.to_string_lossy().to_string(),
            session: Arc::new(session),
            input_name,
            probability_output,
            input_width,
        })
    }

}

impl BinaryClassifier for OnnxClassifier {
    fn input_width(&self) -> usize {
        self.input_width
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<f32, ClassifierError> {
        check_width(self.input_width, features.width())?;

        let dense = features.to_dense();
        let input_array = Array2::from_shape_vec((1, self.input_width), dense.to_vec())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self.session.run(input_tensors).map_err(|e| {
            ClassifierError::ModelError(format!("Failed to run model {}: {}", self.model_path, e))
        })?;
        let probabilities = outputs[self.probability_output.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ClassifierError::ModelError(format!("Failed to extract probabilities: {}", e))
            })?;

        let values: Vec<f32> = probabilities.iter().copied().collect();
        let probability = fraud_probability(&values)?;
        debug!("ONNX probability: {:.4}", probability);
        Ok(probability)
    }
}
