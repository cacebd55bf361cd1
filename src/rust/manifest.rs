use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::artifact_manager::ArtifactError;

/// File name of the ONNX flavour of the classifier artifact
pub const ONNX_CLASSIFIER_FILE: &str = "logistic_model.onnx";
/// Directory holding the tagger model files, relative to the artifact directory
pub const TAGGER_DIR: &str = "tagger";

/// The serialized objects the detector needs at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Classifier,
    TextVectorizer,
    PosVectorizer,
    TaggerWeights,
    TaggerTagdict,
    TaggerClasses,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::Classifier,
        ArtifactKind::TextVectorizer,
        ArtifactKind::PosVectorizer,
        ArtifactKind::TaggerWeights,
        ArtifactKind::TaggerTagdict,
        ArtifactKind::TaggerClasses,
    ];

    /// Location of the artifact relative to the artifact directory when the manifest
    /// does not say otherwise
    pub fn default_path(&self) -> &'static str {
        match self {
            Self::Classifier => "logistic_model.json",
            Self::TextVectorizer => "countvectorizer_text.json",
            Self::PosVectorizer => "countvectorizer_pos.json",
            Self::TaggerWeights => "tagger/weights.json",
            Self::TaggerTagdict => "tagger/tagdict.json",
            Self::TaggerClasses => "tagger/classes.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Classifier => "classifier",
            Self::TextVectorizer => "text vectorizer",
            Self::PosVectorizer => "POS vectorizer",
            Self::TaggerWeights => "tagger weights",
            Self::TaggerTagdict => "tagger tag dictionary",
            Self::TaggerClasses => "tagger classes",
        };
        f.write_str(name)
    }
}

/// One artifact file with its expected digest and optional download source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub kind: ArtifactKind,
    /// Path relative to the artifact directory; defaults to [`ArtifactKind::default_path`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Lowercase hex SHA-256 of the file contents
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ArtifactEntry {
    pub fn relative_path(&self) -> &str {
        self.path.as_deref().unwrap_or(self.kind.default_path())
    }
}

/// Describes a released set of artifacts (`manifest.json`).
///
/// ```json
/// {
///   "name": "fake-job-postings",
///   "version": "1",
///   "artifacts": [
///     { "kind": "classifier", "sha256": "…", "url": "https://…/logistic_model.json" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub artifacts: Vec<ArtifactEntry>,
}

impl ArtifactManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
            .map_err(|e| ArtifactError::Manifest(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let manifest: Self =
            serde_json::from_str(json).map_err(|e| ArtifactError::Manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn entry(&self, kind: ArtifactKind) -> Option<&ArtifactEntry> {
        self.artifacts.iter().find(|e| e.kind == kind)
    }

    /// Checks that every kind appears exactly once with a well-formed digest and a path that
    /// stays inside the artifact directory.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let mut seen = HashSet::new();
        for entry in &self.artifacts {
            if !seen.insert(entry.kind) {
                return Err(ArtifactError::Manifest(format!(
                    "Duplicate entry for {}",
                    entry.kind
                )));
            }
            if entry.sha256.len() != 64 || !entry.sha256.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ArtifactError::Manifest(format!(
                    "Invalid sha256 for {}: '{}'",
                    entry.kind, entry.sha256
                )));
            }
            let relative = Path::new(entry.relative_path());
            let escapes = relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if relative.as_os_str().is_empty() || escapes {
                return Err(ArtifactError::Manifest(format!(
                    "Path for {} must be relative to the artifact directory: '{}'",
                    entry.kind,
                    entry.relative_path()
                )));
            }
        }

        if let Some(missing) = ArtifactKind::ALL.iter().find(|k| !seen.contains(*k)) {
            return Err(ArtifactError::Manifest(format!("Missing entry for {}", missing)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    fn manifest_json(extra: &str) -> String {
        let entries: Vec<String> = [
            "classifier",
            "text_vectorizer",
            "pos_vectorizer",
            "tagger_weights",
            "tagger_tagdict",
            "tagger_classes",
        ]
        .iter()
        .map(|kind| format!(r#"{{"kind": "{}", "sha256": "{}"}}"#, kind, HASH))
        .collect();
        format!(
            r#"{{"name": "test", "version": "1", "artifacts": [{}{}]}}"#,
            entries.join(","),
            extra
        )
    }

    #[test]
    fn test_parses_complete_manifest() {
        let manifest = ArtifactManifest::from_json(&manifest_json("")).unwrap();
        assert_eq!(manifest.artifacts.len(), 6);
        let entry = manifest.entry(ArtifactKind::PosVectorizer).unwrap();
        assert_eq!(entry.relative_path(), "countvectorizer_pos.json");
        assert!(entry.url.is_none());
    }

    #[test]
    fn test_rejects_duplicate_kind() {
        let extra = format!(r#",{{"kind": "classifier", "sha256": "{}"}}"#, HASH);
        assert!(matches!(
            ArtifactManifest::from_json(&manifest_json(&extra)),
            Err(ArtifactError::Manifest(_))
        ));
    }

    #[test]
    fn test_rejects_missing_kind() {
        let json = format!(
            r#"{{"name": "test", "artifacts": [{{"kind": "classifier", "sha256": "{}"}}]}}"#,
            HASH
        );
        assert!(ArtifactManifest::from_json(&json).is_err());
    }

    #[test]
    fn test_rejects_escaping_path() {
        let mut manifest = ArtifactManifest::from_json(&manifest_json("")).unwrap();
        manifest.artifacts[0].path = Some("../outside.json".to_string());
        assert!(manifest.validate().is_err());
        manifest.artifacts[0].path = Some("/etc/passwd".to_string());
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_digest() {
        let mut manifest = ArtifactManifest::from_json(&manifest_json("")).unwrap();
        manifest.artifacts[1].sha256 = "abc".to_string();
        assert!(manifest.validate().is_err());
    }
}
