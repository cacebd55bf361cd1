use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::manifest::{ArtifactEntry, ArtifactKind, ArtifactManifest};

/// Environment variable overriding the default artifact directory
pub const ARTIFACTS_ENV: &str = "JOBSCAM_ARTIFACTS";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact missing: {0}")]
    Missing(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid manifest: {0}")]
    Manifest(String),
    #[error("No download URL for {0} and no valid local copy")]
    NoSource(ArtifactKind),
    #[error("Hash mismatch: expected {expected}, got {actual} for {kind}")]
    HashMismatch {
        kind: ArtifactKind,
        expected: String,
        actual: String,
    },
}

/// Locates, verifies and downloads the artifact files described by a manifest.
#[derive(Clone)]
pub struct ArtifactManager {
    artifacts_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ArtifactManager {
    /// Creates an ArtifactManager rooted at the default artifact directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_artifacts_dir())
    }

    /// Returns the default artifact directory path
    pub fn get_default_artifacts_dir() -> PathBuf {
        if let Ok(path) = env::var(ARTIFACTS_ENV) {
            return PathBuf::from(path);
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("jobscam").join("artifacts");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("jobscam").join("artifacts");
        }

        env::temp_dir().join("jobscam").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> io::Result<Self> {
        let artifacts_dir = artifacts_dir.as_ref().to_path_buf();
        fs::create_dir_all(&artifacts_dir)?;
        Ok(Self {
            artifacts_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn path_for(&self, entry: &ArtifactEntry) -> PathBuf {
        self.artifacts_dir.join(entry.relative_path())
    }

    /// True when every file named by the manifest exists, whatever its contents
    pub fn is_present(&self, manifest: &ArtifactManifest) -> bool {
        manifest.artifacts.iter().all(|entry| {
            let path = self.path_for(entry);
            log::debug!("  {} at {:?} (exists: {})", entry.kind, path, path.exists());
            path.exists()
        })
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ArtifactError> {
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Verifying {:?}: {} bytes, sha256 {}", path, bytes.len(), hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash))
    }

    /// Checks every artifact against its manifest digest.
    ///
    /// Returns `Ok(false)` if any file is missing or differs; I/O failures other than a
    /// missing file are errors.
    pub fn verify(&self, manifest: &ArtifactManifest) -> Result<bool, ArtifactError> {
        let mut all_ok = true;
        for entry in &manifest.artifacts {
            let path = self.path_for(entry);
            let ok = path.exists() && self.verify_file(&path, &entry.sha256)?;
            log::info!("  {}: {}", entry.kind, if ok { "ok" } else { "FAILED" });
            all_ok &= ok;
        }
        Ok(all_ok)
    }

    /// Downloads every artifact that is missing or fails verification.
    ///
    /// Files already present with the right digest are left alone. If any artifact cannot be
    /// fetched, the files written by this call are removed again.
    pub async fn download(&self, manifest: &ArtifactManifest) -> Result<(), ArtifactError> {
        let _lock = self.download_lock.lock().await;
        let mut written = Vec::new();

        for entry in &manifest.artifacts {
            let path = self.path_for(entry);
            if path.exists() && self.verify_file(&path, &entry.sha256)? {
                log::info!("{} already present and verified", entry.kind);
                continue;
            }

            let result = match &entry.url {
                Some(url) => {
                    log::info!("Fetching {} from {}", entry.kind, url);
                    self.download_and_verify_file(url, &path, entry).await
                }
                None => Err(ArtifactError::NoSource(entry.kind)),
            };

            match result {
                Ok(()) => written.push(path),
                Err(e) => {
                    log::error!("Failed to set up {}: {}", entry.kind, e);
                    for path in &written {
                        let _ = fs::remove_file(path);
                    }
                    return Err(e);
                }
            }
        }

        log::info!("All {} artifacts ready in {:?}", manifest.artifacts.len(), self.artifacts_dir);
        Ok(())
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        entry: &ArtifactEntry,
    ) -> Result<(), ArtifactError> {
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes for {}", bytes.len(), entry.kind);

        let hash = sha256_hex(&bytes);
        if !hash.eq_ignore_ascii_case(&entry.sha256) {
            return Err(ArtifactError::HashMismatch {
                kind: entry.kind,
                expected: entry.sha256.clone(),
                actual: hash,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;
        Ok(())
    }

    /// Deletes every artifact file named by the manifest
    pub fn remove(&self, manifest: &ArtifactManifest) -> Result<(), ArtifactError> {
        for entry in &manifest.artifacts {
            let path = self.path_for(entry);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Ensures that the artifacts are present and verified, downloading as needed.
    pub async fn ensure_artifacts(&self, manifest: &ArtifactManifest) -> Result<(), ArtifactError> {
        if self.is_present(manifest) && self.verify(manifest)? {
            log::info!("Artifacts verified in {:?}", self.artifacts_dir);
            return Ok(());
        }
        self.download(manifest).await?;
        if !self.verify(manifest)? {
            return Err(ArtifactError::Missing(format!(
                "artifacts in {:?} failed verification after download",
                self.artifacts_dir
            )));
        }
        Ok(())
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
