//! A thread-safe job-posting fraud detector built on a pre-trained logistic model over
//! word counts and part-of-speech tag counts.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use jobscam::{ArtifactStore, FraudDetector, Outcome};
//! use std::sync::Arc;
//!
//! let store = ArtifactStore::builder()
//!     .with_artifact_dir("artifacts")?
//!     .build()?;
//! let detector = FraudDetector::new(Arc::new(store));
//!
//! match detector.handle("Work from home and earn money fast with no experience required")? {
//!     Outcome::Verdict(verdict) => {
//!         println!("{}", verdict.summary());
//!         println!("Evidence: {}", verdict.evidence_terms.join(", "));
//!     }
//!     Outcome::Rejected(rejection) => println!("{}", rejection.message()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The store is immutable once built and can be shared across threads using `Arc`:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use jobscam::{ArtifactStore, FraudDetector};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let store = Arc::new(ArtifactStore::load("artifacts")?);
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let detector = FraudDetector::new(Arc::clone(&store));
//!     handles.push(thread::spawn(move || {
//!         detector.handle("We are hiring a senior accountant for our Jakarta office").unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
mod runtime;
pub mod artifact_manager;
pub mod manifest;

pub use classifier::{
    ArtifactStore, ArtifactStoreBuilder, BinaryClassifier, ClassifierError, DetectorConfig,
    FraudDetector, Label, Outcome, Rejection, StoreInfo, Verdict,
};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use artifact_manager::{ArtifactManager, ArtifactError};
pub use manifest::{ArtifactKind, ArtifactManifest};

/// Initializes `env_logger`; `RUST_LOG` wins over `default_filter` when set.
pub fn init_logger(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
