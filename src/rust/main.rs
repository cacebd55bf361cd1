use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use jobscam::classifier::EVIDENCE_NOTE;
use jobscam::{
    ArtifactManager, ArtifactManifest, ArtifactStore, DetectorConfig, FraudDetector, Outcome,
};
use log::info;

#[derive(Parser)]
#[command(author, version, about = "Flags fraudulent job postings", long_about = None)]
struct Args {
    /// Log progress (repeat for debug output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one job posting (read from stdin when TEXT is omitted)
    Classify {
        text: Option<String>,
        /// Artifact directory (defaults to the cache directory or $JOBSCAM_ARTIFACTS)
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
        /// Manifest locating each artifact inside the artifact directory
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Number of evidence terms to show
        #[arg(short = 'k', long, default_value_t = jobscam::classifier::DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Download and verify the artifacts listed in a manifest
    Fetch {
        #[arg(short, long)]
        manifest: PathBuf,
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
        /// Remove existing artifact files before downloading
        #[arg(short, long)]
        fresh: bool,
    },
    /// Check local artifacts against a manifest
    Verify {
        #[arg(short, long)]
        manifest: PathBuf,
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },
    /// Show what a loaded artifact store contains
    Info {
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn artifacts_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(ArtifactManager::get_default_artifacts_dir)
}

fn load_store(dir: &Path, manifest: Option<&Path>) -> Result<ArtifactStore> {
    let start = Instant::now();
    let store = match manifest {
        Some(path) => {
            let manifest = load_manifest(path)?;
            ArtifactStore::builder()
                .with_manifest(dir, &manifest)
                .and_then(|builder| builder.build())
        }
        None => ArtifactStore::load(dir),
    }
    .with_context(|| format!("failed to load artifacts from {}", dir.display()))?;
    info!("Artifacts loaded in {:.2?}", start.elapsed());
    Ok(store)
}

fn load_manifest(path: &Path) -> Result<ArtifactManifest> {
    ArtifactManifest::from_file(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))
}

fn read_input(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read posting from stdin")?;
            Ok(buffer)
        }
    }
}

fn classify(text: String, dir: &Path, manifest: Option<&Path>, top_k: usize) -> Result<()> {
    let store = Arc::new(load_store(dir, manifest)?);
    let config = DetectorConfig {
        top_k,
        ..DetectorConfig::default()
    };
    let detector = FraudDetector::new(store).with_config(config);

    let start = Instant::now();
    match detector.handle(&text)? {
        Outcome::Verdict(verdict) => {
            info!("Classified in {:.2?}", start.elapsed());
            println!("{}", verdict.summary());
            println!();
            println!("Probabilitas:");
            for (label, probability) in verdict.probability_bars() {
                let width = (probability * 40.0).round() as usize;
                println!("  {:<6} {:<40} {:>6.2}%", label, "#".repeat(width), probability * 100.0);
            }
            if let Some(terms) = verdict.fraud_evidence() {
                println!();
                println!("Kenapa terdeteksi palsu?");
                println!("Iklan ini diklasifikasikan sebagai palsu karena mengandung kata-kata seperti:");
                for term in terms {
                    println!("  - {}", term);
                }
                println!();
                println!("{}", EVIDENCE_NOTE);
            }
        }
        Outcome::Rejected(rejection) => {
            eprintln!("Peringatan: {}", rejection.message());
        }
    }
    Ok(())
}

async fn fetch(manifest_path: &Path, dir: PathBuf, fresh: bool) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let manager = ArtifactManager::new(&dir)
        .with_context(|| format!("cannot create artifact directory {}", dir.display()))?;

    if fresh {
        info!("Fresh download requested - removing any existing artifact files...");
        manager.remove(&manifest)?;
    }

    manager.ensure_artifacts(&manifest).await?;
    println!(
        "{} {} ready in {}",
        manifest.name,
        manifest.version,
        manager.artifacts_dir().display()
    );
    Ok(())
}

fn verify(manifest_path: &Path, dir: PathBuf) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let manager = ArtifactManager::new(&dir)?;
    if !manager.verify(&manifest)? {
        bail!("artifacts in {} do not match {}", dir.display(), manifest_path.display());
    }
    println!("All {} artifacts verified", manifest.artifacts.len());
    Ok(())
}

fn show_info(dir: &Path, manifest: Option<&Path>) -> Result<()> {
    let info = load_store(dir, manifest)?.info();
    println!("Artifact directory:  {}", info.artifact_dir.as_deref().unwrap_or("-"));
    println!("Classifier:          {}", info.classifier_kind);
    println!("Feature width:       {}", info.feature_width);
    println!("Text vocabulary:     {}", info.text_vocabulary_size);
    println!("POS tag vocabulary:  {}", info.tag_vocabulary_size);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    jobscam::init_logger(log_level(args.verbose));

    match args.command {
        Command::Classify { text, artifacts, manifest, top_k } => {
            let text = read_input(text)?;
            classify(text, &artifacts_dir(artifacts), manifest.as_deref(), top_k)
        }
        Command::Fetch { manifest, artifacts, fresh } => {
            fetch(&manifest, artifacts_dir(artifacts), fresh).await
        }
        Command::Verify { manifest, artifacts } => verify(&manifest, artifacts_dir(artifacts)),
        Command::Info { artifacts, manifest } => {
            show_info(&artifacts_dir(artifacts), manifest.as_deref())
        }
    }
}
