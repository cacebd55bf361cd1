use std::collections::HashMap;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jobscam::classifier::{CountVectorizer, LogisticRegression, PerceptronTagger, Vocabulary};
use jobscam::{ArtifactStore, FraudDetector};

const SHORT: &str = "Earn easy money from home today";
const MEDIUM: &str = "We are looking for a motivated sales representative to join our growing team. \
     Competitive salary, health insurance and paid leave. Apply with your CV and cover letter.";
const LONG: &str = "URGENT HIRING!!! Work from home and earn up to $5000 per week with no experience needed. \
     Our company is expanding fast and we need data entry assistants immediately. You only need a \
     phone and an internet connection. Pay the small registration fee to receive your starter kit \
     and training materials. Payment is sent daily via wire transfer. Limited positions, contact \
     our recruiter on WhatsApp now and start earning cash tomorrow. Thousands of people have already \
     changed their lives with this opportunity, do not miss out.";

fn setup_detector() -> FraudDetector {
    let words: Vec<String> = LONG
        .split(|c: char| !c.is_alphanumeric())
        .chain(MEDIUM.split(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.len() > 1)
        .map(str::to_lowercase)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    let tags = ["cc", "dt", "in", "jj", "nn", "nns", "prp", "rb", "vb", "vbg", "vbz"];

    let text = CountVectorizer::new(Vocabulary::from_terms(words.iter()).unwrap(), true);
    let pos = CountVectorizer::new(Vocabulary::from_terms(tags).unwrap(), true);
    let width = text.width() + pos.width();
    let coef = (0..width).map(|i| ((i % 7) as f32 - 3.0) * 0.1).collect();
    let classifier = LogisticRegression::new(coef, -0.2).unwrap();

    let weights = HashMap::from([(
        "bias".to_string(),
        HashMap::from([("NN".to_string(), 1.0)]),
    )]);
    let tagdict = HashMap::from([
        ("and".to_string(), "CC".to_string()),
        ("the".to_string(), "DT".to_string()),
        ("with".to_string(), "IN".to_string()),
        ("we".to_string(), "PRP".to_string()),
    ]);
    let classes = tags.iter().map(|t| t.to_uppercase()).collect();
    let tagger = PerceptronTagger::new(weights, tagdict, classes).unwrap();

    let store = ArtifactStore::from_parts(Arc::new(classifier), text, pos, Arc::new(tagger)).unwrap();
    FraudDetector::new(Arc::new(store))
}

fn bench_preprocessing(c: &mut Criterion) {
    let detector = setup_detector();
    let mut group = c.benchmark_group("Preprocessing");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for (name, text) in [("short", SHORT), ("medium", MEDIUM), ("long", LONG)] {
        group.bench_with_input(BenchmarkId::new("tag", name), text, |b, text| {
            b.iter(|| detector.store().preprocessor().tag(black_box(text)).unwrap())
        });
    }
    group.finish();
}

fn bench_handle(c: &mut Criterion) {
    let detector = setup_detector();
    let mut group = c.benchmark_group("Handle");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for (name, text) in [("short", SHORT), ("medium", MEDIUM), ("long", LONG)] {
        group.bench_with_input(BenchmarkId::new("handle", name), text, |b, text| {
            b.iter(|| detector.handle(black_box(text)).unwrap())
        });
    }
    group.bench_function("rejected", |b| {
        b.iter(|| detector.handle(black_box("easy money")).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_preprocessing, bench_handle);
criterion_main!(benches);
