use criterion::{criterion_group, criterion_main, Criterion};
use std::collections::HashSet;
use tempest_core::tokenizer::tokenize;
use tempest_core::{Document, TermMatrix};

const VOCAB: &[&str] = &[
    "storm", "flood", "drought", "blizzard", "heat", "wind", "hail", "ice", "rain", "snow",
    "avalanche", "tornado", "hurricane", "wildfire", "surge",
];

fn synthetic_corpus(num_docs: usize, words_per_doc: usize) -> Vec<Document> {
    (0..num_docs)
        .map(|i| {
            let mut text = String::new();
            for j in 0..words_per_doc {
                text.push_str(VOCAB[(i * 7 + j * 13) % VOCAB.len()]);
                text.push(' ');
            }
            Document {
                url: format!("https://example.org/{i}"),
                title: format!("Article {i}"),
                text,
            }
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let text = synthetic_corpus(1, 2000).remove(0).text;
    c.bench_function("tokenize_article", |b| b.iter(|| tokenize(&text)));
}

fn bench_build(c: &mut Criterion) {
    let docs = synthetic_corpus(200, 300);
    c.bench_function("build_term_matrix", |b| {
        b.iter(|| TermMatrix::build(&docs, HashSet::new()))
    });
}

criterion_group!(benches, bench_tokenize, bench_build);
criterion_main!(benches);
