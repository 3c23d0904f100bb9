//! Benchmarks for segmentation strategies and keyword search.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ragloop::KeywordIndex;
use ragloop::chunking::{CharacterChunker, Chunker, RecursiveChunker, TokenChunker};

fn sample_text(size: usize) -> String {
    let sentences = [
        "The customer asked about single sign-on. ",
        "Renewal pricing depends on seat count. ",
        "Audit logs must be retained for a year.\n",
        "Support tickets are answered within a day. ",
        "The pilot ends in March.\n\n",
    ];
    let mut text = String::with_capacity(size);
    let mut i = 0;
    while text.len() < size {
        text.push_str(sentences[i % sentences.len()]);
        i += 1;
    }
    text.truncate(size);
    text
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking");

    for size in [1_000, 10_000, 100_000] {
        let text = sample_text(size);
        let chunkers: [(&str, Box<dyn Chunker>); 3] = [
            (
                "recursive",
                Box::new(RecursiveChunker::new(500, 50).unwrap_or_else(|e| panic!("{e}"))),
            ),
            (
                "character",
                Box::new(CharacterChunker::new(500, 50).unwrap_or_else(|e| panic!("{e}"))),
            ),
            (
                "token",
                Box::new(TokenChunker::new(128, 16).unwrap_or_else(|e| panic!("{e}"))),
            ),
        ];

        group.throughput(Throughput::Bytes(size as u64));
        for (name, chunker) in &chunkers {
            group.bench_with_input(BenchmarkId::new(*name, size), &text, |b, text| {
                b.iter(|| chunker.spans(black_box(text)));
            });
        }
    }

    group.finish();
}

fn bench_keyword_search(c: &mut Criterion) {
    let mut index = KeywordIndex::default();
    for doc in 0..20 {
        index
            .add_document(&format!("doc-{doc}.txt"), &sample_text(20_000))
            .unwrap_or_else(|e| panic!("{e}"));
    }

    c.bench_function("keyword_search", |b| {
        b.iter(|| index.search_terms(black_box("renewal pricing audit"), 3));
    });
}

criterion_group!(benches, bench_strategies, bench_keyword_search);
criterion_main!(benches);
