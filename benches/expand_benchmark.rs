//! Performance benchmarks for pattern expansion.
//!
//! Pattern expansion runs once per glob/regex per monitor against the full
//! branch tree, which can hold tens of thousands of paths for large repos.
//!
//! **Run benchmarks:**
//! ```bash
//! cargo bench                      # Run all benchmarks
//! cargo bench -- expand_glob       # Glob expansion only
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lang_monitor::watcher::{expand_pattern, PatternKind};

/// Synthetic tree shaped like a localized project.
fn synthetic_tree(size: usize) -> Vec<String> {
    let locales = ["en", "fr", "de", "ja", "zh-CN", "pt-BR"];
    (0..size)
        .map(|i| match i % 4 {
            0 => format!("locales/{}/module_{i}.json", locales[i % locales.len()]),
            1 => format!("src/components/widget_{i}.ts"),
            2 => format!("docs/{}/page_{i}.md", locales[i % locales.len()]),
            _ => format!("assets/img/icon_{i}.png"),
        })
        .collect()
}

fn bench_expand_glob(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand_glob");

    for size in [1_000, 10_000, 50_000] {
        let tree = synthetic_tree(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &tree, |b, tree| {
            b.iter(|| {
                expand_pattern(black_box(tree), black_box("locales/*.json"), PatternKind::Glob)
            });
        });
    }

    group.finish();
}

fn bench_expand_regex(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand_regex");

    for size in [1_000, 10_000, 50_000] {
        let tree = synthetic_tree(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &tree, |b, tree| {
            b.iter(|| {
                expand_pattern(
                    black_box(tree),
                    black_box(r"^docs/(fr|ja)/.*\.md$"),
                    PatternKind::Regex,
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_expand_glob, bench_expand_regex);
criterion_main!(benches);
