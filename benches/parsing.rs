//! Benchmarks for chart source parsing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use chartpad::chart::{flowchart, mindmap};

fn large_flowchart() -> String {
    let mut source = String::from("graph TD\n");
    for i in 0..200 {
        source.push_str(&format!("N{i}[Step {i}] -->|next| N{}\n", i + 1));
    }
    source
}

fn large_mind_map() -> String {
    let mut source = String::from("# Plan\n");
    for i in 0..40 {
        source.push_str(&format!("## Branch {i}\n"));
        for j in 0..5 {
            source.push_str(&format!("- Item {i}.{j}\n"));
        }
    }
    source
}

fn bench_parse_flowchart(c: &mut Criterion) {
    let simple = "graph TD\nA[Start] --> B{Ready}\nB -->|yes| C[Done]";
    c.bench_function("parse_flowchart_simple", |b| {
        b.iter(|| flowchart::parse(black_box(simple)).unwrap())
    });

    let large = large_flowchart();
    c.bench_function("parse_flowchart_large", |b| {
        b.iter(|| flowchart::parse(black_box(&large)).unwrap())
    });
}

fn bench_parse_mind_map(c: &mut Criterion) {
    let large = large_mind_map();
    c.bench_function("parse_mind_map_large", |b| {
        b.iter(|| mindmap::parse(black_box(&large)).unwrap())
    });
}

criterion_group!(benches, bench_parse_flowchart, bench_parse_mind_map);
criterion_main!(benches);
