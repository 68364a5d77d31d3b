//! Criterion microbenches for pentoref parsing and alignment.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - TextGrid parsing (from_textgrid_str)
//! - Overlap resolution over a dense recording (Resolver::find)
//! - Assembling a generic corpus (assemble_corpus)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use pentoref::assemble::{assemble_corpus, AssembleOptions, Variant};
use pentoref::diagnostics::DiagnosticLog;
use pentoref::index::{IntervalIndex, SceneSources};
use pentoref::ir::io_textgrid::from_textgrid_str;
use pentoref::ir::{Interval, Recording, Tier};
use pentoref::resolve::Resolver;

/// A short-format TextGrid with an episode tier and `n` utterances.
fn textgrid_fixture(n: usize) -> String {
    let end = n as f64;
    let mut out = format!(
        "File type = \"ooTextFile\"\nObject class = \"TextGrid\"\n\n0\n{end}\n<exists>\n2\n\
         \"IntervalTier\"\n\"Episode\"\n0\n{end}\n1\n0\n{end}\n\"1\"\n\
         \"IntervalTier\"\n\"A-utts\"\n0\n{end}\n{n}\n"
    );
    for i in 0..n {
        out.push_str(&format!("{}\n{}\n\"nimm das rote Kreuz\"\n", i, i as f64 + 0.8));
    }
    out
}

/// A recording whose tiers all have `n` evenly spaced intervals.
fn dense_recording(name: &str, n: usize) -> Recording {
    let tier = |tier: &str, offset: f64, text: &str| {
        Tier::new(
            tier,
            (0..n)
                .map(|i| Interval::new(i as f64 + offset, i as f64 + offset + 0.9, text))
                .collect(),
        )
    };
    Recording::new(
        name,
        vec![
            Tier::new("Episode", vec![Interval::new(0.0, n as f64 + 1.0, "1")]),
            tier("A-utts", 0.0, "nimm {F aeh} das <rel>rechts</rel> Teil"),
            tier("A-dialogue-acts", 0.3, "instruct"),
            tier("Roles", 0.6, "A instructor, B follower"),
        ],
    )
}

fn bench_textgrid_parse(c: &mut Criterion) {
    let fixture = textgrid_fixture(500);
    let mut group = c.benchmark_group("textgrid_parse");
    group.throughput(Throughput::Bytes(fixture.len() as u64));

    group.bench_function("from_textgrid_str", |b| {
        b.iter(|| {
            let tiers = from_textgrid_str(black_box(&fixture)).unwrap();
            black_box(tiers)
        })
    });

    group.finish();
}

/// Benchmark resolving every utterance of a dense recording.
fn bench_resolver(c: &mut Criterion) {
    let recording = dense_recording("r1", 500);
    let resolver = Resolver::default();
    let queries = recording.intervals("A-utts");

    let mut group = c.benchmark_group("resolver");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("find", |b| {
        b.iter(|| {
            let mut log = DiagnosticLog::new();
            for query in queries {
                black_box(resolver.find(&recording, black_box(query), &mut log));
            }
            black_box(log)
        })
    });

    group.finish();
}

fn bench_assemble(c: &mut Criterion) {
    let index =
        IntervalIndex::from_recordings((0..4).map(|i| dense_recording(&format!("r{i}"), 250)));
    let sources = SceneSources::default();
    let resolver = Resolver::default();

    let mut group = c.benchmark_group("assemble");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("generic_corpus", |b| {
        b.iter(|| {
            let mut log = DiagnosticLog::new();
            let records = assemble_corpus(
                Variant::Generic,
                black_box(&index),
                &sources,
                AssembleOptions::new(&resolver),
                &mut log,
            );
            black_box(records)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_textgrid_parse, bench_resolver, bench_assemble);
criterion_main!(benches);
