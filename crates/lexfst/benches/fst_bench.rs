// Criterion benchmarks for lexfst.
//
// Uses a synthetic sorted term list, so no external data is needed.
//
// Run:
//   cargo bench -p lexfst

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lexfst::builder::{BuilderOptions, FstBuilder};
use lexfst::enumerator::BytesFstEnum;
use lexfst::outputs::PositiveIntOutputs;
use lexfst::{Fst, InputType};

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// Sorted, deduplicated pseudo-words with shared prefixes and suffixes.
fn terms(count: usize) -> Vec<Vec<u8>> {
    let suffixes: [&[u8]; 6] = [b"", b"s", b"ed", b"ing", b"er", b"ness"];
    let mut state = 0x2545f4914f6cdd1du64;
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let len = 3 + (state % 6) as usize;
        let mut word: Vec<u8> = (0..len).map(|i| b'a' + ((state >> (i * 5)) % 26) as u8).collect();
        word.extend_from_slice(suffixes[(state >> 50) as usize % suffixes.len()]);
        out.push(word);
    }
    out.sort();
    out.dedup();
    out
}

fn build(terms: &[Vec<u8>], options: BuilderOptions) -> Fst<PositiveIntOutputs> {
    let mut b = FstBuilder::with_options(InputType::Byte1, PositiveIntOutputs, options)
        .expect("valid options");
    for (ord, t) in terms.iter().enumerate() {
        b.add_bytes(t, ord as u64).expect("sorted input");
    }
    b.finish().expect("build").expect("non-empty")
}

fn layouts() -> [(&'static str, BuilderOptions); 3] {
    [
        ("default", BuilderOptions::default()),
        (
            "binary_search",
            BuilderOptions {
                direct_addressing_max_oversizing_factor: -1.0,
                ..BuilderOptions::default()
            },
        ),
        (
            "linear",
            BuilderOptions {
                allow_fixed_length_arcs: false,
                ..BuilderOptions::default()
            },
        ),
    ]
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Build an FST from 50k sorted terms.
fn bench_build(c: &mut Criterion) {
    let terms = terms(50_000);
    let mut group = c.benchmark_group("build_50k");
    group.sample_size(20);
    for (name, options) in layouts() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &options, |b, options| {
            b.iter(|| std::hint::black_box(build(&terms, options.clone())));
        });
    }
    group.finish();
}

/// Exact lookups of every 10th term.
fn bench_get(c: &mut Criterion) {
    let terms = terms(50_000);
    let mut group = c.benchmark_group("get_5k");
    for (name, options) in layouts() {
        let fst = build(&terms, options);
        group.bench_function(name, |b| {
            b.iter(|| {
                for t in terms.iter().step_by(10) {
                    std::hint::black_box(fst.get_bytes(t).expect("lookup"));
                }
            });
        });
    }
    group.finish();
}

/// Ceiling seeks with one reused enumerator.
fn bench_seek_ceil(c: &mut Criterion) {
    let terms = terms(50_000);
    let targets: Vec<Vec<u8>> = terms
        .iter()
        .step_by(10)
        .map(|t| {
            let mut p = t.clone();
            p.push(b'm');
            p
        })
        .collect();
    let mut group = c.benchmark_group("seek_ceil_5k");
    for (name, options) in layouts() {
        let fst = build(&terms, options);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut e = BytesFstEnum::new(&fst);
                for p in &targets {
                    std::hint::black_box(e.seek_ceil(p).expect("seek").map(|io| *io.output));
                }
            });
        });
    }
    group.finish();
}

/// Full in-order walk.
fn bench_iterate(c: &mut Criterion) {
    let fst = build(&terms(50_000), BuilderOptions::default());
    c.bench_function("iterate_50k", |b| {
        b.iter(|| {
            let mut e = BytesFstEnum::new(&fst);
            let mut n = 0usize;
            while e.next().expect("next").is_some() {
                n += 1;
            }
            std::hint::black_box(n)
        });
    });
}

criterion_group!(benches, bench_build, bench_get, bench_seek_ceil, bench_iterate);
criterion_main!(benches);
