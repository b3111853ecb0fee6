use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use gerrit_flow::git::parser::{
    parse_file_list, parse_log_entry, parse_staged_status, FileEntry, FileStatus,
};
use gerrit_flow::status::FileSnapshot;

// Sample git outputs for realistic benchmarking
const SMALL_STAGED: &str = "M\tREADME.md\nA\tsrc/main.rs\nD\told.txt";

const MEDIUM_STAGED: &str = "M\tREADME.md
M\tsrc/main.rs
M\tsrc/lib.rs
A\tsrc/error.rs
D\told_file.rs
R100\tsrc/a.rs\tsrc/b.rs
C075\tsrc/c.rs\tsrc/d.rs
M\tCargo.toml
M\tCargo.lock
M\tdocs/readme.md
T\tscripts/run
U\tsrc/merge.rs
A\tbenches/bench.rs
M\ttests/test.rs
X\tmystery";

fn generate_staged(num_files: usize) -> String {
    let mut output = String::new();
    for i in 0..num_files {
        output.push_str(&format!("M\tsrc/module_{}/file_{}.rs\n", i % 17, i));
    }
    output
}

fn generate_file_list(num_files: usize) -> String {
    let mut output = String::new();
    for i in 0..num_files {
        output.push_str(&format!("src/module_{}/file_{}.rs\n", i % 17, i));
    }
    output
}

const LOG_ENTRY: &str = "commit 9f2c1e0d4b5a6c7d8e9f0a1b2c3d4e5f6a7b8c9d
Author: Test User <test@example.com>
Date:   Mon Oct 19 10:00:00 2026 +0200

    Fix flaky scheduler test

    The retry loop never reset its counter, so a slow first attempt
    consumed the whole budget.

    Change-Id: I0123456789abcdef0123456789abcdef01234567
";

fn bench_parse_staged(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_staged_status");

    group.bench_with_input(
        BenchmarkId::new("small", "3 files"),
        &SMALL_STAGED,
        |b, input| {
            b.iter(|| parse_staged_status(black_box(input)))
        },
    );

    group.bench_with_input(
        BenchmarkId::new("medium", "15 files"),
        &MEDIUM_STAGED,
        |b, input| {
            b.iter(|| parse_staged_status(black_box(input)))
        },
    );

    let large = generate_staged(1000);
    group.bench_with_input(
        BenchmarkId::new("large", "1000 files"),
        &large,
        |b, input| {
            b.iter(|| parse_staged_status(black_box(input)))
        },
    );

    group.finish();
}

fn bench_parse_file_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_file_list");

    for size in [100, 1000, 10000] {
        let listing = generate_file_list(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &listing,
            |b, input| {
                b.iter(|| parse_file_list(black_box(input), FileStatus::Untracked))
            },
        );
    }

    group.finish();
}

fn bench_parse_log_entry(c: &mut Criterion) {
    c.bench_function("parse_log_entry", |b| {
        b.iter(|| parse_log_entry(black_box(LOG_ENTRY)))
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let listing = generate_file_list(1000);
    let staged = generate_staged(1000);
    let mut entries: Vec<FileEntry> = parse_file_list(&listing, FileStatus::Modified);
    entries.extend(parse_staged_status(&staged).unwrap_or_default());

    c.bench_function("snapshot_build_and_filter", |b| {
        b.iter(|| {
            let snapshot = FileSnapshot::from_entries(black_box(entries.clone()));
            snapshot.descriptors(&[FileStatus::Deleted, FileStatus::Modified, FileStatus::Untracked])
        })
    });
}

criterion_group!(
    benches,
    bench_parse_staged,
    bench_parse_file_list,
    bench_parse_log_entry,
    bench_snapshot
);
criterion_main!(benches);
