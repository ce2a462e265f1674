//! Performance benchmarks for the RGASS CRDT implementation.
//!
//! This module benchmarks various aspects of RGASS including:
//! - Sequential insertions and deletions
//! - Splitting long spans
//! - Concurrent editing across multiple sites
//! - Replaying operation streams
//!
//! Run with: cargo bench

use std::thread;

use crdt_rgass::{Identifier, Operation, Rgass, Site};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tokio::sync::mpsc::Receiver;

fn drain(outbound: &mut Receiver<Operation>) -> Vec<Operation> {
    let mut operations = Vec::new();
    while let Ok(operation) = outbound.try_recv() {
        operations.push(operation);
    }
    operations
}

/// Builds a document by appending `size` words through a site.
///
/// The outbound queue has room for plenty of further edits.
fn typed_document(size: usize) -> (Site, Receiver<Operation>) {
    let (site, outbound) = Site::with_capacity(1, 1, size * 4 + 64);
    let mut len = 0;
    for i in 0..size {
        let word = format!("w{} ", i % 100);
        site.insert(len, &word).unwrap();
        len += word.len();
    }
    (site, outbound)
}

/// Benchmark sequential appends
fn bench_sequential_insertions(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_insertions");

    for size in [100, 500, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("append_words", size), size, |b, &size| {
            b.iter(|| {
                let (site, _) = typed_document(size);
                black_box(site.text())
            });
        });
    }
    group.finish();
}

/// Benchmark inserts that each split one long span
fn bench_splitting_insertions(c: &mut Criterion) {
    let mut group = c.benchmark_group("splitting_insertions");

    for size in [100, 500, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("split_span", size), size, |b, &size| {
            let base: String = "abcdefghij".repeat(size);
            let base_id = Identifier::new(1, 1, 1, base.len());

            b.iter(|| {
                let mut rga = Rgass::new();
                rga.local_insert(rga.head_id(), 0, &base, base_id).unwrap();

                // Walking backwards, every insert lands in the untouched front of the span
                for i in 0..size {
                    let position = base.len() - 10 * i - 5;
                    let (anchor, offset) = rga.insertion_anchor(position).unwrap();
                    let id = Identifier::new(1, i as u64 + 2, 1, 1);
                    rga.local_insert(anchor, offset, "+", id).unwrap();
                }
                black_box(rga.len())
            });
        });
    }
    group.finish();
}

/// Benchmark sequential deletions after insertions
fn bench_sequential_deletions(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_deletions");

    for size in [100, 500, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("delete_front", size), size, |b, &size| {
            b.iter_batched(
                || typed_document(size),
                |(site, _outbound)| {
                    // Delete a few characters from the front until empty
                    let mut len = site.text().chars().count();
                    while len > 0 {
                        site.delete(0, len.min(7)).unwrap();
                        len -= len.min(7);
                    }
                    black_box(site.text())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmark concurrent editing across multiple sites
fn bench_concurrent_sites(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_sites");

    for num_sites in [2u64, 4, 8].iter() {
        let ops_per_site = 100;
        let total_ops = *num_sites as usize * ops_per_site;
        group.throughput(Throughput::Elements(total_ops as u64));
        group.bench_with_input(
            BenchmarkId::new("sites", num_sites),
            num_sites,
            |b, &num_sites| {
                b.iter(|| {
                    let sites: Vec<(Site, Receiver<Operation>)> = (1..=num_sites)
                        .map(|site| Site::with_capacity(1, site, ops_per_site * 2))
                        .collect();

                    // Each site edits on its own thread
                    let batches: Vec<Vec<Operation>> = thread::scope(|scope| {
                        let handles: Vec<_> = sites
                            .into_iter()
                            .map(|(site, mut outbound)| {
                                scope.spawn(move || {
                                    for i in 0..ops_per_site {
                                        let len = site.text().chars().count();
                                        if i % 4 == 3 && len > 2 {
                                            site.delete(len / 2, 2).unwrap();
                                        } else {
                                            site.insert(len / 3, "ab").unwrap();
                                        }
                                    }
                                    drain(&mut outbound)
                                })
                            })
                            .collect();
                        handles
                            .into_iter()
                            .map(|handle| handle.join().unwrap())
                            .collect()
                    });

                    // Replicate everything to one fresh replica
                    let mut replica = Rgass::new();
                    for batch in &batches {
                        for operation in batch {
                            replica.apply(operation).unwrap();
                        }
                    }
                    black_box(replica.len())
                });
            },
        );
    }
    group.finish();
}

/// Benchmark replaying an operation stream
fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    let (site, mut outbound) = typed_document(500);
    site.delete(10, 400).unwrap();
    site.insert(20, "inserted into a split span").unwrap();
    let operations = drain(&mut outbound);

    group.throughput(Throughput::Elements(operations.len() as u64));
    group.bench_function("apply_stream", |b| {
        b.iter(|| {
            let mut replica = Rgass::new();
            for operation in &operations {
                replica.apply(operation).unwrap();
            }
            black_box(replica.text())
        });
    });
    group.finish();
}

/// Benchmark read-side queries
fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let (site, _outbound) = typed_document(1000);
    site.delete(100, 2000).unwrap();
    let rga = site.snapshot();

    group.bench_function("text", |b| b.iter(|| black_box(rga.text())));
    group.bench_function("traverse", |b| b.iter(|| black_box(rga.traverse().count())));
    group.bench_function("insertion_anchor", |b| {
        let middle = rga.len() / 2;
        b.iter(|| black_box(rga.insertion_anchor(middle)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_insertions,
    bench_splitting_insertions,
    bench_sequential_deletions,
    bench_concurrent_sites,
    bench_replay,
    bench_queries
);

criterion_main!(benches);
