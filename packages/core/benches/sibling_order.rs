//! Benchmarks for sibling ordering and tree mutation
//!
//! Run with: `cargo bench -p mynotes-core`
//!
//! - Placement on densely packed siblings (worst case for renumbering)
//! - Repeated middle inserts through the tree
//! - Write queue throughput with a no-op store

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mynotes_core::operations::{SiblingOrderCalculator, WriteQueue};
use mynotes_core::{NavigationNode, NavigationTree};
use tokio::runtime::Runtime;

/// Place into the middle of `n` consecutive positions
fn bench_dense_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_placement");

    for n in [10usize, 100, 1000] {
        let positions = SiblingOrderCalculator::rebalance(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &positions, |b, positions| {
            b.iter(|| {
                let placement =
                    SiblingOrderCalculator::place(black_box(positions), positions.len() / 2)
                        .unwrap();
                black_box(placement)
            })
        });
    }

    group.finish();
}

/// Keep inserting at the front of one container
fn bench_tree_head_inserts(c: &mut Criterion) {
    c.bench_function("tree_head_inserts_500", |b| {
        b.iter(|| {
            let mut tree = NavigationTree::new(NavigationNode::root());
            let root = tree.root_id();
            for i in 0..500 {
                tree.insert(root, NavigationNode::leaf(format!("list {}", i)), 0)
                    .unwrap();
            }
            black_box(tree.len())
        })
    });
}

/// Alternate inserts between two neighbours so every placement lands in a full gap
fn bench_tree_middle_inserts(c: &mut Criterion) {
    c.bench_function("tree_middle_inserts_500", |b| {
        b.iter(|| {
            let mut tree = NavigationTree::new(NavigationNode::root());
            let root = tree.root_id();
            for i in 0..500 {
                let index = tree.children(root).count() / 2;
                tree.insert(root, NavigationNode::leaf(format!("list {}", i)), index)
                    .unwrap();
            }
            black_box(tree.len())
        })
    });
}

fn bench_write_queue(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("write_queue");
    group.sample_size(20);

    group.bench_function("1000_noop_writes", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let mut total = std::time::Duration::ZERO;
                for _ in 0..iters {
                    let queue = WriteQueue::spawn();
                    let start = std::time::Instant::now();
                    for _ in 0..1000 {
                        drop(queue.submit(|| async { Ok(1) }));
                    }
                    queue.shutdown().await;
                    total += start.elapsed();
                }
                total
            })
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_dense_placement,
    bench_tree_head_inserts,
    bench_tree_middle_inserts,
    bench_write_queue
);
criterion_main!(benches);
