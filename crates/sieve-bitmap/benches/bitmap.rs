use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sieve_bitmap::Bitmap;

const UNIVERSE: usize = 300_000;

fn sparse(step: usize) -> Bitmap {
    let mut map = Bitmap::new(UNIVERSE);
    for id in (0..UNIVERSE).step_by(step) {
        map.add(id);
    }
    map
}

fn bench_compose(c: &mut Criterion) {
    let module_excludes = sparse(97);
    let repo_excludes = sparse(13);
    let pkg_excludes = sparse(1001);
    let pkg_includes = sparse(3);

    c.bench_function("compose_considered", |b| {
        b.iter(|| {
            let mut considered = Bitmap::full(UNIVERSE);
            considered.difference_with(black_box(&module_excludes));
            considered.difference_with(black_box(&repo_excludes));
            considered.difference_with(black_box(&pkg_excludes));
            considered.intersect_with(black_box(&pkg_includes));
            black_box(considered.count())
        })
    });
}

fn bench_iter(c: &mut Criterion) {
    let map = sparse(7);
    c.bench_function("iter_ids", |b| {
        b.iter(|| black_box(map.iter().fold(0usize, |acc, id| acc ^ id)))
    });
}

criterion_group!(benches, bench_compose, bench_iter);
criterion_main!(benches);
