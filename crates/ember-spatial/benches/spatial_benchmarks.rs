use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ember_spatial::{Aabb, SpatialHash, SpatialHashConfig};

fn populated(count: u32) -> SpatialHash {
    let mut hash = SpatialHash::new(SpatialHashConfig::default());
    for id in 0..count {
        let x = (id % 100) as f32 * 40.0;
        let y = (id / 100) as f32 * 40.0;
        hash.add_dynamic(id, Aabb::new(x, y, 32.0, 32.0));
    }
    hash
}

fn bench_rebuild_dynamic(c: &mut Criterion) {
    let mut hash = SpatialHash::new(SpatialHashConfig::default());
    c.bench_function("rebuild_dynamic_5000", |bencher| {
        bencher.iter(|| {
            hash.clear_dynamic();
            for id in 0..5_000u32 {
                let x = (id % 100) as f32 * 40.0;
                let y = (id / 100) as f32 * 40.0;
                hash.add_dynamic(black_box(id), Aabb::new(x, y, 32.0, 32.0));
            }
        })
    });
}

fn bench_neighbour_query(c: &mut Criterion) {
    let mut hash = populated(5_000);
    let mut out = [0u32; 32];
    c.bench_function("query_neighbours_32", |bencher| {
        bencher.iter(|| black_box(hash.query(Aabb::new(800.0, 800.0, 32.0, 32.0), &mut out)))
    });
}

fn bench_cull_query(c: &mut Criterion) {
    let mut hash = populated(5_000);
    let mut out = vec![0u32; 5_000];
    c.bench_function("query_cull_rect", |bencher| {
        bencher.iter(|| {
            black_box(hash.query(Aabb::new(-256.0, -256.0, 2432.0, 1592.0), &mut out))
        })
    });
}

criterion_group!(
    benches,
    bench_rebuild_dynamic,
    bench_neighbour_query,
    bench_cull_query
);
criterion_main!(benches);
