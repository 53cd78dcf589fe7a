use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use std::collections::BTreeMap;
use treap_map::TreapMap;

const NUM_OF_OPERATIONS: usize = 1000;

fn seeded_rng() -> rand::XorShiftRng {
    rand::SeedableRng::from_seed([1, 1, 1, 1])
}

fn bench_btreemap_insert(c: &mut Criterion) {
    c.bench_function("bench btreemap insert", |b| {
        b.iter(|| {
            let mut rng = seeded_rng();
            let mut map = BTreeMap::new();
            for _ in 0..NUM_OF_OPERATIONS {
                let key = rng.next_u32();
                let val = rng.next_u32();

                map.insert(key, val);
            }
        })
    });
}

fn bench_btreemap_get(c: &mut Criterion) {
    let mut rng = seeded_rng();
    let mut map = BTreeMap::new();
    let mut keys = Vec::new();
    for _ in 0..NUM_OF_OPERATIONS {
        let key = rng.next_u32();
        let val = rng.next_u32();

        map.insert(key, val);
        keys.push(key);
    }

    c.bench_function("bench btreemap get", move |b| {
        b.iter(|| {
            for key in &keys {
                black_box(map.get(key));
            }
        })
    });
}

fn bench_treap_insert(c: &mut Criterion) {
    c.bench_function("bench treap insert", |b| {
        b.iter(|| {
            let mut rng = seeded_rng();
            let mut map = TreapMap::new();
            for _ in 0..NUM_OF_OPERATIONS {
                let key = rng.next_u32();
                let val = rng.next_u32();

                map.insert(key, val);
            }
        })
    });
}

fn bench_treap_get(c: &mut Criterion) {
    let mut rng = seeded_rng();
    let mut map = TreapMap::new();
    let mut keys = Vec::new();
    for _ in 0..NUM_OF_OPERATIONS {
        let key = rng.next_u32();
        let val = rng.next_u32();

        map.insert(key, val);
        keys.push(key);
    }

    c.bench_function("bench treap get", move |b| {
        b.iter(|| {
            for key in &keys {
                black_box(map.get(key));
            }
        })
    });
}

fn bench_treap_split_join(c: &mut Criterion) {
    c.bench_function("bench treap split join", |b| {
        b.iter(|| {
            let mut map = TreapMap::new();
            for key in 0..NUM_OF_OPERATIONS as u32 {
                map.insert(key, key);
            }
            for threshold in (0..NUM_OF_OPERATIONS as u32).step_by(100) {
                let (mut left, mut right) = map.split(&threshold);
                black_box(left.join(&mut right).is_ok());
                map = left;
            }
        })
    });
}

criterion_group!(
    benches,
    bench_btreemap_get,
    bench_btreemap_insert,
    bench_treap_get,
    bench_treap_insert,
    bench_treap_split_join,
);
criterion_main!(benches);
