//! Benchmarks for vibe resolution.
//!
//! Run with: `cargo bench`
//!
//! - `resolve_first_contact`: weighted draw plus one vibe insert
//! - `resolve_replay`: lookup of an existing vibe, no writes
//! - `select_weighted_64`: the pure cumulative walk over 64 options

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;
use vibedb::selection::{draw, select_weighted, total_weight};
use vibedb::{CallerId, Config, NewVibeCheck, NewVibeOption, SyncMode, Timestamp, VibeDB};

const DAY_MS: i64 = 86_400_000;

fn open_with_check(path: &std::path::Path, options: usize) -> VibeDB {
    let config = Config {
        sync_mode: SyncMode::Fast,
        rng_seed: Some(1),
        ..Default::default()
    };
    let db = VibeDB::open(path, config).unwrap();
    let now = Timestamp::now();
    db.create_vibe_check(NewVibeCheck {
        name: "bench".into(),
        start_date: now.plus_millis(-DAY_MS),
        end_date: now.plus_millis(DAY_MS),
        options: (0..options)
            .map(|i| NewVibeOption::new(format!("o{}", i), (i % 5) as u32, i))
            .collect(),
    })
    .unwrap();
    db
}

/// Benchmark resolving for callers never seen before.
fn bench_first_contact(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let db = open_with_check(&dir.path().join("first.db"), 8);

    c.bench_function("resolve_first_contact", |b| {
        b.iter(|| {
            let option = db.resolve("bench", CallerId::new()).unwrap();
            black_box(option);
        });
    });

    db.close().unwrap();
}

/// Benchmark resolving for a caller that already holds a vibe.
fn bench_replay(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let db = open_with_check(&dir.path().join("replay.db"), 8);
    let caller = CallerId::new();
    db.resolve("bench", caller).unwrap();

    c.bench_function("resolve_replay", |b| {
        b.iter(|| {
            let option = db.resolve("bench", black_box(caller)).unwrap();
            black_box(option);
        });
    });

    db.close().unwrap();
}

/// Benchmark the selection walk alone.
fn bench_select(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let db = open_with_check(&dir.path().join("select.db"), 64);
    let check = db.find_active_vibe_check("bench").unwrap().unwrap();
    let mut options = db.storage_for_test().options_for(check.id).unwrap();
    options.sort_by_key(|o| o.position);
    let total = total_weight(&options);
    let mut rng = StdRng::seed_from_u64(9);

    c.bench_function("select_weighted_64", |b| {
        b.iter(|| {
            let r = draw(&mut rng, total).unwrap();
            black_box(select_weighted(&options, r));
        });
    });

    db.close().unwrap();
}

criterion_group!(benches, bench_first_contact, bench_replay, bench_select);
criterion_main!(benches);
