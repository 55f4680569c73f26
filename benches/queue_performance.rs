//! Benchmarks for the hot paths of queue handling

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pickup_hub::flags::FlagSet;
use pickup_hub::types::Subscriber;
use pickup_hub::PickupQueue;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn full_queue(team_size: u32) -> PickupQueue {
    let mut queue = PickupQueue::new(
        42,
        "bench",
        Subscriber::new(1, "owner"),
        Some(team_size),
        &FlagSet::default(),
    );
    let mut id = 2;
    while queue.subscribers.len() < queue.max_in_queue() as usize {
        queue.join(Subscriber::new(id, format!("user{}", id)));
        id += 1;
    }
    queue
}

fn bench_flag_parsing(c: &mut Criterion) {
    c.bench_function("parse_full_flag_string", |b| {
        b.iter(|| {
            FlagSet::parse(black_box(
                "-coop -rcon -teamsize 8 -host ra3.se -port 27960 -game baseq3 -game cpma",
            ))
        })
    });
}

fn bench_team_split(c: &mut Criterion) {
    let queue = full_queue(16);
    c.bench_function("partition_32_subscribers", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| black_box(queue.partition_subscribers(&mut rng)))
    });
}

fn bench_join_leave_cycle(c: &mut Criterion) {
    c.bench_function("join_leave_cycle", |b| {
        let mut queue = full_queue(8);
        b.iter(|| {
            queue.join(Subscriber::new(9999, "churner"));
            queue.leave(9999);
        })
    });
}

criterion_group!(
    benches,
    bench_flag_parsing,
    bench_team_split,
    bench_join_leave_cycle
);
criterion_main!(benches);
