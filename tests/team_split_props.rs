//! Property tests for the team-split algorithm

use pickup_hub::flags::FlagSet;
use pickup_hub::types::Subscriber;
use pickup_hub::PickupQueue;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn queue_with_roster(team_size: u32, coop: bool, joiners: usize) -> PickupQueue {
    let flags = FlagSet {
        coop: Some(coop),
        ..Default::default()
    };
    let mut queue = PickupQueue::new(
        42,
        "prop",
        Subscriber::new(1, "owner"),
        Some(team_size),
        &flags,
    );
    for id in 2..=(joiners as u64 + 1) {
        queue.join(Subscriber::new(id, format!("user{}", id)));
    }
    queue
}

proptest! {
    #[test]
    fn split_is_an_exact_partition(
        team_size in 1u32..=16,
        joiners in 0usize..=40,
        seed in any::<u64>(),
    ) {
        let queue = queue_with_roster(team_size, false, joiners);
        let mut rng = StdRng::seed_from_u64(seed);
        let (red, blue) = queue.partition_subscribers(&mut rng);

        // every subscriber assigned exactly once
        prop_assert_eq!(red.len() + blue.len(), queue.subscribers.len());
        let mut ids: Vec<_> = red.iter().chain(blue.iter()).map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), queue.subscribers.len());

        // sizes differ by at most one, larger half first
        prop_assert!(red.len().abs_diff(blue.len()) <= 1);
        prop_assert!(red.len() >= blue.len());
    }

    #[test]
    fn coop_split_never_produces_a_second_side(
        team_size in 1u32..=16,
        joiners in 0usize..=40,
        seed in any::<u64>(),
    ) {
        let queue = queue_with_roster(team_size, true, joiners);
        let mut rng = StdRng::seed_from_u64(seed);
        let (coop, other) = queue.partition_subscribers(&mut rng);

        prop_assert_eq!(coop.len(), queue.subscribers.len());
        prop_assert!(other.is_empty());
    }

    #[test]
    fn capacity_invariant_survives_any_join_sequence(
        team_size in 1u32..=16,
        coop: bool,
        joiners in 0usize..=64,
    ) {
        let queue = queue_with_roster(team_size, coop, joiners);
        prop_assert!(queue.subscribers.len() as u32 <= queue.max_in_queue());

        let roster_and_waiting = queue.subscribers.len() + queue.waiting_list.len();
        prop_assert_eq!(roster_and_waiting, joiners + 1);
    }
}
