#![no_main]

use accord_consensus::{Dag, Tally, UniformValidators};
use accord_types::{TimePoint, Timestamp};
use libfuzzer_sys::fuzz_target;

// Build an arbitrary out-of-order vote log and sweep it end to end: edge
// callbacks must fire in non-decreasing time order with consistent totals,
// and nothing may panic no matter how votes collide.
fuzz_target!(|data: &[u8]| {
    let validators = UniformValidators::new(8);
    let mut dag: Dag<u32, u32, Timestamp> = Dag::new();
    let node = dag.create(50, 0u32);

    for chunk in data.chunks_exact(3) {
        let time = Timestamp::from_millis(1000 + chunk[0] as u64);
        dag.insert(node, (chunk[2] % 6) as u32, time, (chunk[1] % 12) as u32)
            .unwrap();
    }

    let mut tally = Tally::new();
    let mut last: Option<Timestamp> = None;
    dag.scan(
        node,
        &mut tally,
        Timestamp::EPOCH,
        Timestamp::MAX,
        &validators,
        &mut |time, tally: &Tally<u32, u32, Timestamp, u32>| {
            if let Some(previous) = last {
                assert!(previous <= time);
            }
            last = Some(time);
            let sum: u32 = tally.totals().values().copied().sum();
            assert_eq!(sum, tally.total());
        },
        &mut |_| {},
    )
    .unwrap();

    // A full sweep drains every open slot.
    assert!(tally.is_empty());
});
