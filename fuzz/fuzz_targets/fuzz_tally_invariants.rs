#![no_main]

use accord_consensus::{Tally, UniformValidators};
use accord_types::Timestamp;
use libfuzzer_sys::fuzz_target;

// Drive arbitrary rise/fall sequences, including mismatched falls and
// contradicting rises, and check the tally's bookkeeping after every step.
fuzz_target!(|data: &[u8]| {
    let validators = UniformValidators::new(8);
    let mut tally: Tally<u32, u32, Timestamp, u32> = Tally::new();

    for chunk in data.chunks_exact(4) {
        // Keep times away from the epoch default, which means "no open vote".
        let time = Timestamp::from_millis(1 + (chunk[1] & 0x3f) as u64);
        let validator = (chunk[2] % 12) as u32;
        let object = (chunk[3] % 6) as u32;

        if chunk[0] & 1 == 0 {
            tally.rise(time, validator, object, &validators, &mut |_| {});
        } else {
            tally.fall(time, &validator, &object);
        }

        let sum: u32 = tally.totals().values().copied().sum();
        assert_eq!(sum, tally.total());
        let (weight, _) = tally.max();
        assert_eq!(
            weight,
            tally.totals().values().copied().max().unwrap_or(0)
        );
    }

    tally.reset();
    assert!(tally.is_empty());
    assert_eq!(tally.total(), 0);
});
