//! Agreement under byzantine traffic.
//!
//! A seeded, single-threaded rendition of the live fuzz harness: honest
//! validators run vote → broadcast → insert → tally loops against a shared
//! message pool that byzantine validators pollute with random objects at
//! random times within ±4W of the present. The hold duration exceeds the
//! window so confirmation demands quorum sustained across window
//! generations.

use accord_consensus::{Dag, NodeId, UniformValidators};
use accord_types::{TimePoint, Timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const W: u64 = 50;
const HOLD: u64 = W + 1;
const VALIDATORS: usize = 7;
const STEPS: usize = 40_000;

struct Peer {
    dag: Dag<u16, u32, Timestamp>,
    node: NodeId,
    confirmed: Option<u16>,
    casts: Vec<(u16, Timestamp)>,
    next_vote: Timestamp,
}

impl Peer {
    fn new(window: u64, preference: u16) -> Self {
        let mut dag = Dag::new();
        let root = dag.create(window, 0u16);
        let node = dag.create_with_parents(window, preference, [root]).unwrap();
        Self {
            dag,
            node,
            confirmed: None,
            casts: Vec::new(),
            next_vote: Timestamp::EPOCH,
        }
    }
}

/// Drive the network for up to `STEPS` logical milliseconds.
///
/// `preference` picks each honest peer's starting object; `paced` gates
/// voting on the instant the previous `vote` returned, while unpaced peers
/// call `vote` every turn and lean on the deferral rule instead.
fn run(seed: u64, preference: impl Fn(&mut StdRng, usize) -> u16, paced: bool) -> Vec<Peer> {
    let mut rng = StdRng::seed_from_u64(seed);
    let validators = UniformValidators::new(VALIDATORS);
    let faulty = (VALIDATORS - 1) / 3;

    let mut pool: Vec<(u16, Timestamp, u32)> = Vec::new();
    let mut peers: Vec<Peer> = (0..VALIDATORS)
        .map(|index| Peer::new(W, preference(&mut rng, index)))
        .collect();

    let mut now = 1_000u64;
    for _ in 0..STEPS {
        now += 1;
        let at = Timestamp::from_millis(now);

        let actor = rng.gen_range(0..VALIDATORS);
        if actor < faulty {
            // Byzantine: a random object stamped anywhere within ±4W.
            let warp = rng.gen_range(0..8 * W);
            let stamp = at.rewind(4 * W).advance(warp);
            pool.push((rng.gen_range(0..2u16), stamp, actor as u32));
        } else if !paced || peers[actor].next_vote <= at {
            let peer = &mut peers[actor];
            let node = peer.node;
            let casts = &mut peer.casts;
            let mut cast = |object: &u16, time: Timestamp| {
                pool.push((*object, time, actor as u32));
                casts.push((*object, time));
            };
            peer.next_vote = peer
                .dag
                .vote(node, &mut cast, &validators, at, &mut |_: &u32| {})
                .unwrap();
        }

        // Old traffic ages out of the shared pool.
        let horizon = at.rewind(4 * W);
        pool.retain(|&(_, stamp, _)| stamp >= horizon);
        if pool.is_empty() {
            continue;
        }

        // Every honest peer gossips in one pooled message and re-tallies
        // around it.
        for index in faulty..VALIDATORS {
            let (object, stamp, validator) = pool[rng.gen_range(0..pool.len())];
            let peer = &mut peers[index];
            peer.dag.insert(peer.node, object, stamp, validator).unwrap();

            let mut confirmed = peer.confirmed;
            peer.dag
                .tally(
                    peer.node,
                    stamp.rewind(W).advance(1),
                    stamp.advance(W),
                    &validators,
                    &mut |object: &u16, _| {
                        confirmed.get_or_insert(*object);
                    },
                    &mut |_: &u32| {},
                    HOLD,
                )
                .unwrap();
            peer.confirmed = confirmed;
        }

        if peers[faulty..].iter().all(|peer| peer.confirmed.is_some()) {
            break;
        }
    }
    peers.drain(..faulty);
    peers
}

/// With every honest peer starting on the same object, byzantine weight can
/// never assemble a competing quorum: whoever confirms, confirms that
/// object.
#[test]
fn honest_majority_confirms_one_object() {
    let mut total_confirmed = 0usize;
    for seed in 0..8u64 {
        let honest = run(seed, |_, _| 0, true);
        for peer in &honest {
            if let Some(object) = peer.confirmed {
                assert_eq!(object, 0, "seed {seed} confirmed a byzantine object");
                total_confirmed += 1;
            }
        }
    }
    assert!(total_confirmed > 0, "no confirmation in any seeded run");
}

/// With honest peers split across objects and voting every turn, the
/// deferral rule still spaces out preference changes: a peer never casts a
/// different object within one window of its previous cast.
#[test]
fn split_start_keeps_replacement_spacing() {
    for seed in 0..8u64 {
        let honest = run(seed, |rng, _| rng.gen_range(0..2u16), false);
        for peer in &honest {
            for pair in peer.casts.windows(2) {
                let (previous, at_previous) = pair[0];
                let (current, at_current) = pair[1];
                if previous != current {
                    assert!(
                        at_current.since(at_previous) >= W,
                        "seed {seed} flipped {previous}->{current} after only {}ms",
                        at_current.since(at_previous)
                    );
                }
            }
        }
    }
}
