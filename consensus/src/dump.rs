//! CSV edge dump for offline inspection.
//!
//! One line per `(object, weight)` totals entry in every edge snapshot, in
//! scan order: `time,object,weight`. Entries within a snapshot are sorted by
//! object so two dumps of the same log compare byte-for-byte. Drained
//! entries show up with weight zero, which is what makes "just emptied"
//! instants visible to plotting tools.

use crate::agreement::{Dag, NodeId};
use crate::error::AgreementError;
use crate::tally::Tally;
use accord_types::{Object, TimePoint, ValidatorId, ValidatorSet, Weight};
use std::fmt::Display;
use std::io::Write;

/// Sweep `id`'s entire log and write every edge snapshot to `out`.
pub fn write_edges<O, V, T, W, S, Out>(
    dag: &Dag<O, V, T>,
    id: NodeId,
    validators: &S,
    out: &mut Out,
) -> Result<(), AgreementError>
where
    O: Object + Display,
    V: ValidatorId,
    T: TimePoint + Display,
    W: Weight + Display,
    S: ValidatorSet<Id = V, Weight = W>,
    Out: Write,
{
    let mut tally = Tally::new();
    let mut status = Ok(());
    let mut edge = |time: T, tally: &Tally<O, V, T, W>| {
        if status.is_err() {
            return;
        }
        let mut entries: Vec<_> = tally.totals().iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (object, weight) in entries {
            if let Err(error) = writeln!(out, "{time},{object},{weight}") {
                status = Err(error);
                return;
            }
        }
    };
    dag.scan(
        id,
        &mut tally,
        T::default(),
        T::MAX,
        validators,
        &mut edge,
        &mut |_| {},
    )?;
    status.map_err(AgreementError::from)
}
