//! Agreement nodes and the dependency DAG that owns them.
//!
//! An [`Agreement`] node owns a vote log, a set of parent references, a
//! current preferred object, and the instant it was last marked. Nodes live
//! in a [`Dag`] arena and are addressed by [`NodeId`]; parents must exist
//! before a child is created and parent sets are never extended afterwards,
//! so the graph is acyclic by construction.
//!
//! Two rules govern the DAG:
//!
//! - **Confirmation** ([`Dag::tally`]) — an object is confirmed once it
//!   holds quorum across consecutive edges for at least the hold duration.
//!   A confirmed node detaches from its ancestors; it no longer depends on
//!   them for stability.
//! - **Replacement** ([`Dag::vote`]) — a node adopts the window's plurality
//!   as its new preference only when every ancestor's last mark is at least
//!   one window old. Marking on every cast vote is what makes the spacing
//!   rule bite: a chain of agreements cannot churn faster than the window.
//!
//! Nodes are reference counted: the creator's handle counts for one, each
//! child's parent reference for one more. Dropping the last reference
//! removes the node and cascades to its ancestors, mirroring a shared-
//! pointer parent graph without interior mutability.

use crate::error::AgreementError;
use crate::log::VoteLog;
use crate::scanner;
use crate::tally::Tally;
use accord_types::{Clock, Object, TimePoint, ValidatorId, ValidatorSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Stable handle to an agreement node within a [`Dag`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One agreement node.
#[derive(Clone, Debug)]
pub struct Agreement<O, V, T: TimePoint> {
    window: T::Span,
    votes: VoteLog<O, V, T>,
    parents: HashSet<NodeId>,
    preferred: O,
    marked_at: T,
    refs: usize,
}

impl<O: Object, V: ValidatorId, T: TimePoint> Agreement<O, V, T> {
    fn new(window: T::Span, object: O, parents: HashSet<NodeId>) -> Self {
        Self {
            window,
            votes: VoteLog::new(),
            parents,
            preferred: object,
            marked_at: T::default(),
            refs: 1,
        }
    }

    /// The sliding-window width fixed at construction.
    pub fn window(&self) -> T::Span {
        self.window
    }

    /// The object this node currently prefers.
    pub fn preferred(&self) -> &O {
        &self.preferred
    }

    /// When this node was last marked by a cast vote or a descendant's;
    /// the epoch default if never.
    pub fn marked_at(&self) -> T {
        self.marked_at
    }

    pub fn parents(&self) -> &HashSet<NodeId> {
        &self.parents
    }

    pub fn votes(&self) -> &VoteLog<O, V, T> {
        &self.votes
    }

    /// Outstanding references: the creator's handle plus one per child.
    pub fn ref_count(&self) -> usize {
        self.refs
    }
}

/// Arena of agreement nodes forming a DAG of dependencies.
///
/// All operations are synchronous and single-threaded; a DAG shared across
/// threads needs external serialisation around the whole `Dag` value.
#[derive(Clone, Debug)]
pub struct Dag<O, V, T: TimePoint> {
    nodes: HashMap<NodeId, Agreement<O, V, T>>,
    next: u64,
}

impl<O: Object, V: ValidatorId, T: TimePoint> Default for Dag<O, V, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Object, V: ValidatorId, T: TimePoint> Dag<O, V, T> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next: 0,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Result<&Agreement<O, V, T>, AgreementError> {
        self.nodes.get(&id).ok_or(AgreementError::UnknownNode(id))
    }

    /// Create a root node preferring `object`.
    pub fn create(&mut self, window: T::Span, object: O) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        self.nodes
            .insert(id, Agreement::new(window, object, HashSet::new()));
        id
    }

    /// Create a node depending on `parents`, preferring `object`.
    ///
    /// Every parent must already exist, which is what keeps the graph
    /// acyclic: a node can never be reachable from its own parent set.
    pub fn create_with_parents(
        &mut self,
        window: T::Span,
        object: O,
        parents: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, AgreementError> {
        let parents: HashSet<NodeId> = parents.into_iter().collect();
        for &parent in &parents {
            if !self.nodes.contains_key(&parent) {
                return Err(AgreementError::UnknownParent(parent));
            }
        }
        for &parent in &parents {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.refs += 1;
            }
        }
        let id = NodeId(self.next);
        self.next += 1;
        self.nodes.insert(id, Agreement::new(window, object, parents));
        Ok(id)
    }

    /// Drop the creator's handle on `id`. The node is removed once no child
    /// references it either, releasing its own parents in cascade.
    pub fn release(&mut self, id: NodeId) -> Result<(), AgreementError> {
        if !self.nodes.contains_key(&id) {
            return Err(AgreementError::UnknownNode(id));
        }
        self.unref(id);
        Ok(())
    }

    /// Append an observed vote to `id`'s log. Votes may arrive in any
    /// order; sweeps always replay the log in time order.
    pub fn insert(
        &mut self,
        id: NodeId,
        object: O,
        time: T,
        validator: V,
    ) -> Result<(), AgreementError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(AgreementError::UnknownNode(id))?;
        node.votes.insert(object, time, validator);
        Ok(())
    }

    /// Drop `id`'s vote events observed before `cutoff`; returns how many
    /// were dropped. Never invoked implicitly.
    pub fn prune(&mut self, id: NodeId, cutoff: T) -> Result<usize, AgreementError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(AgreementError::UnknownNode(id))?;
        Ok(node.votes.prune(cutoff))
    }

    /// Sweep `id`'s log across `[begin, end]` into a caller-owned tally,
    /// with caller-supplied edge and fault callbacks.
    pub fn scan<S, E, F>(
        &self,
        id: NodeId,
        tally: &mut Tally<O, V, T, S::Weight>,
        begin: T,
        end: T,
        validators: &S,
        edge: &mut E,
        fault: &mut F,
    ) -> Result<(), AgreementError>
    where
        S: ValidatorSet<Id = V>,
        E: FnMut(T, &Tally<O, V, T, S::Weight>),
        F: FnMut(&V),
    {
        let node = self.get(id)?;
        scanner::sweep(
            &node.votes,
            tally,
            node.window,
            begin,
            end,
            validators,
            edge,
            fault,
        );
        Ok(())
    }

    /// Sweep `[begin, end]` and fire `confirm` each time an object has held
    /// quorum for at least `hold` by the next edge.
    ///
    /// Confirmation requires one edge to establish quorum and a later edge
    /// to observe the hold elapsed, so a lone burst of simultaneous votes
    /// does not confirm by itself. `confirm` may fire at several
    /// consecutive edges within one call, so callers latch. Once any
    /// confirmation fired the node detaches from its ancestors.
    pub fn tally<S, C, F>(
        &mut self,
        id: NodeId,
        begin: T,
        end: T,
        validators: &S,
        confirm: &mut C,
        fault: &mut F,
        hold: T::Span,
    ) -> Result<(), AgreementError>
    where
        S: ValidatorSet<Id = V>,
        C: FnMut(&O, S::Weight),
        F: FnMut(&V),
    {
        let node = self.get(id)?;
        let quorum = validators.quorum();
        let mut tally = Tally::new();
        let mut holding = false;
        let mut held_since = T::default();
        let mut held = node.preferred.clone();
        let mut confirmed = false;

        let mut edge = |time: T, tally: &Tally<O, V, T, S::Weight>| {
            let (weight, object) = tally.max();
            let holding_next = weight >= quorum;
            // `holding` and `held` describe the previous edge here: quorum
            // must have been standing before this instant for the hold to
            // have elapsed.
            if holding && time.since(held_since) >= hold {
                confirm(&held, weight);
                confirmed = true;
            }
            if !holding || held != object {
                held_since = time;
                held = object;
            }
            holding = holding_next;
        };
        scanner::sweep(
            &node.votes,
            &mut tally,
            node.window,
            begin,
            end,
            validators,
            &mut edge,
            fault,
        );

        if confirmed {
            tracing::debug!(node = %id, "object confirmed; detaching from ancestors");
            self.clear_parents(id);
        }
        Ok(())
    }

    /// Re-evaluate `id`'s preference over the window ending at `now`, then
    /// declare it through `cast`.
    ///
    /// When the window carries quorum weight and its plurality differs from
    /// the current preference, the node may adopt it, but only if every
    /// ancestor's last mark is at least one window old. A refused adoption
    /// returns the earliest instant at which it would be legal and casts
    /// nothing. In every other case the node marks itself and its ancestors
    /// at `now`, casts the (possibly updated) preference, and returns
    /// `now + window` as the next time to vote.
    pub fn vote<S, CB, F>(
        &mut self,
        id: NodeId,
        cast: &mut CB,
        validators: &S,
        now: T,
        fault: &mut F,
    ) -> Result<T, AgreementError>
    where
        S: ValidatorSet<Id = V>,
        CB: FnMut(&O, T),
        F: FnMut(&V),
    {
        let node = self.get(id)?;
        let window = node.window;
        let mut tally = Tally::new();
        scanner::sweep(
            &node.votes,
            &mut tally,
            window,
            now.rewind(window),
            now,
            validators,
            &mut |_, _: &Tally<O, V, T, S::Weight>| {},
            fault,
        );
        let (_, object) = tally.max();

        if tally.total() >= validators.quorum() && node.preferred != object {
            let cutoff = self.replaceable(id)?;
            if cutoff > now {
                tracing::trace!(node = %id, "replacement deferred");
                return Ok(cutoff);
            }
            if let Some(node) = self.nodes.get_mut(&id) {
                node.preferred = object.clone();
            }
            self.mark(id, now)?;
            cast(&object, now);
            tracing::debug!(node = %id, "adopted new preferred object");
        } else {
            let preferred = node.preferred.clone();
            self.mark(id, now)?;
            cast(&preferred, now);
        }
        Ok(now.advance(window))
    }

    /// [`Dag::vote`] with `now` sampled from `clock`.
    pub fn vote_now<S, CB, F, C>(
        &mut self,
        id: NodeId,
        cast: &mut CB,
        validators: &S,
        clock: &C,
        fault: &mut F,
    ) -> Result<T, AgreementError>
    where
        S: ValidatorSet<Id = V>,
        CB: FnMut(&O, T),
        F: FnMut(&V),
        C: Clock<Instant = T>,
    {
        let now = clock.now();
        self.vote(id, cast, validators, now, fault)
    }

    /// Return `id` to its uncommitted state, preferring `object`.
    ///
    /// The vote log is retained; parents cleared by an earlier confirmation
    /// stay cleared.
    pub fn reset(&mut self, id: NodeId, object: O) -> Result<(), AgreementError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(AgreementError::UnknownNode(id))?;
        node.marked_at = T::default();
        node.preferred = object;
        Ok(())
    }

    /// Stamp `id` and every transitive ancestor with `now`. Each node is
    /// visited exactly once.
    fn mark(&mut self, id: NodeId, now: T) -> Result<(), AgreementError> {
        if !self.nodes.contains_key(&id) {
            return Err(AgreementError::UnknownNode(id));
        }
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut work = vec![id];
        while let Some(id) = work.pop() {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            node.marked_at = now;
            for &parent in &node.parents {
                if visited.insert(parent) {
                    work.push(parent);
                }
            }
        }
        Ok(())
    }

    /// Earliest instant at which `id` may adopt a new preference: the
    /// latest ancestor mark (self included) plus this node's window.
    fn replaceable(&self, id: NodeId) -> Result<T, AgreementError> {
        let window = self.get(id)?.window;
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut work = vec![id];
        let mut cutoff = T::default();
        while let Some(id) = work.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            cutoff = cutoff.max(node.marked_at.advance(window));
            for &parent in &node.parents {
                if visited.insert(parent) {
                    work.push(parent);
                }
            }
        }
        Ok(cutoff)
    }

    fn clear_parents(&mut self, id: NodeId) {
        let parents: Vec<NodeId> = match self.nodes.get_mut(&id) {
            Some(node) => node.parents.drain().collect(),
            None => return,
        };
        for parent in parents {
            self.unref(parent);
        }
    }

    fn unref(&mut self, id: NodeId) {
        let mut work = vec![id];
        while let Some(id) = work.pop() {
            let remove = match self.nodes.get_mut(&id) {
                Some(node) => {
                    node.refs -= 1;
                    node.refs == 0
                }
                None => false,
            };
            if remove {
                if let Some(node) = self.nodes.remove(&id) {
                    work.extend(node.parents.iter().copied());
                }
            }
        }
    }
}
