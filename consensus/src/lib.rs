//! Sliding-window voting core for Byzantine-fault-tolerant agreement.
//!
//! Each agreement node accumulates time-stamped votes from identified
//! validators, tallies weighted support for competing objects over a rolling
//! window, detects equivocation, and confirms an object once quorum is
//! sustained. Nodes form a DAG of dependencies: confirming a descendant
//! detaches it from its ancestors, and adopting a new preferred object is
//! rate-limited so the DAG cannot churn faster than one window.
//!
//! ## Module overview
//!
//! - [`tally`] — incremental weighted ranking over the active vote set.
//! - [`scanner`] — ordered sweep replaying rises and window expirations.
//! - [`log`] — time-ordered vote storage.
//! - [`agreement`] — agreement nodes, the owning DAG, confirmation and
//!   replacement rules.
//! - [`validators`] — validator-set implementations.
//! - [`dump`] — CSV edge dump for offline inspection.
//! - [`error`] — error types.

pub mod agreement;
pub mod dump;
pub mod error;
pub mod log;
pub mod scanner;
pub mod tally;
pub mod validators;

pub use agreement::{Agreement, Dag, NodeId};
pub use error::AgreementError;
pub use log::VoteLog;
pub use tally::Tally;
pub use validators::{UniformValidators, WeightTable};
