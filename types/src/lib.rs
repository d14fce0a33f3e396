//! Type contracts for the accord agreement engine.
//!
//! This crate defines the contracts shared by every other crate in the
//! workspace: the timeline abstraction and its default millisecond
//! [`Timestamp`], the sealed integral [`Weight`] trait, the [`Object`] and
//! [`ValidatorId`] markers, and the [`ValidatorSet`] registry contract.

pub mod object;
pub mod time;
pub mod validators;
pub mod weight;

pub use object::Object;
pub use time::{Clock, SystemClock, TimePoint, Timestamp};
pub use validators::{ValidatorId, ValidatorSet};
pub use weight::Weight;
