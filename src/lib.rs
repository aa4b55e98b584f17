//! A library for checking recorded histories of concurrent operations
//! against sequential reference models, i.e. for testing linearizability.
//!
//! A history is a set of client operations with invocation and response
//! timestamps. It is linearizable when some total order of the operations
//! respects real time (an operation that responded before another was
//! invoked comes first) and is accepted step by step by the reference
//! model. Deciding this is NP-hard in general, so the checker implements
//! the Wing–Gong backtracking search with Lowe's refinements: the model
//! splits the history into independent partitions, each partition's search
//! memoizes (linearized set, state) pairs, and partitions are checked on
//! parallel worker threads under one shared deadline.
//!
//! # Example
//!
//! ```
//! use linvet::{check_operations, CheckResult, Model, Operation};
//!
//! // A single register: reads must observe the most recent write.
//! #[derive(Clone)]
//! struct Register(i64);
//!
//! #[derive(Clone)]
//! enum RegisterOp { Write(i64), Read }
//!
//! impl Model for Register {
//!     type In = RegisterOp;
//!     type Out = i64;
//!     fn init() -> Self { Register(0) }
//!     fn step(&self, input: &RegisterOp, output: &i64) -> Option<Self> {
//!         match input {
//!             RegisterOp::Write(value) => Some(Register(*value)),
//!             RegisterOp::Read if self.0 == *output => Some(self.clone()),
//!             RegisterOp::Read => None,
//!         }
//!     }
//!     fn equal(&self, other: &Self) -> bool { self.0 == other.0 }
//! }
//!
//! // A write of 1 overlapping a read that observed 1: linearizable.
//! let history = vec![
//!     Operation { client_id: 0, input: RegisterOp::Write(1), call: 0, output: 0, ret: 10 },
//!     Operation { client_id: 1, input: RegisterOp::Read, call: 5, output: 1, ret: 15 },
//! ];
//! assert_eq!(check_operations::<Register>(history, None), CheckResult::Ok);
//! ```
//!
//! When a check fails, the verbose entry points also return a
//! [`report::LinearizationInfo`] recording the deepest partial
//! linearizations the search explored before each dead end, which
//! [`report::visualize`] writes out as an interactive timeline.

mod checker;
pub mod history;
pub mod model;
pub mod report;

pub use checker::{
    check_events, check_events_verbose, check_operations, check_operations_verbose, CheckResult,
};
pub use history::{Event, EventKind, HistoryError, Operation};
pub use model::Model;

use std::hash::Hash;

/// Stable 64-bit hash used to key memoization tables. Seeds are fixed so
/// that equal values fingerprint equally on every worker thread.
pub(crate) fn fingerprint<T: Hash>(value: &T) -> u64 {
    ahash::RandomState::with_seeds(
        0x243f_6a88_85a3_08d3,
        0x1319_8a2e_0370_7344,
        0xa409_3822_299f_31d0,
        0x082e_fa98_ec4e_6c89,
    )
    .hash_one(value)
}
