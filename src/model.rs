//! The sequential reference model interface.

use crate::history::{Event, Operation};

/// A sequential reference model for the system under test.
///
/// The implementing type doubles as the model's state: [`Model::init`]
/// produces the state before any operation, and [`Model::step`] produces
/// successor states. The checker treats states as values, moving and
/// retaining them in its undo stack and memoization table, so they should
/// be cheap to produce.
///
/// All methods may be invoked concurrently from different worker threads,
/// always on disjoint inputs.
pub trait Model: Sized {
    /// Invocation argument type.
    type In;

    /// Response value type.
    type Out;

    /// State of the model before any operation has been applied.
    fn init() -> Self;

    /// Applies an operation to the state, returning the successor state if
    /// the model accepts this input/output pair and `None` otherwise. Must
    /// be deterministic and side-effect free.
    fn step(&self, input: &Self::In, output: &Self::Out) -> Option<Self>;

    /// Whether two states are equivalent. Used to avoid re-exploring
    /// linearization prefixes that lead to an already-seen state.
    fn equal(&self, other: &Self) -> bool;

    /// Splits a history into sub-histories that are independent under the
    /// model's semantics: the history is linearizable if and only if every
    /// sub-history is. Together the sub-histories must cover the input
    /// exactly once.
    ///
    /// The default keeps everything in a single partition.
    fn partition(
        history: Vec<Operation<Self::In, Self::Out>>,
    ) -> Vec<Vec<Operation<Self::In, Self::Out>>> {
        vec![history]
    }

    /// Event-form analogue of [`Model::partition`]. Call/return pairs must
    /// stay within one partition.
    fn partition_events(
        history: Vec<Event<Self::In, Self::Out>>,
    ) -> Vec<Vec<Event<Self::In, Self::Out>>> {
        vec![history]
    }

    /// Renders an operation for diagnostics, e.g. `"put('x', 'y')"`.
    fn describe_operation(_input: &Self::In, _output: &Self::Out) -> String {
        "<operation>".to_string()
    }

    /// Renders a state for diagnostics.
    fn describe_state(&self) -> String {
        "<state>".to_string()
    }
}
