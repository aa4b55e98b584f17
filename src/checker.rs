//! Private module for selective re-export.

mod entries;
mod search;

use crate::history::{self, Event, HistoryError, Operation};
use crate::model::Model;
use crate::report::{HistoryElement, LinearizationInfo, LinearizationStep, PartitionDiagnostics};
use search::{PartitionWitness, SearchOutcome};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// The verdict reached for a history.
///
/// The discriminants are stable and form the wire encoding for embedders;
/// see [`CheckResult::code`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CheckResult {
    /// A linearization exists.
    Ok = 0,
    /// No linearization exists.
    Illegal = 1,
    /// The deadline expired before the search reached a verdict. Only
    /// possible with a finite timeout.
    Unknown = 2,
}

impl CheckResult {
    /// Stable integer form of the verdict.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Checks whether a history of operations is linearizable with respect to
/// the model `M`.
///
/// `timeout` bounds the entire check across all partitions; `None` or a
/// zero duration means no limit, in which case the verdict is always
/// definite.
pub fn check_operations<M>(
    history: Vec<Operation<M::In, M::Out>>,
    timeout: Option<Duration>,
) -> CheckResult
where
    M: Model,
    M::In: Send,
    M::Out: Send,
{
    check_partitions::<M>(partitioned::<M>(history), false, timeout).0
}

/// As [`check_operations`], but also returns diagnostics: for every
/// partition, the deepest partial linearizations the search explored
/// before each dead end.
pub fn check_operations_verbose<M>(
    history: Vec<Operation<M::In, M::Out>>,
    timeout: Option<Duration>,
) -> (CheckResult, LinearizationInfo)
where
    M: Model,
    M::In: Send,
    M::Out: Send,
{
    check_partitions::<M>(partitioned::<M>(history), true, timeout)
}

/// Checks a history captured as a stream of call and return events. Fails
/// fast with a [`HistoryError`] if the stream does not pair up.
pub fn check_events<M>(
    history: Vec<Event<M::In, M::Out>>,
    timeout: Option<Duration>,
) -> Result<CheckResult, HistoryError>
where
    M: Model,
    M::In: Send,
    M::Out: Send,
{
    history::validate_events(&history)?;
    let partitions = paired_partitions::<M>(history)?;
    Ok(check_partitions::<M>(partitions, false, timeout).0)
}

/// As [`check_events`], but also returns diagnostics.
pub fn check_events_verbose<M>(
    history: Vec<Event<M::In, M::Out>>,
    timeout: Option<Duration>,
) -> Result<(CheckResult, LinearizationInfo), HistoryError>
where
    M: Model,
    M::In: Send,
    M::Out: Send,
{
    history::validate_events(&history)?;
    let partitions = paired_partitions::<M>(history)?;
    Ok(check_partitions::<M>(partitions, true, timeout))
}

/// Partitions an operation history, checking that the partitions cover the
/// input exactly once.
fn partitioned<M: Model>(
    history: Vec<Operation<M::In, M::Out>>,
) -> Vec<Vec<Operation<M::In, M::Out>>> {
    let total = history.len();
    let partitions = M::partition(history);
    debug_assert_eq!(
        total,
        partitions.iter().map(Vec::len).sum::<usize>(),
        "partitions must cover the history exactly once"
    );
    partitions
}

/// Partitions an event history, then pairs each partition's events into
/// operations timestamped by sequence position.
fn paired_partitions<M: Model>(
    history: Vec<Event<M::In, M::Out>>,
) -> Result<Vec<Vec<Operation<M::In, M::Out>>>, HistoryError> {
    let total = history.len();
    let partitions: Vec<_> = M::partition_events(history)
        .into_iter()
        .map(history::pair_events)
        .collect::<Result<_, _>>()?;
    debug_assert_eq!(
        total,
        2 * partitions.iter().map(Vec::len).sum::<usize>(),
        "partitions must cover the history exactly once"
    );
    Ok(partitions)
}

/// Runs one worker per non-empty partition and combines the verdicts:
/// `Illegal` if any partition is illegal, else `Unknown` if any search was
/// cut short, else `Ok`.
fn check_partitions<M>(
    mut partitions: Vec<Vec<Operation<M::In, M::Out>>>,
    verbose: bool,
    timeout: Option<Duration>,
) -> (CheckResult, LinearizationInfo)
where
    M: Model,
    M::In: Send,
    M::Out: Send,
{
    partitions.retain(|partition| !partition.is_empty());
    // Renumber densely within each partition: a stable sort on
    // (invocation, response) fixes both the diagnostics order and the
    // equal-timestamp tie-break, leaving input order to break ties.
    for partition in &mut partitions {
        partition.sort_by(|a, b| (a.call, a.ret).cmp(&(b.call, b.ret)));
    }

    let deadline = timeout
        .filter(|timeout| !timeout.is_zero())
        .map(|timeout| Instant::now() + timeout);
    let kill = AtomicBool::new(false);

    let results: Vec<(SearchOutcome, PartitionDiagnostics)> = thread::scope(|scope| {
        let kill = &kill;
        let handles: Vec<_> = partitions
            .into_iter()
            .enumerate()
            .map(|(index, ops)| {
                let elements = verbose.then(|| history_elements::<M>(&ops));
                thread::Builder::new()
                    .name(format!("checker-{}", index))
                    .spawn_scoped(scope, move || {
                        log::debug!("{}: checking partition of {} operations", index, ops.len());
                        let (outcome, witness) =
                            search::check_partition::<M>(ops, verbose, kill, deadline);
                        log::debug!("{}: partition outcome is {:?}", index, outcome);
                        if outcome == SearchOutcome::Illegal && !verbose {
                            // short-circuit the remaining workers; verbose
                            // checks let every partition finish so each
                            // witness is maximal
                            kill.store(true, Ordering::Relaxed);
                        }
                        let diagnostics = elements
                            .map(|history| assemble_partition(history, witness))
                            .unwrap_or_default();
                        (outcome, diagnostics)
                    })
                    .expect("Failed to spawn a thread")
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("Failed to join checker thread"))
            .collect()
    });

    let mut verdict = CheckResult::Ok;
    for (outcome, _) in &results {
        match outcome {
            SearchOutcome::Illegal => verdict = CheckResult::Illegal,
            SearchOutcome::Aborted if verdict == CheckResult::Ok => {
                verdict = CheckResult::Unknown
            }
            _ => {}
        }
    }

    let info = if verbose {
        LinearizationInfo::new(
            results
                .into_iter()
                .map(|(_, diagnostics)| diagnostics)
                .collect(),
        )
    } else {
        LinearizationInfo::default()
    };
    (verdict, info)
}

/// Timeline rows for a partition, in operation id order (which is
/// (start, end, input position) order after renumbering).
fn history_elements<M: Model>(ops: &[Operation<M::In, M::Out>]) -> Vec<HistoryElement> {
    ops.iter()
        .map(|op| HistoryElement {
            client_id: op.client_id,
            start: op.call,
            end: op.ret,
            description: M::describe_operation(&op.input, &op.output),
        })
        .collect()
}

/// Keeps only the snapshots the longest-table still references and
/// reindexes the table accordingly. A snapshot whose operations were all
/// superseded by a longer one drops out here, which is what bounds the
/// reported witnesses to maximal branches.
fn assemble_partition(
    history: Vec<HistoryElement>,
    witness: PartitionWitness,
) -> PartitionDiagnostics {
    let PartitionWitness { partials, longest } = witness;
    let mut keep: Vec<usize> = longest.iter().flatten().copied().collect();
    keep.sort_unstable();
    keep.dedup();
    let remap: HashMap<usize, usize> = keep
        .iter()
        .enumerate()
        .map(|(new, &old)| (old, new))
        .collect();
    let partial_linearizations = partials
        .into_iter()
        .enumerate()
        .filter(|(at, _)| remap.contains_key(at))
        .map(|(_, snapshot)| {
            snapshot
                .into_iter()
                .map(|(index, state_description)| LinearizationStep {
                    index,
                    state_description,
                })
                .collect()
        })
        .collect();
    let largest = longest
        .iter()
        .enumerate()
        .filter_map(|(op, at)| at.map(|at| (op, remap[&at])))
        .collect();
    PartitionDiagnostics {
        history,
        partial_linearizations,
        largest,
    }
}
