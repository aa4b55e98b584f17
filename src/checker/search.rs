//! Private module for selective re-export.

use crate::checker::entries::{self, EntryList};
use crate::fingerprint;
use crate::history::Operation;
use crate::model::Model;
use bit_vec::BitVec;
use nohash_hasher::NoHashHasher;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// How a single-partition search ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SearchOutcome {
    /// The partition has a linearization.
    Linearizable,
    /// No linearization exists.
    Illegal,
    /// The search was cancelled or timed out before reaching a verdict.
    Aborted,
}

/// Witness material collected during a verbose search.
pub(crate) struct PartitionWitness {
    /// Partial linearizations in creation order, each a sequence of
    /// (operation id, state description) steps. Superseded snapshots
    /// linger here until assembly keeps only the ones `longest` still
    /// references.
    pub partials: Vec<Vec<(usize, String)>>,
    /// For each operation, the index in `partials` of the longest partial
    /// linearization containing it.
    pub longest: Vec<Option<usize>>,
}

/// Explored (linearized set, state) pairs, keyed by the set's fingerprint.
/// A fingerprint collision falls back to bit-set equality plus
/// [`Model::equal`].
type MemoTable<M> = HashMap<u64, Vec<MemoEntry<M>>, BuildHasherDefault<NoHashHasher<u64>>>;

struct MemoEntry<M> {
    linearized: BitVec,
    state: M,
}

/// An undo frame: a lifted call entry and the state it was applied to.
struct Frame<M> {
    call: usize,
    prior: M,
}

/// Decides linearizability of a single partition with the Wing–Gong
/// backtracking search. `kill` is polled every iteration and `deadline`
/// at every backtrack; either aborts the search.
pub(crate) fn check_partition<M: Model>(
    ops: Vec<Operation<M::In, M::Out>>,
    record_witness: bool,
    kill: &AtomicBool,
    deadline: Option<Instant>,
) -> (SearchOutcome, PartitionWitness) {
    let n = ops.len();
    let mut witness = PartitionWitness {
        partials: Vec::new(),
        longest: vec![None; n],
    };
    let mut list = entries::build_list(ops);
    let mut cursor = match list.first() {
        Some(index) => index,
        None => return (SearchOutcome::Linearizable, witness),
    };

    let mut state = M::init();
    let mut linearized = BitVec::from_elem(n, false);
    let mut memo = MemoTable::<M>::default();
    let mut calls: Vec<Frame<M>> = Vec::with_capacity(n);

    loop {
        if kill.load(Ordering::Relaxed) {
            return (SearchOutcome::Aborted, witness);
        }
        let attempted = list
            .call_io(cursor)
            .map(|(input, output)| state.step(input, output));
        match attempted {
            Some(stepped) => {
                // invocation at the head of the pending list
                let id = list.entry(cursor).id;
                match stepped {
                    Some(next) if !known_dead(&memo, &linearized, id, &next) => {
                        linearized.set(id, true);
                        calls.push(Frame {
                            call: cursor,
                            prior: mem::replace(&mut state, next),
                        });
                        list.lift(cursor);
                        if record_witness {
                            record_longest(&calls, &state, &list, &mut witness);
                        }
                        cursor = match list.first() {
                            Some(index) => index,
                            None => return (SearchOutcome::Linearizable, witness),
                        };
                    }
                    // rejected by the model, or a prefix/state pair that
                    // already proved non-extensible
                    _ => cursor = list.next_of(cursor).expect("a call precedes its return"),
                }
            }
            None => {
                // a response whose invocation is not linearized: backtrack
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    kill.store(true, Ordering::Relaxed);
                    return (SearchOutcome::Aborted, witness);
                }
                let frame = match calls.pop() {
                    Some(frame) => frame,
                    None => return (SearchOutcome::Illegal, witness),
                };
                // the abandoned prefix/state pair is now known dead
                let abandoned = mem::replace(&mut state, frame.prior);
                memo.entry(fingerprint(&linearized)).or_default().push(MemoEntry {
                    linearized: linearized.clone(),
                    state: abandoned,
                });
                linearized.set(list.entry(frame.call).id, false);
                list.unlift(frame.call);
                cursor = list.next_of(frame.call).expect("a call precedes its return");
            }
        }
    }
}

/// Whether linearizing operation `id` from the current prefix would reach
/// a (set, state) pair that already proved non-extensible.
fn known_dead<M: Model>(memo: &MemoTable<M>, linearized: &BitVec, id: usize, state: &M) -> bool {
    let mut candidate = linearized.clone();
    candidate.set(id, true);
    memo.get(&fingerprint(&candidate)).is_some_and(|bucket| {
        bucket
            .iter()
            .any(|entry| entry.linearized == candidate && entry.state.equal(state))
    })
}

/// Snapshots the calls stack whenever it is deeper than the recorded best
/// for some operation it contains, and repoints those operations' best at
/// the new snapshot.
fn record_longest<M: Model>(
    calls: &[Frame<M>],
    state: &M,
    list: &EntryList<M::In, M::Out>,
    witness: &mut PartitionWitness,
) {
    let depth = calls.len();
    let improves = calls.iter().any(|frame| {
        let id = list.entry(frame.call).id;
        witness.longest[id].map_or(true, |at| depth > witness.partials[at].len())
    });
    if !improves {
        return;
    }
    let snapshot = calls
        .iter()
        .enumerate()
        .map(|(position, frame)| {
            let id = list.entry(frame.call).id;
            // a frame's post-state is the next frame's prior state; the
            // top of the stack pairs with the current state
            let post = calls.get(position + 1).map_or(state, |next| &next.prior);
            (id, post.describe_state())
        })
        .collect();
    let at = witness.partials.len();
    witness.partials.push(snapshot);
    for frame in calls {
        let id = list.entry(frame.call).id;
        if witness.longest[id].map_or(true, |prior| depth > witness.partials[prior].len()) {
            witness.longest[id] = Some(at);
        }
    }
}
