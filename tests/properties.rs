//! Randomized properties: the search agrees with brute-force enumeration,
//! and verdicts are stable under input reordering and timeout changes.

mod common;

use common::{op, Register, RegisterOp};
use linvet::{check_operations, CheckResult, Model, Operation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Decides linearizability by enumerating every real-time-respecting
/// total order and replaying the model along it.
fn linearizable_by_enumeration(history: &[Operation<RegisterOp, i64>]) -> bool {
    fn extend(
        history: &[Operation<RegisterOp, i64>],
        used: &mut Vec<bool>,
        state: &Register,
        depth: usize,
    ) -> bool {
        if depth == history.len() {
            return true;
        }
        for index in 0..history.len() {
            if used[index] {
                continue;
            }
            let operation = &history[index];
            // an operation pending behind one that already responded
            // before this one's invocation cannot come next
            let blocked = history.iter().enumerate().any(|(other, earlier)| {
                other != index && !used[other] && earlier.ret < operation.call
            });
            if blocked {
                continue;
            }
            if let Some(next) = state.step(&operation.input, &operation.output) {
                used[index] = true;
                if extend(history, used, &next, depth + 1) {
                    return true;
                }
                used[index] = false;
            }
        }
        false
    }
    extend(
        history,
        &mut vec![false; history.len()],
        &Register::init(),
        0,
    )
}

/// Generates a small register history: a few clients, each sequential,
/// with overlapping intervals and read results drawn from the written
/// value range so that both verdicts occur.
fn random_history(rng: &mut StdRng, len: usize) -> Vec<Operation<RegisterOp, i64>> {
    let mut last_end = [0i64; 3];
    (0..len)
        .map(|_| {
            let client = rng.gen_range(0..3);
            let call = last_end[client] + rng.gen_range(1..4);
            let ret = call + rng.gen_range(1..8);
            last_end[client] = ret;
            if rng.gen_bool(0.5) {
                op(client, RegisterOp::Write(rng.gen_range(0..3)), call, 0, ret)
            } else {
                op(client, RegisterOp::Read, call, rng.gen_range(0..3), ret)
            }
        })
        .collect()
}

#[test]
fn search_matches_enumeration_on_random_histories() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = StdRng::seed_from_u64(0x1dea);
    for _ in 0..200 {
        let history = random_history(&mut rng, 6);
        let expected = if linearizable_by_enumeration(&history) {
            CheckResult::Ok
        } else {
            CheckResult::Illegal
        };
        assert_eq!(
            check_operations::<Register>(history.clone(), None),
            expected,
            "history: {:?}",
            history
        );
    }
}

#[test]
fn verdict_ignores_operation_order_in_the_input() {
    let mut rng = StdRng::seed_from_u64(0xbead);
    for _ in 0..50 {
        let history = random_history(&mut rng, 5);
        let baseline = check_operations::<Register>(history.clone(), None);

        let mut reversed = history.clone();
        reversed.reverse();
        assert_eq!(check_operations::<Register>(reversed, None), baseline);

        let mut shuffled = history.clone();
        for i in (1..shuffled.len()).rev() {
            shuffled.swap(i, rng.gen_range(0..=i));
        }
        assert_eq!(
            check_operations::<Register>(shuffled, None),
            baseline,
            "history: {:?}",
            history
        );
    }
}

#[test]
fn unlimited_checks_are_definite() {
    // a stale read forces backtracking before the Illegal verdict
    let history = || {
        vec![
            op(0, RegisterOp::Write(1), 0, 0, 10),
            op(1, RegisterOp::Read, 20, 0, 30),
        ]
    };
    let unlimited = check_operations::<Register>(history(), None);
    assert_eq!(unlimited, CheckResult::Illegal);
    // zero also means no limit
    assert_eq!(
        check_operations::<Register>(history(), Some(Duration::ZERO)),
        unlimited
    );
    // a generous deadline cannot flip a definite verdict
    assert_eq!(
        check_operations::<Register>(history(), Some(Duration::from_secs(3600))),
        unlimited
    );
}

#[test]
fn expired_deadline_yields_unknown_not_a_wrong_verdict() {
    let history = vec![
        op(0, RegisterOp::Write(1), 0, 0, 10),
        op(1, RegisterOp::Read, 20, 0, 30),
    ];
    // the first backtrack polls the deadline, which has already passed
    assert_eq!(
        check_operations::<Register>(history, Some(Duration::from_nanos(1))),
        CheckResult::Unknown
    );
}
