//! Property tests for the leave state machine.

use chrono::{Duration, Utc};
use proptest::prelude::*;

use super::fixtures::{Actors, submitted, three_level_workflow};
use super::machine::LeaveStateMachine;
use super::types::{Decision, LedgerEffect};
use crate::request::{LeaveRequest, StepAction};

#[derive(Debug, Clone)]
enum Op {
    Decide { step: usize, approve: bool, actor: usize },
    Cancel { actor: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..4, any::<bool>(), 0usize..5)
            .prop_map(|(step, approve, actor)| Op::Decide { step, approve, actor }),
        1 => (0usize..5).prop_map(|actor| Op::Cancel { actor }),
    ]
}

fn actor_at(actors: &Actors, index: usize) -> furlough_shared::types::EmployeeId {
    match index {
        0 => actors.requester,
        1 => actors.manager,
        2 => actors.department_head,
        3 => actors.hr_officer,
        _ => actors.hr_manager,
    }
}

fn apply(request: &LeaveRequest, op: &Op, actors: &Actors) -> Option<(LeaveRequest, LedgerEffect)> {
    let now = Utc::now();
    let result = match *op {
        Op::Decide { step, approve, actor } => {
            let decision = if approve { Decision::Approve } else { Decision::Reject };
            LeaveStateMachine::decide(
                request,
                step,
                decision,
                actor_at(actors, actor),
                Some("reviewed".to_string()),
                true,
                now,
            )
        }
        Op::Cancel { actor } => LeaveStateMachine::cancel(request, actor_at(actors, actor), "changed", now),
    };
    result.ok().map(|t| (t.request, t.effect))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A step leaves `pending` at most once and never returns to it.
    #[test]
    fn prop_step_decided_at_most_once(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let actors = Actors::new();
        let mut request = submitted(&actors, &three_level_workflow(), Utc::now() - Duration::hours(1));

        for op in &ops {
            let before: Vec<_> = request.approval_chain.iter().map(|s| (s.action, s.acted_by)).collect();
            if let Some((next, _)) = apply(&request, op, &actors) {
                for (old, new) in before.iter().zip(&next.approval_chain) {
                    if old.0 != StepAction::Pending {
                        prop_assert_eq!(old.0, new.action);
                        prop_assert_eq!(old.1, new.acted_by);
                    }
                }
                request = next;
            }
        }
    }

    /// The reservation is settled (committed or released) at most once.
    #[test]
    fn prop_reservation_settled_at_most_once(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let actors = Actors::new();
        let mut request = submitted(&actors, &three_level_workflow(), Utc::now() - Duration::hours(1));
        let mut settlements = 0;

        for op in &ops {
            if let Some((next, effect)) = apply(&request, op, &actors) {
                if matches!(effect, LedgerEffect::Commit | LedgerEffect::Release) {
                    settlements += 1;
                }
                request = next;
            }
        }
        prop_assert!(settlements <= 1);
    }

    /// Terminal requests accept no further decisions or cancellations.
    #[test]
    fn prop_terminal_is_final(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let actors = Actors::new();
        let mut request = submitted(&actors, &three_level_workflow(), Utc::now() - Duration::hours(1));

        for op in &ops {
            let was_terminal = request.status.is_terminal();
            let outcome = apply(&request, op, &actors);
            if was_terminal {
                prop_assert!(outcome.is_none());
            }
            if let Some((next, _)) = outcome {
                request = next;
            }
        }
    }
}
