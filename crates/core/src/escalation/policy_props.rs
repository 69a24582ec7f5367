//! Property tests for escalation.

use chrono::{Duration, Utc};
use proptest::prelude::*;

use super::policy::{EscalationDecision, EscalationPolicy};
use crate::workflow::ChainResolver;
use crate::workflow::chain::test_support::FixedDelegations;
use crate::workflow::fixtures::{Actors, submitted, three_level_workflow};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any sequence of scheduler ticks escalates a step at most once.
    #[test]
    fn prop_escalates_at_most_once(ticks in prop::collection::vec(0i64..200, 1..10)) {
        let actors = Actors::new();
        let org = actors.org();
        let delegations = FixedDelegations::default();
        let resolver = ChainResolver { org: &org, delegations: &delegations, default_escalation_hours: 48 };
        let start = Utc::now();
        let mut request = submitted(&actors, &three_level_workflow(), start);

        let mut hours: Vec<i64> = ticks;
        hours.sort_unstable();
        let mut escalations = 0;
        for h in hours {
            let now = start + Duration::hours(h);
            let decision = EscalationPolicy::evaluate(&request, now, resolver);
            if decision.is_actionable() {
                escalations += 1;
                prop_assert!(h >= 48);
            }
            request = EscalationPolicy::apply(&request, &decision, now).unwrap().request;
            prop_assert_eq!(request.approval_chain[0].activated_at, Some(start));
        }
        prop_assert!(escalations <= 1);
        if escalations == 1 {
            prop_assert!(matches!(
                EscalationPolicy::evaluate(&request, start + Duration::hours(1000), resolver),
                EscalationDecision::AlreadyEscalated
            ));
        }
    }
}
