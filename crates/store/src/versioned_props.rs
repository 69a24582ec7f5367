//! Property tests for compare-and-swap writes.

use chrono::Utc;
use furlough_core::balance::{BalanceKey, EmployeeLeaveBalance};
use furlough_shared::types::{EmployeeId, LeaveTypeId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::versioned::VersionedMap;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Writers holding copies of various ages: only a write based on the
    /// latest version lands, and every landed write bumps the version by one.
    #[test]
    fn prop_only_fresh_writes_land(reads in prop::collection::vec(any::<bool>(), 1..40)) {
        let key = BalanceKey::new(EmployeeId::new(), LeaveTypeId::new(), 2025);
        let map = VersionedMap::new();
        let mut held = map.insert_new(EmployeeLeaveBalance::new(key, Utc::now())).unwrap();
        let mut landed = 0u64;

        for refresh in reads {
            if refresh {
                held = map.get(&key).unwrap();
            }
            let mut next = held.clone();
            next.accrued += Decimal::ONE;
            let fresh = held.version == map.get(&key).unwrap().version;
            match map.compare_and_swap(next) {
                Ok(stored) => {
                    prop_assert!(fresh);
                    landed += 1;
                    prop_assert_eq!(stored.version, 1 + landed);
                }
                Err(e) => {
                    prop_assert!(!fresh);
                    prop_assert!(e.is_conflict());
                }
            }
        }

        let last = map.get(&key).unwrap();
        prop_assert_eq!(last.version, 1 + landed);
        prop_assert_eq!(last.accrued, Decimal::from(landed));
    }
}
