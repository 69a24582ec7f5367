//! Property-based tests for ConflictDetector.
//!
//! - Property 6: overlap detection is symmetric between two booked requests
//! - Property 7: allowed concurrency is at least one and never above the team

use chrono::{Duration, NaiveDate, Utc};
use furlough_shared::config::ConflictConfig;
use furlough_shared::types::{DateRange, EmployeeId, LeaveTypeId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::detector::ConflictDetector;
use crate::request::{LeaveRequest, LeaveStatus, NewLeaveRequest};

/// Strategy for ranges in December 2025.
fn range() -> impl Strategy<Value = DateRange> {
    (0i64..28, 0i64..7).prop_map(|(offset, len)| {
        let start = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap() + Duration::days(offset);
        DateRange::new(start, start + Duration::days(len)).unwrap()
    })
}

fn booked(employee_id: EmployeeId, range: DateRange) -> LeaveRequest {
    let mut r = LeaveRequest::draft(
        NewLeaveRequest {
            employee_id,
            leave_type_id: LeaveTypeId::new(),
            range,
            half_day: false,
            reason: "Leave".to_string(),
            document_ids: vec![],
            is_emergency: false,
            is_post_leave: false,
        },
        Decimal::ONE,
        2025,
        Utc::now(),
    );
    r.status = LeaveStatus::PendingManagerApproval;
    r
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 6: A overlaps B iff B overlaps A.
    #[test]
    fn prop_overlap_symmetric(a in range(), b in range()) {
        let emp = EmployeeId::new();
        let first = booked(emp, a);
        let second = booked(emp, b);
        let forward = ConflictDetector::find_overlaps(&second, std::slice::from_ref(&first));
        let backward = ConflictDetector::find_overlaps(&first, std::slice::from_ref(&second));
        prop_assert_eq!(forward.len(), backward.len());
        prop_assert_eq!(forward.len() == 1, a.intersects(&b));
    }

    /// Property 7: 1 <= allowed <= max(team_size, 1).
    #[test]
    fn prop_allowed_concurrency_bounds(team_size in 0u32..500, percent in 0i64..=100) {
        let config = ConflictConfig {
            max_concurrent_percent: Decimal::from(percent),
            ..ConflictConfig::default()
        };
        let allowed = ConflictDetector::allowed_concurrency(team_size, &config);
        prop_assert!(allowed >= 1);
        prop_assert!(allowed <= team_size.max(1));
    }
}
