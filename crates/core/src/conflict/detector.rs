//! Overlap, team-conflict and block-period checks.

use std::collections::BTreeSet;

use furlough_shared::config::{ConflictConfig, TeamScope};
use furlough_shared::types::EmployeeId;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::types::{ConflictContext, ConflictReport};
use crate::policy::{EmployeeProfile, LeaveBlockPeriod};
use crate::request::{LeaveRequest, OverlapDetail, TeamConflictDetail, ValidationFailure};

/// Stateless conflict checks.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Booked requests of the same employee whose dates intersect the candidate.
    #[must_use]
    pub fn find_overlaps(candidate: &LeaveRequest, existing: &[LeaveRequest]) -> Vec<OverlapDetail> {
        existing
            .iter()
            .filter(|other| {
                other.id != candidate.id
                    && other.employee_id == candidate.employee_id
                    && other.status.counts_as_booked()
                    && other.range.intersects(&candidate.range)
            })
            .map(|other| OverlapDetail {
                request_id: other.id,
                range: other.range,
                status: other.status,
            })
            .collect()
    }

    /// Concurrency allowed for a team of `team_size`.
    ///
    /// At least one member may always be away; the absolute cap, when set,
    /// lowers the percentage-based figure.
    #[must_use]
    pub fn allowed_concurrency(team_size: u32, config: &ConflictConfig) -> u32 {
        let share = (Decimal::from(team_size) * config.max_concurrent_percent
            / Decimal::ONE_HUNDRED)
            .floor()
            .to_u32()
            .unwrap_or(0);
        config
            .max_concurrent_absolute
            .map_or(share, |cap| share.min(cap))
            .max(1)
    }

    /// Counts team members away on the candidate's busiest day, requester
    /// included, against the configured threshold.
    ///
    /// Returns `None` when the threshold holds or the team is too small to
    /// be checked.
    #[must_use]
    pub fn check_team_conflict(
        candidate: &LeaveRequest,
        requester: &EmployeeProfile,
        team: &[EmployeeProfile],
        team_requests: &[LeaveRequest],
        config: &ConflictConfig,
    ) -> Option<TeamConflictDetail> {
        let members: BTreeSet<EmployeeId> = team
            .iter()
            .filter(|m| Self::same_team(requester, m, config.team_scope))
            .map(|m| m.id)
            .chain(std::iter::once(requester.id))
            .collect();
        let team_size = u32::try_from(members.len()).unwrap_or(u32::MAX);
        if team_size < config.min_team_size {
            return None;
        }

        let colliding: Vec<&LeaveRequest> = team_requests
            .iter()
            .filter(|r| {
                r.id != candidate.id
                    && r.employee_id != requester.id
                    && members.contains(&r.employee_id)
                    && r.status.counts_as_booked()
                    && r.range.intersects(&candidate.range)
            })
            .collect();

        let concurrent = candidate
            .range
            .days()
            .map(|day| {
                let away: BTreeSet<EmployeeId> = colliding
                    .iter()
                    .filter(|r| r.range.contains(day))
                    .map(|r| r.employee_id)
                    .collect();
                u32::try_from(away.len()).unwrap_or(u32::MAX).saturating_add(1)
            })
            .max()
            .unwrap_or(1);

        let allowed = Self::allowed_concurrency(team_size, config);
        (concurrent > allowed).then(|| TeamConflictDetail {
            concurrent,
            team_size,
            allowed,
            colliding_request_ids: colliding.iter().map(|r| r.id).collect(),
        })
    }

    /// Fails if an active block period vetoes the candidate.
    pub fn check_block_periods(
        candidate: &LeaveRequest,
        requester: &EmployeeProfile,
        block_periods: &[LeaveBlockPeriod],
    ) -> Result<(), ValidationFailure> {
        match block_periods.iter().find(|b| {
            b.vetoes(
                requester,
                candidate.leave_type_id,
                &candidate.range,
                candidate.is_emergency,
            )
        }) {
            Some(block) => Err(ValidationFailure::BlockedPeriod {
                block_id: block.id,
                name: block.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Runs every check. Post-leave requests skip them all.
    pub fn evaluate(
        candidate: &LeaveRequest,
        requester: &EmployeeProfile,
        context: ConflictContext<'_>,
        config: &ConflictConfig,
    ) -> Result<ConflictReport, ValidationFailure> {
        if candidate.is_post_leave {
            return Ok(ConflictReport::default());
        }
        Self::check_block_periods(candidate, requester, context.block_periods)?;
        Ok(ConflictReport {
            overlaps: Self::find_overlaps(candidate, context.own_requests),
            team_conflict: Self::check_team_conflict(
                candidate,
                requester,
                context.team,
                context.team_requests,
                config,
            ),
        })
    }

    fn same_team(requester: &EmployeeProfile, other: &EmployeeProfile, scope: TeamScope) -> bool {
        requester.department_id == other.department_id
            && match scope {
                TeamScope::Department => true,
                TeamScope::DepartmentAndPosition => requester.position == other.position,
            }
    }
}
