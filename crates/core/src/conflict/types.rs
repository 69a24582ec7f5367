//! Inputs and outputs of the conflict detector.

use serde::{Deserialize, Serialize};

use crate::policy::{EmployeeProfile, LeaveBlockPeriod};
use crate::request::{
    LeaveRequest, OverlapDetail, TeamConflictDetail, ValidationResult, ValidationWarning,
};

/// Read-only view of the request index around a candidate.
#[derive(Debug, Clone, Copy)]
pub struct ConflictContext<'a> {
    /// The requester's other requests.
    pub own_requests: &'a [LeaveRequest],
    /// Team members, requester included or not.
    pub team: &'a [EmployeeProfile],
    /// Requests of team members intersecting the candidate's dates.
    pub team_requests: &'a [LeaveRequest],
    /// Configured block periods.
    pub block_periods: &'a [LeaveBlockPeriod],
}

/// Advisory findings for a candidate request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// Overlapping booked requests of the same employee.
    pub overlaps: Vec<OverlapDetail>,
    /// Set when the team threshold is exceeded.
    pub team_conflict: Option<TeamConflictDetail>,
}

impl ConflictReport {
    /// Returns true if nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.overlaps.is_empty() && self.team_conflict.is_none()
    }

    /// Warnings for the validation result.
    #[must_use]
    pub fn warnings(&self) -> Vec<ValidationWarning> {
        let mut warnings: Vec<_> = self
            .overlaps
            .iter()
            .map(|o| ValidationWarning::Overlap {
                request_id: o.request_id,
                range: o.range,
            })
            .collect();
        if let Some(team) = &self.team_conflict {
            warnings.push(ValidationWarning::TeamConflict {
                concurrent: team.concurrent,
                allowed: team.allowed,
            });
        }
        warnings
    }

    /// Records the findings on `request`.
    pub fn apply_to(&self, request: &mut LeaveRequest) {
        for overlap in &self.overlaps {
            request.add_overlap(overlap.clone());
        }
        if let Some(team) = &self.team_conflict {
            request.has_team_conflict = true;
            request.conflict_details = Some(team.clone());
        }
        let validation: &mut ValidationResult = &mut request.validation;
        for warning in self.warnings() {
            validation.push(warning);
        }
    }
}
