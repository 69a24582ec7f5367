//! Approval workflow configuration.
//!
//! Level semantics (role, override capability, escalation) are fixed by
//! configuration; nothing here is user-programmable.

use furlough_shared::types::{ApprovalWorkflowId, LeaveTypeId};
use serde::{Deserialize, Serialize};

/// Role an approval level is staffed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverRole {
    /// The requester's line manager.
    DirectManager,
    /// The line manager's manager.
    SecondLevelManager,
    /// Head of the requester's department.
    DepartmentHead,
    /// HR officer responsible for the requester.
    HrOfficer,
    /// HR manager.
    HrManager,
}

/// Which tier of the organization a role belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalTier {
    /// Line management.
    LineManagement,
    /// Human resources.
    Hr,
}

impl ApproverRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectManager => "direct_manager",
            Self::SecondLevelManager => "second_level_manager",
            Self::DepartmentHead => "department_head",
            Self::HrOfficer => "hr_officer",
            Self::HrManager => "hr_manager",
        }
    }

    /// Parses a role from a string. Accepts the camelCase spellings used by
    /// older configuration files.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "").as_str() {
            "directmanager" | "manager" => Some(Self::DirectManager),
            "secondlevelmanager" => Some(Self::SecondLevelManager),
            "departmenthead" => Some(Self::DepartmentHead),
            "hrofficer" | "hr" => Some(Self::HrOfficer),
            "hrmanager" => Some(Self::HrManager),
            _ => None,
        }
    }

    /// Tier the role belongs to.
    #[must_use]
    pub fn tier(&self) -> ApprovalTier {
        match self {
            Self::DirectManager | Self::SecondLevelManager | Self::DepartmentHead => {
                ApprovalTier::LineManagement
            }
            Self::HrOfficer | Self::HrManager => ApprovalTier::Hr,
        }
    }

    /// Returns true for HR roles.
    #[must_use]
    pub fn is_hr(&self) -> bool {
        self.tier() == ApprovalTier::Hr
    }
}

impl std::fmt::Display for ApproverRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One level of an approval workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalLevel {
    /// Ordering key; lower levels decide first.
    pub level: u8,
    /// Who staffs the level.
    pub role: ApproverRole,
    /// Optional levels are dropped when nobody holds the role.
    pub is_required: bool,
    /// The level may override a prior rejection.
    pub can_override: bool,
    /// Escalation window; `None` uses the configured default.
    pub escalation_hours: Option<u32>,
    /// Escalate automatically when the window elapses.
    pub auto_escalate_on_timeout: bool,
    /// Role that takes over on escalation; `None` only flags the step.
    pub escalate_to: Option<ApproverRole>,
}

/// An ordered set of approval levels for a leave type, or the default set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalWorkflow {
    /// Identifier.
    pub id: ApprovalWorkflowId,
    /// Display name.
    pub name: String,
    /// Leave type served; `None` marks the default workflow.
    pub leave_type_id: Option<LeaveTypeId>,
    /// Inactive workflows are ignored.
    pub is_active: bool,
    /// Levels, in any order; sorted by `level` when a chain is built.
    pub levels: Vec<ApprovalLevel>,
    /// Tell the first approver when a request is submitted.
    pub notify_on_submit: bool,
    /// Tell the next approver / requester on approval.
    pub notify_on_approval: bool,
    /// Tell the requester on rejection.
    pub notify_on_rejection: bool,
}

impl ApprovalWorkflow {
    /// Picks the workflow for `leave_type_id`, falling back to the default.
    #[must_use]
    pub fn select(workflows: &[ApprovalWorkflow], leave_type_id: LeaveTypeId) -> Option<&ApprovalWorkflow> {
        let active = || workflows.iter().filter(|w| w.is_active);
        active()
            .find(|w| w.leave_type_id == Some(leave_type_id))
            .or_else(|| active().find(|w| w.leave_type_id.is_none()))
    }

    /// Levels sorted by their ordering key.
    #[must_use]
    pub fn ordered_levels(&self) -> Vec<&ApprovalLevel> {
        let mut levels: Vec<_> = self.levels.iter().collect();
        levels.sort_by_key(|l| l.level);
        levels
    }

    /// Returns true if any level is staffed by HR.
    #[must_use]
    pub fn has_hr_levels(&self) -> bool {
        self.levels.iter().any(|l| l.role.is_hr())
    }
}
