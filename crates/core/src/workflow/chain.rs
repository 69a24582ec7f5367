//! Approval chain construction.
//!
//! Role resolution is a pure function of the requester, the role and the
//! date, backed by the org hierarchy and delegation lookups. The same
//! function re-resolves escalation targets.

use chrono::{DateTime, NaiveDate, Utc};
use furlough_shared::types::{EmployeeId, LeaveTypeId};

use super::error::WorkflowError;
use crate::collab::{DelegationLookup, OrgHierarchy};
use crate::policy::{ApprovalTier, ApprovalWorkflow, ApproverRole};
use crate::request::{ApprovalStep, DelegationGrant, EscalationRule, NotifySettings, StepAction};

/// Concrete approver for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedApprover {
    /// Who owns the step.
    pub approver_id: EmployeeId,
    /// Set when a delegate stands in.
    pub delegation: Option<DelegationGrant>,
}

/// Resolves `role` for `requester_id` on `on`.
///
/// Line-management roles honor a delegation in force; HR roles do not.
/// A role that resolves to the requester is treated as unresolvable, so
/// nobody approves their own leave.
#[must_use]
pub fn resolve_approver(
    requester_id: EmployeeId,
    role: ApproverRole,
    on: NaiveDate,
    org: &dyn OrgHierarchy,
    delegations: &dyn DelegationLookup,
) -> Option<ResolvedApprover> {
    let approver_id = org.resolve_approver(requester_id, role)?;
    if approver_id == requester_id {
        return None;
    }
    if role.tier() == ApprovalTier::LineManagement
        && let Some(delegation) = delegations.active_delegate(approver_id, on)
        && delegation.is_in_force(on)
        && delegation.delegate_id != requester_id
    {
        return Some(ResolvedApprover {
            approver_id: delegation.delegate_id,
            delegation: Some(DelegationGrant {
                delegator_id: approver_id,
                can_approve: delegation.can_approve,
                can_reject: delegation.can_reject,
            }),
        });
    }
    Some(ResolvedApprover {
        approver_id,
        delegation: None,
    })
}

/// A built chain plus the workflow's notification flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalChain {
    /// Ordered steps; the first is active.
    pub steps: Vec<ApprovalStep>,
    /// Notification flags.
    pub notify: NotifySettings,
}

/// Collaborators and defaults used while building a chain.
#[derive(Clone, Copy)]
pub struct ChainResolver<'a> {
    /// Org hierarchy.
    pub org: &'a dyn OrgHierarchy,
    /// Delegation lookup.
    pub delegations: &'a dyn DelegationLookup,
    /// Escalation window for levels that do not set one.
    pub default_escalation_hours: u32,
}

impl ChainResolver<'_> {
    /// Resolves `role` for `requester_id` on `on`.
    #[must_use]
    pub fn resolve(&self, requester_id: EmployeeId, role: ApproverRole, on: NaiveDate) -> Option<ResolvedApprover> {
        resolve_approver(requester_id, role, on, self.org, self.delegations)
    }
}

/// Builds approval chains from workflow configuration.
pub struct ApprovalChainBuilder;

impl ApprovalChainBuilder {
    /// Picks the workflow for the leave type and builds its chain.
    pub fn build(
        workflows: &[ApprovalWorkflow],
        leave_type_id: LeaveTypeId,
        requester_id: EmployeeId,
        on: NaiveDate,
        now: DateTime<Utc>,
        resolver: ChainResolver<'_>,
    ) -> Result<ApprovalChain, WorkflowError> {
        let workflow = ApprovalWorkflow::select(workflows, leave_type_id)
            .ok_or(WorkflowError::NoApplicableWorkflow(leave_type_id))?;
        Self::build_from(workflow, requester_id, on, now, resolver)
    }

    /// Builds the chain of `workflow` for `requester_id`.
    ///
    /// Optional levels nobody holds are dropped; a required one fails with
    /// `ApproverUnresolved`. The first step is activated at `now`.
    pub fn build_from(
        workflow: &ApprovalWorkflow,
        requester_id: EmployeeId,
        on: NaiveDate,
        now: DateTime<Utc>,
        resolver: ChainResolver<'_>,
    ) -> Result<ApprovalChain, WorkflowError> {
        let levels = workflow.ordered_levels();

        let mut seen_hr = false;
        for level in &levels {
            match level.role.tier() {
                ApprovalTier::Hr => seen_hr = true,
                ApprovalTier::LineManagement if seen_hr => {
                    return Err(WorkflowError::InvalidLevelOrder(level.level));
                }
                ApprovalTier::LineManagement => {}
            }
        }

        let mut steps = Vec::with_capacity(levels.len());
        for level in levels {
            let Some(resolved) = resolver.resolve(requester_id, level.role, on) else {
                if level.is_required {
                    return Err(WorkflowError::ApproverUnresolved {
                        level: level.level,
                        role: level.role,
                    });
                }
                continue;
            };
            steps.push(ApprovalStep {
                level: level.level,
                role: level.role,
                approver_id: resolved.approver_id,
                delegation: resolved.delegation,
                is_required: level.is_required,
                can_override: level.can_override,
                escalation: EscalationRule {
                    hours: level.escalation_hours.unwrap_or(resolver.default_escalation_hours),
                    auto_escalate: level.auto_escalate_on_timeout,
                    escalate_to: level.escalate_to,
                },
                action: StepAction::Pending,
                acted_by: None,
                comments: None,
                action_date: None,
                activated_at: None,
                is_escalated: false,
                escalated_at: None,
                escalated_from: None,
            });
        }

        let first = steps.first_mut().ok_or(WorkflowError::EmptyApprovalChain)?;
        first.activated_at = Some(now);

        Ok(ApprovalChain {
            steps,
            notify: NotifySettings {
                on_submit: workflow.notify_on_submit,
                on_approval: workflow.notify_on_approval,
                on_rejection: workflow.notify_on_rejection,
            },
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use furlough_shared::types::EmployeeId;

    use crate::collab::{DelegationLookup, OrgHierarchy};
    use crate::policy::{ApproverRole, ManagerDelegation};

    /// Fixed role assignments for one requester population.
    #[derive(Default)]
    pub struct FixedOrg {
        pub roles: HashMap<(EmployeeId, ApproverRole), EmployeeId>,
    }

    impl FixedOrg {
        pub fn with(mut self, employee: EmployeeId, role: ApproverRole, approver: EmployeeId) -> Self {
            self.roles.insert((employee, role), approver);
            self
        }
    }

    impl OrgHierarchy for FixedOrg {
        fn resolve_approver(&self, employee_id: EmployeeId, role: ApproverRole) -> Option<EmployeeId> {
            self.roles.get(&(employee_id, role)).copied()
        }
    }

    /// Delegations held in a list.
    #[derive(Default)]
    pub struct FixedDelegations(pub Vec<ManagerDelegation>);

    impl DelegationLookup for FixedDelegations {
        fn active_delegate(&self, manager_id: EmployeeId, on: NaiveDate) -> Option<ManagerDelegation> {
            self.0
                .iter()
                .find(|d| d.manager_id == manager_id && d.is_in_force(on))
                .cloned()
        }
    }
}
