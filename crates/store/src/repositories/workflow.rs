//! Leave workflow repository.
//!
//! Orchestrates a request through submission, decisions, cancellation,
//! override, downstream sync and completion.
//!
//! Ledger ordering: every ledger movement happens before the request is
//! written. When the request write is lost the movement is reversed
//! (release for a reservation, reopen for a commit, restore for a release),
//! so the ledger never disagrees with the stored request status.

use std::sync::Arc;

use chrono::NaiveDate;
use furlough_core::Clock;
use furlough_core::balance::{BalanceKey, ExcessDaysHandling};
use furlough_core::collab::{DownstreamSync, HolidayCalendar, NotificationSink, OrgHierarchy, SyncSignal, SyncTarget};
use furlough_core::conflict::{ConflictContext, ConflictDetector, ConflictReport};
use furlough_core::policy::{EmployeeProfile, LeaveType, ResetCriterion};
use furlough_core::request::{
    LeaveRequest, LeaveStatus, NewLeaveRequest, OverlapDetail, RequestValidator, ValidationWarning,
};
use furlough_core::workflow::{
    ApprovalChainBuilder, ChainResolver, Decision, LeaveStateMachine, LedgerEffect, Transition, WorkflowError,
};
use furlough_shared::config::{ConflictConfig, WorkflowConfig};
use furlough_shared::types::{EmployeeId, LeaveRequestId};
use rust_decimal::Decimal;

use super::balance::BalanceRepository;
use super::catalog::PolicyCatalog;
use super::dispatch;
use super::request::RequestRepository;

/// External collaborators and shared configuration of the workflow.
#[derive(Clone)]
pub struct WorkflowDeps {
    /// Policy catalog (also the delegation lookup).
    pub catalog: Arc<PolicyCatalog>,
    /// Org hierarchy.
    pub org: Arc<dyn OrgHierarchy>,
    /// Working-day calendar.
    pub calendar: Arc<dyn HolidayCalendar>,
    /// Notification delivery.
    pub notifier: Arc<dyn NotificationSink>,
    /// Payroll and time-management publication.
    pub sync: Arc<dyn DownstreamSync>,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
}

/// Drives leave requests through the state machine.
pub struct LeaveWorkflowRepository {
    requests: Arc<RequestRepository>,
    balances: Arc<BalanceRepository>,
    deps: WorkflowDeps,
    workflow: WorkflowConfig,
    conflict: ConflictConfig,
}

impl LeaveWorkflowRepository {
    /// Creates the repository.
    #[must_use]
    pub fn new(
        requests: Arc<RequestRepository>,
        balances: Arc<BalanceRepository>,
        deps: WorkflowDeps,
        workflow: WorkflowConfig,
        conflict: ConflictConfig,
    ) -> Self {
        Self {
            requests,
            balances,
            deps,
            workflow,
            conflict,
        }
    }

    /// Validates input, counts working days and stores a draft.
    pub fn create_draft(&self, input: NewLeaveRequest) -> Result<LeaveRequest, WorkflowError> {
        let now = self.deps.clock.now();
        RequestValidator::validate_input(&input, now.date_naive())?;
        let employee = self.employee(input.employee_id)?;
        let leave_type = self.leave_type(&input)?;
        let total_days = RequestValidator::total_days(
            input.range,
            input.half_day,
            self.deps.calendar.as_ref(),
            &employee.country_code,
        )?;
        let balance_year = self.leave_year(&employee, &leave_type, input.range.start);

        let draft = self
            .requests
            .insert(LeaveRequest::draft(input, total_days, balance_year, now))?;
        tracing::info!(
            request_id = %draft.id,
            employee_id = %draft.employee_id,
            days = %draft.total_days,
            balance_year,
            "Leave request drafted"
        );
        Ok(draft)
    }

    /// Submits a draft.
    ///
    /// Validation, chain building and conflict checks all run before the
    /// reservation, so a refused submission leaves nothing behind.
    pub fn submit(&self, request_id: LeaveRequestId, actor: EmployeeId) -> Result<LeaveRequest, WorkflowError> {
        let now = self.deps.clock.now();
        let today = now.date_naive();
        let draft = self.requests.get(request_id)?;
        if actor != draft.employee_id {
            return Err(WorkflowError::NotAuthorized(actor));
        }
        let employee = self.employee(draft.employee_id)?;
        let leave_type = self.leave_type_of(&draft)?;
        RequestValidator::check_leave_type(&leave_type, draft.total_days, &draft.document_ids)?;

        let workflows = self.deps.catalog.workflows();
        let chain = ApprovalChainBuilder::build(&workflows, leave_type.id, employee.id, today, now, self.resolver())?;
        if let Some(first) = chain.steps.first() {
            let target = LeaveStatus::pending_for(first.tier());
            if !draft.status.can_transition_to(target) {
                return Err(WorkflowError::InvalidTransition {
                    from: draft.status,
                    to: target,
                });
            }
        }

        let report = self.conflicts(&draft, &employee)?;

        let key = Self::balance_key(&draft);
        let excess = self.reserve(&draft, &leave_type, key)?;
        let transition = match LeaveStateMachine::submit(&draft, chain, excess, &report, actor, now) {
            Ok(t) => t,
            Err(e) => {
                self.compensate(key, excess.paid_days, request_id);
                return Err(e);
            }
        };
        let saved = match self.requests.save(transition.request) {
            Ok(saved) => saved,
            Err(e) => {
                self.compensate(key, excess.paid_days, request_id);
                return Err(e);
            }
        };

        self.link_overlaps(&saved, &report);
        dispatch(self.deps.notifier.as_ref(), saved.id, &transition.notifications);
        tracing::info!(
            request_id = %saved.id,
            employee_id = %saved.employee_id,
            status = %saved.status,
            paid_days = %excess.paid_days,
            unpaid_days = %excess.unpaid_days,
            warnings = saved.validation.warnings.len(),
            "Leave request submitted"
        );
        Ok(saved)
    }

    /// Records a decision on the active step.
    pub fn decide(
        &self,
        request_id: LeaveRequestId,
        step_index: usize,
        decision: Decision,
        actor: EmployeeId,
        comments: Option<String>,
    ) -> Result<LeaveRequest, WorkflowError> {
        let now = self.deps.clock.now();
        let require_comment = self.workflow.require_rejection_comment;
        let transition = self.apply_with_retry(request_id, |current| {
            LeaveStateMachine::decide(current, step_index, decision, actor, comments.clone(), require_comment, now)
        })?;
        tracing::info!(
            request_id = %request_id,
            step = step_index,
            ?decision,
            actor = %actor,
            status = %transition.request.status,
            "Approval decision recorded"
        );
        Ok(self.finish(transition))
    }

    /// Cancels an open request and releases its reservation.
    pub fn cancel(
        &self,
        request_id: LeaveRequestId,
        actor: EmployeeId,
        reason: &str,
    ) -> Result<LeaveRequest, WorkflowError> {
        let now = self.deps.clock.now();
        let transition =
            self.apply_with_retry(request_id, |current| LeaveStateMachine::cancel(current, actor, reason, now))?;
        tracing::info!(request_id = %request_id, actor = %actor, "Leave request cancelled");
        Ok(self.finish(transition))
    }

    /// Overrides a rejection.
    ///
    /// The reservation released on rejection is taken again against the
    /// current balance, so the paid/unpaid split may differ from the
    /// original one.
    pub fn override_rejection(
        &self,
        request_id: LeaveRequestId,
        actor: EmployeeId,
        reason: &str,
    ) -> Result<LeaveRequest, WorkflowError> {
        let now = self.deps.clock.now();
        let current = self.requests.get(request_id)?;
        let mut transition = LeaveStateMachine::override_rejection(&current, actor, reason, now)?;
        let leave_type = self.leave_type_of(&current)?;
        let key = Self::balance_key(&current);

        let excess = self.reserve(&current, &leave_type, key)?;
        transition.request.excess = excess;
        if excess.converted_to_unpaid {
            transition.request.validation.push(ValidationWarning::ExcessConvertedToUnpaid {
                paid_days: excess.paid_days,
                unpaid_days: excess.unpaid_days,
            });
        }
        let commits = transition.effect.commits();
        if commits && let Err(e) = self.settle(&transition.request, LedgerEffect::Commit) {
            self.compensate(key, excess.paid_days, request_id);
            return Err(e);
        }
        let saved = match self.requests.save(transition.request.clone()) {
            Ok(saved) => saved,
            Err(e) => {
                if commits {
                    self.unsettle(&transition.request, LedgerEffect::Commit);
                }
                self.compensate(key, excess.paid_days, request_id);
                return Err(e);
            }
        };
        tracing::info!(
            request_id = %request_id,
            actor = %actor,
            status = %saved.status,
            "Rejection overridden"
        );
        transition.request = saved;
        Ok(self.finish(transition))
    }

    /// Records a downstream acknowledgment.
    pub fn acknowledge_sync(
        &self,
        request_id: LeaveRequestId,
        target: SyncTarget,
    ) -> Result<LeaveRequest, WorkflowError> {
        let now = self.deps.clock.now();
        let transition = self.apply_with_retry(request_id, |current| {
            LeaveStateMachine::acknowledge_sync(current, target, now)
        })?;
        tracing::debug!(request_id = %request_id, ?target, "Sync acknowledged");
        Ok(transition.request)
    }

    /// Completes every fully approved request whose period ended before
    /// `today` and whose downstream targets acknowledged it.
    ///
    /// Returns the number completed.
    pub fn complete_elapsed(&self, today: NaiveDate) -> usize {
        let now = self.deps.clock.now();
        let mut completed = 0;
        for request in self.requests.fully_approved() {
            let next = match LeaveStateMachine::complete(&request, today, now) {
                Ok(t) => t.request,
                Err(WorkflowError::NotYetCompletable(why)) => {
                    tracing::trace!(request_id = %request.id, why, "Not completable yet");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(request_id = %request.id, error = %e, "Completion failed");
                    continue;
                }
            };
            match self.requests.save(next) {
                Ok(_) => completed += 1,
                Err(e) => tracing::debug!(request_id = %request.id, error = %e, "Completion skipped"),
            }
        }
        if completed > 0 {
            tracing::info!(completed, "Elapsed leave completed");
        }
        completed
    }

    // ========== Internals ==========

    fn resolver(&self) -> ChainResolver<'_> {
        ChainResolver {
            org: self.deps.org.as_ref(),
            delegations: self.deps.catalog.as_ref(),
            default_escalation_hours: self.workflow.default_escalation_hours,
        }
    }

    fn employee(&self, id: EmployeeId) -> Result<EmployeeProfile, WorkflowError> {
        self.deps.catalog.employee(id).ok_or(WorkflowError::EmployeeNotFound(id))
    }

    fn leave_type(&self, input: &NewLeaveRequest) -> Result<LeaveType, WorkflowError> {
        self.deps
            .catalog
            .leave_type(input.leave_type_id)
            .ok_or(WorkflowError::LeaveTypeNotFound(input.leave_type_id))
    }

    fn leave_type_of(&self, request: &LeaveRequest) -> Result<LeaveType, WorkflowError> {
        self.deps
            .catalog
            .leave_type(request.leave_type_id)
            .ok_or(WorkflowError::LeaveTypeNotFound(request.leave_type_id))
    }

    /// Leave year containing `on`; requests spanning a year boundary are
    /// charged to the year of their first day.
    fn leave_year(&self, employee: &EmployeeProfile, leave_type: &LeaveType, on: NaiveDate) -> i32 {
        self.deps
            .catalog
            .package_for(employee, leave_type.id, on)
            .map_or(ResetCriterion::CalendarYear, |p| p.reset)
            .leave_year_of(employee, on)
    }

    const fn balance_key(request: &LeaveRequest) -> BalanceKey {
        BalanceKey::new(request.employee_id, request.leave_type_id, request.balance_year)
    }

    fn conflicts(&self, draft: &LeaveRequest, employee: &EmployeeProfile) -> Result<ConflictReport, WorkflowError> {
        let own = self.requests.for_employee(employee.id);
        let team = self.deps.catalog.department_of(employee);
        let team_ids: Vec<EmployeeId> = team.iter().map(|m| m.id).collect();
        let team_requests = self.requests.booked_in(&team_ids, &draft.range);
        let blocks = self.deps.catalog.block_periods();
        let context = ConflictContext {
            own_requests: &own,
            team: &team,
            team_requests: &team_requests,
            block_periods: &blocks,
        };
        Ok(ConflictDetector::evaluate(draft, employee, context, &self.conflict)?)
    }

    /// Reserves the request's days. Unpaid leave types draw nothing.
    fn reserve(
        &self,
        request: &LeaveRequest,
        leave_type: &LeaveType,
        key: BalanceKey,
    ) -> Result<ExcessDaysHandling, WorkflowError> {
        if !leave_type.is_paid {
            return Ok(ExcessDaysHandling::all_unpaid(request.total_days));
        }
        let reservation = self.balances.reserve_checked(
            key,
            request.total_days,
            leave_type.allow_unpaid_excess,
            |r| {
                let already_used = r.balance.taken + r.balance.pending - r.excess.paid_days;
                RequestValidator::check_annual_cap(leave_type, already_used, r.excess.paid_days)
                    .map_err(WorkflowError::from)
            },
        )?;
        Ok(reservation.excess)
    }

    /// Gives back a reservation after a failed write.
    fn compensate(&self, key: BalanceKey, paid_days: Decimal, request_id: LeaveRequestId) {
        if paid_days <= Decimal::ZERO {
            return;
        }
        if let Err(e) = self.balances.release(key, paid_days) {
            tracing::error!(
                request_id = %request_id,
                key = %key,
                days = %paid_days,
                error = %e,
                "Failed to release reservation after aborted write"
            );
        }
    }

    /// Runs `op` against the stored request, settles its ledger effect and
    /// writes the result, retrying on lost races. A lost write reverses the
    /// settlement before the next attempt. The returned transition carries
    /// the stored request.
    fn apply_with_retry(
        &self,
        request_id: LeaveRequestId,
        mut op: impl FnMut(&LeaveRequest) -> Result<Transition, WorkflowError>,
    ) -> Result<Transition, WorkflowError> {
        for attempt in 0..=self.workflow.max_write_retries {
            let current = self.requests.get(request_id)?;
            let mut transition = op(&current)?;
            self.settle(&transition.request, transition.effect)?;
            match self.requests.save(transition.request.clone()) {
                Ok(saved) => {
                    transition.request = saved;
                    return Ok(transition);
                }
                Err(WorkflowError::ConcurrentModification(_)) => {
                    self.unsettle(&transition.request, transition.effect);
                    tracing::debug!(request_id = %request_id, attempt, "Request write conflict, retrying");
                }
                Err(e) => {
                    self.unsettle(&transition.request, transition.effect);
                    return Err(e);
                }
            }
        }
        tracing::warn!(
            request_id = %request_id,
            retries = self.workflow.max_write_retries,
            "Request write retries exhausted"
        );
        Err(WorkflowError::ConcurrentModification(request_id))
    }

    /// Notifies and publishes on final approval.
    fn finish(&self, transition: Transition) -> LeaveRequest {
        let Transition {
            request,
            effect,
            notifications,
        } = transition;
        dispatch(self.deps.notifier.as_ref(), request.id, &notifications);
        if effect.commits() {
            return self.publish(request);
        }
        request
    }

    fn settle(&self, request: &LeaveRequest, effect: LedgerEffect) -> Result<(), WorkflowError> {
        let paid = request.paid_days();
        if paid <= Decimal::ZERO {
            return Ok(());
        }
        let key = Self::balance_key(request);
        let result = match effect {
            LedgerEffect::Commit | LedgerEffect::ReserveAndCommit => self.balances.commit(key, paid),
            LedgerEffect::Release => self.balances.release(key, paid),
            LedgerEffect::None | LedgerEffect::Reserve => return Ok(()),
        };
        result.map(|_| ()).map_err(|e| {
            tracing::error!(
                request_id = %request.id,
                key = %key,
                ?effect,
                error = %e,
                "Ledger settlement failed, request left unchanged"
            );
            WorkflowError::from(e)
        })
    }

    /// Reverses a settlement whose request write was lost.
    fn unsettle(&self, request: &LeaveRequest, effect: LedgerEffect) {
        let paid = request.paid_days();
        if paid <= Decimal::ZERO {
            return;
        }
        let key = Self::balance_key(request);
        let result = match effect {
            LedgerEffect::Commit | LedgerEffect::ReserveAndCommit => self.balances.reopen(key, paid),
            LedgerEffect::Release => self.balances.restore(key, paid),
            LedgerEffect::None | LedgerEffect::Reserve => return,
        };
        if let Err(e) = result {
            tracing::error!(
                request_id = %request.id,
                key = %key,
                ?effect,
                error = %e,
                "Failed to reverse settlement after lost write"
            );
        }
    }

    /// Publishes an approved request downstream and stamps `published_at`.
    fn publish(&self, request: LeaveRequest) -> LeaveRequest {
        let pay_code = self
            .deps
            .catalog
            .leave_type(request.leave_type_id)
            .map(|lt| lt.payroll_code)
            .unwrap_or_default();
        let signal = SyncSignal {
            request_id: request.id,
            employee_id: request.employee_id,
            range: request.range,
            paid_days: request.excess.paid_days,
            unpaid_days: request.excess.unpaid_days,
            pay_code,
        };
        for target in SyncTarget::ALL {
            if let Err(e) = self.deps.sync.publish(target, &signal) {
                tracing::warn!(request_id = %request.id, ?target, error = %e, "Downstream publication failed");
            }
        }

        let now = self.deps.clock.now();
        let stamped = self.apply_with_retry(request.id, |current| {
            let mut next = current.clone();
            next.sync.published_at = Some(now);
            Ok(Transition {
                request: next,
                effect: LedgerEffect::None,
                notifications: Vec::new(),
            })
        });
        match stamped {
            Ok(t) => t.request,
            Err(e) => {
                tracing::warn!(request_id = %request.id, error = %e, "Could not record publication time");
                request
            }
        }
    }

    /// Points existing overlapping requests back at the newcomer.
    fn link_overlaps(&self, saved: &LeaveRequest, report: &ConflictReport) {
        let now = self.deps.clock.now();
        for overlap in &report.overlaps {
            let detail = OverlapDetail {
                request_id: saved.id,
                range: saved.range,
                status: saved.status,
            };
            let linked = self.apply_with_retry(overlap.request_id, |current| {
                let mut next = current.clone();
                if next.add_overlap(detail.clone()) {
                    next.validation.push(ValidationWarning::Overlap {
                        request_id: saved.id,
                        range: saved.range,
                    });
                    next.updated_at = now;
                }
                Ok(Transition {
                    request: next,
                    effect: LedgerEffect::None,
                    notifications: Vec::new(),
                })
            });
            if let Err(e) = linked {
                tracing::warn!(
                    request_id = %saved.id,
                    other = %overlap.request_id,
                    error = %e,
                    "Could not link overlapping request"
                );
            }
        }
    }
}
