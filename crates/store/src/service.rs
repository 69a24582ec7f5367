//! The `LeaveService` facade handed to transport.
//!
//! Every call returns `AppResult<Outcome<T>>`: the value plus the
//! non-blocking warnings the operation produced.

use std::sync::Arc;

use furlough_core::balance::{AdjustmentInput, BalanceKey, EmployeeLeaveBalance, LeaveAdjustment};
use furlough_core::collab::SyncTarget;
use furlough_core::request::{LeaveRequest, NewLeaveRequest, ValidationWarning};
use furlough_core::workflow::{Decision, WorkflowError};
use furlough_shared::AppError;
use furlough_shared::config::AppConfig;
use furlough_shared::types::{EmployeeId, LeaveRequestId};
use furlough_shared::AppResult;

use crate::repositories::{
    AccrualRepository, BalanceRepository, EscalationRepository, LeaveWorkflowRepository, PolicyCatalog,
    RequestRepository, WorkflowDeps,
};

/// A result plus its advisory findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    /// The value.
    pub value: T,
    /// Non-blocking findings.
    pub warnings: Vec<ValidationWarning>,
}

impl<T> Outcome<T> {
    /// A value without warnings.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }
}

impl Outcome<LeaveRequest> {
    fn of_request(request: LeaveRequest) -> Self {
        let warnings = request.validation.warnings.clone();
        Self {
            value: request,
            warnings,
        }
    }
}

/// Entry point for the leave subsystem.
pub struct LeaveService {
    requests: Arc<RequestRepository>,
    balances: Arc<BalanceRepository>,
    workflow: Arc<LeaveWorkflowRepository>,
    deps: WorkflowDeps,
    config: AppConfig,
}

impl LeaveService {
    /// Wires repositories over empty stores.
    #[must_use]
    pub fn new(config: AppConfig, deps: WorkflowDeps) -> Self {
        let requests = Arc::new(RequestRepository::new());
        let balances = Arc::new(BalanceRepository::new(
            Arc::clone(&deps.clock),
            config.workflow.max_write_retries,
        ));
        let workflow = Arc::new(LeaveWorkflowRepository::new(
            Arc::clone(&requests),
            Arc::clone(&balances),
            deps.clone(),
            config.workflow.clone(),
            config.conflict.clone(),
        ));
        Self {
            requests,
            balances,
            workflow,
            deps,
            config,
        }
    }

    /// The policy catalog.
    pub fn catalog(&self) -> &PolicyCatalog {
        &self.deps.catalog
    }

    /// The workflow repository (completion sweep).
    pub fn workflow(&self) -> Arc<LeaveWorkflowRepository> {
        Arc::clone(&self.workflow)
    }

    /// The balance repository.
    pub fn balances(&self) -> Arc<BalanceRepository> {
        Arc::clone(&self.balances)
    }

    /// An escalation repository over the same stores.
    pub fn escalation(&self) -> EscalationRepository {
        EscalationRepository::new(
            Arc::clone(&self.requests),
            Arc::clone(&self.deps.catalog),
            Arc::clone(&self.deps.org),
            Arc::clone(&self.deps.notifier),
            self.config.workflow.default_escalation_hours,
        )
    }

    /// An accrual repository over the same stores.
    pub fn accrual(&self) -> AccrualRepository {
        AccrualRepository::new(Arc::clone(&self.balances), Arc::clone(&self.deps.catalog))
    }

    // ========== Requests ==========

    /// Creates a draft.
    pub fn create_draft(&self, input: NewLeaveRequest) -> AppResult<Outcome<LeaveRequest>> {
        let draft = self.workflow.create_draft(input).map_err(into_app)?;
        Ok(Outcome::clean(draft))
    }

    /// Submits a draft.
    pub fn submit(&self, request_id: LeaveRequestId, actor: EmployeeId) -> AppResult<Outcome<LeaveRequest>> {
        self.workflow
            .submit(request_id, actor)
            .map(Outcome::of_request)
            .map_err(into_app)
    }

    /// Approves or rejects the active step.
    pub fn decide(
        &self,
        request_id: LeaveRequestId,
        step_index: usize,
        decision: Decision,
        actor: EmployeeId,
        comments: Option<String>,
    ) -> AppResult<Outcome<LeaveRequest>> {
        self.workflow
            .decide(request_id, step_index, decision, actor, comments)
            .map(Outcome::of_request)
            .map_err(into_app)
    }

    /// Cancels an open request.
    pub fn cancel(
        &self,
        request_id: LeaveRequestId,
        actor: EmployeeId,
        reason: &str,
    ) -> AppResult<Outcome<LeaveRequest>> {
        self.workflow
            .cancel(request_id, actor, reason)
            .map(Outcome::of_request)
            .map_err(into_app)
    }

    /// Overrides a rejection.
    pub fn override_rejection(
        &self,
        request_id: LeaveRequestId,
        actor: EmployeeId,
        reason: &str,
    ) -> AppResult<Outcome<LeaveRequest>> {
        self.workflow
            .override_rejection(request_id, actor, reason)
            .map(Outcome::of_request)
            .map_err(into_app)
    }

    /// Looks up a request.
    pub fn get_request(&self, request_id: LeaveRequestId) -> AppResult<Outcome<LeaveRequest>> {
        self.requests
            .get(request_id)
            .map(Outcome::of_request)
            .map_err(into_app)
    }

    /// Records a downstream acknowledgment.
    pub fn acknowledge_sync(
        &self,
        request_id: LeaveRequestId,
        target: SyncTarget,
    ) -> AppResult<Outcome<LeaveRequest>> {
        self.workflow
            .acknowledge_sync(request_id, target)
            .map(Outcome::clean)
            .map_err(into_app)
    }

    // ========== Balances ==========

    /// Looks up a balance.
    pub fn get_balance(&self, key: BalanceKey) -> AppResult<Outcome<EmployeeLeaveBalance>> {
        self.balances
            .get(&key)
            .map(Outcome::clean)
            .ok_or_else(|| AppError::NotFound(format!("Balance {key} not found")))
    }

    /// Applies a manual adjustment, correction or encashment.
    pub fn adjust_balance(
        &self,
        key: BalanceKey,
        input: &AdjustmentInput,
    ) -> AppResult<Outcome<(EmployeeLeaveBalance, LeaveAdjustment)>> {
        let leave_type = self
            .deps
            .catalog
            .leave_type(key.leave_type_id)
            .ok_or_else(|| AppError::NotFound(format!("Leave type {} not found", key.leave_type_id)))?;
        if input.adjustment_type.is_system() {
            return Err(AppError::Validation(format!(
                "{:?} adjustments are written by scheduled runs only",
                input.adjustment_type
            )));
        }
        let adjusted = self.balances.adjust(key, input, &leave_type)?;
        Ok(Outcome::clean(adjusted))
    }

    /// Adjustment history of a balance, newest last.
    pub fn adjustment_history(&self, key: BalanceKey) -> AppResult<Outcome<Vec<LeaveAdjustment>>> {
        Ok(Outcome::clean(self.balances.history(&key)))
    }
}

fn into_app(e: WorkflowError) -> AppError {
    let code = e.error_code();
    let app = AppError::from(e);
    if app.is_retryable() {
        tracing::warn!(error = %app, code, "Request failed, retry may succeed");
    } else {
        tracing::debug!(error = %app, code, "Request refused");
    }
    app
}
