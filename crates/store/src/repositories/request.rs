//! Leave request repository.

use furlough_core::request::LeaveRequest;
use furlough_core::workflow::WorkflowError;
use furlough_shared::types::{DateRange, EmployeeId, LeaveRequestId};

use crate::error::StoreError;
use crate::versioned::VersionedMap;

/// Stored leave requests.
#[derive(Debug, Default)]
pub struct RequestRepository {
    requests: VersionedMap<LeaveRequest>,
}

impl RequestRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a request.
    pub fn get(&self, id: LeaveRequestId) -> Result<LeaveRequest, WorkflowError> {
        self.requests.get(&id).ok_or(WorkflowError::RequestNotFound(id))
    }

    /// Stores a new request.
    pub fn insert(&self, request: LeaveRequest) -> Result<LeaveRequest, WorkflowError> {
        self.requests.insert_new(request).map_err(storage)
    }

    /// Writes `request` if nobody changed it since it was read.
    pub fn save(&self, request: LeaveRequest) -> Result<LeaveRequest, WorkflowError> {
        let id = request.id;
        self.requests.compare_and_swap(request).map_err(|e| match e {
            StoreError::VersionConflict { .. } => WorkflowError::ConcurrentModification(id),
            StoreError::NotFound(_) => WorkflowError::RequestNotFound(id),
            other => storage(other),
        })
    }

    /// Every request of an employee.
    pub fn for_employee(&self, employee_id: EmployeeId) -> Vec<LeaveRequest> {
        self.requests.filter(|r| r.employee_id == employee_id)
    }

    /// Booked requests of any of `employees` intersecting `range`.
    pub fn booked_in(&self, employees: &[EmployeeId], range: &DateRange) -> Vec<LeaveRequest> {
        self.requests.filter(|r| {
            r.status.counts_as_booked() && employees.contains(&r.employee_id) && r.range.intersects(range)
        })
    }

    /// Requests with an active approval step.
    pub fn awaiting_decision(&self) -> Vec<LeaveRequest> {
        self.requests.filter(|r| r.active_step_index().is_some())
    }

    /// Requests at final approval, not yet completed.
    pub fn fully_approved(&self) -> Vec<LeaveRequest> {
        self.requests.filter(LeaveRequest::is_fully_approved)
    }

    /// Number of stored requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

fn storage(e: StoreError) -> WorkflowError {
    WorkflowError::Storage(e.to_string())
}
