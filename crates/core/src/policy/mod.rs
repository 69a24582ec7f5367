//! Configuration entities consulted by the leave workflow.
//!
//! # Modules
//!
//! - `leave_type` - Leave types and their caps
//! - `employee` - Read model of the employee directory
//! - `package` - Vacation packages: eligibility, accrual, carryover, leave-year reset
//! - `approval` - Approval workflows, levels and approver roles
//! - `modifiers` - Manager delegations and block periods

pub mod approval;
pub mod employee;
pub mod leave_type;
pub mod modifiers;
pub mod package;

pub use approval::{ApprovalLevel, ApprovalTier, ApprovalWorkflow, ApproverRole};
pub use employee::EmployeeProfile;
pub use leave_type::LeaveType;
pub use modifiers::{LeaveBlockPeriod, ManagerDelegation};
pub use package::{
    AccrualFrequency, AccrualRules, CarryOverRules, Eligibility, ResetCriterion, VacationPackage,
};
