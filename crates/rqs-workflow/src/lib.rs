//! rqs-workflow
//!
//! Pure lifecycle logic: the requisition and order transition tables, the
//! submit-time line validator, and the search criteria. No I/O lives here;
//! the service crate loads and stores entities around these calls.

pub mod search;
pub mod state_machine;
pub mod validator;

pub use search::{
    ApprovedCandidate, ApprovedFilterBy, ApprovedSearch, ApprovedSortBy, OrderSearchParams,
    RequisitionSearchParams, SearchParamError, search_order,
};
pub use state_machine::{finalize_order, next_status, RequisitionAction, TransitionError};
pub use validator::{validate_for_submit, FieldError, REQUISITION_LINES_FIELD};
