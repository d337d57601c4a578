use rqs_workflow::{FieldError, SearchParamError, TransitionError};

/// Every failure a service operation can report.
///
/// `skip` and `delete` do not use this for an unmet precondition; they
/// return `Ok(false)` instead.
#[derive(Debug, thiserror::Error)]
pub enum RequisitionError {
    #[error("{0}")]
    NotFound(String),

    /// Line-completeness failure at submit.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Status guard from the transition table.
    #[error("{0}")]
    InvalidTransition(String),

    /// Duplicate non-emergency requisition for a (facility, program, period).
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("store failure: {0:#}")]
    Store(anyhow::Error),

    #[error("reference data failure: {0:#}")]
    ReferenceData(anyhow::Error),

    /// Rendering an order for print.
    #[error("order export failed: {0:#}")]
    Export(anyhow::Error),
}

pub type ServiceResult<T> = Result<T, RequisitionError>;

impl RequisitionError {
    pub fn not_found(entity: &str, id: uuid::Uuid) -> Self {
        RequisitionError::NotFound(format!("{entity} {id} not found"))
    }
}

impl From<FieldError> for RequisitionError {
    fn from(e: FieldError) -> Self {
        RequisitionError::Validation {
            field: e.field.to_string(),
            message: e.message.to_string(),
        }
    }
}

impl From<TransitionError> for RequisitionError {
    fn from(e: TransitionError) -> Self {
        RequisitionError::InvalidTransition(e.to_string())
    }
}

impl From<SearchParamError> for RequisitionError {
    fn from(e: SearchParamError) -> Self {
        RequisitionError::BadRequest(e.to_string())
    }
}

pub(crate) fn store_err(e: anyhow::Error) -> RequisitionError {
    tracing::error!(error = %format!("{e:#}"), "store call failed");
    RequisitionError::Store(e)
}

pub(crate) fn refdata_err(e: anyhow::Error) -> RequisitionError {
    tracing::error!(error = %format!("{e:#}"), "reference data call failed");
    RequisitionError::ReferenceData(e)
}

pub(crate) fn export_err(e: anyhow::Error) -> RequisitionError {
    tracing::error!(error = %format!("{e:#}"), "order export failed");
    RequisitionError::Export(e)
}
