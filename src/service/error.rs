use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::{ErrorMessage, HttpError},
    models::{bidmodel::BidStatus, paymentmodel::Payment, projectmodel::ProjectStatus},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User {0} is not authorized to perform this action on {1}")]
    NotAuthorized(Uuid, Uuid),

    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("Bid {0} not found")]
    BidNotFound(Uuid),

    #[error("Payment {0} not found")]
    PaymentNotFound(Uuid),

    #[error("No account found for user {0}")]
    AccountNotFound(Uuid),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Freelancer {freelancer_id} has already bid on project {project_id}")]
    DuplicateBid {
        project_id: Uuid,
        freelancer_id: Uuid,
    },

    // Idempotency short-circuit, not a hard failure: carries the prior
    // successful payment so callers can treat it as success-equivalent.
    #[error("Payment for bid {} already completed ({})", .payment.bid_id, .payment.transaction_id)]
    DuplicatePayment { payment: Box<Payment> },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Bid {0} is not pending (status {1:?})")]
    InvalidBidTransition(Uuid, BidStatus),

    #[error("Invalid project status transition: {from:?} -> {to:?}")]
    InvalidProjectTransition {
        from: ProjectStatus,
        to: ProjectStatus,
    },

    #[error("Storage operation could not complete")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::NotAuthorized(_, _) => StatusCode::UNAUTHORIZED,

            ServiceError::ProjectNotFound(_)
            | ServiceError::BidNotFound(_)
            | ServiceError::PaymentNotFound(_)
            | ServiceError::AccountNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::BusinessRule(_)
            | ServiceError::InvalidBidTransition(_, _)
            | ServiceError::InvalidProjectTransition { .. } => StatusCode::BAD_REQUEST,

            ServiceError::DuplicateBid { .. } | ServiceError::DuplicatePayment { .. } => {
                StatusCode::CONFLICT
            }

            ServiceError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match &error {
            // Storage errors are logged here and never surfaced verbatim.
            ServiceError::Database(err) => {
                tracing::error!("storage failure: {}", err);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
            _ => HttpError::new(error.to_string(), error.status_code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ServiceError::Validation("Amount must be positive".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn insufficient_funds_maps_to_payment_required() {
        let err = ServiceError::InsufficientFunds {
            required: 400,
            available: 100,
        };
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn storage_errors_are_not_surfaced_verbatim() {
        let err = ServiceError::Database(sqlx::Error::PoolTimedOut);
        let http: HttpError = err.into();
        assert_eq!(http.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!http.message.to_lowercase().contains("pool"));
    }
}
