use crate::store::StoreError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Validation(String),

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Insufficient stock for product {0}")]
    InsufficientStock(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("Refund error: {0}")]
    Refund(String),

    #[error("Payment gateway timed out")]
    GatewayTimeout,
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Store(e) => {
                // Technical detail stays in the log; callers get the code
                tracing::error!(error = %e, "Store error reached the engine boundary");
                AppError::with_message(ErrorCode::StoreError, e.to_string())
            }
            EngineError::Validation(msg) => AppError::validation(msg),
            EngineError::EmptyOrder => AppError::new(ErrorCode::OrderEmpty),
            EngineError::OrderNotFound(id) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("order", id)
            }
            EngineError::ProductNotFound(id) => {
                AppError::new(ErrorCode::ProductNotFound).with_detail("product", id)
            }
            EngineError::InsufficientStock(id) => AppError::insufficient_stock(id),
            EngineError::InvalidTransition(msg) => AppError::invalid_transition(msg),
            EngineError::Forbidden(msg) => AppError::forbidden(msg),
            EngineError::Payment(msg) => AppError::payment(msg),
            EngineError::Refund(msg) => AppError::with_message(ErrorCode::RefundFailed, msg),
            EngineError::GatewayTimeout => AppError::new(ErrorCode::GatewayTimeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err: AppError = EngineError::OrderNotFound("o-1".to_string()).into();
        assert_eq!(err.code, ErrorCode::OrderNotFound);

        let err: AppError = EngineError::InsufficientStock("p-1".to_string()).into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err: AppError = EngineError::GatewayTimeout.into();
        assert_eq!(err.code, ErrorCode::GatewayTimeout);

        let err: AppError = EngineError::Refund("declined".to_string()).into();
        assert_eq!(err.code, ErrorCode::RefundFailed);
    }

    #[test]
    fn test_store_error_maps_to_store_code() {
        let err: AppError = EngineError::Store(StoreError::Backend("io".to_string())).into();
        assert_eq!(err.code, ErrorCode::StoreError);
        assert!(!err.is_client_error());
    }
}
