//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::ProductNotFound
            | Self::UserNotFound => StatusCode::NOT_FOUND,

            // 403 Forbidden
            Self::PermissionDenied | Self::AdminRequired => StatusCode::FORBIDDEN,

            // 409 Conflict (state transition not permitted)
            Self::InvalidTransition | Self::OrderAlreadyRefunded => StatusCode::CONFLICT,

            // 502 Bad Gateway (payment processor failure)
            Self::PaymentFailed | Self::RefundFailed => StatusCode::BAD_GATEWAY,

            // 504 Gateway Timeout
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            Self::InternalError | Self::StoreError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
