//! Unified error handling.
//!
//! Provides a unified `AppError` for the flows a front end drives. The
//! `Display` text is for logs; what the customer sees comes from
//! [`AppError::user_message`], which never exposes internal details.

use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the shop.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Order submission failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// A protected flow was entered without a valid session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Input rejected before reaching any collaborator.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Message safe to show the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) | Self::Storage(_) => "Something went wrong on this device".to_string(),
            Self::Api(err) => api_message(err, "Request failed. Please try again."),
            Self::Checkout(CheckoutError::MissingField(field)) => format!("{field} is required"),
            Self::Checkout(CheckoutError::Submission(err)) => {
                api_message(err, "Order failed. Please try again.")
            }
            Self::Unauthorized(_) => "Please log in to continue".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }

    /// Whether offering the same action again could succeed.
    ///
    /// Every failed order submission is retryable except an expired session,
    /// which needs a fresh login first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Checkout(CheckoutError::Submission(err)) => {
                !matches!(err, ApiError::SessionExpired)
            }
            Self::Api(err) => matches!(err, ApiError::Http(_) | ApiError::Api { status: 500.., .. }),
            _ => false,
        }
    }
}

fn api_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::SessionExpired => "Your session has expired. Please log in again".to_string(),
        ApiError::Validation(msg) => msg.clone(),
        ApiError::ProductNotFound(id) => format!("No plant with id {id}"),
        // Auth and order rejections carry a message meant for the customer.
        ApiError::Api { status: 400..500, message } => message.clone(),
        ApiError::Http(_) | ApiError::Url(_) | ApiError::Api { .. } | ApiError::Parse(_) => {
            fallback.to_string()
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, message: &str) -> ApiError {
        ApiError::Api {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_order_server_failure_is_generic() {
        let err = AppError::from(CheckoutError::Submission(api(500, "pg: connection refused")));
        assert_eq!(err.user_message(), "Order failed. Please try again.");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_order_rejection_is_shown_and_retryable() {
        let err = AppError::from(CheckoutError::Submission(api(422, "Out of stock")));
        assert_eq!(err.user_message(), "Out of stock");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_missing_field() {
        let err = AppError::from(CheckoutError::MissingField("Address"));
        assert_eq!(err.user_message(), "Address is required");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_session_expired_is_not_retryable() {
        let err = AppError::from(CheckoutError::Submission(ApiError::SessionExpired));
        assert!(err.user_message().contains("log in"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_login_rejection_message() {
        let err = AppError::from(api(400, "Invalid credentials"));
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_error_is_hidden() {
        let err = AppError::from(ApiError::Parse("expected `[` at line 1".to_string()));
        assert_eq!(err.user_message(), "Request failed. Please try again.");
    }

    #[test]
    fn test_storage_error_is_hidden() {
        let err = AppError::from(StorageError::InvalidKey("../etc".to_string()));
        assert!(!err.user_message().contains("etc"));
    }
}
