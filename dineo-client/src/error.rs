//! Client error types
//!
//! One enum per layer. Every error maps onto a stable
//! [`ErrorCode`](shared::error::ErrorCode) so a UI can render it without
//! matching on strings.

use shared::error::{AppError, ErrorCode};
use shared::models::InvalidTableNumber;
use shared::order::OrderStatus;
use thiserror::Error;

/// Local key-value store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A writer panicked while holding the in-memory store
    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Serialization(_) => ErrorCode::StorageCorrupted,
            Self::Poisoned => ErrorCode::InternalError,
            _ => ErrorCode::DatabaseError,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Order backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend refused or could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl BackendError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
            Self::Timeout(_) => ErrorCode::TimeoutError,
            Self::Http(_) | Self::Unavailable(_) => ErrorCode::NetworkError,
            Self::Status { .. } => ErrorCode::NetworkError,
            Self::InvalidResponse(_) | Self::Serialization(_) => ErrorCode::InvalidFormat,
            Self::NotFound(_) => ErrorCode::OrderNotFound,
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Order submission errors
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Another submission has not resolved yet
    #[error("Order submission already in progress")]
    InFlight,

    #[error("Device is offline")]
    Offline,

    #[error("No table selected")]
    NoTable,

    #[error("Cart is empty")]
    EmptyCart,

    /// Header write failed; nothing exists remotely, resubmitting is safe
    #[error("Failed to create order: {0}")]
    HeaderFailed(#[source] BackendError),

    /// Header exists remotely but its lines could not be written
    #[error("Order {order_id} may be incomplete (compensated: {compensated}): {source}")]
    IncompleteOrder {
        order_id: String,
        /// Whether the header was successfully cancelled afterwards
        compensated: bool,
        #[source]
        source: BackendError,
    },
}

impl SubmitError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InFlight => ErrorCode::OrderSubmitInProgress,
            Self::Offline => ErrorCode::NetworkOffline,
            Self::NoTable => ErrorCode::TableNotSelected,
            Self::EmptyCart => ErrorCode::OrderEmpty,
            Self::HeaderFailed(_) => ErrorCode::OrderCreateFailed,
            Self::IncompleteOrder { .. } => ErrorCode::OrderIncomplete,
        }
    }
}

impl From<&SubmitError> for AppError {
    fn from(err: &SubmitError) -> Self {
        let app = AppError::new(err.code());
        match err {
            SubmitError::IncompleteOrder {
                order_id,
                compensated,
                ..
            } => app
                .with_detail("order_id", order_id.as_str())
                .with_detail("compensated", *compensated),
            SubmitError::HeaderFailed(source) => app.with_detail("cause", source.to_string()),
            _ => app,
        }
    }
}

/// Session lifecycle errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidTable(#[from] InvalidTableNumber),

    #[error("No table selected")]
    NoTable,

    #[error("No active order")]
    NoActiveOrder,

    /// Action only available once the order reached its terminal status
    #[error("Order is still {0}")]
    NotTerminal(OrderStatus),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Menu is currently unavailable: {0}")]
    MenuUnavailable(#[source] BackendError),
}

impl SessionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidTable(_) => ErrorCode::TableNumberInvalid,
            Self::NoTable => ErrorCode::TableNotSelected,
            Self::NoActiveOrder => ErrorCode::OrderNotFound,
            Self::NotTerminal(_) => ErrorCode::OrderNotTerminal,
            Self::Submit(e) => e.code(),
            Self::Store(e) => e.code(),
            Self::MenuUnavailable(_) => ErrorCode::MenuUnavailable,
        }
    }
}

impl From<&SessionError> for AppError {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::Submit(e) => e.into(),
            SessionError::InvalidTable(e) => {
                AppError::new(ErrorCode::TableNumberInvalid).with_detail("input", e.input.as_str())
            }
            other => AppError::with_message(other.code(), other.to_string()),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_error_codes() {
        assert_eq!(SubmitError::InFlight.code(), ErrorCode::OrderSubmitInProgress);
        assert_eq!(SubmitError::Offline.code(), ErrorCode::NetworkOffline);
        assert_eq!(SubmitError::NoTable.code(), ErrorCode::TableNotSelected);
        assert_eq!(SubmitError::EmptyCart.code(), ErrorCode::OrderEmpty);
        assert_eq!(
            SubmitError::HeaderFailed(BackendError::Unavailable("down".into())).code(),
            ErrorCode::OrderCreateFailed
        );
    }

    #[test]
    fn test_incomplete_order_is_distinct_and_carries_details() {
        let err = SubmitError::IncompleteOrder {
            order_id: "ORD-7".to_string(),
            compensated: false,
            source: BackendError::Unavailable("lines rejected".into()),
        };
        assert_eq!(err.code(), ErrorCode::OrderIncomplete);

        let app = AppError::from(&err);
        assert_eq!(app.code, ErrorCode::OrderIncomplete);
        let details = app.details.unwrap();
        assert_eq!(details["order_id"], "ORD-7");
        assert_eq!(details["compensated"], false);
    }

    #[test]
    fn test_session_error_maps_invalid_table() {
        let err = SessionError::from(InvalidTableNumber {
            input: "101".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::TableNumberInvalid);
        assert_eq!(err.to_string(), "Please enter a valid table number (1-100)");

        let app = AppError::from(&err);
        assert_eq!(app.message, "Please enter a valid table number (1-100)");
    }

    #[test]
    fn test_store_error_codes() {
        let corrupt = serde_json::from_str::<u8>("not json").unwrap_err();
        assert_eq!(StoreError::from(corrupt).code(), ErrorCode::StorageCorrupted);
        assert_eq!(StoreError::Poisoned.code(), ErrorCode::InternalError);

        let err = SessionError::from(StoreError::Poisoned);
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_backend_timeout_and_menu_codes() {
        let timeout = BackendError::Timeout("status subscription".into());
        assert_eq!(timeout.code(), ErrorCode::TimeoutError);

        let err = SessionError::MenuUnavailable(BackendError::Unavailable("down".into()));
        assert_eq!(err.code(), ErrorCode::MenuUnavailable);
        assert_eq!(AppError::from(&err).code, ErrorCode::MenuUnavailable);
    }

    #[test]
    fn test_session_error_delegates_to_submit() {
        let err = SessionError::from(SubmitError::EmptyCart);
        assert_eq!(err.code(), ErrorCode::OrderEmpty);
        assert!(!AppError::from(&err).is_retryable());
    }
}
