//! Unified error codes for the Dineo client
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Menu errors
//! - 7xxx: Table errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that a UI layer can map
/// them to localized messages without parsing error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4007,
    /// Order header exists remotely but its items could not be written
    OrderIncomplete = 4008,
    /// A submission is already in flight
    OrderSubmitInProgress = 4009,
    /// Order has not reached a terminal status yet
    OrderNotTerminal = 4010,
    /// Order could not be created
    OrderCreateFailed = 4011,

    // ==================== 6xxx: Menu ====================
    /// Menu could not be loaded
    MenuUnavailable = 6002,

    // ==================== 7xxx: Table ====================
    /// No table selected for this device
    TableNotSelected = 7005,
    /// Table number outside the accepted range
    TableNumberInvalid = 7006,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Local database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timed out
    TimeoutError = 9004,
    /// Device is offline
    NetworkOffline = 9006,
    /// Stored data could not be decoded
    StorageCorrupted = 9403,
}

impl ErrorCode {
    /// Get the numeric value of this error code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this code represents success
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Your cart is empty",
            ErrorCode::OrderIncomplete => "Your order may be incomplete, please ask a staff member",
            ErrorCode::OrderSubmitInProgress => "Your order is already being placed",
            ErrorCode::OrderNotTerminal => "Your order is still being prepared",
            ErrorCode::OrderCreateFailed => "Failed to place order, please try again",

            // Menu
            ErrorCode::MenuUnavailable => "Menu is currently unavailable",

            // Table
            ErrorCode::TableNotSelected => "Please enter your table number first",
            ErrorCode::TableNumberInvalid => "Please enter a valid table number (1-100)",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::NetworkOffline => "You are offline, reconnect to place your order",
            ErrorCode::StorageCorrupted => "Stored data is corrupted",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::OrderIncomplete),
            4009 => Ok(ErrorCode::OrderSubmitInProgress),
            4010 => Ok(ErrorCode::OrderNotTerminal),
            4011 => Ok(ErrorCode::OrderCreateFailed),

            // Menu
            6002 => Ok(ErrorCode::MenuUnavailable),

            // Table
            7005 => Ok(ErrorCode::TableNotSelected),
            7006 => Ok(ErrorCode::TableNumberInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9006 => Ok(ErrorCode::NetworkOffline),
            9403 => Ok(ErrorCode::StorageCorrupted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::OrderEmpty.code(), 4007);
        assert_eq!(ErrorCode::OrderIncomplete.code(), 4008);
        assert_eq!(ErrorCode::TableNumberInvalid.code(), 7006);
        assert_eq!(ErrorCode::NetworkOffline.code(), 9006);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::OrderIncomplete.is_success());
    }

    #[test]
    fn test_try_from_covers_every_variant() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::Unknown,
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::InvalidRequest,
            ErrorCode::InvalidFormat,
            ErrorCode::OrderNotFound,
            ErrorCode::OrderEmpty,
            ErrorCode::OrderIncomplete,
            ErrorCode::OrderSubmitInProgress,
            ErrorCode::OrderNotTerminal,
            ErrorCode::OrderCreateFailed,
            ErrorCode::MenuUnavailable,
            ErrorCode::TableNotSelected,
            ErrorCode::TableNumberInvalid,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
            ErrorCode::NetworkError,
            ErrorCode::TimeoutError,
            ErrorCode::NetworkOffline,
            ErrorCode::StorageCorrupted,
        ];

        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::OrderIncomplete).unwrap();
        assert_eq!(json, "4008");

        let parsed: ErrorCode = serde_json::from_str("7006").unwrap();
        assert_eq!(parsed, ErrorCode::TableNumberInvalid);

        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
        assert_eq!(format!("{}", InvalidErrorCode(999)), "invalid error code: 999");
    }

    #[test]
    fn test_message() {
        assert_eq!(
            ErrorCode::TableNumberInvalid.message(),
            "Please enter a valid table number (1-100)"
        );
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
    }
}
