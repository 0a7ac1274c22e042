//! # API Error Type
//!
//! Unified error type for terminal operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kasira POS                             │
//! │                                                                         │
//! │  Frontend                    Rust Backend                               │
//! │  ────────                    ────────────                               │
//! │                                                                         │
//! │  POST /checkout                                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Terminal operation: Result<T, ApiError>                                │
//! │         │                                                               │
//! │         ├── DbError::Domain(InsufficientStock) ──► INSUFFICIENT_STOCK  │
//! │         ├── CoreError::Validation(..) ───────────► VALIDATION_ERROR    │
//! │         ├── CoreError::ShiftStillOpen ───────────► CONFLICT            │
//! │         └── sqlx failure ────────────────────────► DATABASE_ERROR      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  { "code": "INSUFFICIENT_STOCK", "message": "..." }                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use kasira_core::CoreError;
use kasira_db::DbError;

/// API error returned from terminal operations.
///
/// ## Serialization
/// This is what the frontend receives when an operation fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 550e8400-..."
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
///
/// ## Usage in Frontend
/// ```typescript
/// try {
///   await checkout(payload);
/// } catch (e) {
///   switch (e.code) {
///     case 'INSUFFICIENT_STOCK':
///       showStockWarning(e.message);
///       break;
///     case 'CONFLICT':
///       refreshShiftState();
///       break;
///     default:
///       showError('An error occurred');
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// State conflict: open shift exists, shift already closed,
    /// sale already refunded (409)
    Conflict,

    /// Insufficient stock at checkout (422)
    InsufficientStock,

    /// Cart operation failed (e.g. checkout on an empty cart)
    CartError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_)
            | CoreError::CustomerNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::ShiftNotFound(_) => ErrorCode::NotFound,

            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,

            CoreError::ShiftAlreadyOpen(_)
            | CoreError::ShiftClosed(_)
            | CoreError::ShiftStillOpen(_)
            | CoreError::ApprovalNotPending(_)
            | CoreError::InvalidSaleStatus { .. } => ErrorCode::Conflict,

            CoreError::EmptyCart => ErrorCode::CartError,

            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            _ => ApiError::new(ErrorCode::DatabaseError, err.to_string()),
        }
    }
}

/// Result type for terminal operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::ProductNotFound("p1".to_string()).into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = CoreError::InsufficientStock {
            name: "Indomie".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err: ApiError = CoreError::ShiftStillOpen("cashier-1".to_string()).into();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err: ApiError = CoreError::EmptyCart.into();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[test]
    fn test_db_error_unwraps_domain() {
        let err: ApiError = DbError::Domain(CoreError::EmptyCart).into();
        assert_eq!(err.code, ErrorCode::CartError);

        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::not_found("Product", "p1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: p1");
    }
}
