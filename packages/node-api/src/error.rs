//! Standard error response body.

use serde::{Deserialize, Serialize};

/// The JSON body returned for all error responses.
///
/// ```json
/// { "error": "You cannot follow yourself.", "code": "invalid_operation" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub error: String,

    /// Machine-readable error code.
    ///
    /// | `code` | HTTP status |
    /// |--------|------------|
    /// | `invalid_json` | 400 |
    /// | `invalid_operation` | 400 |
    /// | `invalid_action` | 400 |
    /// | `unauthorized` | 401 |
    /// | `not_found` | 404 |
    /// | `not_following` | 404 |
    /// | `conflict` | 409 |
    /// | `validation_failed` | 422 |
    /// | `internal_error` | 500 |
    /// | `store_timeout` | 504 |
    pub code: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
        }
    }
}

/// Well-known error codes.
pub mod codes {
    pub const INVALID_JSON: &str = "invalid_json";
    pub const INVALID_OPERATION: &str = "invalid_operation";
    pub const INVALID_ACTION: &str = "invalid_action";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const NOT_FOLLOWING: &str = "not_following";
    pub const CONFLICT: &str = "conflict";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const STORE_TIMEOUT: &str = "store_timeout";
}
