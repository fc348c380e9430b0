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
            | Self::ShopNotFound
            | Self::UserNotFound
            | Self::JobNotFound
            | Self::RuleNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::EmailExists
            | Self::ShopAlreadyOwned
            | Self::InvalidState
            | Self::MembershipNotPending => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 410 Gone (stale emailed link)
            Self::CapabilityInvalid => StatusCode::GONE,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::ManagerRequired
            | Self::TechnicianRequired
            | Self::NotEligible
            | Self::ShopMismatch
            | Self::MembershipPending
            | Self::MembershipRejected
            | Self::NotShopMember
            | Self::JobNotAssignedToYou => StatusCode::FORBIDDEN,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
