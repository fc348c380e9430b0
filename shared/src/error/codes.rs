//! Unified error codes
//!
//! This module defines all error codes used across the server and its clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission / eligibility errors
//! - 3xxx: Shop and membership errors
//! - 4xxx: Job errors
//! - 5xxx: Incentive rule errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
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
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Email already registered
    EmailExists = 1008,
    /// Emailed link token is missing, consumed or mismatched
    CapabilityInvalid = 1101,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Manager role required
    ManagerRequired = 2003,
    /// Technician role required
    TechnicianRequired = 2004,
    /// Technician lacks the certification or membership for the action
    NotEligible = 2101,
    /// Participants belong to different shops
    ShopMismatch = 2102,

    // ==================== 3xxx: Shop ====================
    /// Shop code does not resolve to an active shop
    InvalidShopCode = 3001,
    /// Shop not found
    ShopNotFound = 3002,
    /// Membership request awaiting manager approval
    MembershipPending = 3003,
    /// Membership request was rejected
    MembershipRejected = 3004,
    /// Membership is not pending
    MembershipNotPending = 3005,
    /// User does not belong to a shop
    NotShopMember = 3006,
    /// Manager already owns a shop
    ShopAlreadyOwned = 3007,
    /// User not found
    UserNotFound = 3101,

    // ==================== 4xxx: Job ====================
    /// Job not found
    JobNotFound = 4001,
    /// Job state does not permit the action
    InvalidState = 4002,
    /// Job is assigned to another technician
    JobNotAssignedToYou = 4003,
    /// Reported actual time is invalid
    InvalidActualTime = 4004,

    // ==================== 5xxx: Incentive ====================
    /// Incentive rule not found
    RuleNotFound = 5001,
    /// Incentive rule fields are invalid
    InvalidRule = 5002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Whether this code represents success
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this code
    pub fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::EmailExists => "Email is already registered",
            ErrorCode::CapabilityInvalid => "Link already used or expired",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::ManagerRequired => "Manager role required",
            ErrorCode::TechnicianRequired => "Technician role required",
            ErrorCode::NotEligible => "Not eligible for this job",
            ErrorCode::ShopMismatch => "Participants belong to different shops",

            // Shop
            ErrorCode::InvalidShopCode => "Invalid shop code",
            ErrorCode::ShopNotFound => "Shop not found",
            ErrorCode::MembershipPending => "Your account is pending approval by the shop manager",
            ErrorCode::MembershipRejected => "Your request to join the shop was rejected",
            ErrorCode::MembershipNotPending => "Membership request is not pending",
            ErrorCode::NotShopMember => "You are not a member of a shop",
            ErrorCode::ShopAlreadyOwned => "Manager already owns a shop",
            ErrorCode::UserNotFound => "User not found",

            // Job
            ErrorCode::JobNotFound => "Job not found",
            ErrorCode::InvalidState => "Job state does not allow this action",
            ErrorCode::JobNotAssignedToYou => "Job is not assigned to you",
            ErrorCode::InvalidActualTime => "Actual time must be between 0 and 100000 minutes",

            // Incentive
            ErrorCode::RuleNotFound => "Incentive rule not found",
            ErrorCode::InvalidRule => "Invalid incentive rule",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
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
            4 => Ok(ErrorCode::AlreadyExists),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::EmailExists),
            1101 => Ok(ErrorCode::CapabilityInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::ManagerRequired),
            2004 => Ok(ErrorCode::TechnicianRequired),
            2101 => Ok(ErrorCode::NotEligible),
            2102 => Ok(ErrorCode::ShopMismatch),

            // Shop
            3001 => Ok(ErrorCode::InvalidShopCode),
            3002 => Ok(ErrorCode::ShopNotFound),
            3003 => Ok(ErrorCode::MembershipPending),
            3004 => Ok(ErrorCode::MembershipRejected),
            3005 => Ok(ErrorCode::MembershipNotPending),
            3006 => Ok(ErrorCode::NotShopMember),
            3007 => Ok(ErrorCode::ShopAlreadyOwned),
            3101 => Ok(ErrorCode::UserNotFound),

            // Job
            4001 => Ok(ErrorCode::JobNotFound),
            4002 => Ok(ErrorCode::InvalidState),
            4003 => Ok(ErrorCode::JobNotAssignedToYou),
            4004 => Ok(ErrorCode::InvalidActualTime),

            // Incentive
            5001 => Ok(ErrorCode::RuleNotFound),
            5002 => Ok(ErrorCode::InvalidRule),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
