//! Identity errors

use shared::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::repository::RepoError;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email is already registered: {0}")]
    EmailExists(String),

    #[error("Membership request is awaiting manager approval")]
    MembershipPending,

    #[error("Membership request was rejected")]
    MembershipRejected,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Manager role required")]
    ManagerRequired,

    #[error("Technician role required")]
    TechnicianRequired,

    #[error("Not an approved member of a shop")]
    NotShopMember,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => AppError::invalid_credentials(),
            IdentityError::EmailExists(email) => {
                AppError::new(ErrorCode::EmailExists).with_detail("email", email)
            }
            IdentityError::MembershipPending => AppError::new(ErrorCode::MembershipPending),
            IdentityError::MembershipRejected => AppError::new(ErrorCode::MembershipRejected),
            IdentityError::AccountDisabled => AppError::new(ErrorCode::AccountDisabled),
            IdentityError::UserNotFound(id) => {
                AppError::new(ErrorCode::UserNotFound).with_detail("user_id", id)
            }
            IdentityError::ManagerRequired => AppError::new(ErrorCode::ManagerRequired),
            IdentityError::TechnicianRequired => AppError::new(ErrorCode::TechnicianRequired),
            IdentityError::NotShopMember => AppError::new(ErrorCode::NotShopMember),
            IdentityError::PermissionDenied(msg) => AppError::permission_denied(msg),
            IdentityError::Validation(msg) => AppError::validation(msg),
            IdentityError::Internal(msg) => AppError::internal(msg),
            IdentityError::Repo(RepoError::Duplicate(msg)) => {
                AppError::with_message(ErrorCode::EmailExists, msg)
            }
            IdentityError::Repo(e) => e.into(),
        }
    }
}
