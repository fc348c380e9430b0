//! Membership errors

use shared::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::identity::IdentityError;

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("Invalid shop code: {0}")]
    InvalidCode(String),

    #[error("Shop not found")]
    ShopNotFound,

    #[error("Manager already owns a shop")]
    ShopAlreadyOwned,

    #[error("Already a member of a shop")]
    AlreadyMember,

    #[error("Membership request is not pending")]
    NotPending,

    #[error("Technician does not belong to your shop")]
    NotInShop,

    #[error("Link already used or expired")]
    CapabilityInvalid,

    #[error("Could not allocate a unique shop code after {0} attempts")]
    CodeExhausted(usize),

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type MembershipResult<T> = Result<T, MembershipError>;

impl From<MembershipError> for AppError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::InvalidCode(code) => {
                AppError::new(ErrorCode::InvalidShopCode).with_detail("code", code)
            }
            MembershipError::ShopNotFound => AppError::new(ErrorCode::ShopNotFound),
            MembershipError::ShopAlreadyOwned => AppError::new(ErrorCode::ShopAlreadyOwned),
            MembershipError::AlreadyMember => {
                AppError::with_message(ErrorCode::AlreadyExists, "Already a member of a shop")
            }
            MembershipError::NotPending => AppError::new(ErrorCode::MembershipNotPending),
            MembershipError::NotInShop => AppError::not_eligible("Technician is not in your shop"),
            MembershipError::CapabilityInvalid => AppError::capability_invalid(),
            e @ MembershipError::CodeExhausted(_) => AppError::database(e.to_string()),
            MembershipError::Validation(msg) => AppError::validation(msg),
            MembershipError::Internal(msg) => AppError::internal(msg),
            MembershipError::Identity(e) => e.into(),
            // 并发审批落败 = 申请已被处理
            MembershipError::Repo(RepoError::Conflict(_)) => {
                AppError::new(ErrorCode::MembershipNotPending)
            }
            MembershipError::Repo(e) => e.into(),
        }
    }
}
