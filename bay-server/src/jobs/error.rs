//! Job lifecycle errors

use shared::{AppError, ErrorCode};
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::incentives::BonusError;
use crate::identity::IdentityError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not eligible: {0}")]
    NotEligible(String),

    #[error("Shop mismatch: {0}")]
    ShopMismatch(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Job is not assigned to you")]
    NotAssignedToYou,

    #[error("Actual time must be between 0 and 100000 minutes, got {0}")]
    InvalidActualTime(i64),

    #[error("Link already used or expired")]
    CapabilityInvalid,

    #[error(transparent)]
    Bonus(#[from] BonusError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    App(#[from] AppError),
}

pub type JobResult<T> = Result<T, JobError>;

impl From<JobError> for AppError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => {
                AppError::new(ErrorCode::JobNotFound).with_detail("job_id", id)
            }
            JobError::Validation(msg) => AppError::validation(msg),
            JobError::NotEligible(msg) => AppError::not_eligible(msg),
            JobError::ShopMismatch(msg) => AppError::with_message(ErrorCode::ShopMismatch, msg),
            JobError::InvalidState(msg) => AppError::invalid_state(msg),
            JobError::NotAssignedToYou => AppError::new(ErrorCode::JobNotAssignedToYou),
            JobError::InvalidActualTime(value) => {
                AppError::new(ErrorCode::InvalidActualTime).with_detail("actual_time", value)
            }
            JobError::CapabilityInvalid => AppError::capability_invalid(),
            JobError::Bonus(e) => AppError::with_message(ErrorCode::InvalidRule, e.to_string()),
            JobError::Identity(e) => e.into(),
            // 条件更新落败 = 有人先一步改变了状态
            JobError::Repo(RepoError::Conflict(msg)) => AppError::invalid_state(msg),
            JobError::Repo(e) => e.into(),
            JobError::App(e) => e,
        }
    }
}
