//! Cancel action

use shared::models::JobStatus;

use super::{ActionMetadata, JobAction, record_audit, revoke_capabilities};
use crate::db::models::Job;
use crate::jobs::error::{JobError, JobResult};

/// Cancel action
///
/// Work already underway has to be reassigned or completed; it cannot be cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelAction {
    pub reason: Option<String>,
}

impl JobAction for CancelAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        if job.status == JobStatus::InProgress || job.status.is_terminal() {
            return Err(JobError::InvalidState(format!(
                "Job is {} and cannot be cancelled",
                job.status
            )));
        }

        job.status = JobStatus::Cancelled;
        revoke_capabilities(job);

        record_audit(job, metadata, "cancel", self.reason.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use shared::models::Certification;

    #[test]
    fn test_cancel_open_and_pending_jobs() {
        for status in [JobStatus::Available, JobStatus::PendingApproval] {
            let mut job = create_test_job(Certification::Engine, 60);
            job.status = status;
            CancelAction::default()
                .execute(&mut job, &create_test_metadata())
                .unwrap();
            assert_eq!(job.status, JobStatus::Cancelled);
            assert!(job.capabilities.is_empty());
        }
    }

    #[test]
    fn test_cannot_cancel_started_or_finished_work() {
        for status in [
            JobStatus::InProgress,
            JobStatus::Completed,
            JobStatus::Cancelled,
        ] {
            let mut job = create_test_job(Certification::Engine, 60);
            job.status = status;
            let err = CancelAction::default()
                .execute(&mut job, &create_test_metadata())
                .unwrap_err();
            assert!(matches!(err, JobError::InvalidState(_)));
            assert_eq!(job.status, status);
        }
    }
}
