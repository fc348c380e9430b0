//! RejectRequest action
//!
//! The manager declines a pending work request; the job re-enters the open pool.

use shared::models::{AssignmentType, JobStatus, RequestStatus};

use super::{ActionMetadata, JobAction, record_audit, revoke_capabilities};
use crate::db::models::Job;
use crate::jobs::error::{JobError, JobResult};

/// RejectRequest action
#[derive(Debug, Clone, Default)]
pub struct RejectRequestAction {
    pub reason: Option<String>,
}

impl JobAction for RejectRequestAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        if job.request_status != RequestStatus::Pending || job.status != JobStatus::PendingApproval
        {
            return Err(JobError::InvalidState(
                "Job has no pending request".to_string(),
            ));
        }

        job.status = JobStatus::Available;
        job.request_status = RequestStatus::Rejected;
        job.requested_by = None;
        job.assignment_type = AssignmentType::None;
        job.rejected_reason = self.reason.clone();
        revoke_capabilities(job);

        record_audit(job, metadata, "reject_request", self.reason.clone());
        Ok(())
    }
}
