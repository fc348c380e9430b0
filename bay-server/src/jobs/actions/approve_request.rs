//! ApproveRequest action
//!
//! The manager grants a pending work request; the job returns to `available`
//! with the requester as assignee so they can start it.

use shared::models::{JobStatus, RequestStatus};
use surrealdb::RecordId;

use super::{
    ActionMetadata, JobAction, TechProfile, ensure_certified, ensure_same_shop, record_audit,
    revoke_capabilities,
};
use crate::db::models::Job;
use crate::jobs::error::{JobError, JobResult};

/// ApproveRequest action
#[derive(Debug, Clone)]
pub struct ApproveRequestAction {
    /// Manager the approval is attributed to (the link path uses the shop manager)
    pub approver: RecordId,
    /// Current profile of the requesting technician
    pub requester: TechProfile,
}

impl JobAction for ApproveRequestAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        if job.request_status != RequestStatus::Pending || job.status != JobStatus::PendingApproval
        {
            return Err(JobError::InvalidState(
                "Job has no pending request".to_string(),
            ));
        }
        if job.requested_by.as_ref() != Some(&self.requester.id) {
            return Err(JobError::InvalidState(
                "Request belongs to another technician".to_string(),
            ));
        }
        ensure_same_shop(job, &self.requester)?;
        ensure_certified(job, &self.requester)?;

        job.status = JobStatus::Available;
        job.request_status = RequestStatus::Approved;
        job.assigned_tech = Some(self.requester.id.clone());
        job.approved_by = Some(self.approver.clone());
        job.approved_at = Some(metadata.timestamp);
        revoke_capabilities(job);

        record_audit(job, metadata, "approve_request", None);
        Ok(())
    }
}
