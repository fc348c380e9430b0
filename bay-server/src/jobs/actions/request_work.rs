//! RequestWork action
//!
//! A technician asks the manager for an available job.

use shared::models::{AssignmentType, JobStatus, RequestStatus};

use super::{
    ActionMetadata, JobAction, TechProfile, ensure_certified, ensure_same_shop, record_audit,
};
use crate::auth::Capability;
use crate::db::models::Job;
use crate::jobs::error::{JobError, JobResult};

/// RequestWork action
#[derive(Debug, Clone)]
pub struct RequestWorkAction {
    pub tech: TechProfile,
    /// Freshly minted approve/reject link capabilities (hashes only)
    pub capabilities: Vec<Capability>,
}

impl JobAction for RequestWorkAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        ensure_same_shop(job, &self.tech)?;
        ensure_certified(job, &self.tech)?;

        if job.status != JobStatus::Available {
            return Err(JobError::InvalidState(format!(
                "Job is {}, only available jobs can be requested",
                job.status
            )));
        }
        if job.assigned_tech.is_some() {
            return Err(JobError::InvalidState(
                "Job is already assigned to a technician".to_string(),
            ));
        }

        job.status = JobStatus::PendingApproval;
        job.request_status = RequestStatus::Pending;
        job.requested_by = Some(self.tech.id.clone());
        job.assignment_type = AssignmentType::Requested;
        job.rejected_reason = None;
        job.capabilities = self.capabilities.clone();

        record_audit(job, metadata, "request_work", None);
        Ok(())
    }
}
