//! Reassign action
//!
//! Manager moves a non-terminal job to a different technician. An in-progress
//! job goes back to `available` and the new assignee has to start it again.

use shared::models::{AssignmentType, JobStatus, RequestStatus};

use super::{
    ActionMetadata, JobAction, TechProfile, ensure_certified, ensure_same_shop, record_audit,
    revoke_capabilities,
};
use crate::db::models::Job;
use crate::jobs::error::{JobError, JobResult};

/// Reassign action
#[derive(Debug, Clone)]
pub struct ReassignAction {
    pub tech: TechProfile,
    pub reason: Option<String>,
}

impl JobAction for ReassignAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        if job.status.is_terminal() {
            return Err(JobError::InvalidState(format!(
                "Job is {} and cannot be reassigned",
                job.status
            )));
        }
        ensure_same_shop(job, &self.tech)?;
        ensure_certified(job, &self.tech)?;

        if job.assigned_tech.as_ref() == Some(&self.tech.id) {
            return Err(JobError::InvalidState(format!(
                "Job is already assigned to {}",
                self.tech.name
            )));
        }

        let previous = job
            .assigned_tech
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "nobody".to_string());

        match job.status {
            JobStatus::InProgress => {
                job.started_at = None;
            }
            JobStatus::PendingApproval => {
                job.requested_by = None;
            }
            _ => {}
        }

        job.status = JobStatus::Available;
        job.assigned_tech = Some(self.tech.id.clone());
        job.assignment_type = AssignmentType::Direct;
        job.request_status = RequestStatus::Approved;
        job.approved_by = Some(metadata.actor_id.clone());
        job.approved_at = Some(metadata.timestamp);
        revoke_capabilities(job);

        let note = match &self.reason {
            Some(reason) => format!("from {} to {}: {}", previous, self.tech.id, reason),
            None => format!("from {} to {}", previous, self.tech.id),
        };
        record_audit(job, metadata, "reassign", Some(note));
        Ok(())
    }
}
