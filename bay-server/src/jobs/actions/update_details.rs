//! UpdateDetails action
//!
//! Manager edits the descriptive fields of a job that is not finished.

use super::{ActionMetadata, JobAction, TechProfile, record_audit};
use crate::db::models::{Job, JobUpdate};
use crate::jobs::error::{JobError, JobResult};
use shared::models::JobStatus;

/// UpdateDetails action
#[derive(Debug, Clone)]
pub struct UpdateDetailsAction {
    pub changes: JobUpdate,
    /// Current assignee, if any; a certification change must still cover them
    pub assignee: Option<TechProfile>,
}

impl JobAction for UpdateDetailsAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        if job.status.is_terminal() {
            return Err(JobError::InvalidState(format!(
                "Job is {} and can no longer be edited",
                job.status
            )));
        }

        let changes = &self.changes;
        if let Some(book_time) = changes.book_time
            && book_time != job.book_time
            && job.status == JobStatus::InProgress
        {
            return Err(JobError::InvalidState(
                "Book time cannot change while the job is in progress".to_string(),
            ));
        }
        if let (Some(cert), Some(assignee)) = (changes.required_cert, &self.assignee)
            && !assignee.holds(cert)
        {
            return Err(JobError::NotEligible(format!(
                "Assigned technician {} is not certified for {}",
                assignee.name, cert
            )));
        }

        let mut touched = Vec::new();
        if let Some(title) = &changes.title {
            job.title = title.clone();
            touched.push("title");
        }
        if let Some(description) = &changes.description {
            job.description = description.clone();
            touched.push("description");
        }
        if let Some(vehicle) = &changes.vehicle {
            job.vehicle = vehicle.clone();
            touched.push("vehicle");
        }
        if let Some(priority) = changes.priority {
            job.priority = priority;
            touched.push("priority");
        }
        if let Some(book_time) = changes.book_time {
            job.book_time = book_time;
            touched.push("book_time");
        }
        if let Some(cert) = changes.required_cert {
            job.required_cert = cert;
            touched.push("required_cert");
        }

        record_audit(job, metadata, "update", Some(touched.join(", ")));
        Ok(())
    }
}
