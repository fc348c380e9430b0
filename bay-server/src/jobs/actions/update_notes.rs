//! UpdateNotes action

use super::{ActionMetadata, JobAction, record_audit};
use crate::db::models::Job;
use crate::jobs::error::JobResult;

/// UpdateNotes action (allowed in every state)
#[derive(Debug, Clone)]
pub struct UpdateNotesAction {
    pub notes: String,
}

impl JobAction for UpdateNotesAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        job.notes = self.notes.clone();
        record_audit(job, metadata, "update_notes", None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use shared::models::{Certification, JobStatus};

    #[test]
    fn test_notes_on_completed_job() {
        let mut job = create_test_job(Certification::Engine, 60);
        job.status = JobStatus::Completed;
        UpdateNotesAction {
            notes: "Customer declined rotation".to_string(),
        }
        .execute(&mut job, &metadata_at("tess", 5))
        .unwrap();
        assert_eq!(job.notes, "Customer declined rotation");
        assert_eq!(job.status, JobStatus::Completed);
    }
}
