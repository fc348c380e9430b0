//! Assign action
//!
//! Manager pushes an available job directly to a technician.

use shared::models::{AssignmentType, JobStatus, RequestStatus};

use super::{
    ActionMetadata, JobAction, TechProfile, ensure_certified, ensure_same_shop, record_audit,
    revoke_capabilities,
};
use crate::db::models::Job;
use crate::jobs::error::{JobError, JobResult};

/// Assign action
#[derive(Debug, Clone)]
pub struct AssignAction {
    pub tech: TechProfile,
}

impl JobAction for AssignAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        ensure_same_shop(job, &self.tech)?;
        ensure_certified(job, &self.tech)?;

        if job.status != JobStatus::Available {
            return Err(JobError::InvalidState(format!(
                "Job is {}, use reassign instead",
                job.status
            )));
        }

        job.assigned_tech = Some(self.tech.id.clone());
        job.assignment_type = AssignmentType::Direct;
        job.request_status = RequestStatus::Approved;
        job.approved_by = Some(metadata.actor_id.clone());
        job.approved_at = Some(metadata.timestamp);
        revoke_capabilities(job);

        record_audit(
            job,
            metadata,
            "assign",
            Some(format!("assigned to {}", self.tech.name)),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use shared::models::Certification;

    #[test]
    fn test_direct_assignment() {
        let mut job = create_test_job(Certification::Hvac, 45);
        AssignAction {
            tech: tech("tess", &[Certification::Hvac]),
        }
        .execute(&mut job, &create_test_metadata())
        .unwrap();

        assert_eq!(job.status, JobStatus::Available);
        assert_eq!(job.assignment_type, AssignmentType::Direct);
        assert_eq!(job.request_status, RequestStatus::Approved);
        assert_eq!(job.assigned_tech, Some(tech("tess", &[]).id));
        assert_eq!(job.approved_by, Some(create_test_metadata().actor_id));
    }

    #[test]
    fn test_uncertified_tech_cannot_be_assigned() {
        let mut job = create_test_job(Certification::Hvac, 45);
        let err = AssignAction {
            tech: tech("tess", &[Certification::Engine]),
        }
        .execute(&mut job, &create_test_metadata())
        .unwrap_err();
        assert!(matches!(err, JobError::NotEligible(_)));
        assert!(job.assigned_tech.is_none());
    }

    #[test]
    fn test_assign_in_progress_job_is_invalid_state() {
        let mut job = create_test_job(Certification::Hvac, 45);
        job.status = JobStatus::InProgress;
        let err = AssignAction {
            tech: tech("tess", &[Certification::Hvac]),
        }
        .execute(&mut job, &create_test_metadata())
        .unwrap_err();
        assert!(matches!(err, JobError::InvalidState(_)));
    }
}
