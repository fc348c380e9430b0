//! Start action

use shared::models::JobStatus;

use super::{ActionMetadata, JobAction, TechProfile, ensure_certified, ensure_same_shop, record_audit};
use crate::db::models::Job;
use crate::jobs::error::{JobError, JobResult};

/// Start action
///
/// 技师开始一个可用工单。已指派给他人的工单不能被抢占。
#[derive(Debug, Clone)]
pub struct StartAction {
    pub tech: TechProfile,
}

impl JobAction for StartAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        ensure_same_shop(job, &self.tech)?;
        ensure_certified(job, &self.tech)?;

        if job.status != JobStatus::Available {
            return Err(JobError::InvalidState(format!(
                "Job is {}, only available jobs can be started",
                job.status
            )));
        }
        if let Some(assignee) = &job.assigned_tech
            && *assignee != self.tech.id
        {
            return Err(JobError::NotEligible(
                "Job is assigned to another technician".to_string(),
            ));
        }

        job.status = JobStatus::InProgress;
        job.assigned_tech = Some(self.tech.id.clone());
        job.started_at = Some(metadata.timestamp);

        record_audit(job, metadata, "start", None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use shared::models::Certification;

    fn start(key: &str) -> StartAction {
        StartAction {
            tech: tech(key, &[Certification::Electrical]),
        }
    }

    #[test]
    fn test_start_open_job() {
        let mut job = create_test_job(Certification::Electrical, 30);
        start("tess").execute(&mut job, &metadata_at("tess", 42)).unwrap();

        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(job.assigned_tech, Some(tech("tess", &[]).id));
        assert_eq!(job.started_at, Some(42));
        assert_eq!(job.updated_at, 0, "plain action does not stamp updated_at");
    }

    #[test]
    fn test_start_own_assignment() {
        let mut job = create_test_job(Certification::Electrical, 30);
        job.assigned_tech = Some(tech("tess", &[]).id);
        start("tess").execute(&mut job, &metadata_at("tess", 42)).unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
    }

    #[test]
    fn test_start_someone_elses_job_is_not_eligible() {
        let mut job = create_test_job(Certification::Electrical, 30);
        job.assigned_tech = Some(tech("omar", &[]).id);
        let err = start("tess")
            .execute(&mut job, &metadata_at("tess", 42))
            .unwrap_err();
        assert!(matches!(err, JobError::NotEligible(_)));
        assert_eq!(job.status, JobStatus::Available);
    }

    #[test]
    fn test_start_twice_is_invalid_state() {
        let mut job = create_test_job(Certification::Electrical, 30);
        start("tess").execute(&mut job, &metadata_at("tess", 42)).unwrap();
        let err = start("tess")
            .execute(&mut job, &metadata_at("tess", 43))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidState(_)));
        assert_eq!(job.started_at, Some(42));
    }
}
