//! Complete action
//!
//! 完成工单并结算奖金。奖金规则在执行前由服务层选出，这里只做纯计算，
//! 保证同一工单只结算一次 (状态必须是 in-progress)。

use serde::{Deserialize, Serialize};
use shared::models::JobStatus;
use surrealdb::RecordId;

use super::{ActionMetadata, JobAction, record_audit};
use crate::db::models::{IncentiveRule, Job};
use crate::incentives::{BonusBreakdown, compute_bonus};
use crate::jobs::error::{JobError, JobResult};
use crate::utils::time::elapsed_minutes;
use crate::utils::validation::MAX_JOB_MINUTES;

/// Terms of the incentive rule in force when the job completes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleTerms {
    pub time_saved_threshold: i64,
    pub bonus_per_unit: f64,
}

impl From<&IncentiveRule> for RuleTerms {
    fn from(rule: &IncentiveRule) -> Self {
        Self {
            time_saved_threshold: rule.time_saved_threshold,
            bonus_per_unit: rule.bonus_per_unit,
        }
    }
}

/// Complete action
#[derive(Debug, Clone)]
pub struct CompleteAction {
    pub tech_id: RecordId,
    /// Minutes reported by the client; measured from `started_at` when absent
    pub actual_time: Option<i64>,
    /// No rule means no bonus
    pub rule: Option<RuleTerms>,
    pub multiplier: f64,
    pub notes: Option<String>,
}

impl CompleteAction {
    /// Actual minutes this action will record for `job` at `now`
    pub fn resolve_actual_time(&self, job: &Job, now: i64) -> i64 {
        match self.actual_time {
            Some(minutes) => minutes,
            None => elapsed_minutes(job.started_at.unwrap_or(now), now),
        }
    }
}

impl JobAction for CompleteAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        if job.status != JobStatus::InProgress {
            return Err(JobError::InvalidState(format!(
                "Job is {}, only in-progress jobs can be completed",
                job.status
            )));
        }
        if job.assigned_tech.as_ref() != Some(&self.tech_id) {
            return Err(JobError::NotAssignedToYou);
        }

        let actual = self.resolve_actual_time(job, metadata.timestamp);
        if !(0..=MAX_JOB_MINUTES).contains(&actual) {
            return Err(JobError::InvalidActualTime(actual));
        }

        let breakdown = match self.rule {
            Some(terms) => compute_bonus(
                job.book_time,
                actual,
                terms.time_saved_threshold,
                terms.bonus_per_unit,
                self.multiplier,
            )?,
            None => BonusBreakdown {
                time_saved: crate::incentives::time_saved(job.book_time, actual),
                ..BonusBreakdown::NONE
            },
        };

        job.status = JobStatus::Completed;
        job.actual_time = Some(actual);
        job.completed_at = Some(metadata.timestamp);
        job.time_saved = breakdown.time_saved;
        job.incentive_earned = breakdown.bonus;
        if let Some(notes) = &self.notes {
            job.notes = notes.clone();
        }

        record_audit(
            job,
            metadata,
            "complete",
            Some(format!(
                "actual {}m, saved {}m, bonus {:.2}",
                actual, breakdown.time_saved, breakdown.bonus
            )),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::utils::time::MINUTE_MS;
    use shared::models::Certification;

    const TERMS: RuleTerms = RuleTerms {
        time_saved_threshold: 30,
        bonus_per_unit: 10.0,
    };

    fn in_progress_job(book_time: i64) -> Job {
        let mut job = create_test_job(Certification::Engine, book_time);
        job.status = JobStatus::InProgress;
        job.assigned_tech = Some(tech("tess", &[]).id);
        job.started_at = Some(0);
        job
    }

    fn complete(actual: Option<i64>, rule: Option<RuleTerms>) -> CompleteAction {
        CompleteAction {
            tech_id: tech("tess", &[]).id,
            actual_time: actual,
            rule,
            multiplier: 1.0,
            notes: None,
        }
    }

    #[test]
    fn test_complete_with_bonus() {
        let mut job = in_progress_job(120);
        complete(Some(60), Some(TERMS))
            .execute(&mut job, &metadata_at("tess", 3_600_000))
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.actual_time, Some(60));
        assert_eq!(job.time_saved, 60);
        assert_eq!(job.incentive_earned, 20.0);
        assert_eq!(job.completed_at, Some(3_600_000));
    }

    #[test]
    fn test_complete_over_book_time_earns_nothing() {
        let mut job = in_progress_job(60);
        complete(Some(90), Some(TERMS))
            .execute(&mut job, &metadata_at("tess", 1))
            .unwrap();
        assert_eq!(job.time_saved, 0);
        assert_eq!(job.incentive_earned, 0.0);
    }

    #[test]
    fn test_complete_without_rule_records_time_saved_only() {
        let mut job = in_progress_job(120);
        complete(Some(60), None)
            .execute(&mut job, &metadata_at("tess", 1))
            .unwrap();
        assert_eq!(job.time_saved, 60);
        assert_eq!(job.incentive_earned, 0.0);
    }

    #[test]
    fn test_measured_time_used_when_client_omits_it() {
        let mut job = in_progress_job(120);
        complete(None, Some(TERMS))
            .execute(&mut job, &metadata_at("tess", 45 * MINUTE_MS))
            .unwrap();
        assert_eq!(job.actual_time, Some(45));
        assert_eq!(job.time_saved, 75);
        assert_eq!(job.incentive_earned, 20.0);
    }

    #[test]
    fn test_multiplier_scales_bonus() {
        let mut job = in_progress_job(120);
        CompleteAction {
            multiplier: 1.5,
            ..complete(Some(60), Some(TERMS))
        }
        .execute(&mut job, &metadata_at("tess", 1))
        .unwrap();
        assert_eq!(job.incentive_earned, 30.0);
    }

    #[test]
    fn test_other_tech_cannot_complete() {
        let mut job = in_progress_job(120);
        let err = CompleteAction {
            tech_id: tech("omar", &[]).id,
            ..complete(Some(60), Some(TERMS))
        }
        .execute(&mut job, &metadata_at("omar", 1))
        .unwrap_err();
        assert!(matches!(err, JobError::NotAssignedToYou));
        assert_eq!(job.status, JobStatus::InProgress);
    }

    #[test]
    fn test_negative_actual_time_rejected() {
        let mut job = in_progress_job(120);
        let err = complete(Some(-5), Some(TERMS))
            .execute(&mut job, &metadata_at("tess", 1))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidActualTime(-5)));
    }

    #[test]
    fn test_out_of_range_rate_fails_without_completing() {
        let mut job = in_progress_job(120);
        let err = complete(
            Some(60),
            Some(RuleTerms {
                time_saved_threshold: 30,
                bonus_per_unit: 1e30,
            }),
        )
        .execute(&mut job, &metadata_at("tess", 1))
        .unwrap_err();
        assert!(matches!(err, JobError::Bonus(_)));
        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(job.incentive_earned, 0.0);
    }

    #[test]
    fn test_absurd_actual_time_rejected() {
        let mut job = in_progress_job(120);
        let err = complete(Some(MAX_JOB_MINUTES + 1), Some(TERMS))
            .execute(&mut job, &metadata_at("tess", 1))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidActualTime(_)));
    }

    #[test]
    fn test_second_completion_is_invalid_state() {
        let mut job = in_progress_job(120);
        complete(Some(60), Some(TERMS))
            .execute(&mut job, &metadata_at("tess", 1))
            .unwrap();
        let err = complete(Some(10), Some(TERMS))
            .execute(&mut job, &metadata_at("tess", 2))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidState(_)));
        assert_eq!(job.incentive_earned, 20.0);
    }
}
