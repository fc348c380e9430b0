//! Job Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Job, JobFilter, User};
use shared::models::JobStatus;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "job";

/// 完成结算: 工单与技师累计在同一语句内写入，返回 `[job, tech]`
const COMPLETE_WITH_EARNINGS: &str = r#"
RETURN {
    LET $jobs = (UPDATE $thing CONTENT $data WHERE revision = $rev RETURN AFTER);
    IF array::len($jobs) = 0 {
        NONE
    } ELSE {
        LET $techs = (UPDATE $tech SET
            weekly_earnings = math::fixed((weekly_earnings OR 0) + $amount, 2),
            total_jobs_completed = (total_jobs_completed OR 0) + 1,
            total_time_saved = (total_time_saved OR 0) + $saved
        RETURN AFTER);
        IF array::len($techs) = 0 {
            THROW "Technician record missing, completion rolled back";
        };
        [$jobs[0], $techs[0]]
    }
};
"#;

#[derive(Clone)]
pub struct JobRepository {
    base: BaseRepository,
}

impl JobRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find job by id
    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Job>> {
        let job: Option<Job> = self.base.db().select(id.clone()).await?;
        Ok(job)
    }

    /// Jobs of a shop matching the filter, newest first
    pub async fn find_by_shop(&self, shop: &RecordId, filter: &JobFilter) -> RepoResult<Vec<Job>> {
        let mut conditions = vec!["shop = $shop"];
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.required_cert.is_some() {
            conditions.push("required_cert = $cert");
        }
        if filter.priority.is_some() {
            conditions.push("priority = $priority");
        }
        if filter.assigned_tech.is_some() {
            conditions.push("assigned_tech = $tech");
        }

        let sql = format!(
            "SELECT * FROM job WHERE {} ORDER BY created_at DESC",
            conditions.join(" AND ")
        );

        let jobs: Vec<Job> = self
            .base
            .db()
            .query(sql)
            .bind(("shop", shop.to_string()))
            .bind(("status", filter.status))
            .bind(("cert", filter.required_cert))
            .bind(("priority", filter.priority))
            .bind(("tech", filter.assigned_tech.as_ref().map(|t| t.to_string())))
            .await?
            .take(0)?;
        Ok(jobs)
    }

    /// Completed jobs of a shop (analytics input)
    pub async fn find_completed(&self, shop: &RecordId) -> RepoResult<Vec<Job>> {
        self.find_by_shop(
            shop,
            &JobFilter {
                status: Some(JobStatus::Completed),
                ..Default::default()
            },
        )
        .await
    }

    /// Jobs a technician completed since a timestamp
    pub async fn find_completed_by_tech_since(
        &self,
        tech: &RecordId,
        since: i64,
    ) -> RepoResult<Vec<Job>> {
        let jobs: Vec<Job> = self
            .base
            .db()
            .query(
                "SELECT * FROM job WHERE assigned_tech = $tech AND status = $status \
                 AND completed_at >= $since ORDER BY completed_at",
            )
            .bind(("tech", tech.to_string()))
            .bind(("status", JobStatus::Completed))
            .bind(("since", since))
            .await?
            .take(0)?;
        Ok(jobs)
    }

    /// Create a new job (revision starts at 0)
    pub async fn create(&self, job: Job) -> RepoResult<Job> {
        let mut data = job;
        data.id = None;
        data.revision = 0;
        let created: Option<Job> = self.base.db().create(TABLE).content(data).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create job".to_string()))
    }

    /// Conditional write: replace the record only if nobody wrote since `expected_revision`
    ///
    /// 这是单写者获胜的原语：两个并发的读-检查-写序列中，后到者的 WHERE 不再命中，
    /// 返回 `Conflict`。
    pub async fn update_if_revision(&self, job: &Job, expected_revision: i64) -> RepoResult<Job> {
        let id = job
            .id
            .clone()
            .ok_or_else(|| RepoError::Validation("Job has no id".to_string()))?;

        let mut data = job.clone();
        data.id = None;
        data.revision = expected_revision + 1;

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing CONTENT $data WHERE revision = $rev RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("data", data))
            .bind(("rev", expected_revision))
            .await?;

        let updated: Vec<Job> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Conflict(format!("Job {} was modified concurrently", id)))
    }

    /// Conditional completion write plus the technician's earnings, atomically
    ///
    /// 单条语句在一个事务中执行: 技师更新失败时工单写入一并回滚，
    /// 不会出现"工单已完成但奖金未入账"。版本号不匹配返回 `Conflict`。
    pub async fn complete_with_earnings(
        &self,
        job: &Job,
        expected_revision: i64,
        tech: &RecordId,
        amount: f64,
        time_saved: i64,
    ) -> RepoResult<(Job, User)> {
        let id = job
            .id
            .clone()
            .ok_or_else(|| RepoError::Validation("Job has no id".to_string()))?;

        let mut data = job.clone();
        data.id = None;
        data.revision = expected_revision + 1;

        let mut result = self
            .base
            .db()
            .query(COMPLETE_WITH_EARNINGS)
            .bind(("thing", id.clone()))
            .bind(("data", data))
            .bind(("rev", expected_revision))
            .bind(("tech", tech.clone()))
            .bind(("amount", amount))
            .bind(("saved", time_saved))
            .await?;

        let settlement: Option<(Job, User)> = result.take(0)?;
        settlement.ok_or_else(|| RepoError::Conflict(format!("Job {} was modified concurrently", id)))
    }

    /// Hard delete, only if nobody wrote since `expected_revision`
    pub async fn delete_if_revision(&self, id: &RecordId, expected_revision: i64) -> RepoResult<()> {
        let mut result = self
            .base
            .db()
            .query("DELETE $thing WHERE revision = $rev RETURN BEFORE")
            .bind(("thing", id.clone()))
            .bind(("rev", expected_revision))
            .await?;

        let deleted: Vec<Job> = result.take(0)?;
        if deleted.is_empty() {
            return Err(RepoError::Conflict(format!(
                "Job {} was modified concurrently",
                id
            )));
        }
        Ok(())
    }
}
