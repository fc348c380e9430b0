//! JobService - 工单生命周期的命令入口
//!
//! # Command Flow
//!
//! ```text
//! operation(actor, job_id, ...)
//!     ├─ 1. 角色/店铺校验 (Actor 每次从数据库重新加载)
//!     ├─ 2. 获取工单互斥锁
//!     ├─ 3. 加载工单 + 构造 JobCommand (可能需要查询技师、规则)
//!     ├─ 4. 在副本上执行 action
//!     ├─ 5. update_if_revision (条件写入, 落败 = InvalidState)
//!     ├─ 6. 释放锁
//!     └─ 7. 副作用: 累计收入、发送通知 (失败只记日志)
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use serde_json::json;
use shared::models::{JobStatus, MembershipStatus, Role};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use tokio::sync::{Mutex, OwnedMutexGuard};
use validator::Validate;

use super::actions::{
    ActionMetadata, ApproveRequestAction, AssignAction, CancelAction, CompleteAction, JobAction,
    JobCommand, ReassignAction, RejectRequestAction, RequestWorkAction, RuleTerms, StartAction,
    TechProfile, UpdateDetailsAction, UpdateNotesAction,
};
use super::error::{JobError, JobResult};
use super::service_order::format_service_order;
use crate::auth::{CapabilityAction, capability};
use crate::db::models::{Job, JobCreate, JobFilter, JobUpdate, User};
use crate::db::repository::{
    CounterRepository, JobRepository, ShopRepository, UserRepository, parse_record_id,
};
use crate::identity::Actor;
use crate::incentives::IncentiveService;
use crate::notify::{NotificationKind, Notifier, NotifyRecipient, dispatch};
use crate::utils::time::elapsed_minutes;
use crate::utils::validation::{MAX_JOB_MINUTES, MAX_NOTE_LEN};

const SERVICE_ORDER_COUNTER: &str = "service_order";

/// 工单服务配置
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// 邮件链接前缀, 例如 `http://localhost:5000`
    pub public_base_url: String,
    /// 第一个工单号 = offset + 1
    pub service_order_offset: i64,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:5000".to_string(),
            service_order_offset: 1000,
        }
    }
}

/// Completion payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CompleteJob {
    /// 客户端上报的实际分钟数, 缺省时由 started_at 计算
    #[serde(default)]
    #[validate(range(min = 0, max = MAX_JOB_MINUTES))]
    pub actual_time: Option<i64>,
    #[serde(default)]
    #[validate(length(max = MAX_NOTE_LEN))]
    pub notes: Option<String>,
}

type LockMap = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Per-job write lock
///
/// 释放时若没有其他任务在等待，就从表中移除该条目，锁表只保留正在处理的工单。
struct JobLock {
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
    key: String,
}

impl JobLock {
    async fn acquire(locks: &LockMap, id: &RecordId) -> Self {
        let key = id.to_string();
        let mutex = locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        Self {
            guard: Some(guard),
            locks: locks.clone(),
            key,
        }
    }
}

impl Drop for JobLock {
    fn drop(&mut self) {
        self.guard.take();
        // 表本身持有一份引用; 计数为 1 表示无人等待
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[derive(Clone)]
pub struct JobService {
    jobs: JobRepository,
    users: UserRepository,
    shops: ShopRepository,
    counters: CounterRepository,
    incentives: IncentiveService,
    notifier: Arc<dyn Notifier>,
    settings: JobSettings,
    locks: LockMap,
}

impl std::fmt::Debug for JobService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobService")
            .field("settings", &self.settings)
            .field("locks", &self.locks.len())
            .finish()
    }
}

impl JobService {
    pub fn new(
        db: Surreal<Db>,
        incentives: IncentiveService,
        notifier: Arc<dyn Notifier>,
        settings: JobSettings,
    ) -> Self {
        Self {
            jobs: JobRepository::new(db.clone()),
            users: UserRepository::new(db.clone()),
            shops: ShopRepository::new(db.clone()),
            counters: CounterRepository::new(db),
            incentives,
            notifier,
            settings,
            locks: Arc::new(DashMap::new()),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn lock(&self, id: &RecordId) -> JobLock {
        JobLock::acquire(&self.locks, id).await
    }

    async fn load(&self, id: &RecordId) -> JobResult<Job> {
        self.jobs
            .find_by_id(id)
            .await?
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    /// Execute on a copy, then write only if nobody else wrote in between
    async fn commit(
        &self,
        job: &Job,
        command: JobCommand,
        metadata: &ActionMetadata,
    ) -> JobResult<Job> {
        let mut next = job.clone();
        command.execute(&mut next, metadata)?;
        let saved = self.jobs.update_if_revision(&next, job.revision).await?;
        Self::log_transition(job, &saved, &command, metadata);
        Ok(saved)
    }

    fn log_transition(before: &Job, saved: &Job, command: &JobCommand, metadata: &ActionMetadata) {
        tracing::info!(
            job_id = %saved.id_string(),
            action = command.name(),
            actor = %metadata.actor_id,
            from = %before.status,
            to = %saved.status,
            "Job transition"
        );
    }

    /// Manager of the job's shop
    fn ensure_manages(actor: &Actor, job: &Job) -> JobResult<()> {
        let shop = actor.managed_shop()?;
        if *shop != job.shop {
            return Err(JobError::ShopMismatch(
                "Job belongs to another shop".to_string(),
            ));
        }
        Ok(())
    }

    /// Approved technician profile of a user the manager names
    async fn load_tech(&self, tech_id: &str) -> JobResult<TechProfile> {
        let id = parse_record_id("user", tech_id)?;
        let user = self
            .users
            .find_by_id(&id)
            .await?
            .ok_or_else(|| JobError::NotFound(format!("technician {}", tech_id)))?;
        if user.role != Role::Technician
            || user.membership_status != MembershipStatus::Approved
            || !user.is_active
        {
            return Err(JobError::NotEligible(format!(
                "{} is not an approved technician",
                user.name
            )));
        }
        TechProfile::try_from(&user)
    }

    async fn find_user(&self, id: &RecordId) -> JobResult<Option<User>> {
        Ok(self.users.find_by_id(id).await?)
    }

    /// Manager of a shop, used as approver on the link path
    async fn shop_manager(&self, shop: &RecordId) -> JobResult<User> {
        let shop = self
            .shops
            .find_by_id(shop)
            .await?
            .ok_or_else(|| JobError::NotFound(format!("shop {}", shop)))?;
        self.find_user(&shop.manager)
            .await?
            .ok_or_else(|| JobError::NotFound(format!("manager {}", shop.manager)))
    }

    fn link(&self, job: &Job, verb: &str, token: &str) -> String {
        format!(
            "{}/api/links/jobs/{}/{}?token={}",
            self.settings.public_base_url.trim_end_matches('/'),
            job.id_string(),
            verb,
            token
        )
    }

    async fn notify_user(&self, user_id: Option<&RecordId>, kind: NotificationKind, data: serde_json::Value) {
        let Some(user_id) = user_id else {
            return;
        };
        match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => {
                dispatch(self.notifier.as_ref(), &NotifyRecipient::from(&user), kind, data).await
            }
            Ok(None) => tracing::warn!(user = %user_id, "Notification recipient not found"),
            Err(e) => tracing::warn!(user = %user_id, error = %e, "Notification recipient lookup failed"),
        }
    }

    /// 技师可见: 本店中指派给自己、自己申请的、或未被认领且有资质的可用工单
    pub fn can_view(actor: &Actor, job: &Job) -> bool {
        match actor.role {
            Role::Manager => actor.managed_shop().is_ok_and(|shop| *shop == job.shop),
            Role::Technician => {
                let Ok(shop) = actor.member_shop() else {
                    return false;
                };
                if *shop != job.shop {
                    return false;
                }
                job.is_assigned_to(&actor.id)
                    || job.requested_by.as_ref() == Some(&actor.id)
                    || (job.status == JobStatus::Available
                        && job.assigned_tech.is_none()
                        && actor.holds(job.required_cert))
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn list(&self, actor: &Actor, filter: &JobFilter) -> JobResult<Vec<Job>> {
        let shop = actor.shop()?;
        let jobs = self.jobs.find_by_shop(shop, filter).await?;
        if actor.is_manager() {
            return Ok(jobs);
        }
        Ok(jobs
            .into_iter()
            .filter(|job| Self::can_view(actor, job))
            .collect())
    }

    /// Jobs assigned to the calling technician
    pub async fn list_mine(&self, actor: &Actor) -> JobResult<Vec<Job>> {
        let shop = actor.member_shop()?;
        let filter = JobFilter {
            assigned_tech: Some(actor.id.clone()),
            ..Default::default()
        };
        Ok(self.jobs.find_by_shop(shop, &filter).await?)
    }

    pub async fn get(&self, actor: &Actor, job_id: &str) -> JobResult<Job> {
        actor.shop()?;
        let id = parse_record_id("job", job_id)?;
        let job = self.load(&id).await?;
        if !Self::can_view(actor, &job) {
            return Err(JobError::NotEligible(
                "Job is not visible to you".to_string(),
            ));
        }
        Ok(job)
    }

    // ========================================================================
    // Manager operations
    // ========================================================================

    pub async fn create(&self, actor: &Actor, payload: JobCreate, now: i64) -> JobResult<Job> {
        let shop = actor.managed_shop()?.clone();
        payload
            .validate()
            .map_err(|e| JobError::Validation(e.to_string()))?;
        if payload.title.trim().is_empty() {
            return Err(JobError::Validation("title must not be empty".to_string()));
        }

        // 计数器先递增: 创建失败时号码作废, 不会被复用
        let seq = self.counters.next(SERVICE_ORDER_COUNTER).await?;
        let number = format_service_order(self.settings.service_order_offset + seq);

        let job = Job {
            id: None,
            service_order_number: number,
            title: payload.title.trim().to_string(),
            description: payload.description,
            vehicle: payload.vehicle,
            required_cert: payload.required_cert,
            book_time: payload.book_time,
            actual_time: None,
            status: JobStatus::Available,
            priority: payload.priority,
            assigned_tech: None,
            created_by: actor.id.clone(),
            shop,
            started_at: None,
            completed_at: None,
            incentive_earned: 0.0,
            time_saved: 0,
            notes: payload.notes,
            assignment_type: Default::default(),
            requested_by: None,
            request_status: Default::default(),
            approved_by: None,
            approved_at: None,
            rejected_reason: None,
            capabilities: Vec::new(),
            audit_log: Vec::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        let created = self.jobs.create(job).await?;
        tracing::info!(
            job_id = %created.id_string(),
            service_order = %created.service_order_number,
            required_cert = %created.required_cert,
            book_time = created.book_time,
            "Job created"
        );
        Ok(created)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        job_id: &str,
        changes: JobUpdate,
        now: i64,
    ) -> JobResult<Job> {
        changes
            .validate()
            .map_err(|e| JobError::Validation(e.to_string()))?;
        let id = parse_record_id("job", job_id)?;

        let _guard = self.lock(&id).await;
        let job = self.load(&id).await?;
        Self::ensure_manages(actor, &job)?;

        let assignee = match &job.assigned_tech {
            Some(tech) => self
                .find_user(tech)
                .await?
                .map(|user| TechProfile::try_from(&user))
                .transpose()?,
            None => None,
        };

        let metadata = ActionMetadata::new(actor.id.clone(), &actor.name, now);
        self.commit(
            &job,
            JobCommand::UpdateDetails(UpdateDetailsAction { changes, assignee }),
            &metadata,
        )
        .await
    }

    /// Notes may be edited by the shop manager or the assignee, in any state
    pub async fn update_notes(
        &self,
        actor: &Actor,
        job_id: &str,
        notes: String,
        now: i64,
    ) -> JobResult<Job> {
        if notes.chars().count() > MAX_NOTE_LEN as usize {
            return Err(JobError::Validation(format!(
                "notes must be at most {} characters",
                MAX_NOTE_LEN
            )));
        }
        let id = parse_record_id("job", job_id)?;

        let _guard = self.lock(&id).await;
        let job = self.load(&id).await?;
        let allowed = match actor.role {
            Role::Manager => Self::ensure_manages(actor, &job).is_ok(),
            Role::Technician => actor.member_shop().is_ok() && job.is_assigned_to(&actor.id),
        };
        if !allowed {
            return Err(JobError::NotEligible(
                "Only the shop manager or the assigned technician can edit notes".to_string(),
            ));
        }

        let metadata = ActionMetadata::new(actor.id.clone(), &actor.name, now);
        self.commit(
            &job,
            JobCommand::UpdateNotes(UpdateNotesAction { notes }),
            &metadata,
        )
        .await
    }

    pub async fn cancel(
        &self,
        actor: &Actor,
        job_id: &str,
        reason: Option<String>,
        now: i64,
    ) -> JobResult<Job> {
        let id = parse_record_id("job", job_id)?;

        let _guard = self.lock(&id).await;
        let job = self.load(&id).await?;
        Self::ensure_manages(actor, &job)?;

        let metadata = ActionMetadata::new(actor.id.clone(), &actor.name, now);
        self.commit(&job, JobCommand::Cancel(CancelAction { reason }), &metadata)
            .await
    }

    /// Hard delete, refused while work is in progress
    pub async fn delete(&self, actor: &Actor, job_id: &str) -> JobResult<()> {
        let id = parse_record_id("job", job_id)?;

        let guard = self.lock(&id).await;
        let job = self.load(&id).await?;
        Self::ensure_manages(actor, &job)?;
        if job.status == JobStatus::InProgress {
            return Err(JobError::InvalidState(
                "Job is in progress; reassign or complete it first".to_string(),
            ));
        }

        self.jobs.delete_if_revision(&id, job.revision).await?;
        drop(guard);

        tracing::info!(job_id = %id, actor = %actor.id, "Job deleted");
        Ok(())
    }

    pub async fn approve_request(&self, actor: &Actor, job_id: &str, now: i64) -> JobResult<Job> {
        let id = parse_record_id("job", job_id)?;

        let guard = self.lock(&id).await;
        let job = self.load(&id).await?;
        Self::ensure_manages(actor, &job)?;

        let metadata = ActionMetadata::new(actor.id.clone(), &actor.name, now);
        let saved = self.approve_locked(&job, actor.id.clone(), &metadata).await?;
        drop(guard);

        self.notify_decision(&saved, "approved").await;
        Ok(saved)
    }

    pub async fn reject_request(
        &self,
        actor: &Actor,
        job_id: &str,
        reason: Option<String>,
        now: i64,
    ) -> JobResult<Job> {
        let id = parse_record_id("job", job_id)?;

        let guard = self.lock(&id).await;
        let job = self.load(&id).await?;
        Self::ensure_manages(actor, &job)?;

        let requester = job.requested_by.clone();
        let metadata = ActionMetadata::new(actor.id.clone(), &actor.name, now);
        let saved = self
            .commit(
                &job,
                JobCommand::RejectRequest(RejectRequestAction { reason }),
                &metadata,
            )
            .await?;
        drop(guard);

        self.notify_rejection(&saved, requester.as_ref()).await;
        Ok(saved)
    }

    pub async fn direct_assign(
        &self,
        actor: &Actor,
        job_id: &str,
        tech_id: &str,
        now: i64,
    ) -> JobResult<Job> {
        let id = parse_record_id("job", job_id)?;
        actor.managed_shop()?;
        let tech = self.load_tech(tech_id).await?;

        let _guard = self.lock(&id).await;
        let job = self.load(&id).await?;
        Self::ensure_manages(actor, &job)?;

        let metadata = ActionMetadata::new(actor.id.clone(), &actor.name, now);
        self.commit(&job, JobCommand::Assign(AssignAction { tech }), &metadata)
            .await
    }

    pub async fn reassign(
        &self,
        actor: &Actor,
        job_id: &str,
        tech_id: &str,
        reason: Option<String>,
        now: i64,
    ) -> JobResult<Job> {
        let id = parse_record_id("job", job_id)?;
        actor.managed_shop()?;
        let tech = self.load_tech(tech_id).await?;

        let _guard = self.lock(&id).await;
        let job = self.load(&id).await?;
        Self::ensure_manages(actor, &job)?;

        let metadata = ActionMetadata::new(actor.id.clone(), &actor.name, now);
        self.commit(
            &job,
            JobCommand::Reassign(ReassignAction { tech, reason }),
            &metadata,
        )
        .await
    }

    // ========================================================================
    // Technician operations
    // ========================================================================

    pub async fn request_to_work(&self, actor: &Actor, job_id: &str, now: i64) -> JobResult<Job> {
        actor.member_shop()?;
        let id = parse_record_id("job", job_id)?;

        let guard = self.lock(&id).await;
        let job = self.load(&id).await?;

        let (capabilities, issued) = capability::issue(
            &id,
            &[CapabilityAction::ApproveJob, CapabilityAction::RejectJob],
        )
        .map_err(|e| JobError::App(shared::AppError::internal(e.to_string())))?;

        let metadata = ActionMetadata::new(actor.id.clone(), &actor.name, now);
        let saved = self
            .commit(
                &job,
                JobCommand::RequestWork(RequestWorkAction {
                    tech: TechProfile::from(actor),
                    capabilities,
                }),
                &metadata,
            )
            .await?;
        drop(guard);

        match self.shop_manager(&saved.shop).await {
            Ok(manager) => {
                let approve = capability::token_for(&issued, CapabilityAction::ApproveJob)
                    .map(|t| self.link(&saved, "approve", t));
                let reject = capability::token_for(&issued, CapabilityAction::RejectJob)
                    .map(|t| self.link(&saved, "reject", t));
                dispatch(
                    self.notifier.as_ref(),
                    &NotifyRecipient::from(&manager),
                    NotificationKind::JobRequestToManager,
                    json!({
                        "job_id": saved.id_string(),
                        "service_order_number": saved.service_order_number,
                        "title": saved.title,
                        "required_cert": saved.required_cert,
                        "technician": actor.name,
                        "approve_url": approve,
                        "reject_url": reject,
                    }),
                )
                .await;
            }
            Err(e) => tracing::warn!(job_id = %saved.id_string(), error = %e, "No manager to notify"),
        }
        Ok(saved)
    }

    pub async fn start(&self, actor: &Actor, job_id: &str, now: i64) -> JobResult<Job> {
        actor.member_shop()?;
        let id = parse_record_id("job", job_id)?;

        let _guard = self.lock(&id).await;
        let job = self.load(&id).await?;

        let metadata = ActionMetadata::new(actor.id.clone(), &actor.name, now);
        self.commit(
            &job,
            JobCommand::Start(StartAction {
                tech: TechProfile::from(actor),
            }),
            &metadata,
        )
        .await
    }

    pub async fn complete(
        &self,
        actor: &Actor,
        job_id: &str,
        payload: CompleteJob,
        now: i64,
    ) -> JobResult<Job> {
        actor.member_shop()?;
        payload
            .validate()
            .map_err(|e| JobError::Validation(e.to_string()))?;
        let id = parse_record_id("job", job_id)?;

        let guard = self.lock(&id).await;
        let job = self.load(&id).await?;

        let mut action = CompleteAction {
            tech_id: actor.id.clone(),
            actual_time: payload.actual_time,
            rule: None,
            multiplier: actor.bonus_multiplier,
            notes: payload.notes,
        };

        if let (Some(reported), Some(started_at)) = (payload.actual_time, job.started_at) {
            let measured = elapsed_minutes(started_at, now);
            if reported != measured {
                tracing::warn!(
                    job_id = %job.id_string(),
                    reported,
                    measured,
                    "Reported actual time differs from measured duration"
                );
            }
        }

        if job.status == JobStatus::InProgress && job.is_assigned_to(&actor.id) {
            let rule = self
                .incentives
                .select_active_rule(&job.shop, job.required_cert, now)
                .await?;
            action.rule = rule.as_ref().map(RuleTerms::from);
        }

        let metadata = ActionMetadata::new(actor.id.clone(), &actor.name, now);
        let command = JobCommand::Complete(action);
        let mut next = job.clone();
        command.execute(&mut next, &metadata)?;

        // 工单状态与技师累计同一事务提交
        let (saved, tech) = self
            .jobs
            .complete_with_earnings(
                &next,
                job.revision,
                &actor.id,
                next.incentive_earned,
                next.time_saved,
            )
            .await?;
        Self::log_transition(&job, &saved, &command, &metadata);
        drop(guard);

        tracing::info!(
            job_id = %saved.id_string(),
            tech = %actor.id,
            actual_time = saved.actual_time.unwrap_or_default(),
            time_saved = saved.time_saved,
            bonus = saved.incentive_earned,
            "Job completed"
        );

        if saved.incentive_earned > 0.0 {
            dispatch(
                self.notifier.as_ref(),
                &NotifyRecipient::from(&tech),
                NotificationKind::BonusEarned,
                json!({
                    "job_id": saved.id_string(),
                    "service_order_number": saved.service_order_number,
                    "title": saved.title,
                    "bonus": saved.incentive_earned,
                    "time_saved": saved.time_saved,
                    "weekly_earnings": tech.weekly_earnings,
                }),
            )
            .await;
        }
        Ok(saved)
    }

    // ========================================================================
    // Capability links (no session)
    // ========================================================================

    pub async fn approve_via_token(&self, job_id: &str, token: &str, now: i64) -> JobResult<Job> {
        let id = parse_record_id("job", job_id).map_err(|_| JobError::CapabilityInvalid)?;

        let guard = self.lock(&id).await;
        let job = self
            .jobs
            .find_by_id(&id)
            .await?
            .ok_or(JobError::CapabilityInvalid)?;
        if !capability::verify(&job.capabilities, &id, CapabilityAction::ApproveJob, token) {
            return Err(JobError::CapabilityInvalid);
        }

        let manager = self.shop_manager(&job.shop).await?;
        let manager_id = manager
            .id
            .clone()
            .ok_or_else(|| JobError::NotFound("shop manager".to_string()))?;
        let metadata = ActionMetadata::new(manager_id.clone(), &manager.name, now);
        let saved = self.approve_locked(&job, manager_id, &metadata).await?;
        drop(guard);

        self.notify_decision(&saved, "approved").await;
        Ok(saved)
    }

    pub async fn reject_via_token(
        &self,
        job_id: &str,
        token: &str,
        reason: Option<String>,
        now: i64,
    ) -> JobResult<Job> {
        let id = parse_record_id("job", job_id).map_err(|_| JobError::CapabilityInvalid)?;

        let guard = self.lock(&id).await;
        let job = self
            .jobs
            .find_by_id(&id)
            .await?
            .ok_or(JobError::CapabilityInvalid)?;
        if !capability::verify(&job.capabilities, &id, CapabilityAction::RejectJob, token) {
            return Err(JobError::CapabilityInvalid);
        }

        let manager = self.shop_manager(&job.shop).await?;
        let manager_id = manager
            .id
            .clone()
            .ok_or_else(|| JobError::NotFound("shop manager".to_string()))?;
        let requester = job.requested_by.clone();
        let metadata = ActionMetadata::new(manager_id, &manager.name, now);
        let saved = self
            .commit(
                &job,
                JobCommand::RejectRequest(RejectRequestAction { reason }),
                &metadata,
            )
            .await?;
        drop(guard);

        self.notify_rejection(&saved, requester.as_ref()).await;
        Ok(saved)
    }

    /// Shared by the session and link approval paths; caller holds the job lock
    async fn approve_locked(
        &self,
        job: &Job,
        approver: RecordId,
        metadata: &ActionMetadata,
    ) -> JobResult<Job> {
        let Some(requester_id) = job.requested_by.clone() else {
            return Err(JobError::InvalidState(
                "Job has no pending request".to_string(),
            ));
        };
        let requester = self
            .find_user(&requester_id)
            .await?
            .ok_or_else(|| JobError::NotFound(format!("technician {}", requester_id)))?;
        let requester = TechProfile::try_from(&requester)?;

        self.commit(
            job,
            JobCommand::ApproveRequest(ApproveRequestAction {
                approver,
                requester,
            }),
            metadata,
        )
        .await
    }

    async fn notify_decision(&self, job: &Job, decision: &str) {
        self.notify_user(
            job.assigned_tech.as_ref(),
            NotificationKind::JobDecisionToTech,
            json!({
                "job_id": job.id_string(),
                "service_order_number": job.service_order_number,
                "title": job.title,
                "decision": decision,
            }),
        )
        .await;
    }

    async fn notify_rejection(&self, job: &Job, requester: Option<&RecordId>) {
        self.notify_user(
            requester,
            NotificationKind::JobDecisionToTech,
            json!({
                "job_id": job.id_string(),
                "service_order_number": job.service_order_number,
                "title": job.title,
                "decision": "rejected",
                "reason": job.rejected_reason,
            }),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::actor::test_support::{manager, technician};
    use crate::jobs::actions::test_support::create_test_job;
    use shared::models::Certification;

    #[test]
    fn test_manager_sees_only_own_shop() {
        let job = create_test_job(Certification::Engine, 60);
        assert!(JobService::can_view(&manager("downtown"), &job));
        assert!(!JobService::can_view(&manager("uptown"), &job));
    }

    #[test]
    fn test_technician_visibility() {
        let mut job = create_test_job(Certification::Engine, 60);
        let certified = technician("tess", "downtown", &[Certification::Engine]);
        let uncertified = technician("omar", "downtown", &[Certification::Ev]);

        assert!(JobService::can_view(&certified, &job));
        assert!(!JobService::can_view(&uncertified, &job));

        job.assigned_tech = Some(uncertified.id.clone());
        assert!(JobService::can_view(&uncertified, &job));
        assert!(!JobService::can_view(&certified, &job), "claimed by someone else");
    }

    #[tokio::test]
    async fn test_lock_entry_evicted_after_release() {
        let locks: LockMap = Arc::new(DashMap::new());
        let id = RecordId::from_table_key("job", "j1");

        let lock = JobLock::acquire(&locks, &id).await;
        assert_eq!(locks.len(), 1);
        drop(lock);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_lock_entry_kept_while_contended() {
        let locks: LockMap = Arc::new(DashMap::new());
        let id = RecordId::from_table_key("job", "j1");

        let first = JobLock::acquire(&locks, &id).await;
        let waiter = {
            let locks = locks.clone();
            let id = id.clone();
            tokio::spawn(async move { JobLock::acquire(&locks, &id).await })
        };
        // 等待者已拿到同一把锁的引用
        while locks.get(&id.to_string()).map(|m| Arc::strong_count(&m)) != Some(3) {
            tokio::task::yield_now().await;
        }

        drop(first);
        assert_eq!(locks.len(), 1, "waiter still queued on the entry");
        let second = waiter.await.unwrap();
        drop(second);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_pending_technician_sees_nothing() {
        let job = create_test_job(Certification::Engine, 60);
        let mut tech = technician("tess", "downtown", &[Certification::Engine]);
        tech.membership_status = MembershipStatus::Pending;
        assert!(!JobService::can_view(&tech, &job));
    }
}
