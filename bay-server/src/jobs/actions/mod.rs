//! Job action implementations
//!
//! Each action implements [`JobAction`] and performs one transition of the
//! job state machine on an in-memory [`Job`]. Actions are pure: loading,
//! locking, persisting and notifying belong to [`super::JobService`].
//!
//! | Action | From | To |
//! |--------|------|----|
//! | RequestWork | available | pending-approval |
//! | ApproveRequest | pending-approval | available (+ assignee) |
//! | RejectRequest | pending-approval | available |
//! | Assign | available | available (+ assignee) |
//! | Reassign | any non-terminal | available (+ new assignee) |
//! | Start | available | in-progress |
//! | Complete | in-progress | completed |
//! | Cancel | available / pending-approval | cancelled |

use shared::models::Certification;
use surrealdb::RecordId;

use super::error::{JobError, JobResult};
use crate::db::models::{AuditEntry, Job, User};
use crate::identity::Actor;

mod approve_request;
mod assign;
mod cancel;
mod complete;
mod reassign;
mod reject_request;
mod request_work;
mod start;
mod update_details;
mod update_notes;

pub use approve_request::ApproveRequestAction;
pub use assign::AssignAction;
pub use cancel::CancelAction;
pub use complete::{CompleteAction, RuleTerms};
pub use reassign::ReassignAction;
pub use reject_request::RejectRequestAction;
pub use request_work::RequestWorkAction;
pub use start::StartAction;
pub use update_details::UpdateDetailsAction;
pub use update_notes::UpdateNotesAction;

/// Who performs the action, and when
#[derive(Debug, Clone)]
pub struct ActionMetadata {
    pub actor_id: RecordId,
    pub actor_name: String,
    pub timestamp: i64,
}

impl ActionMetadata {
    pub fn new(actor_id: RecordId, actor_name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            actor_id,
            actor_name: actor_name.into(),
            timestamp,
        }
    }
}

/// 技师资质快照 (动作执行时的权威数据)
#[derive(Debug, Clone)]
pub struct TechProfile {
    pub id: RecordId,
    pub name: String,
    pub shop: Option<RecordId>,
    pub certifications: Vec<Certification>,
}

impl TechProfile {
    pub fn holds(&self, cert: Certification) -> bool {
        self.certifications.contains(&cert)
    }
}

impl From<&Actor> for TechProfile {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id.clone(),
            name: actor.name.clone(),
            shop: actor.shop.clone(),
            certifications: actor.certifications.clone(),
        }
    }
}

impl TryFrom<&User> for TechProfile {
    type Error = JobError;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        let actor = Actor::try_from(user)?;
        Ok(Self::from(&actor))
    }
}

/// A single state-machine transition
pub trait JobAction {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()>;
}

/// JobCommand enum - dispatches to concrete action implementations
#[derive(Debug, Clone)]
pub enum JobCommand {
    RequestWork(RequestWorkAction),
    ApproveRequest(ApproveRequestAction),
    RejectRequest(RejectRequestAction),
    Assign(AssignAction),
    Reassign(ReassignAction),
    Start(StartAction),
    Complete(CompleteAction),
    Cancel(CancelAction),
    UpdateDetails(UpdateDetailsAction),
    UpdateNotes(UpdateNotesAction),
}

impl JobCommand {
    pub fn name(&self) -> &'static str {
        match self {
            JobCommand::RequestWork(_) => "request_work",
            JobCommand::ApproveRequest(_) => "approve_request",
            JobCommand::RejectRequest(_) => "reject_request",
            JobCommand::Assign(_) => "assign",
            JobCommand::Reassign(_) => "reassign",
            JobCommand::Start(_) => "start",
            JobCommand::Complete(_) => "complete",
            JobCommand::Cancel(_) => "cancel",
            JobCommand::UpdateDetails(_) => "update_details",
            JobCommand::UpdateNotes(_) => "update_notes",
        }
    }
}

/// Manual implementation of JobAction for JobCommand
impl JobAction for JobCommand {
    fn execute(&self, job: &mut Job, metadata: &ActionMetadata) -> JobResult<()> {
        match self {
            JobCommand::RequestWork(action) => action.execute(job, metadata),
            JobCommand::ApproveRequest(action) => action.execute(job, metadata),
            JobCommand::RejectRequest(action) => action.execute(job, metadata),
            JobCommand::Assign(action) => action.execute(job, metadata),
            JobCommand::Reassign(action) => action.execute(job, metadata),
            JobCommand::Start(action) => action.execute(job, metadata),
            JobCommand::Complete(action) => action.execute(job, metadata),
            JobCommand::Cancel(action) => action.execute(job, metadata),
            JobCommand::UpdateDetails(action) => action.execute(job, metadata),
            JobCommand::UpdateNotes(action) => action.execute(job, metadata),
        }?;
        job.updated_at = metadata.timestamp;
        Ok(())
    }
}

// ==================== Shared checks ====================

/// Technician must belong to the job's shop
pub(crate) fn ensure_same_shop(job: &Job, tech: &TechProfile) -> JobResult<()> {
    if tech.shop.as_ref() != Some(&job.shop) {
        return Err(JobError::ShopMismatch(format!(
            "{} is not a member of the job's shop",
            tech.name
        )));
    }
    Ok(())
}

/// Technician must hold the job's required certification
pub(crate) fn ensure_certified(job: &Job, tech: &TechProfile) -> JobResult<()> {
    if !tech.holds(job.required_cert) {
        return Err(JobError::NotEligible(format!(
            "{} is not certified for {}",
            tech.name, job.required_cert
        )));
    }
    Ok(())
}

/// Emailed approval links die as soon as the job leaves the pending request
pub(crate) fn revoke_capabilities(job: &mut Job) {
    job.capabilities.clear();
}

pub(crate) fn record_audit(
    job: &mut Job,
    metadata: &ActionMetadata,
    action: &str,
    note: Option<String>,
) {
    job.audit_log.push(AuditEntry {
        at: metadata.timestamp,
        actor: metadata.actor_id.to_string(),
        action: action.to_string(),
        note,
    });
}
