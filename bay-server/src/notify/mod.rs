//! 通知协作者
//!
//! 业务只调用 [`dispatch`]：通知失败只记 `warn` 日志，绝不影响触发它的状态变更。
//! 真正的投递 (邮件模板等) 不在本服务范围内，[`LogNotifier`] 把每条通知写成结构化日志。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::db::models::User;

/// 通知模板类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    BonusEarned,
    JobRequestToManager,
    JobDecisionToTech,
    MembershipRequestToManager,
    MembershipDecisionToTech,
    MembershipRequestAck,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BonusEarned => "bonus-earned",
            Self::JobRequestToManager => "job-request-to-manager",
            Self::JobDecisionToTech => "job-decision-to-tech",
            Self::MembershipRequestToManager => "membership-request-to-manager",
            Self::MembershipDecisionToTech => "membership-decision-to-tech",
            Self::MembershipRequestAck => "membership-request-ack",
        }
    }
}

/// 收件人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyRecipient {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for NotifyRecipient {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id_string(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// 通知发送接口
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient: &NotifyRecipient,
        kind: NotificationKind,
        data: Value,
    ) -> Result<(), NotifyError>;
}

/// Best-effort delivery: failures are logged and swallowed
pub async fn dispatch(
    notifier: &dyn Notifier,
    recipient: &NotifyRecipient,
    kind: NotificationKind,
    data: Value,
) {
    if let Err(e) = notifier.notify(recipient, kind, data).await {
        tracing::warn!(
            recipient = %recipient.user_id,
            kind = kind.as_str(),
            error = %e,
            "Notification failed"
        );
    }
}

/// 写日志的通知器 (默认)
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: &NotifyRecipient,
        kind: NotificationKind,
        data: Value,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            target: "notification",
            recipient = %recipient.user_id,
            email = %recipient.email,
            kind = kind.as_str(),
            data = %data,
            "Notification queued"
        );
        Ok(())
    }
}

/// 已发送的通知 (测试观察用)
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub recipient: NotifyRecipient,
    pub kind: NotificationKind,
    pub data: Value,
}

/// 内存通知器：记录所有通知，可切换为必定失败
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 之后的每次发送都返回错误
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_of(&self, kind: NotificationKind) -> Vec<SentNotification> {
        self.sent().into_iter().filter(|n| n.kind == kind).collect()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(
        &self,
        recipient: &NotifyRecipient,
        kind: NotificationKind,
        data: Value,
    ) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("mail relay unavailable".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentNotification {
                recipient: recipient.clone(),
                kind,
                data,
            });
        }
        Ok(())
    }
}
