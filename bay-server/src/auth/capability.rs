//! 邮件链接能力令牌
//!
//! 审批邮件里的链接携带一个一次性令牌，代替经理会话完成一次特定操作。
//!
//! - 令牌: 32 字节随机数 (ring `SystemRandom`)，hex 编码后放进链接
//! - 存储: 实体上只保存 `sha256(subject | action | token)`，明文不落库
//! - 作用域: 哈希绑定了实体 ID 和动作，令牌不能挪用到别的记录或别的动作
//! - 失效: 实体离开待审批状态时整组清空，因此只能被消费一次

use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use surrealdb::RecordId;
use thiserror::Error;

const TOKEN_BYTES: usize = 32;

/// 令牌授权的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityAction {
    ApproveJob,
    RejectJob,
    ApproveMembership,
    RejectMembership,
}

impl CapabilityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApproveJob => "approve_job",
            Self::RejectJob => "reject_job",
            Self::ApproveMembership => "approve_membership",
            Self::RejectMembership => "reject_membership",
        }
    }
}

/// 持久化的能力记录 (只有哈希)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub action: CapabilityAction,
    pub token_hash: String,
}

/// 刚签发的令牌明文，只用于拼接通知里的链接
#[derive(Debug, Clone)]
pub struct IssuedCapability {
    pub action: CapabilityAction,
    pub token: String,
}

#[derive(Debug, Error)]
#[error("Failed to generate capability token")]
pub struct CapabilityError;

fn digest(subject: &RecordId, action: CapabilityAction, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(action.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// 为同一实体签发一组令牌 (例如同时签发批准和拒绝)
pub fn issue(
    subject: &RecordId,
    actions: &[CapabilityAction],
) -> Result<(Vec<Capability>, Vec<IssuedCapability>), CapabilityError> {
    let rng = SystemRandom::new();
    let mut stored = Vec::with_capacity(actions.len());
    let mut issued = Vec::with_capacity(actions.len());

    for &action in actions {
        let mut bytes = [0u8; TOKEN_BYTES];
        rng.fill(&mut bytes).map_err(|_| CapabilityError)?;
        let token = hex::encode(bytes);

        stored.push(Capability {
            action,
            token_hash: digest(subject, action, &token),
        });
        issued.push(IssuedCapability { action, token });
    }

    Ok((stored, issued))
}

/// 校验令牌是否与实体上某个同动作的记录匹配
pub fn verify(
    stored: &[Capability],
    subject: &RecordId,
    action: CapabilityAction,
    token: &str,
) -> bool {
    if token.len() != TOKEN_BYTES * 2 {
        return false;
    }
    let expected = digest(subject, action, token);
    stored
        .iter()
        .any(|c| c.action == action && c.token_hash == expected)
}

/// 在签发结果里找出某个动作的明文令牌
pub fn token_for(issued: &[IssuedCapability], action: CapabilityAction) -> Option<&str> {
    issued
        .iter()
        .find(|c| c.action == action)
        .map(|c| c.token.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> RecordId {
        RecordId::from_table_key("job", "j1")
    }

    #[test]
    fn test_issued_token_verifies_for_its_action_only() {
        let (stored, issued) =
            issue(&job(), &[CapabilityAction::ApproveJob, CapabilityAction::RejectJob]).unwrap();
        assert_eq!(stored.len(), 2);

        let approve = token_for(&issued, CapabilityAction::ApproveJob).unwrap();
        assert_eq!(approve.len(), 64);
        assert!(verify(&stored, &job(), CapabilityAction::ApproveJob, approve));
        assert!(!verify(&stored, &job(), CapabilityAction::RejectJob, approve));
    }

    #[test]
    fn test_token_is_bound_to_subject() {
        let (stored, issued) = issue(&job(), &[CapabilityAction::ApproveJob]).unwrap();
        let token = token_for(&issued, CapabilityAction::ApproveJob).unwrap();
        let other = RecordId::from_table_key("job", "j2");
        assert!(!verify(&stored, &other, CapabilityAction::ApproveJob, token));
    }

    #[test]
    fn test_plaintext_is_never_stored() {
        let (stored, issued) = issue(&job(), &[CapabilityAction::ApproveJob]).unwrap();
        assert_ne!(stored[0].token_hash, issued[0].token);
    }

    #[test]
    fn test_cleared_or_malformed_tokens_fail() {
        let (_, issued) = issue(&job(), &[CapabilityAction::ApproveJob]).unwrap();
        let token = token_for(&issued, CapabilityAction::ApproveJob).unwrap();
        assert!(!verify(&[], &job(), CapabilityAction::ApproveJob, token));

        let (stored, _) = issue(&job(), &[CapabilityAction::ApproveJob]).unwrap();
        assert!(!verify(&stored, &job(), CapabilityAction::ApproveJob, ""));
        assert!(!verify(&stored, &job(), CapabilityAction::ApproveJob, "abc"));
    }
}
