//! MembershipService - 店铺与成员审批

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::models::{Certification, MembershipStatus, Role};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use validator::Validate;

use super::code::{CODE_ATTEMPTS, generate_shop_code, normalize_code};
use super::error::{MembershipError, MembershipResult};
use crate::auth::{CapabilityAction, capability};
use crate::db::models::{Shop, User, UserProfile};
use crate::db::repository::{RepoError, ShopRepository, UserRepository, parse_record_id};
use crate::identity::Actor;
use crate::notify::{NotificationKind, Notifier, NotifyRecipient, dispatch};
use crate::utils::validation::{MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN};

/// New shop payload
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ShopCreate {
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = MAX_ADDRESS_LEN))]
    pub address: String,
    #[serde(default)]
    #[validate(length(max = MAX_SHORT_TEXT_LEN))]
    pub phone: String,
}

/// Shop edit payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ShopUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_ADDRESS_LEN))]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = MAX_SHORT_TEXT_LEN))]
    pub phone: Option<String>,
}

/// Result of a public code lookup
#[derive(Debug, Clone, Serialize)]
pub struct ShopCodeInfo {
    pub code: String,
    pub shop_name: String,
}

#[derive(Clone)]
pub struct MembershipService {
    users: UserRepository,
    shops: ShopRepository,
    notifier: Arc<dyn Notifier>,
    public_base_url: String,
    code_prefix: String,
}

impl std::fmt::Debug for MembershipService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipService")
            .field("code_prefix", &self.code_prefix)
            .finish()
    }
}

fn validate<T: Validate>(payload: &T) -> MembershipResult<()> {
    payload
        .validate()
        .map_err(|e| MembershipError::Validation(e.to_string()))
}

impl MembershipService {
    pub fn new(
        db: Surreal<Db>,
        notifier: Arc<dyn Notifier>,
        public_base_url: impl Into<String>,
        code_prefix: impl Into<String>,
    ) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            shops: ShopRepository::new(db),
            notifier,
            public_base_url: public_base_url.into(),
            code_prefix: code_prefix.into(),
        }
    }

    /// A code no other shop holds
    async fn unique_code(&self) -> MembershipResult<String> {
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_shop_code(&self.code_prefix)?;
            if !self.shops.code_exists(&code).await? {
                return Ok(code);
            }
            tracing::debug!(code = %code, "Shop code collision, regenerating");
        }
        Err(MembershipError::CodeExhausted(CODE_ATTEMPTS))
    }

    fn link(&self, user_id: &RecordId, verb: &str, token: &str) -> String {
        format!(
            "{}/api/links/membership/{}/{}?token={}",
            self.public_base_url.trim_end_matches('/'),
            user_id,
            verb,
            token
        )
    }

    async fn load_shop(&self, id: &RecordId) -> MembershipResult<Shop> {
        self.shops
            .find_by_id(id)
            .await?
            .ok_or(MembershipError::ShopNotFound)
    }

    /// Technician of the manager's shop
    async fn load_member(&self, actor: &Actor, tech_id: &str) -> MembershipResult<(Shop, User)> {
        let shop_id = actor.managed_shop()?.clone();
        let id = parse_record_id("user", tech_id)?;
        let tech = self
            .users
            .find_by_id(&id)
            .await?
            .ok_or(MembershipError::NotInShop)?;
        if !tech.is_technician() || tech.shop.as_ref() != Some(&shop_id) {
            return Err(MembershipError::NotInShop);
        }
        let shop = self.load_shop(&shop_id).await?;
        Ok((shop, tech))
    }

    // ========================================================================
    // Shops
    // ========================================================================

    /// Create a shop bound to `manager` (one shop per manager)
    pub async fn create_shop(
        &self,
        manager: &User,
        payload: ShopCreate,
        now: i64,
    ) -> MembershipResult<Shop> {
        validate(&payload)?;
        if payload.name.trim().is_empty() {
            return Err(MembershipError::Validation(
                "Shop name must not be empty".to_string(),
            ));
        }
        let manager_id = manager
            .id
            .clone()
            .ok_or_else(|| MembershipError::Internal("Manager record without id".to_string()))?;
        if manager.role != Role::Manager {
            return Err(crate::identity::IdentityError::ManagerRequired.into());
        }
        if self.shops.find_by_manager(&manager_id).await?.is_some() {
            return Err(MembershipError::ShopAlreadyOwned);
        }

        for _ in 0..CODE_ATTEMPTS {
            let code = self.unique_code().await?;
            let shop = Shop {
                id: None,
                name: payload.name.trim().to_string(),
                code,
                address: payload.address.clone(),
                phone: payload.phone.clone(),
                manager: manager_id.clone(),
                is_active: true,
                created_at: now,
            };
            match self.shops.create(shop).await {
                Ok(created) => {
                    tracing::info!(
                        shop_id = %created.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
                        code = %created.code,
                        manager = %manager_id,
                        "Shop created"
                    );
                    return Ok(created);
                }
                // 唯一索引在检查与写入之间被抢占
                Err(RepoError::Duplicate(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(MembershipError::CodeExhausted(CODE_ATTEMPTS))
    }

    /// Remove a shop whose owner signup failed halfway
    pub(crate) async fn discard_shop(&self, id: &RecordId) {
        if let Err(e) = self.shops.delete(id).await {
            tracing::error!(shop = %id, error = %e, "Failed to roll back shop after signup error");
        }
    }

    /// Shop of the caller (manager: owned, technician: the shop it belongs to or applied to)
    pub async fn my_shop(&self, actor: &Actor) -> MembershipResult<Shop> {
        let shop_id = match actor.role {
            Role::Manager => actor.managed_shop()?.clone(),
            Role::Technician => actor
                .shop
                .clone()
                .ok_or(crate::identity::IdentityError::NotShopMember)?,
        };
        self.load_shop(&shop_id).await
    }

    pub async fn update_shop(
        &self,
        actor: &Actor,
        payload: ShopUpdate,
    ) -> MembershipResult<Shop> {
        validate(&payload)?;
        let shop_id = actor.managed_shop()?.clone();

        let mut patch = serde_json::Map::new();
        if let Some(name) = payload.name {
            if name.trim().is_empty() {
                return Err(MembershipError::Validation(
                    "Shop name must not be empty".to_string(),
                ));
            }
            patch.insert("name".into(), json!(name.trim()));
        }
        if let Some(address) = payload.address {
            patch.insert("address".into(), json!(address));
        }
        if let Some(phone) = payload.phone {
            patch.insert("phone".into(), json!(phone));
        }
        if patch.is_empty() {
            return self.load_shop(&shop_id).await;
        }

        Ok(self.shops.merge(&shop_id, patch.into()).await?)
    }

    /// New join code; the old one stops working immediately
    pub async fn regenerate_code(&self, actor: &Actor) -> MembershipResult<Shop> {
        let shop_id = actor.managed_shop()?.clone();
        let old = self.load_shop(&shop_id).await?;

        for _ in 0..CODE_ATTEMPTS {
            let code = self.unique_code().await?;
            match self.shops.update_code(&shop_id, &code).await {
                Ok(shop) => {
                    tracing::info!(shop_id = %shop_id, old = %old.code, new = %shop.code, "Shop code regenerated");
                    return Ok(shop);
                }
                Err(RepoError::Duplicate(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(MembershipError::CodeExhausted(CODE_ATTEMPTS))
    }

    async fn resolve_code(&self, code: &str) -> MembershipResult<Shop> {
        let normalized = normalize_code(code);
        match self.shops.find_by_code(&normalized).await? {
            Some(shop) if shop.is_active => Ok(shop),
            _ => Err(MembershipError::InvalidCode(normalized)),
        }
    }

    /// Public lookup used by the signup form
    pub async fn validate_code(&self, code: &str) -> MembershipResult<ShopCodeInfo> {
        let shop = self.resolve_code(code).await?;
        Ok(ShopCodeInfo {
            code: shop.code,
            shop_name: shop.name,
        })
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Technician applies to the shop behind `code`
    pub async fn request_membership(
        &self,
        tech: &User,
        code: &str,
        certifications: Vec<Certification>,
        now: i64,
    ) -> MembershipResult<User> {
        if !tech.is_technician() {
            return Err(crate::identity::IdentityError::TechnicianRequired.into());
        }
        let tech_id = tech
            .id
            .clone()
            .ok_or_else(|| MembershipError::Internal("Technician record without id".to_string()))?;
        if tech.shop.is_some() && tech.membership_status == MembershipStatus::Approved {
            return Err(MembershipError::AlreadyMember);
        }
        let mut certifications = certifications;
        certifications.sort();
        certifications.dedup();
        if certifications.is_empty() {
            return Err(MembershipError::Validation(
                "At least one certification is required".to_string(),
            ));
        }

        let shop = self.resolve_code(code).await?;
        let shop_id = shop
            .id
            .clone()
            .ok_or_else(|| MembershipError::Internal("Shop record without id".to_string()))?;

        let (capabilities, issued) = capability::issue(
            &tech_id,
            &[
                CapabilityAction::ApproveMembership,
                CapabilityAction::RejectMembership,
            ],
        )
        .map_err(|e| MembershipError::Internal(e.to_string()))?;

        let updated = self
            .users
            .merge(
                &tech_id,
                json!({
                    "shop": shop_id.to_string(),
                    "membership_status": MembershipStatus::Pending,
                    "is_active": false,
                    "certifications": certifications,
                    "capabilities": capabilities,
                    "rejected_reason": null,
                    "updated_at": now,
                }),
            )
            .await?;

        tracing::info!(tech = %tech_id, shop = %shop_id, "Membership requested");

        match self.users.find_by_id(&shop.manager).await {
            Ok(Some(manager)) => {
                let approve = capability::token_for(&issued, CapabilityAction::ApproveMembership)
                    .map(|t| self.link(&tech_id, "approve", t));
                let reject = capability::token_for(&issued, CapabilityAction::RejectMembership)
                    .map(|t| self.link(&tech_id, "reject", t));
                dispatch(
                    self.notifier.as_ref(),
                    &NotifyRecipient::from(&manager),
                    NotificationKind::MembershipRequestToManager,
                    json!({
                        "technician_id": tech_id.to_string(),
                        "technician": updated.name,
                        "email": updated.email,
                        "certifications": updated.certifications,
                        "shop_name": shop.name,
                        "approve_url": approve,
                        "reject_url": reject,
                    }),
                )
                .await;
            }
            Ok(None) => tracing::warn!(shop = %shop_id, "Shop manager not found"),
            Err(e) => tracing::warn!(shop = %shop_id, error = %e, "Shop manager lookup failed"),
        }

        dispatch(
            self.notifier.as_ref(),
            &NotifyRecipient::from(&updated),
            NotificationKind::MembershipRequestAck,
            json!({ "shop_name": shop.name }),
        )
        .await;

        Ok(updated)
    }

    /// Technician already signed up asks to (re)join a shop
    pub async fn join(
        &self,
        actor: &Actor,
        code: &str,
        certifications: Option<Vec<Certification>>,
        now: i64,
    ) -> MembershipResult<UserProfile> {
        let tech = self
            .users
            .find_by_id(&actor.id)
            .await?
            .ok_or_else(|| crate::identity::IdentityError::UserNotFound(actor.id.to_string()))?;
        let certifications = certifications.unwrap_or_else(|| tech.certifications.clone());
        let updated = self
            .request_membership(&tech, code, certifications, now)
            .await?;
        Ok(UserProfile::from(updated))
    }

    pub async fn list_pending(&self, actor: &Actor) -> MembershipResult<Vec<UserProfile>> {
        let shop = actor.managed_shop()?;
        let users = self
            .users
            .find_technicians(shop, MembershipStatus::Pending)
            .await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    pub async fn approve(
        &self,
        actor: &Actor,
        tech_id: &str,
        now: i64,
    ) -> MembershipResult<UserProfile> {
        let (shop, tech) = self.load_member(actor, tech_id).await?;
        self.decide(&shop, tech, true, None, now).await
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        tech_id: &str,
        reason: Option<String>,
        now: i64,
    ) -> MembershipResult<UserProfile> {
        check_reason(reason.as_deref())?;
        let (shop, tech) = self.load_member(actor, tech_id).await?;
        self.decide(&shop, tech, false, reason, now).await
    }

    pub async fn approve_via_token(
        &self,
        tech_id: &str,
        token: &str,
        now: i64,
    ) -> MembershipResult<UserProfile> {
        let (shop, tech) = self
            .load_by_token(tech_id, CapabilityAction::ApproveMembership, token)
            .await?;
        self.decide(&shop, tech, true, None, now)
            .await
            .map_err(link_outcome)
    }

    pub async fn reject_via_token(
        &self,
        tech_id: &str,
        token: &str,
        reason: Option<String>,
        now: i64,
    ) -> MembershipResult<UserProfile> {
        check_reason(reason.as_deref())?;
        let (shop, tech) = self
            .load_by_token(tech_id, CapabilityAction::RejectMembership, token)
            .await?;
        self.decide(&shop, tech, false, reason, now)
            .await
            .map_err(link_outcome)
    }

    async fn load_by_token(
        &self,
        tech_id: &str,
        action: CapabilityAction,
        token: &str,
    ) -> MembershipResult<(Shop, User)> {
        let id = parse_record_id("user", tech_id).map_err(|_| MembershipError::CapabilityInvalid)?;
        let tech = self
            .users
            .find_by_id(&id)
            .await?
            .ok_or(MembershipError::CapabilityInvalid)?;
        if !capability::verify(&tech.capabilities, &id, action, token) {
            return Err(MembershipError::CapabilityInvalid);
        }
        let shop_id = tech.shop.clone().ok_or(MembershipError::CapabilityInvalid)?;
        let shop = self.load_shop(&shop_id).await?;
        Ok((shop, tech))
    }

    /// Pending → approved / rejected, first writer wins
    async fn decide(
        &self,
        shop: &Shop,
        tech: User,
        approve: bool,
        reason: Option<String>,
        now: i64,
    ) -> MembershipResult<UserProfile> {
        if tech.membership_status != MembershipStatus::Pending {
            return Err(MembershipError::NotPending);
        }
        let tech_id = tech
            .id
            .clone()
            .ok_or_else(|| MembershipError::Internal("Technician record without id".to_string()))?;

        let patch = if approve {
            json!({
                "membership_status": MembershipStatus::Approved,
                "is_active": true,
                "capabilities": [],
                "rejected_reason": null,
                "week_started_at": now,
                "updated_at": now,
            })
        } else {
            json!({
                "membership_status": MembershipStatus::Rejected,
                "is_active": false,
                "capabilities": [],
                "rejected_reason": reason,
                "updated_at": now,
            })
        };

        let updated = self
            .users
            .merge_if_status(&tech_id, MembershipStatus::Pending, patch)
            .await?;

        let decision = if approve { "approved" } else { "rejected" };
        tracing::info!(tech = %tech_id, shop = %shop.name, decision, "Membership decided");

        dispatch(
            self.notifier.as_ref(),
            &NotifyRecipient::from(&updated),
            NotificationKind::MembershipDecisionToTech,
            json!({
                "shop_name": shop.name,
                "decision": decision,
                "reason": updated.rejected_reason,
            }),
        )
        .await;

        Ok(UserProfile::from(updated))
    }

    /// Technician leaves the shop and has to re-apply to rejoin
    pub async fn remove(&self, actor: &Actor, tech_id: &str, now: i64) -> MembershipResult<UserProfile> {
        let (shop, tech) = self.load_member(actor, tech_id).await?;
        let id = tech
            .id
            .clone()
            .ok_or_else(|| MembershipError::Internal("Technician record without id".to_string()))?;

        let updated = self
            .users
            .merge(
                &id,
                json!({
                    "shop": null,
                    "membership_status": MembershipStatus::Pending,
                    "is_active": false,
                    "capabilities": [],
                    "updated_at": now,
                }),
            )
            .await?;

        tracing::info!(tech = %id, shop = %shop.name, "Technician removed from shop");
        Ok(UserProfile::from(updated))
    }
}

fn check_reason(reason: Option<&str>) -> MembershipResult<()> {
    if reason.is_some_and(|r| r.chars().count() > MAX_NOTE_LEN as usize) {
        return Err(MembershipError::Validation(format!(
            "reason must be at most {} characters",
            MAX_NOTE_LEN
        )));
    }
    Ok(())
}

/// On the link path an already-decided request reads as a used link
fn link_outcome(err: MembershipError) -> MembershipError {
    match err {
        MembershipError::NotPending | MembershipError::Repo(RepoError::Conflict(_)) => {
            MembershipError::CapabilityInvalid
        }
        other => other,
    }
}
