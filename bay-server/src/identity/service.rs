//! IdentityService - 注册、登录、资料与周统计

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::models::{Certification, MembershipStatus, Role};
use shared::util::millis_to_date_string;
use shared::{AppError, AppResult};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use validator::Validate;

use super::actor::Actor;
use super::error::{IdentityError, IdentityResult};
use super::stats::{UserStats, weekly_snapshot};
use crate::auth::{JwtService, hash_password, verify_password};
use crate::db::models::{Shop, User, UserProfile};
use crate::db::repository::{JobRepository, UserRepository, parse_record_id};
use crate::membership::{MembershipService, ShopCreate};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PASSWORD_LEN, MAX_SHORT_TEXT_LEN,
    MAX_URL_LEN, MIN_PASSWORD_LEN, normalize_email,
};

/// 奖金倍数上限
pub const MAX_BONUS_MULTIPLIER: f64 = 3.0;

/// Signup payload
///
/// 经理必须提供 `shop_name`；技师必须提供 `shop_code` 和至少一项认证。
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    pub name: String,
    #[validate(email, length(max = MAX_EMAIL_LEN))]
    pub email: String,
    #[validate(length(min = MIN_PASSWORD_LEN, max = MAX_PASSWORD_LEN))]
    pub password: String,
    pub role: Role,
    #[serde(default)]
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    pub shop_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_ADDRESS_LEN))]
    pub shop_address: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_SHORT_TEXT_LEN))]
    pub shop_phone: Option<String>,
    #[serde(default)]
    pub shop_code: Option<String>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub user: UserProfile,
    /// Pending technicians get no session until approved
    pub token: Option<String>,
    pub shop: Option<Shop>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = MAX_EMAIL_LEN))]
    pub email: String,
    #[validate(length(min = 1, max = MAX_PASSWORD_LEN))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Profile edit payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_URL_LEN))]
    pub avatar: Option<String>,
    #[serde(default)]
    pub certifications: Option<Vec<Certification>>,
}

/// Manager-only technician settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub bonus_multiplier: Option<f64>,
    #[serde(default)]
    pub weekly_bonus_goal: Option<f64>,
}

#[derive(Clone)]
pub struct IdentityService {
    users: UserRepository,
    jobs: JobRepository,
    membership: MembershipService,
    jwt: Arc<JwtService>,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService").finish_non_exhaustive()
    }
}

impl IdentityService {
    pub fn new(db: Surreal<Db>, membership: MembershipService, jwt: Arc<JwtService>) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            jobs: JobRepository::new(db),
            membership,
            jwt,
        }
    }

    async fn find(&self, id: &RecordId) -> IdentityResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))
    }

    async fn find_str(&self, user_id: &str) -> IdentityResult<User> {
        let id = parse_record_id("user", user_id)?;
        self.find(&id).await
    }

    fn issue_token(&self, user: &User) -> IdentityResult<String> {
        let id = user
            .id
            .as_ref()
            .ok_or_else(|| IdentityError::Internal("User record without id".to_string()))?;
        self.jwt
            .generate_token(id, &user.name, user.role)
            .map_err(|e| IdentityError::Internal(e.to_string()))
    }

    /// Authoritative caller profile, re-read on every call
    pub async fn load_actor(&self, id: &RecordId) -> IdentityResult<Actor> {
        let user = self.find(id).await?;
        Actor::try_from(&user)
    }

    /// Self, or the manager of the user's shop
    fn ensure_can_see(actor: &Actor, target: &User) -> IdentityResult<()> {
        if target.id.as_ref() == Some(&actor.id) {
            return Ok(());
        }
        if actor.is_manager()
            && let Ok(shop) = actor.managed_shop()
            && target.shop.as_ref() == Some(shop)
        {
            return Ok(());
        }
        Err(IdentityError::PermissionDenied(
            "Not your profile".to_string(),
        ))
    }

    /// Technician of the manager's shop (any membership status)
    fn ensure_manages(actor: &Actor, target: &User) -> IdentityResult<()> {
        let shop = actor.managed_shop()?;
        if !target.is_technician() || target.shop.as_ref() != Some(shop) {
            return Err(IdentityError::PermissionDenied(
                "Technician is not in your shop".to_string(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Signup / login
    // ========================================================================

    pub async fn signup(&self, payload: SignupRequest, now: i64) -> AppResult<SignupResponse> {
        crate::utils::validation::validate_payload(&payload)?;
        let email = normalize_email(&payload.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::EmailExists(email).into());
        }
        let password_hash =
            hash_password(&payload.password).map_err(|e| AppError::internal(e.to_string()))?;

        match payload.role {
            Role::Manager => self.signup_manager(payload, email, password_hash, now).await,
            Role::Technician => {
                self.signup_technician(payload, email, password_hash, now)
                    .await
            }
        }
    }

    async fn signup_manager(
        &self,
        payload: SignupRequest,
        email: String,
        password_hash: String,
        now: i64,
    ) -> AppResult<SignupResponse> {
        let shop_name = payload
            .shop_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| {
                AppError::validation("shop_name is required for managers")
                    .with_detail("field", "shop_name")
            })?;

        let mut user = User::new(
            payload.name.trim().to_string(),
            email,
            password_hash,
            Role::Manager,
            now,
        );
        user.membership_status = MembershipStatus::Approved;
        let created = self.users.create(user).await.map_err(IdentityError::from)?;
        let user_id = created
            .id
            .clone()
            .ok_or_else(|| AppError::internal("User record without id"))?;

        let shop = match self
            .membership
            .create_shop(
                &created,
                ShopCreate {
                    name: shop_name,
                    address: payload.shop_address.unwrap_or_default(),
                    phone: payload.shop_phone.unwrap_or_default(),
                },
                now,
            )
            .await
        {
            Ok(shop) => shop,
            Err(e) => {
                self.rollback_user(&user_id).await;
                return Err(e.into());
            }
        };

        let shop_id = shop
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Shop record without id"))?;
        let bound = match self
            .users
            .merge(&user_id, json!({ "shop": shop_id.to_string(), "updated_at": now }))
            .await
        {
            Ok(user) => user,
            Err(e) => {
                self.membership.discard_shop(&shop_id).await;
                self.rollback_user(&user_id).await;
                return Err(IdentityError::from(e).into());
            }
        };

        let token = self.issue_token(&bound)?;
        tracing::info!(user = %user_id, shop = %shop.code, "Manager signed up");
        Ok(SignupResponse {
            user: UserProfile::from(&bound),
            token: Some(token),
            shop: Some(shop),
        })
    }

    async fn signup_technician(
        &self,
        payload: SignupRequest,
        email: String,
        password_hash: String,
        now: i64,
    ) -> AppResult<SignupResponse> {
        let code = payload
            .shop_code
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                AppError::validation("shop_code is required for technicians")
                    .with_detail("field", "shop_code")
            })?;
        if payload.certifications.is_empty() {
            return Err(AppError::validation("At least one certification is required")
                .with_detail("field", "certifications"));
        }
        // 先校验加入码，避免留下孤立账号
        self.membership.validate_code(&code).await?;

        let mut user = User::new(
            payload.name.trim().to_string(),
            email,
            password_hash,
            Role::Technician,
            now,
        );
        user.is_active = false;
        user.certifications = payload.certifications.clone();
        let created = self.users.create(user).await.map_err(IdentityError::from)?;
        let user_id = created
            .id
            .clone()
            .ok_or_else(|| AppError::internal("User record without id"))?;

        let pending = match self
            .membership
            .request_membership(&created, &code, payload.certifications, now)
            .await
        {
            Ok(user) => user,
            Err(e) => {
                self.rollback_user(&user_id).await;
                return Err(e.into());
            }
        };

        tracing::info!(user = %user_id, code = %code, "Technician signed up, awaiting approval");
        Ok(SignupResponse {
            user: UserProfile::from(&pending),
            token: None,
            shop: None,
        })
    }

    async fn rollback_user(&self, id: &RecordId) {
        if let Err(e) = self.users.delete(id).await {
            tracing::error!(user = %id, error = %e, "Failed to roll back user after signup error");
        }
    }

    pub async fn login(&self, payload: LoginRequest) -> IdentityResult<LoginResponse> {
        payload
            .validate()
            .map_err(|_| IdentityError::InvalidCredentials)?;
        let email = normalize_email(&payload.email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            crate::security_log!("WARN", "login_failed", email = email.as_str(), reason = "unknown_email");
            return Err(IdentityError::InvalidCredentials);
        };
        if !verify_password(&payload.password, &user.password_hash) {
            crate::security_log!("WARN", "login_failed", email = email.as_str(), reason = "bad_password");
            return Err(IdentityError::InvalidCredentials);
        }

        match user.role {
            Role::Technician if user.shop.is_some() => match user.membership_status {
                MembershipStatus::Pending => return Err(IdentityError::MembershipPending),
                MembershipStatus::Rejected => return Err(IdentityError::MembershipRejected),
                MembershipStatus::Approved => {}
            },
            // 已被移除的技师可以登录，以便重新申请加入
            Role::Technician => {}
            Role::Manager if !user.is_active => return Err(IdentityError::AccountDisabled),
            Role::Manager => {}
        }

        let token = self.issue_token(&user)?;
        tracing::info!(user = %user.id_string(), role = %user.role, "User logged in");
        Ok(LoginResponse {
            token,
            user: UserProfile::from(&user),
        })
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    pub async fn me(&self, id: &RecordId) -> IdentityResult<UserProfile> {
        Ok(UserProfile::from(self.find(id).await?))
    }

    pub async fn get_profile(&self, actor: &Actor, user_id: &str) -> IdentityResult<UserProfile> {
        let user = self.find_str(user_id).await?;
        Self::ensure_can_see(actor, &user)?;
        Ok(UserProfile::from(user))
    }

    /// Self edits name/avatar/certifications; the shop manager edits certifications only
    pub async fn update_profile(
        &self,
        actor: &Actor,
        user_id: &str,
        payload: ProfileUpdate,
        now: i64,
    ) -> IdentityResult<UserProfile> {
        payload
            .validate()
            .map_err(|e| IdentityError::Validation(e.to_string()))?;
        let user = self.find_str(user_id).await?;
        let id = user
            .id
            .clone()
            .ok_or_else(|| IdentityError::Internal("User record without id".to_string()))?;
        let is_self = id == actor.id;

        if !is_self {
            Self::ensure_manages(actor, &user)?;
            if payload.name.is_some() || payload.avatar.is_some() {
                return Err(IdentityError::PermissionDenied(
                    "Managers may only change a technician's certifications".to_string(),
                ));
            }
        }

        let mut patch = serde_json::Map::new();
        if let Some(name) = payload.name {
            if name.trim().is_empty() {
                return Err(IdentityError::Validation("name must not be empty".to_string()));
            }
            patch.insert("name".into(), json!(name.trim()));
        }
        if let Some(avatar) = payload.avatar {
            patch.insert("avatar".into(), json!(avatar));
        }
        if let Some(mut certs) = payload.certifications {
            if !user.is_technician() {
                return Err(IdentityError::Validation(
                    "Only technicians carry certifications".to_string(),
                ));
            }
            certs.sort();
            certs.dedup();
            patch.insert("certifications".into(), json!(certs));
        }
        if patch.is_empty() {
            return Ok(UserProfile::from(user));
        }
        patch.insert("updated_at".into(), json!(now));

        let updated = self.users.merge(&id, patch.into()).await?;
        tracing::info!(user = %id, by = %actor.id, "Profile updated");
        Ok(UserProfile::from(updated))
    }

    pub async fn update_settings(
        &self,
        actor: &Actor,
        user_id: &str,
        payload: SettingsUpdate,
        now: i64,
    ) -> IdentityResult<UserProfile> {
        let user = self.find_str(user_id).await?;
        Self::ensure_manages(actor, &user)?;

        let mut patch = serde_json::Map::new();
        if let Some(multiplier) = payload.bonus_multiplier {
            if !multiplier.is_finite() {
                return Err(IdentityError::Validation(
                    "bonus_multiplier must be a number".to_string(),
                ));
            }
            patch.insert(
                "bonus_multiplier".into(),
                json!(multiplier.clamp(0.0, MAX_BONUS_MULTIPLIER)),
            );
        }
        if let Some(goal) = payload.weekly_bonus_goal {
            if !goal.is_finite() || goal < 0.0 {
                return Err(IdentityError::Validation(
                    "weekly_bonus_goal must be zero or more".to_string(),
                ));
            }
            patch.insert("weekly_bonus_goal".into(), json!(goal));
        }
        if patch.is_empty() {
            return Ok(UserProfile::from(user));
        }
        patch.insert("updated_at".into(), json!(now));

        let id = user
            .id
            .clone()
            .ok_or_else(|| IdentityError::Internal("User record without id".to_string()))?;
        let updated = self.users.merge(&id, patch.into()).await?;
        tracing::info!(
            user = %id,
            multiplier = updated.bonus_multiplier,
            goal = updated.weekly_bonus_goal,
            "Technician settings updated"
        );
        Ok(UserProfile::from(updated))
    }

    /// Archive the current week (if anything was earned) and start a new one
    pub async fn reset_weekly(
        &self,
        actor: &Actor,
        user_id: &str,
        now: i64,
    ) -> IdentityResult<UserProfile> {
        let user = self.find_str(user_id).await?;
        Self::ensure_manages(actor, &user)?;
        let id = user
            .id
            .clone()
            .ok_or_else(|| IdentityError::Internal("User record without id".to_string()))?;

        let snapshot = if user.weekly_earnings > 0.0 {
            let jobs = self
                .jobs
                .find_completed_by_tech_since(&id, user.week_started_at)
                .await?;
            Some(weekly_snapshot(
                &jobs,
                millis_to_date_string(user.week_started_at),
                user.weekly_earnings,
            ))
        } else {
            None
        };

        // 期间有新的完成工单入账时条件写入落败, 返回 InvalidState
        let updated = self
            .users
            .reset_weekly(&id, user.weekly_earnings, snapshot, now)
            .await?;

        tracing::info!(user = %id, archived = user.weekly_earnings, "Weekly earnings reset");
        Ok(UserProfile::from(updated))
    }

    pub async fn stats(&self, actor: &Actor, user_id: &str) -> IdentityResult<UserStats> {
        let user = self.find_str(user_id).await?;
        Self::ensure_can_see(actor, &user)?;
        Ok(UserStats::from(&user))
    }

    /// Approved technicians of the manager's shop
    pub async fn list_technicians(&self, actor: &Actor) -> IdentityResult<Vec<UserProfile>> {
        let shop = actor.managed_shop()?;
        let users = self
            .users
            .find_technicians(shop, MembershipStatus::Approved)
            .await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_rejects_unknown_fields() {
        let json = r#"{"name":"A","email":"a@b.co","password":"secret1","role":"manager","is_admin":true}"#;
        assert!(serde_json::from_str::<SignupRequest>(json).is_err());
    }

    #[test]
    fn test_signup_validation() {
        let json = r#"{"name":"A","email":"not-an-email","password":"secret1","role":"technician"}"#;
        let payload: SignupRequest = serde_json::from_str(json).unwrap();
        assert!(payload.validate().is_err());

        let json = r#"{"name":"A","email":"a@b.co","password":"123","role":"technician"}"#;
        let payload: SignupRequest = serde_json::from_str(json).unwrap();
        assert!(payload.validate().is_err());

        let json = r#"{"name":"A","email":"a@b.co","password":"secret1","role":"technician","shop_code":"TG-1A2B","certifications":["Engine"]}"#;
        let payload: SignupRequest = serde_json::from_str(json).unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_settings_payload_is_strict() {
        assert!(serde_json::from_str::<SettingsUpdate>(r#"{"base_rate":40}"#).is_err());
    }
}
