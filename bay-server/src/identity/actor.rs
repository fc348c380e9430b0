//! 调用者画像
//!
//! 令牌只声明身份；店铺、资质、成员状态在每次核心调用前从数据库重新读取。

use shared::models::{Certification, MembershipStatus, Role};
use surrealdb::RecordId;

use super::error::{IdentityError, IdentityResult};
use crate::db::models::User;

/// 当前调用者 (权威数据)
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: RecordId,
    pub name: String,
    pub role: Role,
    pub shop: Option<RecordId>,
    pub certifications: Vec<Certification>,
    pub membership_status: MembershipStatus,
    pub is_active: bool,
    pub bonus_multiplier: f64,
}

impl TryFrom<&User> for Actor {
    type Error = IdentityError;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        let id = user
            .id
            .clone()
            .ok_or_else(|| IdentityError::Internal("User record without id".to_string()))?;
        Ok(Self {
            id,
            name: user.name.clone(),
            role: user.role,
            shop: user.shop.clone(),
            certifications: user.certifications.clone(),
            membership_status: user.membership_status,
            is_active: user.is_active,
            bonus_multiplier: user.bonus_multiplier,
        })
    }
}

impl Actor {
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    pub fn is_technician(&self) -> bool {
        self.role == Role::Technician
    }

    pub fn holds(&self, cert: Certification) -> bool {
        self.certifications.contains(&cert)
    }

    /// 经理所属的店铺
    pub fn managed_shop(&self) -> IdentityResult<&RecordId> {
        if !self.is_manager() {
            return Err(IdentityError::ManagerRequired);
        }
        if !self.is_active {
            return Err(IdentityError::AccountDisabled);
        }
        self.shop.as_ref().ok_or(IdentityError::NotShopMember)
    }

    /// 已批准技师所属的店铺
    pub fn member_shop(&self) -> IdentityResult<&RecordId> {
        if !self.is_technician() {
            return Err(IdentityError::TechnicianRequired);
        }
        match (self.membership_status, self.is_active, self.shop.as_ref()) {
            (MembershipStatus::Approved, true, Some(shop)) => Ok(shop),
            (MembershipStatus::Pending, _, Some(_)) => Err(IdentityError::MembershipPending),
            (MembershipStatus::Rejected, _, Some(_)) => Err(IdentityError::MembershipRejected),
            _ => Err(IdentityError::NotShopMember),
        }
    }

    /// 按角色取店铺
    pub fn shop(&self) -> IdentityResult<&RecordId> {
        match self.role {
            Role::Manager => self.managed_shop(),
            Role::Technician => self.member_shop(),
        }
    }
}
