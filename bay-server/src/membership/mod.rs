//! Shop membership workflow
//!
//! 技师通过店铺加入码申请加入，经理 (会话或邮件链接) 审批。
//!
//! | 状态 | shop | is_active |
//! |------|------|-----------|
//! | pending | 申请的店铺 | false |
//! | approved | 店铺 | true |
//! | rejected | 申请的店铺 | false |
//! | 已移除 | NONE | false (status 回到 pending) |

pub mod code;
mod error;
mod service;

pub use code::{CODE_ATTEMPTS, generate_shop_code, normalize_code};
pub use error::{MembershipError, MembershipResult};
pub use service::{MembershipService, ShopCodeInfo, ShopCreate, ShopUpdate};
