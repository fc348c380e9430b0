//! Shop join codes: `{prefix}-XXXX`

use ring::rand::{SecureRandom, SystemRandom};

use super::error::{MembershipError, MembershipResult};

/// 碰撞重试上限
pub const CODE_ATTEMPTS: usize = 10;

/// Fresh random code, 4 upper-case hex chars from 2 random bytes
pub fn generate_shop_code(prefix: &str) -> MembershipResult<String> {
    let mut bytes = [0u8; 2];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| MembershipError::Internal("Random source unavailable".to_string()))?;
    Ok(format!("{}-{}", prefix.to_uppercase(), hex::encode_upper(bytes)))
}

/// Codes are matched case-insensitively against the stored upper-case form
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
