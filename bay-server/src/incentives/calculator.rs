//! Bonus calculation
//!
//! 奖金按整单位累计：`units = floor(time_saved / threshold)`，单位数只用整数分钟计算；
//! 金额用 `Decimal` 计算后四舍五入到 2 位小数 (远离零)。

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Bonus computation failures
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BonusError {
    #[error("{field} {value} cannot be represented as currency")]
    Unrepresentable { field: &'static str, value: f64 },

    #[error("Bonus amount overflows")]
    Overflow,
}

/// Exact currency conversion, failing instead of collapsing to zero
fn currency(value: f64, field: &'static str) -> Result<Decimal, BonusError> {
    Decimal::from_f64(value).ok_or(BonusError::Unrepresentable { field, value })
}

/// Result of a bonus computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusBreakdown {
    /// 分钟
    pub time_saved: i64,
    pub units: i64,
    pub bonus: f64,
}

impl BonusBreakdown {
    pub const NONE: BonusBreakdown = BonusBreakdown {
        time_saved: 0,
        units: 0,
        bonus: 0.0,
    };
}

/// Minutes saved against book time (never negative)
pub fn time_saved(book_time: i64, actual_time: i64) -> i64 {
    book_time.saturating_sub(actual_time).max(0)
}

/// Compute the bonus for beating book time
///
/// `actual_time >= book_time` 时没有奖金。非正的 `threshold` 不产生单位。
/// 超出 `Decimal` 范围的费率或乘积返回错误，不会静默变成 0。
pub fn compute_bonus(
    book_time: i64,
    actual_time: i64,
    threshold: i64,
    bonus_per_unit: f64,
    multiplier: f64,
) -> Result<BonusBreakdown, BonusError> {
    if actual_time >= book_time {
        return Ok(BonusBreakdown::NONE);
    }

    let saved = time_saved(book_time, actual_time);
    let units = if threshold > 0 { saved / threshold } else { 0 };

    let rate = currency(bonus_per_unit, "bonus_per_unit")?;
    let multiplier = currency(multiplier, "multiplier")?;
    let bonus = Decimal::from(units)
        .checked_mul(rate)
        .and_then(|amount| amount.checked_mul(multiplier))
        .ok_or(BonusError::Overflow)?;

    Ok(BonusBreakdown {
        time_saved: saved,
        units,
        bonus: to_f64(bonus.max(Decimal::ZERO)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_one_unit_earns_nothing() {
        let b = compute_bonus(120, 100, 30, 10.0, 1.0).unwrap();
        assert_eq!(b.time_saved, 20);
        assert_eq!(b.units, 0);
        assert_eq!(b.bonus, 0.0);
    }

    #[test]
    fn test_two_units() {
        let b = compute_bonus(120, 60, 30, 10.0, 1.0).unwrap();
        assert_eq!(b.units, 2);
        assert_eq!(b.bonus, 20.00);
    }

    #[test]
    fn test_multiplier_applies() {
        let b = compute_bonus(120, 90, 30, 10.0, 2.0).unwrap();
        assert_eq!(b.units, 1);
        assert_eq!(b.bonus, 20.00);
    }

    #[test]
    fn test_floor_not_proportional() {
        // 29 分钟与 1 分钟同样是 0 个单位
        assert_eq!(compute_bonus(60, 31, 30, 10.0, 1.0).unwrap().bonus, 0.0);
        assert_eq!(compute_bonus(60, 59, 30, 10.0, 1.0).unwrap().bonus, 0.0);
        // 59 分钟仍只有 1 个单位
        assert_eq!(compute_bonus(90, 31, 30, 10.0, 1.0).unwrap().units, 1);
    }

    #[test]
    fn test_no_bonus_without_beating_book_time() {
        assert_eq!(compute_bonus(60, 60, 30, 10.0, 1.0).unwrap(), BonusBreakdown::NONE);
        assert_eq!(compute_bonus(60, 90, 30, 10.0, 3.0).unwrap(), BonusBreakdown::NONE);
    }

    #[test]
    fn test_currency_rounding() {
        // 1 unit × 0.333 × 1.5 = 0.4995 → 0.50
        let b = compute_bonus(60, 30, 30, 0.333, 1.5).unwrap();
        assert_eq!(b.bonus, 0.50);
        // 3 units × 10 × 1.1 = 33.00, no binary drift
        let b = compute_bonus(100, 10, 30, 10.0, 1.1).unwrap();
        assert_eq!(b.bonus, 33.00);
    }

    #[test]
    fn test_zero_multiplier_and_bad_threshold() {
        assert_eq!(compute_bonus(120, 60, 30, 10.0, 0.0).unwrap().bonus, 0.0);
        let b = compute_bonus(120, 60, 0, 10.0, 1.0).unwrap();
        assert_eq!(b.units, 0);
        assert_eq!(b.time_saved, 60);
    }

    #[test]
    fn test_huge_book_time_overflows_instead_of_panicking() {
        let err = compute_bonus(9_000_000_000_000_000_000, 0, 1, 1e12, 1.0).unwrap_err();
        assert_eq!(err, BonusError::Overflow);
    }

    #[test]
    fn test_rate_outside_decimal_range_is_rejected() {
        let err = compute_bonus(120, 60, 30, 1e30, 1.0).unwrap_err();
        assert!(matches!(
            err,
            BonusError::Unrepresentable {
                field: "bonus_per_unit",
                ..
            }
        ));
        assert!(compute_bonus(120, 60, 30, 10.0, f64::NAN).is_err());
    }

    #[test]
    fn test_largest_accepted_inputs_stay_in_range() {
        let b = compute_bonus(100_000, 0, 1, 100_000.0, 3.0).unwrap();
        assert_eq!(b.units, 100_000);
        assert_eq!(b.bonus, 30_000_000_000.0);
    }
}
