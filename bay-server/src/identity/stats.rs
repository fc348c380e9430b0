//! 技师周统计
//!
//! | 字段 | 计算 |
//! |------|------|
//! | flagged_hours | Σ book_time / 60 |
//! | clocked_hours | Σ actual_time / 60 |
//! | efficiency_ratio | flagged / clocked (clocked 为 0 时为 1) |
//! | progress_to_goal | min(earnings / goal × 100, 100), goal 为 0 时为 0 |

use rust_decimal::prelude::*;
use serde::Serialize;

use crate::db::models::{EfficiencySnapshot, Job, User};
use crate::incentives::{to_decimal, to_f64};

/// 最近几周的快照条数
pub const RECENT_SNAPSHOTS: usize = 10;

/// Dashboard numbers for one technician
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub user_id: String,
    pub weekly_earnings: f64,
    pub weekly_bonus_goal: f64,
    pub progress_to_goal: f64,
    pub total_jobs_completed: i64,
    pub total_time_saved: i64,
    pub bonus_multiplier: f64,
    pub efficiency_history: Vec<EfficiencySnapshot>,
}

impl From<&User> for UserStats {
    fn from(user: &User) -> Self {
        let skip = user
            .efficiency_history
            .len()
            .saturating_sub(RECENT_SNAPSHOTS);
        Self {
            user_id: user.id_string(),
            weekly_earnings: user.weekly_earnings,
            weekly_bonus_goal: user.weekly_bonus_goal,
            progress_to_goal: progress_to_goal(user.weekly_earnings, user.weekly_bonus_goal),
            total_jobs_completed: user.total_jobs_completed,
            total_time_saved: user.total_time_saved,
            bonus_multiplier: user.bonus_multiplier,
            efficiency_history: user.efficiency_history[skip..].to_vec(),
        }
    }
}

/// Percentage of the weekly goal reached, capped at 100
pub fn progress_to_goal(earnings: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    let pct = to_decimal(earnings) / to_decimal(goal) * Decimal::ONE_HUNDRED;
    to_f64(pct.min(Decimal::ONE_HUNDRED).max(Decimal::ZERO))
}

fn minutes_to_hours(minutes: i64) -> Decimal {
    Decimal::from(minutes) / Decimal::from(60)
}

/// Archive entry for the week that started at `week_start`
pub fn weekly_snapshot(jobs: &[Job], week_start_date: String, bonus_earned: f64) -> EfficiencySnapshot {
    let book: i64 = jobs.iter().map(|j| j.book_time).sum();
    let actual: i64 = jobs.iter().filter_map(|j| j.actual_time).sum();

    let ratio = if actual > 0 {
        Decimal::from(book) / Decimal::from(actual)
    } else {
        Decimal::ONE
    };

    EfficiencySnapshot {
        week_start_date,
        flagged_hours: to_f64(minutes_to_hours(book)),
        clocked_hours: to_f64(minutes_to_hours(actual)),
        efficiency_ratio: to_f64(ratio),
        bonus_earned,
    }
}
