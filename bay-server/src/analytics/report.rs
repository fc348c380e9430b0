//! Aggregations over completed jobs

use std::collections::{BTreeMap, HashMap};

use rust_decimal::prelude::*;
use serde::Serialize;
use shared::models::{Certification, JobStatus};
use shared::util::millis_to_date_string;

use crate::db::models::{Job, User};
use crate::incentives::{to_decimal, to_f64};
use crate::utils::time::rolling_weeks;

/// 趋势窗口数
pub const TREND_WEEKS: usize = 8;
/// 培训建议的最少样本数
pub const MIN_TRAINING_SAMPLES: usize = 3;
/// 低于此效率才给出培训建议
pub const TRAINING_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderboardEntry {
    pub tech_id: String,
    pub name: String,
    pub jobs_completed: i64,
    pub total_book_time: i64,
    pub total_actual_time: i64,
    pub total_time_saved: i64,
    pub total_incentive: f64,
    pub efficiency_ratio: f64,
    pub weekly_earnings: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Bottleneck {
    pub certification: Certification,
    pub total_jobs: i64,
    pub avg_book_time: i64,
    pub avg_actual_time: i64,
    pub over_time_percentage: f64,
    pub time_loss: i64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrainingSuggestion {
    pub tech_id: String,
    pub name: String,
    pub certification: Certification,
    pub jobs_completed: i64,
    pub avg_efficiency: f64,
    pub priority: SuggestionPriority,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Overview {
    pub active_technicians: i64,
    pub jobs_by_status: BTreeMap<String, i64>,
    pub total_time_saved: i64,
    pub total_incentives_paid: f64,
    pub overall_efficiency: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeeklyTrend {
    pub week_start: String,
    pub week_end: String,
    pub jobs_completed: i64,
    pub efficiency: f64,
    pub incentives_paid: f64,
}

/// book / actual, 2 dp; 实际用时为 0 时视为 1
pub fn efficiency_ratio(book: i64, actual: i64) -> f64 {
    if actual <= 0 {
        return 1.0;
    }
    to_f64(Decimal::from(book) / Decimal::from(actual))
}

fn completed(jobs: &[Job]) -> impl Iterator<Item = &Job> {
    jobs.iter().filter(|j| j.status == JobStatus::Completed)
}

fn actual(job: &Job) -> i64 {
    job.actual_time.unwrap_or_default()
}

fn sum_incentive<'a>(jobs: impl Iterator<Item = &'a Job>) -> f64 {
    to_f64(jobs.map(|j| to_decimal(j.incentive_earned)).sum())
}

fn round_avg(total: i64, count: i64) -> i64 {
    if count == 0 {
        return 0;
    }
    (Decimal::from(total) / Decimal::from(count))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

/// Active technicians ranked by efficiency, best first
pub fn leaderboard(technicians: &[User], jobs: &[Job]) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = technicians
        .iter()
        .filter(|t| t.is_technician() && t.is_active)
        .filter_map(|tech| {
            let id = tech.id.as_ref()?;
            let mine: Vec<&Job> = completed(jobs).filter(|j| j.is_assigned_to(id)).collect();
            let book: i64 = mine.iter().map(|j| j.book_time).sum();
            let act: i64 = mine.iter().map(|j| actual(j)).sum();
            Some(LeaderboardEntry {
                tech_id: id.to_string(),
                name: tech.name.clone(),
                jobs_completed: mine.len() as i64,
                total_book_time: book,
                total_actual_time: act,
                total_time_saved: mine.iter().map(|j| j.time_saved).sum(),
                total_incentive: sum_incentive(mine.iter().copied()),
                efficiency_ratio: efficiency_ratio(book, act),
                weekly_earnings: tech.weekly_earnings,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.efficiency_ratio
            .total_cmp(&a.efficiency_ratio)
            .then_with(|| a.name.cmp(&b.name))
    });
    entries
}

/// Certifications whose jobs run over book time, worst first
pub fn bottlenecks(jobs: &[Job]) -> Vec<Bottleneck> {
    let mut groups: BTreeMap<Certification, Vec<&Job>> = BTreeMap::new();
    for job in completed(jobs) {
        groups.entry(job.required_cert).or_default().push(job);
    }

    let mut result: Vec<Bottleneck> = groups
        .into_iter()
        .map(|(cert, group)| {
            let count = group.len() as i64;
            let book: i64 = group.iter().map(|j| j.book_time).sum();
            let act: i64 = group.iter().map(|j| actual(j)).sum();
            let over = group.iter().filter(|j| actual(j) > j.book_time).count() as i64;
            Bottleneck {
                certification: cert,
                total_jobs: count,
                avg_book_time: round_avg(book, count),
                avg_actual_time: round_avg(act, count),
                over_time_percentage: to_f64(
                    Decimal::from(over) * Decimal::ONE_HUNDRED / Decimal::from(count.max(1)),
                ),
                time_loss: act - book,
            }
        })
        .filter(|b| b.time_loss > 0)
        .collect();

    result.sort_by(|a, b| b.time_loss.cmp(&a.time_loss));
    result
}

/// Technician × certification pairs that would benefit from training
pub fn training_suggestions(technicians: &[User], jobs: &[Job]) -> Vec<TrainingSuggestion> {
    let names: HashMap<String, &str> = technicians
        .iter()
        .map(|t| (t.id_string(), t.name.as_str()))
        .collect();

    let mut groups: BTreeMap<(String, Certification), Vec<f64>> = BTreeMap::new();
    for job in completed(jobs) {
        let Some(tech) = &job.assigned_tech else {
            continue;
        };
        groups
            .entry((tech.to_string(), job.required_cert))
            .or_default()
            .push(efficiency_ratio(job.book_time, actual(job)));
    }

    let mut result: Vec<TrainingSuggestion> = groups
        .into_iter()
        .filter(|(_, samples)| samples.len() >= MIN_TRAINING_SAMPLES)
        .filter_map(|((tech_id, cert), samples)| {
            let name = names.get(&tech_id)?.to_string();
            let total: Decimal = samples.iter().map(|r| to_decimal(*r)).sum();
            let avg = to_f64(total / Decimal::from(samples.len()));
            if avg >= TRAINING_THRESHOLD {
                return None;
            }
            let priority = if avg < 0.7 {
                SuggestionPriority::High
            } else if avg < 0.85 {
                SuggestionPriority::Medium
            } else {
                SuggestionPriority::Low
            };
            Some(TrainingSuggestion {
                tech_id,
                name,
                certification: cert,
                jobs_completed: samples.len() as i64,
                avg_efficiency: avg,
                priority,
            })
        })
        .collect();

    result.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.avg_efficiency.total_cmp(&b.avg_efficiency))
    });
    result
}

/// Shop-wide totals; `jobs` includes every status
pub fn overview(technicians: &[User], jobs: &[Job]) -> Overview {
    let mut jobs_by_status: BTreeMap<String, i64> = [
        JobStatus::Available,
        JobStatus::PendingApproval,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ]
    .iter()
    .map(|s| (s.as_str().to_string(), 0))
    .collect();
    for job in jobs {
        *jobs_by_status.entry(job.status.as_str().to_string()).or_default() += 1;
    }

    let book: i64 = completed(jobs).map(|j| j.book_time).sum();
    let act: i64 = completed(jobs).map(actual).sum();

    Overview {
        active_technicians: technicians
            .iter()
            .filter(|t| t.is_technician() && t.is_active)
            .count() as i64,
        jobs_by_status,
        total_time_saved: completed(jobs).map(|j| j.time_saved).sum(),
        total_incentives_paid: sum_incentive(completed(jobs)),
        overall_efficiency: efficiency_ratio(book, act),
    }
}

/// Last [`TREND_WEEKS`] rolling weeks ending at `now`, oldest first
pub fn weekly_trends(jobs: &[Job], now: i64) -> Vec<WeeklyTrend> {
    rolling_weeks(now, TREND_WEEKS)
        .into_iter()
        .map(|(start, end)| {
            let in_week: Vec<&Job> = completed(jobs)
                .filter(|j| j.completed_at.is_some_and(|t| t >= start && t < end))
                .collect();
            let book: i64 = in_week.iter().map(|j| j.book_time).sum();
            let act: i64 = in_week.iter().map(|j| actual(j)).sum();
            WeeklyTrend {
                week_start: millis_to_date_string(start),
                week_end: millis_to_date_string(end),
                jobs_completed: in_week.len() as i64,
                efficiency: if in_week.is_empty() {
                    0.0
                } else {
                    efficiency_ratio(book, act)
                },
                incentives_paid: sum_incentive(in_week.iter().copied()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::actions::test_support::create_test_job;
    use crate::utils::time::WEEK_MS;
    use shared::models::{MembershipStatus, Role};
    use surrealdb::RecordId;

    fn tech(key: &str, name: &str) -> User {
        let mut user = User::new(
            name.to_string(),
            format!("{key}@example.com"),
            String::new(),
            Role::Technician,
            0,
        );
        user.id = Some(RecordId::from_table_key("user", key));
        user.membership_status = MembershipStatus::Approved;
        user
    }

    fn done(tech: &str, cert: Certification, book: i64, act: i64, bonus: f64) -> Job {
        let mut job = create_test_job(cert, book);
        job.status = JobStatus::Completed;
        job.assigned_tech = Some(RecordId::from_table_key("user", tech));
        job.actual_time = Some(act);
        job.time_saved = (book - act).max(0);
        job.incentive_earned = bonus;
        job.completed_at = Some(1_000);
        job
    }

    #[test]
    fn test_efficiency_ratio() {
        assert_eq!(efficiency_ratio(120, 60), 2.0);
        assert_eq!(efficiency_ratio(100, 300), 0.33);
        assert_eq!(efficiency_ratio(60, 0), 1.0);
    }

    #[test]
    fn test_leaderboard_sorted_by_ratio() {
        let techs = vec![tech("a", "Ana"), tech("b", "Ben")];
        let jobs = vec![
            done("a", Certification::Engine, 60, 60, 0.0),
            done("b", Certification::Engine, 120, 60, 20.0),
            done("b", Certification::Brakes, 60, 60, 0.0),
        ];
        let board = leaderboard(&techs, &jobs);
        assert_eq!(board[0].name, "Ben");
        assert_eq!(board[0].jobs_completed, 2);
        assert_eq!(board[0].efficiency_ratio, 1.5);
        assert_eq!(board[0].total_incentive, 20.0);
        assert_eq!(board[1].efficiency_ratio, 1.0);
    }

    #[test]
    fn test_bottlenecks_only_losing_groups() {
        let jobs = vec![
            done("a", Certification::Ev, 60, 90, 0.0),
            done("a", Certification::Ev, 60, 70, 0.0),
            done("a", Certification::Engine, 60, 30, 10.0),
            done("a", Certification::Hvac, 30, 100, 0.0),
        ];
        let result = bottlenecks(&jobs);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].certification, Certification::Hvac);
        assert_eq!(result[0].time_loss, 70);
        assert_eq!(result[1].certification, Certification::Ev);
        assert_eq!(result[1].avg_actual_time, 80);
        assert_eq!(result[1].over_time_percentage, 100.0);
    }

    #[test]
    fn test_training_suggestions_need_three_samples() {
        let techs = vec![tech("a", "Ana")];
        let mut jobs = vec![
            done("a", Certification::Ev, 60, 120, 0.0),
            done("a", Certification::Ev, 60, 120, 0.0),
        ];
        assert!(training_suggestions(&techs, &jobs).is_empty());

        jobs.push(done("a", Certification::Ev, 60, 120, 0.0));
        let suggestions = training_suggestions(&techs, &jobs);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].avg_efficiency, 0.5);
        assert_eq!(suggestions[0].priority, SuggestionPriority::High);
    }

    #[test]
    fn test_training_priority_bands() {
        let techs = vec![tech("a", "Ana"), tech("b", "Ben")];
        let mut jobs = Vec::new();
        for _ in 0..3 {
            jobs.push(done("a", Certification::Engine, 80, 100, 0.0));
            jobs.push(done("b", Certification::Engine, 88, 100, 0.0));
        }
        let suggestions = training_suggestions(&techs, &jobs);
        assert_eq!(suggestions[0].priority, SuggestionPriority::Medium);
        assert_eq!(suggestions[1].priority, SuggestionPriority::Low);
    }

    #[test]
    fn test_overview_counts_every_status() {
        let techs = vec![tech("a", "Ana")];
        let mut open = create_test_job(Certification::Engine, 60);
        open.status = JobStatus::Available;
        let jobs = vec![open, done("a", Certification::Engine, 120, 60, 20.0)];
        let view = overview(&techs, &jobs);
        assert_eq!(view.active_technicians, 1);
        assert_eq!(view.jobs_by_status["available"], 1);
        assert_eq!(view.jobs_by_status["completed"], 1);
        assert_eq!(view.jobs_by_status["in-progress"], 0);
        assert_eq!(view.total_incentives_paid, 20.0);
        assert_eq!(view.overall_efficiency, 2.0);
    }

    #[test]
    fn test_weekly_trends_buckets() {
        let now = 100 * WEEK_MS;
        let mut recent = done("a", Certification::Engine, 120, 60, 20.0);
        recent.completed_at = Some(now - 1);
        let mut older = done("a", Certification::Engine, 60, 60, 0.0);
        older.completed_at = Some(now - 3 * WEEK_MS + 10);

        let trends = weekly_trends(&[recent, older], now);
        assert_eq!(trends.len(), TREND_WEEKS);
        assert_eq!(trends[7].jobs_completed, 1);
        assert_eq!(trends[7].efficiency, 2.0);
        assert_eq!(trends[7].incentives_paid, 20.0);
        assert_eq!(trends[5].jobs_completed, 1);
        assert_eq!(trends[6].jobs_completed, 0);
        assert_eq!(trends[6].efficiency, 0.0);
    }
}
