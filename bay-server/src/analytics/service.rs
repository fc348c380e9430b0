use serde::Serialize;
use shared::AppResult;
use shared::models::MembershipStatus;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::report::{
    self, Bottleneck, LeaderboardEntry, Overview, TrainingSuggestion, WeeklyTrend,
};
use crate::db::models::{JobFilter, User};
use crate::db::repository::{JobRepository, UserRepository};
use crate::identity::Actor;

/// Everything the dashboard shows in one response
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub overview: Overview,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub bottlenecks: Vec<Bottleneck>,
    pub training_suggestions: Vec<TrainingSuggestion>,
    pub weekly_trends: Vec<WeeklyTrend>,
}

/// 店铺分析 (仅经理)
#[derive(Clone)]
pub struct AnalyticsService {
    jobs: JobRepository,
    users: UserRepository,
}

impl AnalyticsService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            jobs: JobRepository::new(db.clone()),
            users: UserRepository::new(db),
        }
    }

    async fn technicians(&self, actor: &Actor) -> AppResult<Vec<User>> {
        let shop = actor.managed_shop()?;
        Ok(self
            .users
            .find_technicians(shop, MembershipStatus::Approved)
            .await?)
    }

    pub async fn leaderboard(&self, actor: &Actor) -> AppResult<Vec<LeaderboardEntry>> {
        let techs = self.technicians(actor).await?;
        let jobs = self.jobs.find_completed(actor.managed_shop()?).await?;
        Ok(report::leaderboard(&techs, &jobs))
    }

    pub async fn bottlenecks(&self, actor: &Actor) -> AppResult<Vec<Bottleneck>> {
        let jobs = self.jobs.find_completed(actor.managed_shop()?).await?;
        Ok(report::bottlenecks(&jobs))
    }

    pub async fn training_suggestions(&self, actor: &Actor) -> AppResult<Vec<TrainingSuggestion>> {
        let techs = self.technicians(actor).await?;
        let jobs = self.jobs.find_completed(actor.managed_shop()?).await?;
        Ok(report::training_suggestions(&techs, &jobs))
    }

    pub async fn overview(&self, actor: &Actor) -> AppResult<Overview> {
        let techs = self.technicians(actor).await?;
        let jobs = self
            .jobs
            .find_by_shop(actor.managed_shop()?, &JobFilter::default())
            .await?;
        Ok(report::overview(&techs, &jobs))
    }

    pub async fn weekly_trends(&self, actor: &Actor, now: i64) -> AppResult<Vec<WeeklyTrend>> {
        let jobs = self.jobs.find_completed(actor.managed_shop()?).await?;
        Ok(report::weekly_trends(&jobs, now))
    }

    /// 单次加载, 计算全部报表
    pub async fn dashboard(&self, actor: &Actor, now: i64) -> AppResult<Dashboard> {
        let shop = actor.managed_shop()?;
        let techs = self.technicians(actor).await?;
        let all = self.jobs.find_by_shop(shop, &JobFilter::default()).await?;

        tracing::debug!(shop = %shop, jobs = all.len(), "Building analytics dashboard");

        Ok(Dashboard {
            overview: report::overview(&techs, &all),
            leaderboard: report::leaderboard(&techs, &all),
            bottlenecks: report::bottlenecks(&all),
            training_suggestions: report::training_suggestions(&techs, &all),
            weekly_trends: report::weekly_trends(&all, now),
        })
    }
}
