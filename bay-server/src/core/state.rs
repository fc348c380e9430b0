use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::analytics::AnalyticsService;
use crate::auth::JwtService;
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::identity::IdentityService;
use crate::incentives::IncentiveService;
use crate::jobs::{JobService, JobSettings};
use crate::membership::MembershipService;
use crate::notify::{LogNotifier, Notifier};

/// 服务器状态 - 持有所有服务的单例引用
///
/// 所有字段都是浅拷贝 (内部为 `Arc` 或数据库句柄)，每个请求 clone 一份。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | notifier | Arc<dyn Notifier> | 通知协作者 |
/// | identity | IdentityService | 注册、登录、资料 |
/// | membership | MembershipService | 店铺与成员审批 |
/// | jobs | JobService | 工单生命周期 |
/// | incentives | IncentiveService | 奖金规则 |
/// | analytics | AnalyticsService | 店铺分析 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    pub notifier: Arc<dyn Notifier>,
    pub identity: IdentityService,
    pub membership: MembershipService,
    pub jobs: JobService,
    pub incentives: IncentiveService,
    pub analytics: AnalyticsService,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("environment", &self.config.environment)
            .field("http_port", &self.config.http_port)
            .field("jwt_service", &self.jwt_service)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 用已打开的数据库组装所有服务
    pub fn new(config: Config, db: Surreal<Db>, notifier: Arc<dyn Notifier>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let incentives = IncentiveService::new(db.clone());
        let membership = MembershipService::new(
            db.clone(),
            notifier.clone(),
            config.public_base_url.clone(),
            config.shop_code_prefix.clone(),
        );
        let identity = IdentityService::new(db.clone(), membership.clone(), jwt_service.clone());
        let jobs = JobService::new(
            db.clone(),
            incentives.clone(),
            notifier.clone(),
            JobSettings {
                public_base_url: config.public_base_url.clone(),
                service_order_offset: i64::try_from(config.service_order_offset)
                    .unwrap_or(i64::MAX),
            },
        );
        let analytics = AnalyticsService::new(db.clone());

        Self {
            config,
            db,
            jwt_service,
            notifier,
            identity,
            membership,
            jobs,
            incentives,
            analytics,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 校验配置 (生产环境必须显式设置 JWT_SECRET)
    /// 2. 数据库 (`memory` 或 RocksDB 目录)
    /// 3. 各服务 (通知使用 [`LogNotifier`])
    pub async fn initialize(config: &Config) -> Result<Self> {
        Self::initialize_with_notifier(config, Arc::new(LogNotifier)).await
    }

    /// 同 [`initialize()`](Self::initialize)，可替换通知器
    pub async fn initialize_with_notifier(
        config: &Config,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        if config.jwt.ephemeral {
            if config.is_production() {
                return Err(ServerError::Config(
                    "JWT_SECRET must be set in production".to_string(),
                ));
            }
            tracing::warn!("Using an ephemeral JWT key, sessions end on restart");
        }

        let db_service = DbService::new(&config.database_path).await?;
        if config.is_in_memory() {
            tracing::warn!("Database is in-memory, data is lost on shutdown");
        }

        Ok(Self::new(config.clone(), db_service.db, notifier))
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
