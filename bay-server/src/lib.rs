//! Bay Server - 维修车间工位与绩效奖金追踪服务
//!
//! # 架构概述
//!
//! 经理发布带工时定额 (book time) 的维修工单，持证技师申请或被指派，
//! 开工、完工后按节省的工时计算奖金。
//!
//! - **工单** (`jobs`): 状态机 + 按工单串行化的条件写入
//! - **奖金** (`incentives`): 规则匹配与奖金计算
//! - **成员** (`membership`): 店铺加入码与经理审批
//! - **身份** (`identity`): 注册、登录、资料、周统计
//! - **分析** (`analytics`): 排行榜、瓶颈、培训建议、周趋势
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **认证** (`auth`): JWT + Argon2 + 邮件链接能力令牌
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! bay-server/src/
//! ├── core/          # 配置、状态、启动
//! ├── auth/          # JWT 认证、角色中间件、能力令牌
//! ├── api/           # HTTP 路由和处理器
//! ├── identity/      # 用户与调用者画像
//! ├── membership/    # 店铺与成员审批
//! ├── jobs/          # 工单生命周期
//! ├── incentives/    # 奖金规则引擎
//! ├── analytics/     # 店铺分析
//! ├── notify/        # 通知协作者
//! ├── utils/         # 日志、校验、时间
//! └── db/            # 数据库层
//! ```

pub mod analytics;
pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod identity;
pub mod incentives;
pub mod jobs;
pub mod membership;
pub mod notify;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState, build_app};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 按配置初始化日志
pub fn setup_environment(config: &Config) {
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );
}

pub fn print_banner() {
    println!(
        r#"
    ____
   / __ )____ ___  __
  / __  / __ `/ / / /
 / /_/ / /_/ / /_/ /
/_____/\__,_/\__, /
            /____/
    "#
    );
}
