use crate::auth::JwtConfig;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | DATABASE_PATH | memory | `memory` 使用内存引擎，否则为 RocksDB 目录 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 默认日志级别 (RUST_LOG 优先) |
/// | LOG_JSON | false | JSON 日志 |
/// | LOG_DIR | - | 按天滚动的日志目录 |
/// | PUBLIC_BASE_URL | http://localhost:5000 | 邮件审批链接前缀 |
/// | SERVICE_ORDER_OFFSET | 1000 | 工单号起始偏移 (首个工单 SO-001001) |
/// | SHOP_CODE_PREFIX | TG | 店铺加入码前缀 |
///
/// JWT 相关变量见 [`JwtConfig`]。
///
/// # 示例
///
/// ```ignore
/// DATABASE_PATH=/var/lib/bay/db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 数据库路径
    pub database_path: String,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// 邮件链接的外部访问地址
    pub public_base_url: String,
    /// 工单号偏移量
    pub service_order_offset: u64,
    /// 店铺加入码前缀
    pub shop_code_prefix: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "memory".into()),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok(),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".into()),
            service_order_offset: std::env::var("SERVICE_ORDER_OFFSET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            shop_code_prefix: std::env::var("SHOP_CODE_PREFIX").unwrap_or_else(|_| "TG".into()),
        }
    }

    /// 测试配置: 内存数据库 + 固定 JWT 密钥
    pub fn for_tests() -> Self {
        Self {
            http_port: 0,
            database_path: "memory".into(),
            jwt: JwtConfig::for_tests(),
            environment: "test".into(),
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
            public_base_url: "http://localhost:5000".into(),
            service_order_offset: 1000,
            shop_code_prefix: "TG".into(),
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否使用内存数据库
    pub fn is_in_memory(&self) -> bool {
        self.database_path == "memory"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
