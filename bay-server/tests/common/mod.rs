//! 集成测试共用: 内存数据库 + 记录型通知器
#![allow(dead_code)]

use std::sync::Arc;

use bay_server::db::models::{Job, JobCreate, Shop};
use bay_server::identity::{Actor, SignupRequest};
use bay_server::notify::{MemoryNotifier, NotificationKind};
use bay_server::{Config, ServerState};
use shared::models::{Certification, Priority, Role};
use surrealdb::RecordId;

/// 测试时钟起点 (2026-01-05 00:00 UTC)
pub const T0: i64 = 1_767_571_200_000;
pub const MINUTE: i64 = 60_000;

pub struct TestApp {
    pub state: ServerState,
    pub notifier: Arc<MemoryNotifier>,
}

pub async fn setup() -> TestApp {
    let notifier = Arc::new(MemoryNotifier::new());
    let state = ServerState::initialize_with_notifier(&Config::for_tests(), notifier.clone())
        .await
        .expect("in-memory state");
    TestApp { state, notifier }
}

pub fn manager_signup(email: &str, shop_name: &str) -> SignupRequest {
    SignupRequest {
        name: "Morgan".to_string(),
        email: email.to_string(),
        password: "secret123".to_string(),
        role: Role::Manager,
        shop_name: Some(shop_name.to_string()),
        shop_address: None,
        shop_phone: None,
        shop_code: None,
        certifications: Vec::new(),
    }
}

pub fn technician_signup(name: &str, email: &str, code: &str, certs: &[Certification]) -> SignupRequest {
    SignupRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: "secret123".to_string(),
        role: Role::Technician,
        shop_name: None,
        shop_address: None,
        shop_phone: None,
        shop_code: Some(code.to_string()),
        certifications: certs.to_vec(),
    }
}

pub fn record_id(id: &str) -> RecordId {
    id.parse().expect("record id")
}

impl TestApp {
    pub async fn actor(&self, id: &str) -> Actor {
        self.state
            .identity
            .load_actor(&record_id(id))
            .await
            .expect("actor")
    }

    /// 经理注册 (带店铺)
    pub async fn manager(&self, email: &str) -> (Actor, Shop) {
        let response = self
            .state
            .identity
            .signup(manager_signup(email, "Downtown Auto"), T0)
            .await
            .expect("manager signup");
        let shop = response.shop.expect("shop");
        (self.actor(&response.user.id).await, shop)
    }

    /// 技师注册并由经理批准
    pub async fn technician(
        &self,
        manager: &Actor,
        shop: &Shop,
        name: &str,
        certs: &[Certification],
    ) -> Actor {
        let email = format!("{}@example.com", name.to_lowercase());
        let response = self
            .state
            .identity
            .signup(technician_signup(name, &email, &shop.code, certs), T0)
            .await
            .expect("technician signup");
        self.state
            .membership
            .approve(manager, &response.user.id, T0)
            .await
            .expect("approve membership");
        self.actor(&response.user.id).await
    }

    pub async fn job(&self, manager: &Actor, cert: Certification, book_time: i64) -> Job {
        self.state
            .jobs
            .create(
                manager,
                JobCreate {
                    title: "Brake pad replacement".to_string(),
                    description: String::new(),
                    vehicle: Default::default(),
                    required_cert: cert,
                    book_time,
                    priority: Priority::High,
                    notes: String::new(),
                },
                T0,
            )
            .await
            .expect("create job")
    }

    /// 最近一条通知里的令牌 (`...?token=xxx`)
    pub fn last_token(&self, kind: NotificationKind, field: &str) -> String {
        let sent = self.notifier.sent_of(kind);
        let last = sent.last().expect("notification sent");
        let url = last.data[field].as_str().expect("link field");
        url.split("token=").nth(1).expect("token in link").to_string()
    }
}
