//! Job lifecycle
//!
//! # 模块结构
//!
//! - [`actions`] - 状态机的每个转换 (纯函数, 可单测)
//! - [`JobService`] - 加锁、加载、条件写入、通知
//! - [`service_order`] - `SO-######` 工单号
//!
//! # 并发
//!
//! 同一工单的"读-检查-写"先经过进程内的每工单互斥锁，再用
//! `update_if_revision` 做条件写入：即使绕过锁，后到的写入者也只会得到
//! `InvalidState`，不会出现双重指派。

pub mod actions;
mod error;
pub mod service;
pub mod service_order;

pub use error::{JobError, JobResult};
pub use service::{CompleteJob, JobService, JobSettings};
pub use service_order::format_service_order;
