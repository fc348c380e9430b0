//! Shop analytics
//!
//! 纯聚合: 输入是店铺的工单与技师列表, 不读写数据库。
//! [`AnalyticsService`] 负责加载数据并调用这些函数。

mod report;
mod service;

pub use report::*;
pub use service::{AnalyticsService, Dashboard};
