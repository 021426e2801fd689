//! 功能开关定向规则存储
//!
//! 持久化开关的定向规则（有序列表）与各规则下的变体流量分配，
//! 在并发变更下维护两个核心不变量：
//!
//! - 同一 (命名空间, 开关) 范围内，规则序号恒为密集的 1..N，无空洞无重复
//! - 流量分配引用的 (开关, 规则, 变体) 三元组必须在同一命名空间内相互一致，
//!   违反时整体拒绝，不产生部分写入
//!
//! 本 crate 不做开关求值（把实体分桶到变体），只负责求值器所读数据的
//! 持久化与排序。
//!
//! ## 模块结构
//!
//! - `models`: 领域模型与请求类型
//! - `error`: 错误类型定义
//! - `pagination`: 分页令牌与结果集
//! - `repository`: 数据库仓储层

pub mod error;
pub mod models;
pub mod pagination;
pub mod repository;

pub use error::{Result, StoreError};
pub use models::*;
pub use pagination::{PageToken, ResultSet};
pub use repository::{
    DistributionRepository, DistributionRepositoryTrait, RuleRepository, RuleRepositoryTrait,
};

use sqlx::PgPool;

/// 执行数据库迁移
///
/// 迁移脚本随 crate 编译打包，服务启动时调用一次
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))
}
