//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于上层 API 依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    CreateDistributionRequest, CreateRuleRequest, DeleteDistributionRequest, DeleteRuleRequest,
    Distribution, ListRulesRequest, NamespaceKey, OrderRulesRequest, Rule,
    UpdateDistributionRequest, UpdateRuleRequest,
};
use crate::pagination::ResultSet;

/// 定向规则仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleRepositoryTrait: Send + Sync {
    async fn get_rule(&self, namespace_key: &NamespaceKey, id: &str) -> Result<Rule>;
    async fn list_rules(&self, req: ListRulesRequest) -> Result<ResultSet<Rule>>;
    async fn count_rules(&self, namespace_key: &NamespaceKey, flag_key: &str) -> Result<u64>;
    async fn create_rule(&self, req: CreateRuleRequest) -> Result<Rule>;
    async fn update_rule(&self, req: UpdateRuleRequest) -> Result<Rule>;
    async fn delete_rule(&self, req: DeleteRuleRequest) -> Result<()>;
    async fn order_rules(&self, req: OrderRulesRequest) -> Result<()>;
}

/// 流量分配仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DistributionRepositoryTrait: Send + Sync {
    async fn create_distribution(&self, req: CreateDistributionRequest) -> Result<Distribution>;
    async fn update_distribution(&self, req: UpdateDistributionRequest) -> Result<Distribution>;
    async fn delete_distribution(&self, req: DeleteDistributionRequest) -> Result<()>;
}
