//! 领域模型
//!
//! 定向规则与流量分配的实体定义、请求类型与命名空间键

pub mod namespace;
pub mod requests;
pub mod rule;

// 重新导出常用类型
pub use namespace::{DEFAULT_NAMESPACE, NamespaceKey};
pub use requests::{
    CreateDistributionRequest, CreateRuleRequest, DeleteDistributionRequest, DeleteRuleRequest,
    ListRulesRequest, OrderRulesRequest, SortOrder, UpdateDistributionRequest, UpdateRuleRequest,
};
pub use rule::{Distribution, Rule};
