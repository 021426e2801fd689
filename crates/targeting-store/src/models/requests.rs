//! 存储层请求类型
//!
//! 与上层 API 解耦的入参定义。命名空间键在类型构造时已完成默认值归一化。

use serde::{Deserialize, Serialize};

use super::namespace::NamespaceKey;

/// 排序方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// ORDER BY 方向片段
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// 键集分页的比较运算符：升序取游标之后，降序取游标之前
    pub(crate) fn keyset_op(&self) -> &'static str {
        match self {
            Self::Asc => ">",
            Self::Desc => "<",
        }
    }
}

/// 列出规则请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListRulesRequest {
    pub namespace_key: NamespaceKey,
    pub flag_key: String,
    /// 页大小；小于等于 0 表示不分页
    pub limit: i64,
    /// 原始偏移量；提供分页令牌时被忽略
    pub offset: i64,
    pub page_token: Option<String>,
    pub order: SortOrder,
}

impl ListRulesRequest {
    pub fn new(namespace_key: impl Into<NamespaceKey>, flag_key: impl Into<String>) -> Self {
        Self {
            namespace_key: namespace_key.into(),
            flag_key: flag_key.into(),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}

/// 创建规则请求
///
/// 序号按给定值写入，调用方约定传入 count+1 以保持连续
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRuleRequest {
    pub namespace_key: NamespaceKey,
    pub flag_key: String,
    pub segment_key: String,
    pub rank: i32,
}

/// 更新规则请求
///
/// 仅分群引用可变；序号与归属键在此路径上不可变
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRuleRequest {
    pub id: String,
    pub namespace_key: NamespaceKey,
    pub flag_key: String,
    pub segment_key: String,
}

/// 删除规则请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteRuleRequest {
    pub id: String,
    pub namespace_key: NamespaceKey,
    pub flag_key: String,
}

/// 重排规则请求
///
/// rule_ids 即期望的完整顺序；是否覆盖全量规则由调用方保证
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderRulesRequest {
    pub namespace_key: NamespaceKey,
    pub flag_key: String,
    pub rule_ids: Vec<String>,
}

/// 创建流量分配请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateDistributionRequest {
    pub namespace_key: NamespaceKey,
    pub flag_key: String,
    pub rule_id: String,
    pub variant_id: String,
    pub rollout: f32,
}

/// 更新流量分配请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateDistributionRequest {
    pub id: String,
    pub namespace_key: NamespaceKey,
    pub flag_key: String,
    pub rule_id: String,
    pub variant_id: String,
    pub rollout: f32,
}

/// 删除流量分配请求
///
/// 删除只按 (id, rule_id, variant_id) 匹配，不携带命名空间
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteDistributionRequest {
    pub id: String,
    pub rule_id: String,
    pub variant_id: String,
}
