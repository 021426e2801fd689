//! 定向规则存储错误类型
//!
//! 区分"未找到"类业务错误与底层存储错误，后者原样向上传播。

use thiserror::Error;

/// 定向规则存储错误类型
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("规则不存在: {namespace_key}/{id}")]
    RuleNotFound { namespace_key: String, id: String },

    #[error("流量分配不存在: {id}")]
    DistributionNotFound { id: String },

    #[error(
        "流量分配引用无效: variant={variant_id}, rule={rule_id}, flag={flag_key}, namespace={namespace_key}"
    )]
    DistributionScopeNotFound {
        variant_id: String,
        rule_id: String,
        flag_key: String,
        namespace_key: String,
    },

    #[error("无效的分页令牌: {0}")]
    InvalidPageToken(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 存储层 Result 类型别名
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RuleNotFound { .. } => "RULE_NOT_FOUND",
            Self::DistributionNotFound { .. } => "DISTRIBUTION_NOT_FOUND",
            Self::DistributionScopeNotFound { .. } => "DISTRIBUTION_SCOPE_NOT_FOUND",
            Self::InvalidPageToken(_) => "INVALID_PAGE_TOKEN",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// 是否为"未找到"类错误
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RuleNotFound { .. }
                | Self::DistributionNotFound { .. }
                | Self::DistributionScopeNotFound { .. }
        )
    }

    /// 是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}
