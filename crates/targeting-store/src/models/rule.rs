//! 定向规则与流量分配实体定义
//!
//! 规则按序号在开关内排序，序号恒为密集的 1..N；
//! 规则独占其流量分配，删除规则时级联删除。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::namespace::NamespaceKey;

/// 定向规则
///
/// 将一个分群绑定到开关的求值顺序中，序号越小越先求值
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub namespace_key: NamespaceKey,
    /// 所属开关键
    pub flag_key: String,
    /// 引用的分群键
    pub segment_key: String,
    /// 求值顺序序号（1 起始）
    pub rank: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 命中该规则后的流量分配，按创建时间升序
    #[sqlx(skip)]
    #[serde(default)]
    pub distributions: Vec<Distribution>,
}

/// 流量分配
///
/// 把命中规则的流量按权重分给某个变体
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub id: String,
    pub rule_id: String,
    pub variant_id: String,
    /// 灰度权重（百分比）
    pub rollout: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rule() -> Rule {
        Rule {
            id: "rule-001".to_string(),
            namespace_key: NamespaceKey::default(),
            flag_key: "checkout-v2".to_string(),
            segment_key: "beta-users".to_string(),
            rank: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            distributions: Vec::new(),
        }
    }

    #[test]
    fn test_rule_serializes_camel_case() {
        let json = serde_json::to_value(sample_rule()).unwrap();
        assert_eq!(json["namespaceKey"], "default");
        assert_eq!(json["flagKey"], "checkout-v2");
        assert_eq!(json["segmentKey"], "beta-users");
        assert!(json["distributions"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_distribution_serializes_camel_case() {
        let distribution = Distribution {
            id: "dist-001".to_string(),
            rule_id: "rule-001".to_string(),
            variant_id: "variant-001".to_string(),
            rollout: 50.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&distribution).unwrap();
        assert_eq!(json["ruleId"], "rule-001");
        assert_eq!(json["variantId"], "variant-001");
        assert_eq!(json["rollout"], 50.0);
    }
}
