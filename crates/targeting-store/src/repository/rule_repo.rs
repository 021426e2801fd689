//! 定向规则仓储
//!
//! 规则的增删改查、分页列表，以及保持序号密集的删除/重排编排。
//! 删除与重排在单事务内完成行变更与序号压实，失败整体回滚。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::traits::RuleRepositoryTrait;
use crate::error::{Result, StoreError};
use crate::models::{
    CreateRuleRequest, DeleteRuleRequest, Distribution, ListRulesRequest, NamespaceKey,
    OrderRulesRequest, Rule, UpdateRuleRequest,
};
use crate::pagination::{PageToken, ResultSet};

// rank 与保留字风格冲突，SQL 中统一加引号
const RULE_COLUMNS: &str =
    r#"id, namespace_key, flag_key, segment_key, "rank", created_at, updated_at"#;

const DISTRIBUTION_COLUMNS: &str = "id, rule_id, variant_id, rollout, created_at, updated_at";

/// 定向规则仓储
///
/// 规则列表的结构性变更（删除、重排）由本仓储编排，保证序号不变量
pub struct RuleRepository {
    pool: PgPool,
}

impl RuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 获取单条规则及其流量分配
    pub async fn get_rule(&self, namespace_key: &NamespaceKey, id: &str) -> Result<Rule> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM rules WHERE id = $1 AND namespace_key = $2");

        let mut rule = sqlx::query_as::<_, Rule>(&sql)
            .bind(id)
            .bind(namespace_key.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::RuleNotFound {
                namespace_key: namespace_key.to_string(),
                id: id.to_string(),
            })?;

        let sql = format!(
            "SELECT {DISTRIBUTION_COLUMNS} FROM distributions WHERE rule_id = $1 ORDER BY created_at ASC"
        );
        rule.distributions = sqlx::query_as::<_, Distribution>(&sql)
            .bind(&rule.id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rule)
    }

    /// 按序号列出某开关下的规则，支持键集分页
    ///
    /// 多取一行用于探测下一页；分页令牌优先于原始偏移量。
    /// 整页的流量分配用一次批量查询装配，避免逐条查询。
    pub async fn list_rules(&self, req: ListRulesRequest) -> Result<ResultSet<Rule>> {
        let mut sql =
            format!("SELECT {RULE_COLUMNS} FROM rules WHERE namespace_key = $1 AND flag_key = $2");

        // 键集游标：令牌记录上一页最后一行的序号
        let last_rank = match &req.page_token {
            Some(token) => Some(PageToken::decode(token)?.rank),
            None => None,
        };

        if last_rank.is_some() {
            sql.push_str(&format!(r#" AND "rank" {} $3"#, req.order.keyset_op()));
        }

        sql.push_str(&format!(r#" ORDER BY "rank" {}"#, req.order.as_sql()));

        if req.limit > 0 {
            sql.push_str(&format!(" LIMIT {}", req.limit + 1));
        }

        if last_rank.is_none() && req.offset > 0 {
            sql.push_str(&format!(" OFFSET {}", req.offset));
        }

        let mut query = sqlx::query_as::<_, Rule>(&sql)
            .bind(req.namespace_key.as_str())
            .bind(&req.flag_key);
        if let Some(rank) = last_rank {
            query = query.bind(rank);
        }

        let mut rules = query.fetch_all(&self.pool).await?;

        let mut next_page_token = None;
        if req.limit > 0 && rules.len() > req.limit as usize {
            rules.truncate(req.limit as usize);
            if let Some(last) = rules.last() {
                next_page_token = Some(PageToken { rank: last.rank }.encode()?);
            }
        }

        self.attach_distributions(&mut rules).await?;

        Ok(ResultSet {
            results: rules,
            next_page_token,
        })
    }

    /// 统计某开关下的规则数
    pub async fn count_rules(&self, namespace_key: &NamespaceKey, flag_key: &str) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM rules WHERE namespace_key = $1 AND flag_key = $2")
                .bind(namespace_key.as_str())
                .bind(flag_key)
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }

    /// 创建规则
    ///
    /// 序号按调用方给定值写入，不做压实；调用方约定传入 count+1 保持连续
    #[instrument(skip(self, req), fields(namespace_key = %req.namespace_key, flag_key = %req.flag_key))]
    pub async fn create_rule(&self, req: CreateRuleRequest) -> Result<Rule> {
        let now = Utc::now();
        let rule = Rule {
            id: Uuid::new_v4().to_string(),
            namespace_key: req.namespace_key,
            flag_key: req.flag_key,
            segment_key: req.segment_key,
            rank: req.rank,
            created_at: now,
            updated_at: now,
            distributions: Vec::new(),
        };

        sqlx::query(
            r#"
            INSERT INTO rules (id, namespace_key, flag_key, segment_key, "rank", created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&rule.id)
        .bind(rule.namespace_key.as_str())
        .bind(&rule.flag_key)
        .bind(&rule.segment_key)
        .bind(rule.rank)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&self.pool)
        .await?;

        info!("规则已创建: {}", rule.id);
        Ok(rule)
    }

    /// 更新规则
    ///
    /// 仅变更分群引用与更新时间；命中行数不等于 1 视为未找到
    /// （覆盖行不存在与命名空间/开关不匹配两种情况）
    #[instrument(skip(self, req), fields(rule_id = %req.id))]
    pub async fn update_rule(&self, req: UpdateRuleRequest) -> Result<Rule> {
        let result = sqlx::query(
            r#"
            UPDATE rules
            SET segment_key = $1, updated_at = $2
            WHERE id = $3 AND namespace_key = $4 AND flag_key = $5
            "#,
        )
        .bind(&req.segment_key)
        .bind(Utc::now())
        .bind(&req.id)
        .bind(req.namespace_key.as_str())
        .bind(&req.flag_key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() != 1 {
            return Err(StoreError::RuleNotFound {
                namespace_key: req.namespace_key.to_string(),
                id: req.id,
            });
        }

        self.get_rule(&req.namespace_key, &req.id).await
    }

    /// 删除规则
    ///
    /// 行删除与剩余规则的序号压实在同一事务内完成，任一步失败整体回滚
    #[instrument(skip(self, req), fields(rule_id = %req.id))]
    pub async fn delete_rule(&self, req: DeleteRuleRequest) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        match Self::delete_and_compact(&mut tx, &req).await {
            Ok(()) => {
                tx.commit().await?;
                info!("规则已删除: {}", req.id);
                Ok(())
            }
            Err(err) => {
                // 回滚失败只记录日志，保留原始错误向上传播
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "事务回滚失败");
                }
                Err(err)
            }
        }
    }

    /// 按调用方给定的完整顺序重排规则
    ///
    /// rule_ids 是否覆盖该开关的全量规则由调用方保证，这里不做校验
    #[instrument(skip(self, req), fields(namespace_key = %req.namespace_key, flag_key = %req.flag_key))]
    pub async fn order_rules(&self, req: OrderRulesRequest) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        match Self::compact_ranks(&mut tx, &req.namespace_key, &req.flag_key, &req.rule_ids).await {
            Ok(()) => {
                tx.commit().await?;
                info!("规则已重排: {} 条", req.rule_ids.len());
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "事务回滚失败");
                }
                Err(err)
            }
        }
    }

    async fn delete_and_compact(
        tx: &mut Transaction<'_, Postgres>,
        req: &DeleteRuleRequest,
    ) -> Result<()> {
        sqlx::query("DELETE FROM rules WHERE id = $1 AND namespace_key = $2 AND flag_key = $3")
            .bind(&req.id)
            .bind(req.namespace_key.as_str())
            .bind(&req.flag_key)
            .execute(&mut **tx)
            .await?;

        // 重读剩余规则，按当前序号升序压实，保持原相对顺序
        let remaining: Vec<String> = sqlx::query_scalar(
            r#"SELECT id FROM rules WHERE namespace_key = $1 AND flag_key = $2 ORDER BY "rank" ASC"#,
        )
        .bind(req.namespace_key.as_str())
        .bind(&req.flag_key)
        .fetch_all(&mut **tx)
        .await?;

        Self::compact_ranks(tx, &req.namespace_key, &req.flag_key, &remaining).await
    }

    /// 序号压实
    ///
    /// 按列表位置把序号重写为 1..N。单条批量语句完成全部赋值，
    /// 共享同一 updated_at，一次压实在时间戳上表现为原子操作。
    async fn compact_ranks(
        tx: &mut Transaction<'_, Postgres>,
        namespace_key: &NamespaceKey,
        flag_key: &str,
        rule_ids: &[String],
    ) -> Result<()> {
        let ranks: Vec<i32> = (1..=rule_ids.len() as i32).collect();
        let updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE rules
            SET "rank" = ord.new_rank, updated_at = $1
            FROM UNNEST($2::text[], $3::int[]) AS ord(id, new_rank)
            WHERE rules.id = ord.id AND rules.namespace_key = $4 AND rules.flag_key = $5
            "#,
        )
        .bind(updated_at)
        .bind(rule_ids)
        .bind(&ranks)
        .bind(namespace_key.as_str())
        .bind(flag_key)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// 为整页规则批量装配流量分配
    async fn attach_distributions(&self, rules: &mut [Rule]) -> Result<()> {
        if rules.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = rules.iter().map(|r| r.id.clone()).collect();

        let sql = format!(
            "SELECT {DISTRIBUTION_COLUMNS} FROM distributions WHERE rule_id = ANY($1) ORDER BY created_at ASC"
        );
        let distributions = sqlx::query_as::<_, Distribution>(&sql)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_rule: HashMap<String, Vec<Distribution>> = HashMap::new();
        for distribution in distributions {
            by_rule
                .entry(distribution.rule_id.clone())
                .or_default()
                .push(distribution);
        }

        for rule in rules.iter_mut() {
            if let Some(list) = by_rule.remove(&rule.id) {
                rule.distributions = list;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl RuleRepositoryTrait for RuleRepository {
    async fn get_rule(&self, namespace_key: &NamespaceKey, id: &str) -> Result<Rule> {
        self.get_rule(namespace_key, id).await
    }

    async fn list_rules(&self, req: ListRulesRequest) -> Result<ResultSet<Rule>> {
        self.list_rules(req).await
    }

    async fn count_rules(&self, namespace_key: &NamespaceKey, flag_key: &str) -> Result<u64> {
        self.count_rules(namespace_key, flag_key).await
    }

    async fn create_rule(&self, req: CreateRuleRequest) -> Result<Rule> {
        self.create_rule(req).await
    }

    async fn update_rule(&self, req: UpdateRuleRequest) -> Result<Rule> {
        self.update_rule(req).await
    }

    async fn delete_rule(&self, req: DeleteRuleRequest) -> Result<()> {
        self.delete_rule(req).await
    }

    async fn order_rules(&self, req: OrderRulesRequest) -> Result<()> {
        self.order_rules(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_repository_creation() {
        // connect_lazy 不建立实际连接，仅验证构造
        let pool = PgPool::connect_lazy("postgres://flag@localhost:5432/flag_db").unwrap();
        let _ = RuleRepository::new(pool);
    }
}
