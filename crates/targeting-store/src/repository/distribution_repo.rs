//! 流量分配仓储
//!
//! 写入前做引用一致性校验，确保 (开关, 规则, 变体) 三元组在同一命名空间内相互一致。

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use super::traits::DistributionRepositoryTrait;
use crate::error::{Result, StoreError};
use crate::models::{
    CreateDistributionRequest, DeleteDistributionRequest, Distribution, UpdateDistributionRequest,
};

const DISTRIBUTION_COLUMNS: &str = "id, rule_id, variant_id, rollout, created_at, updated_at";

/// 流量分配仓储
pub struct DistributionRepository {
    pool: PgPool,
}

impl DistributionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建流量分配
    ///
    /// 先做引用校验，校验失败按"未找到"上报并带出完整四元组
    #[instrument(skip(self, req), fields(rule_id = %req.rule_id, variant_id = %req.variant_id))]
    pub async fn create_distribution(&self, req: CreateDistributionRequest) -> Result<Distribution> {
        self.validate_scope(
            req.namespace_key.as_str(),
            &req.flag_key,
            &req.rule_id,
            &req.variant_id,
        )
        .await?;

        let now = Utc::now();
        let distribution = Distribution {
            id: Uuid::new_v4().to_string(),
            rule_id: req.rule_id,
            variant_id: req.variant_id,
            rollout: req.rollout,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO distributions (id, rule_id, variant_id, rollout, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&distribution.id)
        .bind(&distribution.rule_id)
        .bind(&distribution.variant_id)
        .bind(distribution.rollout)
        .bind(distribution.created_at)
        .bind(distribution.updated_at)
        .execute(&self.pool)
        .await?;

        info!("流量分配已创建: {}", distribution.id);
        Ok(distribution)
    }

    /// 更新流量分配权重
    ///
    /// 同样先做引用校验；命中行数不等于 1 视为未找到。
    /// 成功后回查并返回带权威时间戳的行。
    #[instrument(skip(self, req), fields(distribution_id = %req.id))]
    pub async fn update_distribution(&self, req: UpdateDistributionRequest) -> Result<Distribution> {
        self.validate_scope(
            req.namespace_key.as_str(),
            &req.flag_key,
            &req.rule_id,
            &req.variant_id,
        )
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE distributions
            SET rollout = $1, updated_at = $2
            WHERE id = $3 AND rule_id = $4 AND variant_id = $5
            "#,
        )
        .bind(req.rollout)
        .bind(Utc::now())
        .bind(&req.id)
        .bind(&req.rule_id)
        .bind(&req.variant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() != 1 {
            return Err(StoreError::DistributionNotFound { id: req.id });
        }

        let sql = format!(
            "SELECT {DISTRIBUTION_COLUMNS} FROM distributions WHERE id = $1 AND rule_id = $2 AND variant_id = $3"
        );
        let distribution = sqlx::query_as::<_, Distribution>(&sql)
            .bind(&req.id)
            .bind(&req.rule_id)
            .bind(&req.variant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::DistributionNotFound { id: req.id.clone() })?;

        Ok(distribution)
    }

    /// 删除流量分配
    ///
    /// 按 (id, rule_id, variant_id) 匹配删除；零行命中同样视为成功
    #[instrument(skip(self, req), fields(distribution_id = %req.id))]
    pub async fn delete_distribution(&self, req: DeleteDistributionRequest) -> Result<()> {
        sqlx::query("DELETE FROM distributions WHERE id = $1 AND rule_id = $2 AND variant_id = $3")
            .bind(&req.id)
            .bind(&req.rule_id)
            .bind(&req.variant_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// 引用一致性校验
    ///
    /// 单条联表查询确认规则、变体与开关键在目标命名空间内能同时解析。
    /// 外键约束发现不了跨命名空间、跨开关的错配，这里是唯一防线。
    async fn validate_scope(
        &self,
        namespace_key: &str,
        flag_key: &str,
        rule_id: &str,
        variant_id: &str,
    ) -> Result<()> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM rules
            JOIN variants USING (namespace_key)
            JOIN flags USING (namespace_key)
            WHERE namespace_key = $1
              AND rules.id = $2
              AND variants.id = $3
              AND flags."key" = $4
            "#,
        )
        .bind(namespace_key)
        .bind(rule_id)
        .bind(variant_id)
        .bind(flag_key)
        .fetch_one(&self.pool)
        .await?;

        if count < 1 {
            return Err(StoreError::DistributionScopeNotFound {
                variant_id: variant_id.to_string(),
                rule_id: rule_id.to_string(),
                flag_key: flag_key.to_string(),
                namespace_key: namespace_key.to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl DistributionRepositoryTrait for DistributionRepository {
    async fn create_distribution(&self, req: CreateDistributionRequest) -> Result<Distribution> {
        self.create_distribution(req).await
    }

    async fn update_distribution(&self, req: UpdateDistributionRequest) -> Result<Distribution> {
        self.update_distribution(req).await
    }

    async fn delete_distribution(&self, req: DeleteDistributionRequest) -> Result<()> {
        self.delete_distribution(req).await
    }
}
