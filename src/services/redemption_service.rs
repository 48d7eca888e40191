use crate::entities::{
    CampaignKind, RedemptionStatus, reward_redemption_entity as redemptions,
};
use crate::error::{AppError, AppResult};
use crate::models::{PaginatedResponse, PaginationParams, RedemptionQuery, RedemptionResponse};
use crate::services::{CampaignService, LoyaltyService};
use crate::utils::{decode_redemption_proof, encode_redemption_proof, generate_proof_nonce};
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, UpdateResult,
};
use std::sync::Arc;

/// 所有校验失败共用一条文案，不向外泄露具体是哪一步不通过
const INVALID_PROOF: &str = "Invalid or expired redemption proof";

/// 兑换状态机：pending → approved / expired，两个终态。
///
/// 创建即扣分（与兑换行同一事务），凭证 30 天有效；核销走守护更新，
/// 过期在验证时惰性处理并退还积分。
#[derive(Clone)]
pub struct RedemptionService {
    pool: Arc<DatabaseConnection>,
    loyalty_service: LoyaltyService,
    campaign_service: CampaignService,
    redemption_valid_days: i64,
}

impl RedemptionService {
    pub fn new(
        pool: Arc<DatabaseConnection>,
        loyalty_service: LoyaltyService,
        campaign_service: CampaignService,
        redemption_valid_days: i64,
    ) -> Self {
        Self {
            pool,
            loyalty_service,
            campaign_service,
            redemption_valid_days,
        }
    }

    /// 发起兑换：锁定奖励活动 → 扣分 → 铸造 pending 兑换行与一次性凭证。
    /// 扣分与兑换行在同一事务里同生共死，不足额时什么都不会留下。
    pub async fn redeem(
        &self,
        customer_id: i64,
        campaign_id: i64,
    ) -> AppResult<RedemptionResponse> {
        let txn = self.pool.begin().await?;

        let campaign = self
            .campaign_service
            .get_active_campaign(&txn, campaign_id)
            .await?;
        let points_cost = match campaign.kind() {
            Some(CampaignKind::LoyaltyReward { points_cost }) => points_cost,
            // 非奖励类活动不可兑换，按不存在上报
            _ => return Err(AppError::NotFound("Reward campaign not found".to_string())),
        };

        let now = Utc::now();
        let redemption = redemptions::ActiveModel {
            customer_id: Set(customer_id),
            business_id: Set(campaign.owner_business_id),
            campaign_id: Set(campaign.id),
            points_spent: Set(points_cost),
            status: Set(RedemptionStatus::Pending),
            // 先占位，行号确定后替换为正式凭证
            qr_proof: Set(generate_proof_nonce()),
            expires_at: Set(now + Duration::days(self.redemption_valid_days)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        self.loyalty_service
            .debit(
                &txn,
                customer_id,
                campaign.owner_business_id,
                points_cost,
                format!("Redeem reward campaign '{}'", campaign.name),
                &format!("redemption:{}", redemption.id),
            )
            .await?;

        let token = encode_redemption_proof(
            redemption.id,
            customer_id,
            campaign.owner_business_id,
            now.timestamp_millis(),
        )?;
        let mut active = redemption.into_active_model();
        active.qr_proof = Set(token);
        let redemption = active.update(&txn).await?;

        txn.commit().await?;

        log::info!(
            "Customer {customer_id} redeemed campaign {campaign_id} for {points_cost} points"
        );
        Ok(redemption.into())
    }

    /// 验证核销凭证（只读）。解码、与库中凭证比对、检查 pending 与有效期；
    /// 任何一步不通过都折叠成同一个 Invalid。
    /// 过期且仍 pending 的兑换在此处惰性置为 expired 并退还积分。
    pub async fn verify_proof(&self, token: &str) -> AppResult<RedemptionResponse> {
        let proof = decode_redemption_proof(token)
            .map_err(|_| AppError::ValidationError(INVALID_PROOF.to_string()))?;

        let redemption = redemptions::Entity::find_by_id(proof.redemption_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::ValidationError(INVALID_PROOF.to_string()))?;

        // 库中凭证必须与出示的令牌逐字一致，拼凑 ID + 时间戳无法通过
        if redemption.qr_proof != token || redemption.customer_id != proof.customer_id {
            return Err(AppError::ValidationError(INVALID_PROOF.to_string()));
        }

        let now = Utc::now();
        if redemption.is_expired_at(now) {
            if redemption.status == RedemptionStatus::Pending {
                self.expire_and_refund(&redemption).await?;
            }
            return Err(AppError::ValidationError(INVALID_PROOF.to_string()));
        }
        if redemption.status != RedemptionStatus::Pending {
            return Err(AppError::ValidationError(INVALID_PROOF.to_string()));
        }

        Ok(redemption.into())
    }

    /// 核销：pending → approved 的守护更新，WHERE 里重申未过期；
    /// 零行命中后诊断读区分不存在 / 已处理 / 已过期
    pub async fn complete(&self, redemption_id: i64) -> AppResult<RedemptionResponse> {
        let now = Utc::now();
        let result: UpdateResult = redemptions::Entity::update_many()
            .col_expr(
                redemptions::Column::Status,
                Expr::value(RedemptionStatus::Approved),
            )
            .col_expr(redemptions::Column::RedeemedAt, Expr::value(now))
            .filter(redemptions::Column::Id.eq(redemption_id))
            .filter(redemptions::Column::Status.eq(RedemptionStatus::Pending))
            .filter(redemptions::Column::ExpiresAt.gt(now))
            .exec(self.pool.as_ref())
            .await?;

        if result.rows_affected == 0 {
            let err = match redemptions::Entity::find_by_id(redemption_id)
                .one(self.pool.as_ref())
                .await?
            {
                None => AppError::NotFound("Redemption not found".to_string()),
                Some(r) if r.status != RedemptionStatus::Pending => AppError::AlreadyProcessed(
                    format!("Redemption {redemption_id} already processed"),
                ),
                Some(_) => {
                    AppError::AlreadyProcessed(format!("Redemption {redemption_id} has expired"))
                }
            };
            return Err(err);
        }

        let redemption = redemptions::Entity::find_by_id(redemption_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::InternalError("Redemption row vanished after update".to_string())
            })?;
        Ok(redemption.into())
    }

    pub async fn list_redemptions(
        &self,
        query: &RedemptionQuery,
    ) -> AppResult<PaginatedResponse<RedemptionResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let base = redemptions::Entity::find()
            .filter(redemptions::Column::CustomerId.eq(query.customer_id));
        let total = base.clone().count(self.pool.as_ref()).await? as i64;
        let items = base
            .order_by(redemptions::Column::CreatedAt, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(self.pool.as_ref())
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(20),
            total,
        ))
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    /// 惰性过期：pending → expired 的守护更新，只有赢家执行退款，
    /// 竞争与重试都不会退两次
    async fn expire_and_refund(&self, redemption: &redemptions::Model) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        let result: UpdateResult = redemptions::Entity::update_many()
            .col_expr(
                redemptions::Column::Status,
                Expr::value(RedemptionStatus::Expired),
            )
            .filter(redemptions::Column::Id.eq(redemption.id))
            .filter(redemptions::Column::Status.eq(RedemptionStatus::Pending))
            .exec(&txn)
            .await?;

        if result.rows_affected == 1 {
            self.loyalty_service
                .refund(
                    &txn,
                    redemption.customer_id,
                    redemption.business_id,
                    redemption.points_spent,
                    format!("Refund for expired redemption {}", redemption.id),
                    &format!("redemption:{}:expired", redemption.id),
                )
                .await?;
            log::info!(
                "Redemption {} expired unused, {} points refunded",
                redemption.id,
                redemption.points_spent
            );
        }

        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: DatabaseConnection) -> RedemptionService {
        let db = Arc::new(db);
        RedemptionService::new(
            db.clone(),
            LoyaltyService::new(db.clone()),
            CampaignService::new(db),
            30,
        )
    }

    fn redemption_row(
        status: RedemptionStatus,
        qr_proof: String,
        expires_in_days: i64,
    ) -> redemptions::Model {
        let now = Utc::now();
        redemptions::Model {
            id: 9,
            customer_id: 1001,
            business_id: 3,
            campaign_id: 4,
            points_spent: 80,
            status,
            qr_proof,
            created_at: Some(now - Duration::days(1)),
            redeemed_at: None,
            expires_at: now + Duration::days(expires_in_days),
        }
    }

    fn valid_token() -> String {
        encode_redemption_proof(9, 1001, 3, 1_700_000_000_000).unwrap()
    }

    #[tokio::test]
    async fn test_verify_proof_happy_path() {
        let token = valid_token();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![redemption_row(
                RedemptionStatus::Pending,
                token.clone(),
                29,
            )]])
            .into_connection();

        let redemption = service(db).verify_proof(&token).await.unwrap();
        assert_eq!(redemption.id, 9);
        assert_eq!(redemption.status, RedemptionStatus::Pending);
    }

    #[tokio::test]
    async fn test_verify_proof_rejects_mismatched_token() {
        // 解码合法但与库中凭证不一致（伪造的 ID + 时间戳）
        let presented = valid_token();
        let stored = encode_redemption_proof(9, 1001, 3, 1_700_000_000_999).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![redemption_row(RedemptionStatus::Pending, stored, 29)]])
            .into_connection();

        let err = service(db).verify_proof(&presented).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_verify_proof_expired_regardless_of_status() {
        // 已核销且过期：不退款，直接 Invalid
        let token = valid_token();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![redemption_row(
                RedemptionStatus::Approved,
                token.clone(),
                -1,
            )]])
            .into_connection();

        let err = service(db).verify_proof(&token).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_verify_proof_expired_pending_still_invalid() {
        // 过期但仍 pending：惰性过期（此处守护更新被并发方抢先，退款跳过），
        // 对外仍然统一报 Invalid
        let token = valid_token();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![redemption_row(
                RedemptionStatus::Pending,
                token.clone(),
                -1,
            )]])
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = service(db).verify_proof(&token).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_complete_already_processed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results(vec![vec![redemption_row(
                RedemptionStatus::Approved,
                "proof".to_string(),
                10,
            )]])
            .into_connection();

        let err = service(db).complete(9).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyProcessed(_)));
    }

    #[tokio::test]
    async fn test_complete_unknown_redemption() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results(vec![Vec::<redemptions::Model>::new()])
            .into_connection();

        let err = service(db).complete(9).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
