use crate::error::{AppError, AppResult};
use crate::models::{RedemptionResponse, VerifyVisitResponse, VisitResponse};
use crate::services::{CampaignService, LoyaltyService, RedemptionService, VisitService};
use crate::utils::decode_visit_proof;
use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::sync::Arc;

/// 台账引擎编排层：把活动目录、到访状态机、积分账本、兑换状态机
/// 组合成对外的两个工作流：核验/核准到访，兑换/核销奖励。
///
/// 多实体工作流在单个数据库事务内执行：任何一步失败整体回滚，
/// 不会出现到访已核准而积分未入账的中间态。
#[derive(Clone)]
pub struct LedgerService {
    pool: Arc<DatabaseConnection>,
    campaign_service: CampaignService,
    visit_service: VisitService,
    loyalty_service: LoyaltyService,
    redemption_service: RedemptionService,
    points_per_visit: i64,
}

impl LedgerService {
    pub fn new(
        pool: Arc<DatabaseConnection>,
        campaign_service: CampaignService,
        visit_service: VisitService,
        loyalty_service: LoyaltyService,
        redemption_service: RedemptionService,
        points_per_visit: i64,
    ) -> Self {
        Self {
            pool,
            campaign_service,
            visit_service,
            loyalty_service,
            redemption_service,
            points_per_visit,
        }
    }

    /// 扫码核验：解码到访凭证 → 活动必须 active 且归属本商家 →
    /// 推荐绑定合理性检查 → 落一条 pending 到访。
    /// 凭证本身不带签名，真实性就在这串检查里建立。
    pub async fn verify_visit(
        &self,
        qr_token: &str,
        business_id: i64,
    ) -> AppResult<VerifyVisitResponse> {
        let proof = decode_visit_proof(qr_token)?;

        let campaign = self
            .campaign_service
            .get_active_campaign(self.pool.as_ref(), proof.campaign_id)
            .await?;
        if campaign.owner_business_id != business_id {
            return Err(AppError::Forbidden(
                "Campaign is not owned by this business".to_string(),
            ));
        }
        // 奖励类活动没有到访凭证，出现即为拼造
        if campaign.credits_per_action().is_none() {
            return Err(AppError::ValidationError(
                "Campaign does not accept visit proofs".to_string(),
            ));
        }

        // 凭证声称的 (活动, 推广方) 绑定必须真实存在且可用
        let binding = self
            .campaign_service
            .find_binding(self.pool.as_ref(), campaign.id, proof.influencer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "No referral binding for this campaign and influencer".to_string(),
                )
            })?;
        if !binding.is_usable_at(Utc::now()) {
            return Err(AppError::NotFound(
                "Referral binding is no longer usable".to_string(),
            ));
        }
        if !binding.has_capacity() {
            return Err(AppError::LimitExceeded(
                "Referral code usage limit reached".to_string(),
            ));
        }

        let visit = self
            .visit_service
            .create_pending_visit(
                self.pool.as_ref(),
                &campaign,
                proof.influencer_id,
                proof.customer_id,
                Some(binding.id),
            )
            .await?;

        log::info!(
            "Visit {} created for campaign {} (influencer {}, customer {})",
            visit.id,
            campaign.id,
            proof.influencer_id,
            proof.customer_id
        );

        Ok(VerifyVisitResponse {
            visit: visit.into(),
            message: "Visit verified and awaiting business approval".to_string(),
        })
    }

    /// 核准到访。单事务内依次执行：
    /// 1. 守护更新 pending → approved（引擎唯一的并发控制点）
    /// 2. 活动积分池条件扣减 credits_per_action
    /// 3. 顾客积分入账（reference "visit:{id}" 去重）
    /// 4. 推荐码用量条件自增
    /// 任何一步失败整体回滚，竞争输家收到“已处理”。
    pub async fn approve_visit(
        &self,
        visit_id: i64,
        business_id: i64,
    ) -> AppResult<VisitResponse> {
        let txn = self.pool.begin().await?;

        let visit = self
            .visit_service
            .find_by_id(&txn, visit_id)
            .await?
            .filter(|v| v.business_id == business_id)
            .ok_or_else(|| AppError::NotFound("Visit not found".to_string()))?;

        // 结算只允许发生在活动 active 且处于投放时间窗内
        let campaign = self
            .campaign_service
            .get_active_campaign(&txn, visit.campaign_id)
            .await?;
        let credits = campaign.credits_per_action().ok_or_else(|| {
            AppError::InternalError("Campaign has no credits_per_action configured".to_string())
        })?;

        let visit = self
            .visit_service
            .approve(&txn, visit_id, business_id, credits, self.points_per_visit)
            .await?;

        self.campaign_service
            .debit_credit_pool(&txn, campaign.id, credits)
            .await?;

        self.loyalty_service
            .credit(
                &txn,
                visit.customer_id,
                visit.business_id,
                self.points_per_visit,
                format!("Points for approved visit {}", visit.id),
                &format!("visit:{}", visit.id),
            )
            .await?;

        if let Some(referral_code_id) = visit.referral_code_id {
            self.campaign_service
                .increment_referral_usage(&txn, referral_code_id)
                .await?;
        }

        txn.commit().await?;

        log::info!(
            "Visit {} approved: {} credits spent, {} points granted to customer {}",
            visit.id,
            credits,
            self.points_per_visit,
            visit.customer_id
        );
        Ok(visit.into())
    }

    /// 驳回到访：守护更新之外没有任何副作用
    pub async fn reject_visit(
        &self,
        visit_id: i64,
        business_id: i64,
    ) -> AppResult<VisitResponse> {
        let visit = self
            .visit_service
            .reject(self.pool.as_ref(), visit_id, business_id)
            .await?;
        Ok(visit.into())
    }

    pub async fn redeem_reward(
        &self,
        customer_id: i64,
        campaign_id: i64,
    ) -> AppResult<RedemptionResponse> {
        self.redemption_service.redeem(customer_id, campaign_id).await
    }

    pub async fn verify_reward_proof(&self, token: &str) -> AppResult<RedemptionResponse> {
        self.redemption_service.verify_proof(token).await
    }

    pub async fn complete_redemption(&self, redemption_id: i64) -> AppResult<RedemptionResponse> {
        self.redemption_service.complete(redemption_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        CampaignStatus, CampaignType, VisitStatus, campaign_entity as campaigns,
        referral_code_entity as referral_codes, visit_entity as visits,
    };
    use crate::utils::encode_visit_proof;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn make_service(db: DatabaseConnection) -> LedgerService {
        let db = Arc::new(db);
        let campaign_service = CampaignService::new(db.clone());
        let visit_service = VisitService::new(db.clone());
        let loyalty_service = LoyaltyService::new(db.clone());
        let redemption_service = RedemptionService::new(
            db.clone(),
            loyalty_service.clone(),
            campaign_service.clone(),
            30,
        );
        LedgerService::new(
            db,
            campaign_service,
            visit_service,
            loyalty_service,
            redemption_service,
            10,
        )
    }

    fn campaign_row(status: CampaignStatus, owner: i64) -> campaigns::Model {
        let now = Utc::now();
        campaigns::Model {
            id: 1,
            owner_business_id: owner,
            name: "Grand opening".to_string(),
            description: None,
            campaign_type: CampaignType::PayPerCustomer,
            status,
            credits_per_action: Some(5),
            points_cost: None,
            total_credits: 100,
            period_start: now - Duration::days(1),
            period_end: now + Duration::days(30),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn referral_row() -> referral_codes::Model {
        referral_codes::Model {
            id: 5,
            campaign_id: 1,
            influencer_id: 7,
            code: "A1B2C3D4".to_string(),
            usage_count: 0,
            usage_limit: Some(10),
            is_active: true,
            expires_at: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_verify_visit_rejects_malformed_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = make_service(db)
            .verify_visit("garbage-token", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_verify_visit_rejects_foreign_campaign() {
        // 活动属于商家 3，商家 99 来核验 → Forbidden，且不创建任何到访
        let token = encode_visit_proof(1, 7, 1001).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![campaign_row(CampaignStatus::Active, 3)]])
            .into_connection();

        let err = make_service(db).verify_visit(&token, 99).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_verify_visit_rejects_inactive_campaign() {
        let token = encode_visit_proof(1, 7, 1001).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![campaign_row(CampaignStatus::Paused, 3)]])
            .into_connection();

        let err = make_service(db).verify_visit(&token, 3).await.unwrap_err();
        assert!(matches!(err, AppError::CampaignInactive(_)));
    }

    #[tokio::test]
    async fn test_verify_visit_requires_plausible_binding() {
        // 凭证声称的 (活动, 推广方) 组合没有签发过推荐码 → 拒绝
        let token = encode_visit_proof(1, 7, 1001).unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![campaign_row(CampaignStatus::Active, 3)]])
            .append_query_results(vec![Vec::<referral_codes::Model>::new()])
            .into_connection();

        let err = make_service(db).verify_visit(&token, 3).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_verify_visit_creates_pending_visit() {
        let token = encode_visit_proof(1, 7, 1001).unwrap();
        let inserted = visits::Model {
            id: 42,
            campaign_id: 1,
            influencer_id: 7,
            customer_id: 1001,
            business_id: 3,
            referral_code_id: Some(5),
            status: VisitStatus::Pending,
            credits_earned: 0,
            loyalty_points_earned: 0,
            created_at: Some(Utc::now()),
            approved_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![campaign_row(CampaignStatus::Active, 3)]])
            .append_query_results(vec![vec![referral_row()]])
            .append_query_results(vec![vec![inserted]])
            .into_connection();

        let response = make_service(db).verify_visit(&token, 3).await.unwrap();
        assert_eq!(response.visit.id, 42);
        assert_eq!(response.visit.status, VisitStatus::Pending);
        assert_eq!(response.visit.referral_code_id, Some(5));
    }
}
