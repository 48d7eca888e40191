use crate::entities::{
    CampaignStatus, CampaignType, campaign_entity as campaigns,
    referral_code_entity as referral_codes,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CampaignQuery, CampaignResponse, CreateCampaignRequest, CreateReferralCodeRequest,
    PaginatedResponse, PaginationParams, ReferralCodeResponse,
};
use crate::utils::generate_referral_code;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, UpdateResult,
};

use std::sync::Arc;

#[derive(Clone)]
pub struct CampaignService {
    pool: Arc<DatabaseConnection>,
}

impl CampaignService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    /// 创建活动（初始为 draft），按类型校验载荷字段
    pub async fn create_campaign(
        &self,
        owner_business_id: i64,
        request: CreateCampaignRequest,
    ) -> AppResult<CampaignResponse> {
        if request.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Campaign name must not be empty".to_string(),
            ));
        }
        if request.period_end <= request.period_start {
            return Err(AppError::ValidationError(
                "Campaign period end must be after period start".to_string(),
            ));
        }
        if request.total_credits < 0 {
            return Err(AppError::ValidationError(
                "Campaign credit pool must not be negative".to_string(),
            ));
        }

        // 按类型区分的载荷：按次计费类需要单次成本，兑换类需要积分价格
        match request.campaign_type {
            CampaignType::LoyaltyReward => {
                if request.points_cost.is_none_or(|p| p <= 0) {
                    return Err(AppError::ValidationError(
                        "Reward campaigns require a positive points_cost".to_string(),
                    ));
                }
            }
            _ => {
                if request.credits_per_action.is_none_or(|c| c <= 0) {
                    return Err(AppError::ValidationError(
                        "Campaigns require a positive credits_per_action".to_string(),
                    ));
                }
            }
        }

        let campaign = campaigns::ActiveModel {
            owner_business_id: Set(owner_business_id),
            name: Set(request.name),
            description: Set(request.description),
            campaign_type: Set(request.campaign_type),
            status: Set(CampaignStatus::Draft),
            credits_per_action: Set(request.credits_per_action),
            points_cost: Set(request.points_cost),
            total_credits: Set(request.total_credits),
            period_start: Set(request.period_start),
            period_end: Set(request.period_end),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        Ok(campaign.into())
    }

    pub async fn get_campaign(&self, id: i64) -> AppResult<campaigns::Model> {
        campaigns::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))
    }

    pub async fn list_campaigns(
        &self,
        owner_business_id: i64,
        query: &CampaignQuery,
    ) -> AppResult<PaginatedResponse<CampaignResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut base = campaigns::Entity::find()
            .filter(campaigns::Column::OwnerBusinessId.eq(owner_business_id));
        if let Some(status) = query.status {
            base = base.filter(campaigns::Column::Status.eq(status));
        }

        let total = base.clone().count(self.pool.as_ref()).await? as i64;
        let items = base
            .order_by(campaigns::Column::CreatedAt, Order::Desc)
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

    /// 活动状态迁移；WHERE 里重申当前状态，竞争失败按已处理上报
    pub async fn update_status(
        &self,
        id: i64,
        owner_business_id: i64,
        next: CampaignStatus,
    ) -> AppResult<CampaignResponse> {
        let campaign = campaigns::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .filter(|c| c.owner_business_id == owner_business_id)
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;

        if !campaign.status.can_transition_to(next) {
            return Err(AppError::ValidationError(format!(
                "Illegal campaign status transition: {} -> {}",
                campaign.status, next
            )));
        }

        let result: UpdateResult = campaigns::Entity::update_many()
            .col_expr(campaigns::Column::Status, Expr::value(next))
            .col_expr(campaigns::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(campaigns::Column::Id.eq(id))
            .filter(campaigns::Column::OwnerBusinessId.eq(owner_business_id))
            .filter(campaigns::Column::Status.eq(campaign.status))
            .exec(self.pool.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::AlreadyProcessed(
                "Campaign status was changed by another request".to_string(),
            ));
        }

        let updated = self.get_campaign(id).await?;
        Ok(updated.into())
    }

    /// 读取可结算的活动：必须 active 且在投放时间窗内，
    /// 否则返回与 NotFound 区分的 CampaignInactive
    pub async fn get_active_campaign<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i64,
    ) -> AppResult<campaigns::Model> {
        let campaign = campaigns::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;

        if campaign.status != CampaignStatus::Active {
            return Err(AppError::CampaignInactive(format!(
                "Campaign is {}, not active",
                campaign.status
            )));
        }
        if !campaign.is_within_period(Utc::now()) {
            return Err(AppError::CampaignInactive(
                "Campaign is outside its active period".to_string(),
            ));
        }

        Ok(campaign)
    }

    /// 给推广方签发推荐码（查库重试保证唯一）
    pub async fn create_referral_code(
        &self,
        campaign_id: i64,
        owner_business_id: i64,
        request: CreateReferralCodeRequest,
    ) -> AppResult<ReferralCodeResponse> {
        let campaign = self.get_campaign(campaign_id).await?;
        if campaign.owner_business_id != owner_business_id {
            return Err(AppError::NotFound("Campaign not found".to_string()));
        }
        if let Some(limit) = request.usage_limit
            && limit <= 0
        {
            return Err(AppError::ValidationError(
                "Usage limit must be positive when set".to_string(),
            ));
        }

        let code = loop {
            let candidate = generate_referral_code();
            let exists = referral_codes::Entity::find()
                .filter(referral_codes::Column::Code.eq(candidate.clone()))
                .one(self.pool.as_ref())
                .await?;
            if exists.is_none() {
                break candidate;
            }
        };

        let referral_code = referral_codes::ActiveModel {
            campaign_id: Set(campaign_id),
            influencer_id: Set(request.influencer_id),
            code: Set(code),
            usage_count: Set(0),
            usage_limit: Set(request.usage_limit),
            is_active: Set(true),
            expires_at: Set(request.expires_at),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        Ok(referral_code.into())
    }

    pub async fn get_referral_code_by_code(
        &self,
        code: &str,
    ) -> AppResult<referral_codes::Model> {
        referral_codes::Entity::find()
            .filter(referral_codes::Column::Code.eq(code))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Referral code not found".to_string()))
    }

    /// (活动, 推广方) 的推荐绑定；同一绑定存在多个码时取最早签发的
    pub async fn find_binding<C: ConnectionTrait>(
        &self,
        db: &C,
        campaign_id: i64,
        influencer_id: i64,
    ) -> AppResult<Option<referral_codes::Model>> {
        let binding = referral_codes::Entity::find()
            .filter(referral_codes::Column::CampaignId.eq(campaign_id))
            .filter(referral_codes::Column::InfluencerId.eq(influencer_id))
            .order_by_asc(referral_codes::Column::Id)
            .one(db)
            .await?;
        Ok(binding)
    }

    /// 条件自增用量：WHERE 限定未达上限，两个并发审批不可能把
    /// usage_count 推过 usage_limit
    pub async fn increment_referral_usage<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i64,
    ) -> AppResult<()> {
        let result: UpdateResult = referral_codes::Entity::update_many()
            .col_expr(
                referral_codes::Column::UsageCount,
                Expr::col(referral_codes::Column::UsageCount).add(1),
            )
            .col_expr(referral_codes::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(referral_codes::Column::Id.eq(id))
            .filter(referral_codes::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(referral_codes::Column::UsageLimit.is_null())
                    .add(
                        Expr::col(referral_codes::Column::UsageCount)
                            .lt(Expr::col(referral_codes::Column::UsageLimit)),
                    ),
            )
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::LimitExceeded(
                "Referral code usage limit reached".to_string(),
            ));
        }
        Ok(())
    }

    /// 条件扣减活动积分池：WHERE 限定余额充足，竞争失败即池耗尽
    pub async fn debit_credit_pool<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i64,
        amount: i64,
    ) -> AppResult<()> {
        let result: UpdateResult = campaigns::Entity::update_many()
            .col_expr(
                campaigns::Column::TotalCredits,
                Expr::col(campaigns::Column::TotalCredits).sub(amount),
            )
            .col_expr(campaigns::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(campaigns::Column::Id.eq(id))
            .filter(campaigns::Column::TotalCredits.gte(amount))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::LimitExceeded(
                "Campaign credit pool exhausted".to_string(),
            ));
        }
        Ok(())
    }
}
