use crate::entities::{CampaignStatus, CampaignType, campaign_entity, referral_code_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCampaignRequest {
    #[schema(example = "Grand opening week")]
    pub name: String,
    pub description: Option<String>,
    pub campaign_type: CampaignType,
    /// 按次计费类活动必填：每次核销动作消耗的积分池额度
    pub credits_per_action: Option<i64>,
    /// loyalty_reward 活动必填：兑换一次所需积分
    pub points_cost: Option<i64>,
    /// 活动注资的积分池总额
    pub total_credits: i64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCampaignStatusRequest {
    pub status: CampaignStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampaignQuery {
    pub status: Option<CampaignStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CampaignResponse {
    pub id: i64,
    pub owner_business_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub credits_per_action: Option<i64>,
    pub points_cost: Option<i64>,
    pub total_credits: i64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<campaign_entity::Model> for CampaignResponse {
    fn from(campaign: campaign_entity::Model) -> Self {
        Self {
            id: campaign.id,
            owner_business_id: campaign.owner_business_id,
            name: campaign.name,
            description: campaign.description,
            campaign_type: campaign.campaign_type,
            status: campaign.status,
            credits_per_action: campaign.credits_per_action,
            points_cost: campaign.points_cost,
            total_credits: campaign.total_credits,
            period_start: campaign.period_start,
            period_end: campaign.period_end,
            created_at: campaign.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReferralCodeRequest {
    pub influencer_id: i64,
    /// NULL 表示不限次数
    pub usage_limit: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralCodeResponse {
    pub id: i64,
    pub campaign_id: i64,
    pub influencer_id: i64,
    pub code: String,
    pub usage_count: i64,
    pub usage_limit: Option<i64>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<referral_code_entity::Model> for ReferralCodeResponse {
    fn from(code: referral_code_entity::Model) -> Self {
        Self {
            id: code.id,
            campaign_id: code.campaign_id,
            influencer_id: code.influencer_id,
            code: code.code,
            usage_count: code.usage_count,
            usage_limit: code.usage_limit,
            is_active: code.is_active,
            expires_at: code.expires_at,
            created_at: code.created_at,
        }
    }
}
