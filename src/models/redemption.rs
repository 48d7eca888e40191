use crate::entities::{RedemptionStatus, reward_redemption_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemRequest {
    pub customer_id: i64,
    /// 目标 loyalty_reward 活动
    pub campaign_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyRewardQuery {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedemptionQuery {
    pub customer_id: i64,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedemptionResponse {
    pub id: i64,
    pub customer_id: i64,
    pub business_id: i64,
    pub campaign_id: i64,
    pub points_spent: i64,
    pub status: RedemptionStatus,
    pub qr_proof: String,
    pub created_at: Option<DateTime<Utc>>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl From<reward_redemption_entity::Model> for RedemptionResponse {
    fn from(redemption: reward_redemption_entity::Model) -> Self {
        Self {
            id: redemption.id,
            customer_id: redemption.customer_id,
            business_id: redemption.business_id,
            campaign_id: redemption.campaign_id,
            points_spent: redemption.points_spent,
            status: redemption.status,
            qr_proof: redemption.qr_proof,
            created_at: redemption.created_at,
            redeemed_at: redemption.redeemed_at,
            expires_at: redemption.expires_at,
        }
    }
}
