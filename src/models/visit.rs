use crate::entities::{VisitStatus, visit_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyVisitRequest {
    /// 顾客扫码出示的到访凭证（二维码负载）
    pub qr_token: String,
    pub business_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VisitActionRequest {
    pub business_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VisitQuery {
    pub business_id: i64,
    pub status: Option<VisitStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VisitResponse {
    pub id: i64,
    pub campaign_id: i64,
    pub influencer_id: i64,
    pub customer_id: i64,
    pub business_id: i64,
    pub referral_code_id: Option<i64>,
    pub status: VisitStatus,
    pub credits_earned: i64,
    pub loyalty_points_earned: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl From<visit_entity::Model> for VisitResponse {
    fn from(visit: visit_entity::Model) -> Self {
        Self {
            id: visit.id,
            campaign_id: visit.campaign_id,
            influencer_id: visit.influencer_id,
            customer_id: visit.customer_id,
            business_id: visit.business_id,
            referral_code_id: visit.referral_code_id,
            status: visit.status,
            credits_earned: visit.credits_earned,
            loyalty_points_earned: visit.loyalty_points_earned,
            created_at: visit.created_at,
            approved_at: visit.approved_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyVisitResponse {
    pub visit: VisitResponse,
    pub message: String,
}
