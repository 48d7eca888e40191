use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl std::fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedemptionStatus::Pending => write!(f, "pending"),
            RedemptionStatus::Approved => write!(f, "approved"),
            RedemptionStatus::Expired => write!(f, "expired"),
        }
    }
}

/// 积分在创建时即已扣除（与交易记录原子），qr_proof 为一次性核销凭证
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "reward_redemptions")]
pub struct Model {
    #[sea_orm(primary_key)]
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

impl Model {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_predicate() {
        let now = Utc::now();
        let redemption = Model {
            id: 1,
            customer_id: 2,
            business_id: 3,
            campaign_id: 4,
            points_spent: 80,
            status: RedemptionStatus::Pending,
            qr_proof: "proof".to_string(),
            created_at: Some(now - Duration::days(31)),
            redeemed_at: None,
            expires_at: now - Duration::days(1),
        };

        // 过了有效期就算仍是 pending 也视为过期
        assert!(redemption.is_expired_at(now));
        assert!(!redemption.is_expired_at(now - Duration::days(2)));
    }
}
