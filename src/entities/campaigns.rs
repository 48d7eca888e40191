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
pub enum CampaignType {
    #[sea_orm(string_value = "pay_per_customer")]
    PayPerCustomer,
    #[sea_orm(string_value = "pay_per_post")]
    PayPerPost,
    #[sea_orm(string_value = "media_event")]
    MediaEvent,
    #[sea_orm(string_value = "loyalty_reward")]
    LoyaltyReward,
}

impl std::fmt::Display for CampaignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignType::PayPerCustomer => write!(f, "pay_per_customer"),
            CampaignType::PayPerPost => write!(f, "pay_per_post"),
            CampaignType::MediaEvent => write!(f, "media_event"),
            CampaignType::LoyaltyReward => write!(f, "loyalty_reward"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Active => write!(f, "active"),
            CampaignStatus::Paused => write!(f, "paused"),
            CampaignStatus::Completed => write!(f, "completed"),
            CampaignStatus::Cancelled => write!(f, "cancelled"),
            CampaignStatus::Expired => write!(f, "expired"),
        }
    }
}

impl CampaignStatus {
    /// 状态机：draft→active，active↔paused，active/paused→三个终态
    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, next),
            (Draft, Active)
                | (Active, Paused)
                | (Paused, Active)
                | (Active, Completed)
                | (Active, Cancelled)
                | (Active, Expired)
                | (Paused, Completed)
                | (Paused, Cancelled)
                | (Paused, Expired)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CampaignStatus::Completed | CampaignStatus::Cancelled | CampaignStatus::Expired
        )
    }
}

/// 按活动类型区分的载荷视图：按量计费类活动携带单次动作积分成本，
/// 积分兑换类活动携带兑换所需积分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignKind {
    PayPerCustomer { credits_per_action: i64 },
    PayPerPost { credits_per_action: i64 },
    MediaEvent { credits_per_action: i64 },
    LoyaltyReward { points_cost: i64 },
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key)]
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
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_within_period(&self, now: DateTime<Utc>) -> bool {
        now >= self.period_start && now <= self.period_end
    }

    /// 行数据的类型化视图；对应列未配置时返回 None（配置损坏）
    pub fn kind(&self) -> Option<CampaignKind> {
        match self.campaign_type {
            CampaignType::PayPerCustomer => self
                .credits_per_action
                .map(|credits_per_action| CampaignKind::PayPerCustomer { credits_per_action }),
            CampaignType::PayPerPost => self
                .credits_per_action
                .map(|credits_per_action| CampaignKind::PayPerPost { credits_per_action }),
            CampaignType::MediaEvent => self
                .credits_per_action
                .map(|credits_per_action| CampaignKind::MediaEvent { credits_per_action }),
            CampaignType::LoyaltyReward => self
                .points_cost
                .map(|points_cost| CampaignKind::LoyaltyReward { points_cost }),
        }
    }

    /// 按次计费活动的单次动作成本；积分兑换类活动返回 None
    pub fn credits_per_action(&self) -> Option<i64> {
        match self.kind()? {
            CampaignKind::PayPerCustomer { credits_per_action }
            | CampaignKind::PayPerPost { credits_per_action }
            | CampaignKind::MediaEvent { credits_per_action } => Some(credits_per_action),
            CampaignKind::LoyaltyReward { .. } => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(campaign_type: CampaignType) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            owner_business_id: 10,
            name: "Grand opening".to_string(),
            description: None,
            campaign_type,
            status: CampaignStatus::Active,
            credits_per_action: Some(5),
            points_cost: Some(80),
            total_credits: 100,
            period_start: now - Duration::days(1),
            period_end: now + Duration::days(30),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    #[test]
    fn test_status_transitions() {
        use CampaignStatus::*;
        assert!(Draft.can_transition_to(Active));
        assert!(Active.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));
        assert!(Paused.can_transition_to(Cancelled));

        // draft 不能直接进入终态，终态不能再转移
        assert!(!Draft.can_transition_to(Completed));
        assert!(!Draft.can_transition_to(Paused));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Active));
        assert!(!Expired.can_transition_to(Draft));
        assert!(!Active.can_transition_to(Draft));
    }

    #[test]
    fn test_terminal_states() {
        use CampaignStatus::*;
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(Expired.is_terminal());
        assert!(!Draft.is_terminal());
        assert!(!Active.is_terminal());
        assert!(!Paused.is_terminal());
    }

    #[test]
    fn test_period_window() {
        let campaign = sample(CampaignType::PayPerCustomer);
        assert!(campaign.is_within_period(Utc::now()));
        assert!(!campaign.is_within_period(Utc::now() - Duration::days(2)));
        assert!(!campaign.is_within_period(Utc::now() + Duration::days(31)));
    }

    #[test]
    fn test_kind_dispatch() {
        let pay = sample(CampaignType::PayPerCustomer);
        assert_eq!(
            pay.kind(),
            Some(CampaignKind::PayPerCustomer {
                credits_per_action: 5
            })
        );
        assert_eq!(pay.credits_per_action(), Some(5));

        let reward = sample(CampaignType::LoyaltyReward);
        assert_eq!(
            reward.kind(),
            Some(CampaignKind::LoyaltyReward { points_cost: 80 })
        );
        assert_eq!(reward.credits_per_action(), None);
    }

    #[test]
    fn test_kind_missing_payload() {
        let mut broken = sample(CampaignType::PayPerPost);
        broken.credits_per_action = None;
        assert_eq!(broken.kind(), None);

        let mut broken_reward = sample(CampaignType::LoyaltyReward);
        broken_reward.points_cost = None;
        assert_eq!(broken_reward.kind(), None);
    }
}
