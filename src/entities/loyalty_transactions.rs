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
pub enum LoyaltyTransactionType {
    #[sea_orm(string_value = "earn")]
    Earn,
    #[sea_orm(string_value = "spend")]
    Spend,
    #[sea_orm(string_value = "expire")]
    Expire,
    #[sea_orm(string_value = "adjust")]
    Adjust,
}

impl std::fmt::Display for LoyaltyTransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoyaltyTransactionType::Earn => write!(f, "earn"),
            LoyaltyTransactionType::Spend => write!(f, "spend"),
            LoyaltyTransactionType::Expire => write!(f, "expire"),
            LoyaltyTransactionType::Adjust => write!(f, "adjust"),
        }
    }
}

/// 追加写日志：从不更新或删除；余额行恒等于本表带符号金额之和。
/// reference_id 关联来源（如 "visit:42" / "redemption:7"），同一账本内唯一，
/// 用于重试去重。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "loyalty_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub loyalty_id: i64,
    pub transaction_type: LoyaltyTransactionType,
    pub points_amount: i64,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
