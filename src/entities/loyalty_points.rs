use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 以 (customer_id, business_id) 为键的积分账本余额行，
/// 首笔交易时惰性创建；恒有 points_balance = total_earned - total_spent >= 0
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "loyalty_points")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub customer_id: i64,
    pub business_id: i64,
    pub points_balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
