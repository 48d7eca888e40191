use crate::entities::{LoyaltyTransactionType, loyalty_point_entity, loyalty_transaction_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceQuery {
    pub customer_id: i64,
    pub business_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoyaltyBalanceResponse {
    pub customer_id: i64,
    pub business_id: i64,
    pub points_balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
}

impl LoyaltyBalanceResponse {
    /// 账本行尚未创建时的零值余额
    pub fn empty(customer_id: i64, business_id: i64) -> Self {
        Self {
            customer_id,
            business_id,
            points_balance: 0,
            total_earned: 0,
            total_spent: 0,
        }
    }
}

impl From<loyalty_point_entity::Model> for LoyaltyBalanceResponse {
    fn from(ledger: loyalty_point_entity::Model) -> Self {
        Self {
            customer_id: ledger.customer_id,
            business_id: ledger.business_id,
            points_balance: ledger.points_balance,
            total_earned: ledger.total_earned,
            total_spent: ledger.total_spent,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoyaltyTransactionQuery {
    pub customer_id: i64,
    pub business_id: i64,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoyaltyTransactionResponse {
    pub id: i64,
    pub transaction_type: LoyaltyTransactionType,
    pub points_amount: i64,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<loyalty_transaction_entity::Model> for LoyaltyTransactionResponse {
    fn from(tx: loyalty_transaction_entity::Model) -> Self {
        Self {
            id: tx.id,
            transaction_type: tx.transaction_type,
            points_amount: tx.points_amount,
            description: tx.description,
            reference_id: tx.reference_id,
            created_at: tx.created_at,
        }
    }
}
