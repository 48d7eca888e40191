use crate::entities::{
    LoyaltyTransactionType, loyalty_point_entity as ledgers,
    loyalty_transaction_entity as transactions,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    LoyaltyBalanceResponse, LoyaltyTransactionResponse, PaginatedResponse, PaginationParams,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, UpdateResult,
};

/// 以 (customer, business) 为键的积分账本。
///
/// 余额行与追加写的交易日志一起维护；所有扣减都走条件更新
/// （WHERE 重申余额充足），余额永不为负。credit/debit 以
/// reference_id 去重，重试不会重复入账。
use std::sync::Arc;

#[derive(Clone)]
pub struct LoyaltyService {
    pool: Arc<DatabaseConnection>,
}

impl LoyaltyService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    /// 查询余额；账本行不存在时返回零值（首笔交易才落行）
    pub async fn get_balance(
        &self,
        customer_id: i64,
        business_id: i64,
    ) -> AppResult<LoyaltyBalanceResponse> {
        let ledger = ledgers::Entity::find()
            .filter(ledgers::Column::CustomerId.eq(customer_id))
            .filter(ledgers::Column::BusinessId.eq(business_id))
            .one(self.pool.as_ref())
            .await?;

        Ok(match ledger {
            Some(ledger) => ledger.into(),
            None => LoyaltyBalanceResponse::empty(customer_id, business_id),
        })
    }

    /// 入账：balance += amount, total_earned += amount，追加 earn 交易
    pub async fn credit<C: ConnectionTrait>(
        &self,
        db: &C,
        customer_id: i64,
        business_id: i64,
        amount: i64,
        description: String,
        reference_id: &str,
    ) -> AppResult<ledgers::Model> {
        self.apply_credit(
            db,
            customer_id,
            business_id,
            amount,
            description,
            reference_id,
            LoyaltyTransactionType::Earn,
        )
        .await
    }

    /// 补偿入账（如过期兑换退款）：回冲 total_spent，记 adjust 交易
    pub async fn refund<C: ConnectionTrait>(
        &self,
        db: &C,
        customer_id: i64,
        business_id: i64,
        amount: i64,
        description: String,
        reference_id: &str,
    ) -> AppResult<ledgers::Model> {
        self.apply_credit(
            db,
            customer_id,
            business_id,
            amount,
            description,
            reference_id,
            LoyaltyTransactionType::Adjust,
        )
        .await
    }

    /// 扣减：对持久化的最新余额做条件更新，余额不足则整体失败，
    /// 绝不部分扣减
    pub async fn debit<C: ConnectionTrait>(
        &self,
        db: &C,
        customer_id: i64,
        business_id: i64,
        amount: i64,
        description: String,
        reference_id: &str,
    ) -> AppResult<ledgers::Model> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "Debit amount must be positive".to_string(),
            ));
        }

        let ledger = self.ensure_ledger(db, customer_id, business_id).await?;

        // 同一 reference 已入账过：重试请求，按无操作处理
        if self
            .find_by_reference(db, ledger.id, reference_id)
            .await?
            .is_some()
        {
            log::info!("Skipping duplicate ledger debit, reference {reference_id}");
            return Ok(ledger);
        }

        let result: UpdateResult = ledgers::Entity::update_many()
            .col_expr(
                ledgers::Column::PointsBalance,
                Expr::col(ledgers::Column::PointsBalance).sub(amount),
            )
            .col_expr(
                ledgers::Column::TotalSpent,
                Expr::col(ledgers::Column::TotalSpent).add(amount),
            )
            .col_expr(ledgers::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(ledgers::Column::Id.eq(ledger.id))
            .filter(ledgers::Column::PointsBalance.gte(amount))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            // 重新读取最新余额，错误里带上所需/可用数量
            let latest = self.reload_ledger(db, ledger.id).await?;
            return Err(AppError::InsufficientPoints {
                required: amount,
                available: latest.points_balance,
            });
        }

        transactions::ActiveModel {
            loyalty_id: Set(ledger.id),
            transaction_type: Set(LoyaltyTransactionType::Spend),
            points_amount: Set(-amount),
            description: Set(Some(description)),
            reference_id: Set(Some(reference_id.to_string())),
            ..Default::default()
        }
        .insert(db)
        .await?;

        self.reload_ledger(db, ledger.id).await
    }

    pub async fn list_transactions(
        &self,
        customer_id: i64,
        business_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<LoyaltyTransactionResponse>> {
        let ledger = ledgers::Entity::find()
            .filter(ledgers::Column::CustomerId.eq(customer_id))
            .filter(ledgers::Column::BusinessId.eq(business_id))
            .one(self.pool.as_ref())
            .await?;

        let Some(ledger) = ledger else {
            return Ok(PaginatedResponse::new(
                vec![],
                params.page.unwrap_or(1),
                params.page_size.unwrap_or(20),
                0,
            ));
        };

        let base =
            transactions::Entity::find().filter(transactions::Column::LoyaltyId.eq(ledger.id));
        let total = base.clone().count(self.pool.as_ref()).await? as i64;
        let items = base
            .order_by(transactions::Column::CreatedAt, Order::Desc)
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

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    async fn apply_credit<C: ConnectionTrait>(
        &self,
        db: &C,
        customer_id: i64,
        business_id: i64,
        amount: i64,
        description: String,
        reference_id: &str,
        transaction_type: LoyaltyTransactionType,
    ) -> AppResult<ledgers::Model> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "Credit amount must be positive".to_string(),
            ));
        }

        let ledger = self.ensure_ledger(db, customer_id, business_id).await?;

        if self
            .find_by_reference(db, ledger.id, reference_id)
            .await?
            .is_some()
        {
            log::info!("Skipping duplicate ledger credit, reference {reference_id}");
            return Ok(ledger);
        }

        let mut update = ledgers::Entity::update_many()
            .col_expr(
                ledgers::Column::PointsBalance,
                Expr::col(ledgers::Column::PointsBalance).add(amount),
            )
            .col_expr(ledgers::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(ledgers::Column::Id.eq(ledger.id));
        update = match transaction_type {
            // 退款回冲消费侧，其余入账算作赚取；两侧都保持
            // balance = earned - spent 恒等式
            LoyaltyTransactionType::Adjust => update.col_expr(
                ledgers::Column::TotalSpent,
                Expr::col(ledgers::Column::TotalSpent).sub(amount),
            ),
            _ => update.col_expr(
                ledgers::Column::TotalEarned,
                Expr::col(ledgers::Column::TotalEarned).add(amount),
            ),
        };

        let result = update.exec(db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::InternalError(
                "Loyalty ledger row vanished during credit".to_string(),
            ));
        }

        transactions::ActiveModel {
            loyalty_id: Set(ledger.id),
            transaction_type: Set(transaction_type),
            points_amount: Set(amount),
            description: Set(Some(description)),
            reference_id: Set(Some(reference_id.to_string())),
            ..Default::default()
        }
        .insert(db)
        .await?;

        self.reload_ledger(db, ledger.id).await
    }

    async fn ensure_ledger<C: ConnectionTrait>(
        &self,
        db: &C,
        customer_id: i64,
        business_id: i64,
    ) -> Result<ledgers::Model, DbErr> {
        if let Some(ledger) = ledgers::Entity::find()
            .filter(ledgers::Column::CustomerId.eq(customer_id))
            .filter(ledgers::Column::BusinessId.eq(business_id))
            .one(db)
            .await?
        {
            return Ok(ledger);
        }
        ledgers::ActiveModel {
            customer_id: Set(customer_id),
            business_id: Set(business_id),
            points_balance: Set(0),
            total_earned: Set(0),
            total_spent: Set(0),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    async fn find_by_reference<C: ConnectionTrait>(
        &self,
        db: &C,
        loyalty_id: i64,
        reference_id: &str,
    ) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::LoyaltyId.eq(loyalty_id))
            .filter(transactions::Column::ReferenceId.eq(reference_id))
            .one(db)
            .await
    }

    async fn reload_ledger<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i64,
    ) -> AppResult<ledgers::Model> {
        ledgers::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::InternalError("Loyalty ledger row vanished".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn ledger_row(balance: i64, earned: i64, spent: i64) -> ledgers::Model {
        ledgers::Model {
            id: 1,
            customer_id: 1001,
            business_id: 3,
            points_balance: balance,
            total_earned: earned,
            total_spent: spent,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_get_balance_defaults_to_zero() {
        // 账本行不存在 → 零值余额，而不是错误
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<ledgers::Model>::new()])
            .into_connection();

        let service = LoyaltyService::new(Arc::new(db));
        let balance = service.get_balance(1001, 3).await.unwrap();
        assert_eq!(balance.points_balance, 0);
        assert_eq!(balance.total_earned, 0);
        assert_eq!(balance.total_spent, 0);
    }

    #[tokio::test]
    async fn test_debit_insufficient_points() {
        // 余额 50 扣 80：条件更新不命中 → InsufficientPoints 带上两个数量
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![ledger_row(50, 50, 0)]])
            .append_query_results(vec![Vec::<transactions::Model>::new()])
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results(vec![vec![ledger_row(50, 50, 0)]])
            .into_connection();

        let db = Arc::new(db);
        let service = LoyaltyService::new(db.clone());
        let err = service
            .debit(db.as_ref(), 1001, 3, 80, "Redeem reward".to_string(), "redemption:9")
            .await
            .unwrap_err();

        match err {
            AppError::InsufficientPoints {
                required,
                available,
            } => {
                assert_eq!(required, 80);
                assert_eq!(available, 50);
            }
            other => panic!("expected InsufficientPoints, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_credit_duplicate_reference_is_noop() {
        // 相同 reference 的重试：返回现有余额，不再入账
        let existing = transactions::Model {
            id: 7,
            loyalty_id: 1,
            transaction_type: LoyaltyTransactionType::Earn,
            points_amount: 10,
            description: Some("Points for approved visit 42".to_string()),
            reference_id: Some("visit:42".to_string()),
            created_at: Some(Utc::now()),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![ledger_row(10, 10, 0)]])
            .append_query_results(vec![vec![existing]])
            .into_connection();

        let db = Arc::new(db);
        let service = LoyaltyService::new(db.clone());
        let ledger = service
            .credit(
                db.as_ref(),
                1001,
                3,
                10,
                "Points for approved visit 42".to_string(),
                "visit:42",
            )
            .await
            .unwrap();
        assert_eq!(ledger.points_balance, 10);
        assert_eq!(ledger.total_earned, 10);
    }

    #[tokio::test]
    async fn test_debit_duplicate_reference_is_noop() {
        let existing = transactions::Model {
            id: 8,
            loyalty_id: 1,
            transaction_type: LoyaltyTransactionType::Spend,
            points_amount: -80,
            description: Some("Redeem reward".to_string()),
            reference_id: Some("redemption:9".to_string()),
            created_at: Some(Utc::now()),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![ledger_row(20, 100, 80)]])
            .append_query_results(vec![vec![existing]])
            .into_connection();

        let db = Arc::new(db);
        let service = LoyaltyService::new(db.clone());
        let ledger = service
            .debit(db.as_ref(), 1001, 3, 80, "Redeem reward".to_string(), "redemption:9")
            .await
            .unwrap();
        // 余额保持不变，没有第二次扣减
        assert_eq!(ledger.points_balance, 20);
        assert_eq!(ledger.total_spent, 80);
    }

    #[tokio::test]
    async fn test_credit_rejects_non_positive_amount() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let db = Arc::new(db);
        let service = LoyaltyService::new(db.clone());
        assert!(matches!(
            service
                .credit(db.as_ref(), 1001, 3, 0, "noop".to_string(), "visit:1")
                .await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service
                .debit(db.as_ref(), 1001, 3, -5, "noop".to_string(), "visit:1")
                .await,
            Err(AppError::ValidationError(_))
        ));
    }
}
