use crate::entities::{VisitStatus, campaign_entity as campaigns, visit_entity as visits};
use crate::error::{AppError, AppResult};
use crate::models::{PaginatedResponse, PaginationParams, VisitQuery, VisitResponse};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, UpdateResult,
};

/// Visit 状态机：pending → approved / rejected，两个终态。
///
/// 离开 pending 的迁移只允许成功一次，靠条件更新（WHERE 重申
/// status = 'pending'）加受影响行数判定实现；竞争输家拿到的是
/// “已处理”而不是第二次发放。
use std::sync::Arc;

#[derive(Clone)]
pub struct VisitService {
    pool: Arc<DatabaseConnection>,
}

impl VisitService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    /// 一次扫码一条 pending 到访；重复扫码是否合并由调用方决策
    pub async fn create_pending_visit<C: ConnectionTrait>(
        &self,
        db: &C,
        campaign: &campaigns::Model,
        influencer_id: i64,
        customer_id: i64,
        referral_code_id: Option<i64>,
    ) -> AppResult<visits::Model> {
        let visit = visits::ActiveModel {
            campaign_id: Set(campaign.id),
            influencer_id: Set(influencer_id),
            customer_id: Set(customer_id),
            business_id: Set(campaign.owner_business_id),
            referral_code_id: Set(referral_code_id),
            status: Set(VisitStatus::Pending),
            credits_earned: Set(0),
            loyalty_points_earned: Set(0),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(visit)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        db: &C,
        visit_id: i64,
    ) -> AppResult<Option<visits::Model>> {
        Ok(visits::Entity::find_by_id(visit_id).one(db).await?)
    }

    /// 核准迁移并写入本次结算额；零行命中交给诊断读分类
    pub async fn approve<C: ConnectionTrait>(
        &self,
        db: &C,
        visit_id: i64,
        business_id: i64,
        credits_earned: i64,
        loyalty_points_earned: i64,
    ) -> AppResult<visits::Model> {
        let result: UpdateResult = visits::Entity::update_many()
            .col_expr(visits::Column::Status, Expr::value(VisitStatus::Approved))
            .col_expr(visits::Column::ApprovedAt, Expr::value(Utc::now()))
            .col_expr(visits::Column::CreditsEarned, Expr::value(credits_earned))
            .col_expr(
                visits::Column::LoyaltyPointsEarned,
                Expr::value(loyalty_points_earned),
            )
            .filter(visits::Column::Id.eq(visit_id))
            .filter(visits::Column::BusinessId.eq(business_id))
            .filter(visits::Column::Status.eq(VisitStatus::Pending))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(self.classify_lost_guard(db, visit_id, business_id).await);
        }

        self.reload(db, visit_id).await
    }

    /// 驳回：同样的守护更新，除状态外无任何副作用
    pub async fn reject<C: ConnectionTrait>(
        &self,
        db: &C,
        visit_id: i64,
        business_id: i64,
    ) -> AppResult<visits::Model> {
        let result: UpdateResult = visits::Entity::update_many()
            .col_expr(visits::Column::Status, Expr::value(VisitStatus::Rejected))
            .filter(visits::Column::Id.eq(visit_id))
            .filter(visits::Column::BusinessId.eq(business_id))
            .filter(visits::Column::Status.eq(VisitStatus::Pending))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(self.classify_lost_guard(db, visit_id, business_id).await);
        }

        self.reload(db, visit_id).await
    }

    pub async fn get_visit(&self, visit_id: i64, business_id: i64) -> AppResult<visits::Model> {
        visits::Entity::find_by_id(visit_id)
            .one(self.pool.as_ref())
            .await?
            .filter(|v| v.business_id == business_id)
            .ok_or_else(|| AppError::NotFound("Visit not found".to_string()))
    }

    pub async fn list_visits(
        &self,
        query: &VisitQuery,
    ) -> AppResult<PaginatedResponse<VisitResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut base =
            visits::Entity::find().filter(visits::Column::BusinessId.eq(query.business_id));
        if let Some(status) = query.status {
            base = base.filter(visits::Column::Status.eq(status));
        }

        let total = base.clone().count(self.pool.as_ref()).await? as i64;
        let items = base
            .order_by(visits::Column::CreatedAt, Order::Desc)
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

    /// 守护更新零行命中后的归因：行存在且已离开 pending → 已处理；
    /// 行不存在或属于别的商家 → 按不存在上报（不泄露他人数据）
    async fn classify_lost_guard<C: ConnectionTrait>(
        &self,
        db: &C,
        visit_id: i64,
        business_id: i64,
    ) -> AppError {
        match visits::Entity::find_by_id(visit_id).one(db).await {
            Ok(Some(visit))
                if visit.business_id == business_id && visit.status != VisitStatus::Pending =>
            {
                AppError::AlreadyProcessed(format!("Visit {visit_id} already processed"))
            }
            Ok(_) => AppError::NotFound("Visit not found".to_string()),
            Err(e) => e.into(),
        }
    }

    async fn reload<C: ConnectionTrait>(&self, db: &C, visit_id: i64) -> AppResult<visits::Model> {
        visits::Entity::find_by_id(visit_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::InternalError("Visit row vanished after update".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn visit_row(status: VisitStatus) -> visits::Model {
        visits::Model {
            id: 42,
            campaign_id: 1,
            influencer_id: 7,
            customer_id: 1001,
            business_id: 3,
            referral_code_id: Some(5),
            status,
            credits_earned: 5,
            loyalty_points_earned: 10,
            created_at: Some(Utc::now()),
            approved_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_approve_lost_guard_reports_already_processed() {
        // 守护更新零行命中 + 行已是 approved → 竞争输家收到“已处理”
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results(vec![vec![visit_row(VisitStatus::Approved)]])
            .into_connection();

        let db = Arc::new(db);
        let service = VisitService::new(db.clone());
        let err = service.approve(db.as_ref(), 42, 3, 5, 10).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyProcessed(_)));
    }

    #[tokio::test]
    async fn test_approve_missing_visit_reports_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results(vec![Vec::<visits::Model>::new()])
            .into_connection();

        let db = Arc::new(db);
        let service = VisitService::new(db.clone());
        let err = service.approve(db.as_ref(), 42, 3, 5, 10).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reject_wrong_owner_reports_not_found() {
        // 行存在但属于另一家商家：按不存在处理，不提示“已处理”
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results(vec![vec![visit_row(VisitStatus::Pending)]])
            .into_connection();

        let db = Arc::new(db);
        let service = VisitService::new(db.clone());
        let err = service.reject(db.as_ref(), 42, 999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
