use crate::models::*;
use crate::services::LoyaltyService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/loyalty/balance",
    tag = "loyalty",
    params(
        ("customer_id" = i64, Query, description = "顾客 ID"),
        ("business_id" = i64, Query, description = "商家 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取余额成功", body = LoyaltyBalanceResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_balance(
    loyalty_service: web::Data<LoyaltyService>,
    query: web::Query<BalanceQuery>,
) -> Result<HttpResponse> {
    match loyalty_service
        .get_balance(query.customer_id, query.business_id)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/loyalty/transactions",
    tag = "loyalty",
    params(
        ("customer_id" = i64, Query, description = "顾客 ID"),
        ("business_id" = i64, Query, description = "商家 ID"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("page_size" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取交易流水成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_transactions(
    loyalty_service: web::Data<LoyaltyService>,
    query: web::Query<LoyaltyTransactionQuery>,
) -> Result<HttpResponse> {
    let params = PaginationParams::new(query.page, query.page_size);

    match loyalty_service
        .list_transactions(query.customer_id, query.business_id, &params)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn loyalty_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/loyalty")
            .route("/balance", web::get().to(get_balance))
            .route("/transactions", web::get().to(list_transactions)),
    );
}
