use crate::models::*;
use crate::services::{LedgerService, RedemptionService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/redemptions",
    tag = "redemption",
    request_body = RedeemRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "兑换成功，返回一次性核销凭证", body = RedemptionResponse),
        (status = 400, description = "积分不足"),
        (status = 404, description = "奖励活动不存在或不可用")
    )
)]
pub async fn redeem(
    ledger_service: web::Data<LedgerService>,
    request: web::Json<RedeemRequest>,
) -> Result<HttpResponse> {
    match ledger_service
        .redeem_reward(request.customer_id, request.campaign_id)
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
    path = "/redemptions/verify",
    tag = "redemption",
    params(
        ("token" = String, Query, description = "核销凭证（二维码负载）")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "凭证有效", body = RedemptionResponse),
        (status = 400, description = "凭证无效、已核销或已过期")
    )
)]
pub async fn verify_reward(
    ledger_service: web::Data<LedgerService>,
    query: web::Query<VerifyRewardQuery>,
) -> Result<HttpResponse> {
    match ledger_service.verify_reward_proof(&query.token).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/redemptions/{id}/complete",
    tag = "redemption",
    params(
        ("id" = i64, Path, description = "兑换 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "核销成功", body = RedemptionResponse),
        (status = 404, description = "兑换不存在"),
        (status = 409, description = "兑换已核销或已过期")
    )
)]
pub async fn complete_redemption(
    ledger_service: web::Data<LedgerService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match ledger_service.complete_redemption(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/redemptions",
    tag = "redemption",
    params(
        ("customer_id" = i64, Query, description = "顾客 ID"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("page_size" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取兑换记录成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_redemptions(
    redemption_service: web::Data<RedemptionService>,
    query: web::Query<RedemptionQuery>,
) -> Result<HttpResponse> {
    match redemption_service.list_redemptions(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn redemption_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/redemptions")
            .route("", web::post().to(redeem))
            .route("", web::get().to(list_redemptions))
            .route("/verify", web::get().to(verify_reward))
            .route("/{id}/complete", web::post().to(complete_redemption)),
    );
}
