use crate::models::*;
use crate::services::{LedgerService, VisitService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/visits/verify",
    tag = "visit",
    request_body = VerifyVisitRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "核验成功，创建 pending 到访", body = VerifyVisitResponse),
        (status = 400, description = "凭证格式错误"),
        (status = 403, description = "活动不属于该商家"),
        (status = 404, description = "活动不存在或不可结算")
    )
)]
pub async fn verify_visit(
    ledger_service: web::Data<LedgerService>,
    request: web::Json<VerifyVisitRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();

    match ledger_service
        .verify_visit(&request.qr_token, request.business_id)
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
    post,
    path = "/visits/{id}/approve",
    tag = "visit",
    params(
        ("id" = i64, Path, description = "到访 ID")
    ),
    request_body = VisitActionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "核准成功", body = VisitResponse),
        (status = 400, description = "积分池耗尽或推荐码达到上限"),
        (status = 404, description = "到访不存在"),
        (status = 409, description = "到访已被处理")
    )
)]
pub async fn approve_visit(
    ledger_service: web::Data<LedgerService>,
    path: web::Path<i64>,
    request: web::Json<VisitActionRequest>,
) -> Result<HttpResponse> {
    match ledger_service
        .approve_visit(path.into_inner(), request.business_id)
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
    post,
    path = "/visits/{id}/reject",
    tag = "visit",
    params(
        ("id" = i64, Path, description = "到访 ID")
    ),
    request_body = VisitActionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "驳回成功", body = VisitResponse),
        (status = 404, description = "到访不存在"),
        (status = 409, description = "到访已被处理")
    )
)]
pub async fn reject_visit(
    ledger_service: web::Data<LedgerService>,
    path: web::Path<i64>,
    request: web::Json<VisitActionRequest>,
) -> Result<HttpResponse> {
    match ledger_service
        .reject_visit(path.into_inner(), request.business_id)
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
    path = "/visits",
    tag = "visit",
    params(
        ("business_id" = i64, Query, description = "商家 ID"),
        ("status" = Option<String>, Query, description = "按状态过滤: pending/approved/rejected"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("page_size" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取到访列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_visits(
    visit_service: web::Data<VisitService>,
    query: web::Query<VisitQuery>,
) -> Result<HttpResponse> {
    match visit_service.list_visits(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/visits/{id}",
    tag = "visit",
    params(
        ("id" = i64, Path, description = "到访 ID"),
        ("business_id" = i64, Query, description = "商家 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取到访成功", body = VisitResponse),
        (status = 404, description = "到访不存在")
    )
)]
pub async fn get_visit(
    visit_service: web::Data<VisitService>,
    path: web::Path<i64>,
    query: web::Query<VisitActionRequest>,
) -> Result<HttpResponse> {
    match visit_service
        .get_visit(path.into_inner(), query.business_id)
        .await
    {
        Ok(visit) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": VisitResponse::from(visit)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn visit_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/visits")
            .route("/verify", web::post().to(verify_visit))
            .route("", web::get().to(list_visits))
            .route("/{id}", web::get().to(get_visit))
            .route("/{id}/approve", web::post().to(approve_visit))
            .route("/{id}/reject", web::post().to(reject_visit)),
    );
}
