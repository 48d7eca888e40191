use crate::models::*;
use crate::services::CampaignService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 认证中间件注入的调用方 ID（商家侧接口将其用作 owner_business_id）
fn get_actor_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    post,
    path = "/campaigns",
    tag = "campaign",
    request_body = CreateCampaignRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建活动成功", body = CampaignResponse),
        (status = 400, description = "请求参数错误"),
        (status = 401, description = "未授权")
    )
)]
pub async fn create_campaign(
    campaign_service: web::Data<CampaignService>,
    req: HttpRequest,
    request: web::Json<CreateCampaignRequest>,
) -> Result<HttpResponse> {
    let business_id = get_actor_id_from_request(&req).unwrap_or(0);

    match campaign_service
        .create_campaign(business_id, request.into_inner())
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
    path = "/campaigns",
    tag = "campaign",
    params(
        ("status" = Option<String>, Query, description = "按状态过滤"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("page_size" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取活动列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_campaigns(
    campaign_service: web::Data<CampaignService>,
    req: HttpRequest,
    query: web::Query<CampaignQuery>,
) -> Result<HttpResponse> {
    let business_id = get_actor_id_from_request(&req).unwrap_or(0);

    match campaign_service.list_campaigns(business_id, &query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    tag = "campaign",
    params(
        ("id" = i64, Path, description = "活动 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取活动成功", body = CampaignResponse),
        (status = 404, description = "活动不存在")
    )
)]
pub async fn get_campaign(
    campaign_service: web::Data<CampaignService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match campaign_service.get_campaign(path.into_inner()).await {
        Ok(campaign) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success(CampaignResponse::from(campaign)))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/status",
    tag = "campaign",
    params(
        ("id" = i64, Path, description = "活动 ID")
    ),
    request_body = UpdateCampaignStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "状态迁移成功", body = CampaignResponse),
        (status = 400, description = "非法状态迁移"),
        (status = 404, description = "活动不存在"),
        (status = 409, description = "状态已被其它请求修改")
    )
)]
pub async fn update_campaign_status(
    campaign_service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateCampaignStatusRequest>,
) -> Result<HttpResponse> {
    let business_id = get_actor_id_from_request(&req).unwrap_or(0);

    match campaign_service
        .update_status(path.into_inner(), business_id, request.status)
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
    path = "/campaigns/{id}/referral-codes",
    tag = "campaign",
    params(
        ("id" = i64, Path, description = "活动 ID")
    ),
    request_body = CreateReferralCodeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "签发推荐码成功", body = ReferralCodeResponse),
        (status = 404, description = "活动不存在")
    )
)]
pub async fn create_referral_code(
    campaign_service: web::Data<CampaignService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<CreateReferralCodeRequest>,
) -> Result<HttpResponse> {
    let business_id = get_actor_id_from_request(&req).unwrap_or(0);

    match campaign_service
        .create_referral_code(path.into_inner(), business_id, request.into_inner())
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
    path = "/referral-codes/{code}",
    tag = "campaign",
    params(
        ("code" = String, Path, description = "推荐码")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "解析推荐码成功", body = ReferralCodeResponse),
        (status = 404, description = "推荐码不存在")
    )
)]
pub async fn get_referral_code(
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match campaign_service
        .get_referral_code_by_code(&path.into_inner())
        .await
    {
        Ok(code) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success(ReferralCodeResponse::from(code)))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn campaign_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/campaigns")
            .route("", web::post().to(create_campaign))
            .route("", web::get().to(list_campaigns))
            .route("/{id}", web::get().to(get_campaign))
            .route("/{id}/status", web::post().to(update_campaign_status))
            .route("/{id}/referral-codes", web::post().to(create_referral_code)),
    )
    .service(
        web::scope("/referral-codes").route("/{code}", web::get().to(get_referral_code)),
    );
}
