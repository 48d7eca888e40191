use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    CampaignStatus, CampaignType, LoyaltyTransactionType, RedemptionStatus, VisitStatus,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::campaign::create_campaign,
        handlers::campaign::list_campaigns,
        handlers::campaign::get_campaign,
        handlers::campaign::update_campaign_status,
        handlers::campaign::create_referral_code,
        handlers::campaign::get_referral_code,
        handlers::visit::verify_visit,
        handlers::visit::approve_visit,
        handlers::visit::reject_visit,
        handlers::visit::get_visit,
        handlers::visit::list_visits,
        handlers::loyalty::get_balance,
        handlers::loyalty::list_transactions,
        handlers::redemption::redeem,
        handlers::redemption::verify_reward,
        handlers::redemption::complete_redemption,
        handlers::redemption::list_redemptions,
    ),
    components(
        schemas(
            CampaignType,
            CampaignStatus,
            VisitStatus,
            LoyaltyTransactionType,
            RedemptionStatus,
            CreateCampaignRequest,
            UpdateCampaignStatusRequest,
            CampaignQuery,
            CampaignResponse,
            CreateReferralCodeRequest,
            ReferralCodeResponse,
            VerifyVisitRequest,
            VisitActionRequest,
            VisitQuery,
            VisitResponse,
            VerifyVisitResponse,
            BalanceQuery,
            LoyaltyBalanceResponse,
            LoyaltyTransactionQuery,
            LoyaltyTransactionResponse,
            RedeemRequest,
            VerifyRewardQuery,
            RedemptionQuery,
            RedemptionResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "campaign", description = "Campaign directory API"),
        (name = "visit", description = "Visit verification and approval API"),
        (name = "loyalty", description = "Loyalty points ledger API"),
        (name = "redemption", description = "Reward redemption API"),
    ),
    info(
        title = "Promolink Backend API",
        version = "1.0.0",
        description = "Visit/redemption ledger engine REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
