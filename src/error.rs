use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 守护更新竞争失败：目标行已被别的请求处理过（与校验错误严格区分）
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    /// 积分不足，带上所需/可用数量方便前端精确提示
    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientPoints { required: i64, available: i64 },

    /// 推荐码用量达到上限或活动积分池耗尽
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// 活动存在但当前不可结算（状态或时间窗不满足），与 NotFound 区分
    #[error("Campaign inactive: {0}")]
    CampaignInactive(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (StatusCode::UNAUTHORIZED, "AUTH_ERROR", msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Forbidden(msg) => {
                log::warn!("Forbidden: {msg}");
                (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
            }
            AppError::AlreadyProcessed(msg) => {
                log::warn!("Already processed: {msg}");
                (StatusCode::CONFLICT, "ALREADY_PROCESSED", msg.clone())
            }
            AppError::InsufficientPoints { .. } => (
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_POINTS",
                self.to_string(),
            ),
            AppError::LimitExceeded(msg) => {
                (StatusCode::BAD_REQUEST, "LIMIT_EXCEEDED", msg.clone())
            }
            AppError::CampaignInactive(msg) => {
                (StatusCode::NOT_FOUND, "CAMPAIGN_INACTIVE", msg.clone())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}
