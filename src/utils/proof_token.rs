//! 扫码凭证编解码。
//!
//! 负载为 JSON + URL 安全 base64（无填充），`kind` 字段区分到访凭证与
//! 兑换核销凭证，两种流程的令牌互不混用。编解码只保证结构合法，
//! 不做签名；真实性由下游校验（活动有效、绑定合理、与库中凭证一致）。

use crate::error::{AppError, AppResult};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

const INVALID_TOKEN: &str = "Invalid proof token";

/// 到访凭证：活动、推广方、顾客三元组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitProof {
    pub campaign_id: i64,
    pub influencer_id: i64,
    pub customer_id: i64,
}

/// 兑换核销凭证；issued_at_ms 为签发毫秒时间戳，与兑换 ID 一起
/// 保证不同兑换的令牌必然不同
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionProof {
    pub redemption_id: i64,
    pub customer_id: i64,
    pub business_id: i64,
    pub issued_at_ms: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ProofPayload {
    Visit(VisitProof),
    Reward(RedemptionProof),
}

fn encode(payload: &ProofPayload) -> AppResult<String> {
    let json = serde_json::to_vec(payload)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode(token: &str) -> AppResult<ProofPayload> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| AppError::ValidationError(INVALID_TOKEN.to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| AppError::ValidationError(INVALID_TOKEN.to_string()))
}

pub fn encode_visit_proof(
    campaign_id: i64,
    influencer_id: i64,
    customer_id: i64,
) -> AppResult<String> {
    encode(&ProofPayload::Visit(VisitProof {
        campaign_id,
        influencer_id,
        customer_id,
    }))
}

pub fn decode_visit_proof(token: &str) -> AppResult<VisitProof> {
    match decode(token)? {
        ProofPayload::Visit(proof) => Ok(proof),
        // 拿兑换凭证冒充到访凭证，一律按格式错误处理
        ProofPayload::Reward(_) => Err(AppError::ValidationError(INVALID_TOKEN.to_string())),
    }
}

pub fn encode_redemption_proof(
    redemption_id: i64,
    customer_id: i64,
    business_id: i64,
    issued_at_ms: i64,
) -> AppResult<String> {
    encode(&ProofPayload::Reward(RedemptionProof {
        redemption_id,
        customer_id,
        business_id,
        issued_at_ms,
    }))
}

pub fn decode_redemption_proof(token: &str) -> AppResult<RedemptionProof> {
    match decode(token)? {
        ProofPayload::Reward(proof) => Ok(proof),
        ProofPayload::Visit(_) => Err(AppError::ValidationError(INVALID_TOKEN.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_proof_roundtrip() {
        let token = encode_visit_proof(42, 7, 1001).unwrap();
        let proof = decode_visit_proof(&token).unwrap();
        assert_eq!(
            proof,
            VisitProof {
                campaign_id: 42,
                influencer_id: 7,
                customer_id: 1001,
            }
        );
    }

    #[test]
    fn test_redemption_proof_roundtrip() {
        let token = encode_redemption_proof(9, 1001, 3, 1_700_000_000_000).unwrap();
        let proof = decode_redemption_proof(&token).unwrap();
        assert_eq!(proof.redemption_id, 9);
        assert_eq!(proof.customer_id, 1001);
        assert_eq!(proof.business_id, 3);
        assert_eq!(proof.issued_at_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        // 非 base64、非 JSON、截断：都必须是格式错误，绝不能当作 pending
        assert!(decode_visit_proof("not@@base64!!").is_err());

        let garbage = URL_SAFE_NO_PAD.encode(b"hello world");
        assert!(decode_visit_proof(&garbage).is_err());

        let token = encode_visit_proof(1, 2, 3).unwrap();
        let truncated = &token[..token.len() / 2];
        assert!(decode_visit_proof(truncated).is_err());
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let visit_token = encode_visit_proof(1, 2, 3).unwrap();
        assert!(decode_redemption_proof(&visit_token).is_err());

        let reward_token = encode_redemption_proof(1, 2, 3, 4).unwrap();
        assert!(decode_visit_proof(&reward_token).is_err());
    }

    #[test]
    fn test_redemption_tokens_unique_per_redemption() {
        // 同一顾客同一商家的两次兑换，令牌必然不同
        let a = encode_redemption_proof(1, 1001, 3, 1_700_000_000_000).unwrap();
        let b = encode_redemption_proof(2, 1001, 3, 1_700_000_000_001).unwrap();
        assert_ne!(a, b);
    }
}
