use rand::Rng;
use uuid::Uuid;

/// 生成8位大写字母数字推荐码（唯一性由调用方查库保证）
pub fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    (0..8)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

/// 兑换行插入时的占位凭证，提交前会替换为正式令牌
pub fn generate_proof_nonce() -> String {
    format!("rdm-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_referral_code() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 8);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_generate_proof_nonce_unique() {
        let a = generate_proof_nonce();
        let b = generate_proof_nonce();
        assert!(a.starts_with("rdm-"));
        assert_ne!(a, b);
    }
}
