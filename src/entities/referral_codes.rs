use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "referral_codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub campaign_id: i64,
    pub influencer_id: i64,
    pub code: String,
    pub usage_count: i64,
    pub usage_limit: Option<i64>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// usage_limit 为 NULL 时不限量
    pub fn has_capacity(&self) -> bool {
        match self.usage_limit {
            None => true,
            Some(limit) => self.usage_count < limit,
        }
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|e| e > now)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Model {
        Model {
            id: 1,
            campaign_id: 2,
            influencer_id: 3,
            code: "A1B2C3D4".to_string(),
            usage_count: 0,
            usage_limit: Some(5),
            is_active: true,
            expires_at: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_capacity() {
        let mut code = sample();
        assert!(code.has_capacity());

        code.usage_count = 5;
        assert!(!code.has_capacity());

        // 无上限
        code.usage_limit = None;
        assert!(code.has_capacity());
    }

    #[test]
    fn test_usable_at() {
        let mut code = sample();
        let now = Utc::now();
        assert!(code.is_usable_at(now));

        code.expires_at = Some(now - Duration::hours(1));
        assert!(!code.is_usable_at(now));

        code.expires_at = Some(now + Duration::hours(1));
        assert!(code.is_usable_at(now));

        code.is_active = false;
        assert!(!code.is_usable_at(now));
    }
}
