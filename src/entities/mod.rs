pub mod campaigns;
pub mod loyalty_points;
pub mod loyalty_transactions;
pub mod referral_codes;
pub mod reward_redemptions;
pub mod visits;

pub use campaigns as campaign_entity;
pub use loyalty_points as loyalty_point_entity;
pub use loyalty_transactions as loyalty_transaction_entity;
pub use referral_codes as referral_code_entity;
pub use reward_redemptions as reward_redemption_entity;
pub use visits as visit_entity;

pub use campaigns::{CampaignKind, CampaignStatus, CampaignType};
pub use loyalty_transactions::LoyaltyTransactionType;
pub use reward_redemptions::RedemptionStatus;
pub use visits::VisitStatus;
