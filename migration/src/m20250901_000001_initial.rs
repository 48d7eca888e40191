use sea_orm_migration::prelude::*;

/// Campaigns (商家出资的推广活动)
#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    OwnerBusinessId,
    Name,
    Description,
    CampaignType,
    Status,
    CreditsPerAction,
    PointsCost,
    TotalCredits,
    PeriodStart,
    PeriodEnd,
    CreatedAt,
    UpdatedAt,
}

/// Referral Codes (签发给推广方的推荐码)
#[derive(DeriveIden)]
enum ReferralCodes {
    Table,
    Id,
    CampaignId,
    InfluencerId,
    Code,
    UsageCount,
    UsageLimit,
    IsActive,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}

/// Visits (扫码核验产生的到访记录)
#[derive(DeriveIden)]
enum Visits {
    Table,
    Id,
    CampaignId,
    InfluencerId,
    CustomerId,
    BusinessId,
    ReferralCodeId,
    Status,
    CreditsEarned,
    LoyaltyPointsEarned,
    CreatedAt,
    ApprovedAt,
}

/// Loyalty Points ((顾客, 商家) 维度的积分余额)
#[derive(DeriveIden)]
enum LoyaltyPoints {
    Table,
    Id,
    CustomerId,
    BusinessId,
    PointsBalance,
    TotalEarned,
    TotalSpent,
    CreatedAt,
    UpdatedAt,
}

/// Loyalty Transactions (追加写的积分流水)
#[derive(DeriveIden)]
enum LoyaltyTransactions {
    Table,
    Id,
    LoyaltyId,
    TransactionType,
    PointsAmount,
    Description,
    ReferenceId,
    CreatedAt,
}

/// Reward Redemptions (积分兑换与一次性核销凭证)
#[derive(DeriveIden)]
enum RewardRedemptions {
    Table,
    Id,
    CustomerId,
    BusinessId,
    CampaignId,
    PointsSpent,
    Status,
    QrProof,
    CreatedAt,
    RedeemedAt,
    ExpiresAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 活动表
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::OwnerBusinessId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Campaigns::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Campaigns::Description).text().null())
                    .col(
                        ColumnDef::new(Campaigns::CampaignType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::Status)
                            .string_len(32)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(Campaigns::CreditsPerAction).big_integer().null())
                    .col(ColumnDef::new(Campaigns::PointsCost).big_integer().null())
                    .col(
                        ColumnDef::new(Campaigns::TotalCredits)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::PeriodStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::PeriodEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 商家维度查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaigns_owner_business")
                    .table(Campaigns::Table)
                    .col(Campaigns::OwnerBusinessId)
                    .to_owned(),
            )
            .await?;

        // 推荐码表
        manager
            .create_table(
                Table::create()
                    .table(ReferralCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReferralCodes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReferralCodes::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReferralCodes::InfluencerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReferralCodes::Code).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ReferralCodes::UsageCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReferralCodes::UsageLimit)
                            .big_integer()
                            .null(), // NULL = 不限次数
                    )
                    .col(
                        ColumnDef::new(ReferralCodes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ReferralCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReferralCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(ReferralCodes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 推荐码唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_referral_codes_code_unique")
                    .table(ReferralCodes::Table)
                    .col(ReferralCodes::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // (活动, 推广方) 绑定查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_referral_codes_campaign_influencer")
                    .table(ReferralCodes::Table)
                    .col(ReferralCodes::CampaignId)
                    .col(ReferralCodes::InfluencerId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(ReferralCodes::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_referral_code_campaign")
                            .from_tbl(ReferralCodes::Table)
                            .from_col(ReferralCodes::CampaignId)
                            .to_tbl(Campaigns::Table)
                            .to_col(Campaigns::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 到访表
        manager
            .create_table(
                Table::create()
                    .table(Visits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Visits::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Visits::CampaignId).big_integer().not_null())
                    .col(ColumnDef::new(Visits::InfluencerId).big_integer().not_null())
                    .col(ColumnDef::new(Visits::CustomerId).big_integer().not_null())
                    .col(ColumnDef::new(Visits::BusinessId).big_integer().not_null())
                    .col(ColumnDef::new(Visits::ReferralCodeId).big_integer().null())
                    .col(
                        ColumnDef::new(Visits::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Visits::CreditsEarned)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Visits::LoyaltyPointsEarned)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Visits::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Visits::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 商家审批队列查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visits_business_status")
                    .table(Visits::Table)
                    .col(Visits::BusinessId)
                    .col(Visits::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Visits::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_visit_campaign")
                            .from_tbl(Visits::Table)
                            .from_col(Visits::CampaignId)
                            .to_tbl(Campaigns::Table)
                            .to_col(Campaigns::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 积分余额表
        manager
            .create_table(
                Table::create()
                    .table(LoyaltyPoints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoyaltyPoints::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPoints::CustomerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPoints::BusinessId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPoints::PointsBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPoints::TotalEarned)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPoints::TotalSpent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPoints::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPoints::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // (顾客, 商家) 唯一，一对一条余额行
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_loyalty_points_customer_business_unique")
                    .table(LoyaltyPoints::Table)
                    .col(LoyaltyPoints::CustomerId)
                    .col(LoyaltyPoints::BusinessId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 积分流水表
        manager
            .create_table(
                Table::create()
                    .table(LoyaltyTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoyaltyTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::LoyaltyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::TransactionType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::PointsAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LoyaltyTransactions::Description).text().null())
                    .col(
                        ColumnDef::new(LoyaltyTransactions::ReferenceId)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_loyalty_transactions_loyalty")
                    .table(LoyaltyTransactions::Table)
                    .col(LoyaltyTransactions::LoyaltyId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(LoyaltyTransactions::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_loyalty_transaction_ledger")
                            .from_tbl(LoyaltyTransactions::Table)
                            .from_col(LoyaltyTransactions::LoyaltyId)
                            .to_tbl(LoyaltyPoints::Table)
                            .to_col(LoyaltyPoints::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // 兑换表
        manager
            .create_table(
                Table::create()
                    .table(RewardRedemptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RewardRedemptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::CustomerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::BusinessId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::PointsSpent)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::QrProof)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::RedeemedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RewardRedemptions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 一次性凭证唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reward_redemptions_qr_proof_unique")
                    .table(RewardRedemptions::Table)
                    .col(RewardRedemptions::QrProof)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reward_redemptions_customer")
                    .table(RewardRedemptions::Table)
                    .col(RewardRedemptions::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(RewardRedemptions::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_reward_redemption_campaign")
                            .from_tbl(RewardRedemptions::Table)
                            .from_col(RewardRedemptions::CampaignId)
                            .to_tbl(Campaigns::Table)
                            .to_col(Campaigns::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：流水 -> 兑换 -> 余额 -> 到访 -> 推荐码 -> 活动
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(LoyaltyTransactions::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(RewardRedemptions::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(LoyaltyPoints::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Visits::Table).to_owned())
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(ReferralCodes::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Campaigns::Table).to_owned())
            .await?;

        Ok(())
    }
}
