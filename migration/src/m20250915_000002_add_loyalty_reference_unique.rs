use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum LoyaltyTransactions {
    Table,
    LoyaltyId,
    ReferenceId,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// credit/debit 以 reference_id 去重后，同一账本内 reference 必须唯一，
/// 数据库层兜底防止并发重试写出两条同源流水
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_loyalty_transactions_reference_unique")
                    .table(LoyaltyTransactions::Table)
                    .col(LoyaltyTransactions::LoyaltyId)
                    .col(LoyaltyTransactions::ReferenceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_loyalty_transactions_reference_unique")
                    .table(LoyaltyTransactions::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
