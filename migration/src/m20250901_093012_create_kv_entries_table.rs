use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(KvEntries::Table)
                    .if_not_exists()
                    .col(string(KvEntries::Namespace))
                    .col(string(KvEntries::Key))
                    .col(text(KvEntries::Value))
                    .col(timestamp_with_time_zone(KvEntries::UpdatedAt))
                    .primary_key(
                        Index::create()
                            .name("pk_kv_entries")
                            .col(KvEntries::Namespace)
                            .col(KvEntries::Key),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(KvEntries::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum KvEntries {
    Table,
    Namespace,
    Key,
    Value,
    UpdatedAt,
}
