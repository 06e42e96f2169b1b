use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Well-known test configs backing the difficulty endpoint. Stimulus
/// pools are generated into these on demand.
const DIFFICULTY_SEEDS: [(i32, &str); 3] = [(1, "Easy"), (3, "Medium"), (4, "Hard")];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(PasswordResetTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ItemConfigs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(TestConfigs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(TestConfigItems)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ItemConfigResults)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(TestConfigResults)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();

        for (id, name) in DIFFICULTY_SEEDS {
            let insert = sea_orm_migration::sea_query::Query::insert()
                .into_table(TestConfigs)
                .columns([
                    crate::entities::test_configs::Column::Id,
                    crate::entities::test_configs::Column::Created,
                    crate::entities::test_configs::Column::Name,
                ])
                .values_panic([
                    id.into(),
                    now.clone().into(),
                    format!("{name} TestConfig").into(),
                ])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TestConfigResults).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ItemConfigResults).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TestConfigItems).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TestConfigs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ItemConfigs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PasswordResetTokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
