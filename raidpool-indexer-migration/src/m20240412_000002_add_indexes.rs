use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            CREATE INDEX "quest_events_unprocessed_created_at_index" ON "quest_events" ("created_at", "id") WHERE "processed" = false;

            CREATE INDEX "chain_events_block_number_index" ON "chain_events" ("block_number");

            CREATE INDEX "chain_events_processed_inserted_at_index" ON "chain_events" ("inserted_at") WHERE "processed" = true;

            CREATE INDEX "quest_definitions_event_kind_index" ON "quest_definitions" ("event_kind") WHERE "active" = true
        "#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            DROP INDEX "quest_definitions_event_kind_index";
            DROP INDEX "chain_events_processed_inserted_at_index";
            DROP INDEX "chain_events_block_number_index";
            DROP INDEX "quest_events_unprocessed_created_at_index"
        "#;

        crate::from_sql(manager, sql).await
    }
}
