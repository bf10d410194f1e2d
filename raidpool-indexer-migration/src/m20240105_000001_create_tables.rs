use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            CREATE TYPE "event_kind" AS ENUM ('join', 'raid', 'high_stakes_raid', 'claim');

            CREATE TYPE "reset_frequency" AS ENUM ('daily', 'weekly', 'seasonal', 'one_time');

            CREATE TABLE "chain_events" (
                "transaction_hash" bytea PRIMARY KEY,
                "block_number" bigint NOT NULL,
                "block_timestamp" timestamp NOT NULL,
                "kind" event_kind NOT NULL,
                "actor" bytea NOT NULL,
                "counterpart" bytea,
                "shares_amount" numeric(78, 0),
                "self_penalty" numeric(78, 0),
                "fee_paid" numeric(78, 0),
                "processed" boolean NOT NULL DEFAULT false,
                "inserted_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc'),
                "updated_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc')
            );

            CREATE TABLE "indexer_cursors" (
                "id" text PRIMARY KEY,
                "last_block" bigint NOT NULL,
                "updated_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc')
            );

            CREATE TABLE "quest_events" (
                "id" bigserial PRIMARY KEY,
                "transaction_hash" bytea NOT NULL UNIQUE references "chain_events"("transaction_hash"),
                "kind" event_kind NOT NULL,
                "actor" bytea NOT NULL,
                "payload" jsonb NOT NULL,
                "processed" boolean NOT NULL DEFAULT false,
                "created_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc')
            );

            CREATE TABLE "quest_definitions" (
                "id" serial PRIMARY KEY,
                "slug" text NOT NULL UNIQUE,
                "event_kind" event_kind NOT NULL,
                "reset_frequency" reset_frequency NOT NULL,
                "max_completions" integer NOT NULL,
                "increment" integer NOT NULL DEFAULT 1,
                "reward_reputation" bigint NOT NULL DEFAULT 0,
                "reward_shares" numeric(78, 0) NOT NULL DEFAULT 0,
                "active" boolean NOT NULL DEFAULT true
            );

            CREATE TABLE "quest_progress" (
                "user_address" bytea NOT NULL,
                "quest_id" integer NOT NULL references "quest_definitions"("id"),
                "season" bigint NOT NULL,
                "current_count" integer NOT NULL DEFAULT 0,
                "completed" boolean NOT NULL DEFAULT false,
                "claimed" boolean NOT NULL DEFAULT false,
                "updated_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc'),
                PRIMARY KEY ("user_address", "quest_id", "season")
            );

            CREATE TABLE "users" (
                "address" bytea PRIMARY KEY,
                "shares" numeric(78, 0) NOT NULL DEFAULT 0,
                "reputation" bigint NOT NULL DEFAULT 0,
                "last_seen_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc')
            );

            CREATE TABLE "pending_rewards" (
                "id" bigserial PRIMARY KEY,
                "user_address" bytea NOT NULL,
                "quest_id" integer NOT NULL references "quest_definitions"("id"),
                "shares" numeric(78, 0) NOT NULL,
                "released" boolean NOT NULL DEFAULT false,
                "created_at" timestamp NOT NULL DEFAULT (now() at time zone 'utc')
            );

            COMMENT ON TABLE "chain_events" IS 'Normalized pool contract events, one row per transaction';

            COMMENT ON TABLE "quest_events" IS 'Outbox queue consumed by the quest engine'
        "#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            DROP TABLE "pending_rewards";
            DROP TABLE "users";
            DROP TABLE "quest_progress";
            DROP TABLE "quest_definitions";
            DROP TABLE "quest_events";
            DROP TABLE "indexer_cursors";
            DROP TABLE "chain_events";
            DROP TYPE "reset_frequency";
            DROP TYPE "event_kind"
        "#;

        crate::from_sql(manager, sql).await
    }
}
