use crate::types::event::PoolEvent;
use anyhow::Error;
use entity::chain_events::{ActiveModel, Column, Entity, Model};
use ethers::types::H256;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Statement,
};
use std::time::Duration;

/// Inserts the event keyed by transaction hash. On conflict only fields the
/// stored row is missing are filled in, so a degraded row gets enriched by a
/// later structured decode while `processed` and already known amounts stay
/// untouched.
pub async fn upsert<C: ConnectionTrait>(db: &C, event: &PoolEvent) -> Result<(), Error> {
    let model: Model = event.clone().into();
    let mut active: ActiveModel = model.into();
    active.processed = ActiveValue::NotSet;
    active.inserted_at = ActiveValue::NotSet;
    active.updated_at = ActiveValue::NotSet;

    Entity::insert(active)
        .on_conflict(
            OnConflict::column(Column::TransactionHash)
                .value(
                    Column::Counterpart,
                    Expr::cust(r#"COALESCE("chain_events"."counterpart", "excluded"."counterpart")"#),
                )
                .value(
                    Column::SharesAmount,
                    Expr::cust(
                        r#"COALESCE("chain_events"."shares_amount", "excluded"."shares_amount")"#,
                    ),
                )
                .value(
                    Column::SelfPenalty,
                    Expr::cust(
                        r#"COALESCE("chain_events"."self_penalty", "excluded"."self_penalty")"#,
                    ),
                )
                .value(
                    Column::FeePaid,
                    Expr::cust(r#"COALESCE("chain_events"."fee_paid", "excluded"."fee_paid")"#),
                )
                .value(Column::UpdatedAt, Expr::cust("(now() at time zone 'utc')"))
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn mark_processed<C: ConnectionTrait>(db: &C, transaction_hash: H256) -> Result<(), Error> {
    Entity::update_many()
        .col_expr(Column::Processed, Expr::value(true))
        .col_expr(
            Column::UpdatedAt,
            Expr::cust("(now() at time zone 'utc')").into(),
        )
        .filter(Column::TransactionHash.eq(transaction_hash.as_bytes().to_vec()))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn find_by_transaction_hash<C: ConnectionTrait>(
    db: &C,
    transaction_hash: H256,
) -> Result<Option<Model>, Error> {
    let event = Entity::find_by_id(transaction_hash.as_bytes().to_vec())
        .one(db)
        .await?;
    Ok(event)
}

/// Events that were committed as processed but have no outbox row. These are
/// the rows the reconciliation sweep has to heal.
pub async fn find_processed_without_outbox<C: ConnectionTrait>(
    db: &C,
    window: Duration,
) -> Result<Vec<Model>, Error> {
    let events = Entity::find()
        .from_raw_sql(Statement::from_sql_and_values(
            db.get_database_backend(),
            r#"
SELECT chain_events.transaction_hash, chain_events.block_number, chain_events.block_timestamp,
       chain_events.kind::text AS kind, chain_events.actor, chain_events.counterpart,
       chain_events.shares_amount, chain_events.self_penalty, chain_events.fee_paid,
       chain_events.processed, chain_events.inserted_at, chain_events.updated_at
FROM chain_events
LEFT JOIN quest_events ON quest_events.transaction_hash = chain_events.transaction_hash
WHERE chain_events.processed
  AND quest_events.id IS NULL
  AND chain_events.inserted_at >= (now() at time zone 'utc') - make_interval(secs => $1)
ORDER BY chain_events.inserted_at, chain_events.transaction_hash"#,
            [(window.as_secs_f64()).into()],
        ))
        .all(db)
        .await?;
    Ok(events)
}
