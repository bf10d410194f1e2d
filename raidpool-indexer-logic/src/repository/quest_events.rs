use crate::types::quest::QuestPayload;
use anyhow::Error;
use entity::{
    quest_events::{ActiveModel, Column, Entity, Model},
    sea_orm_active_enums::EventKind,
};
use sea_orm::{
    sea_query::OnConflict, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Appends an outbox row for the transaction. The unique constraint on the
/// transaction hash makes this idempotent: re-running the same window adds
/// nothing. Returns whether a new row was written.
pub async fn enqueue<C: ConnectionTrait>(
    db: &C,
    transaction_hash: &[u8],
    kind: EventKind,
    actor: &[u8],
    payload: &QuestPayload,
) -> Result<bool, Error> {
    let active = ActiveModel {
        id: ActiveValue::NotSet,
        transaction_hash: ActiveValue::Set(transaction_hash.to_vec()),
        kind: ActiveValue::Set(kind),
        actor: ActiveValue::Set(actor.to_vec()),
        payload: ActiveValue::Set(serde_json::to_value(payload)?),
        processed: ActiveValue::Set(false),
        created_at: ActiveValue::NotSet,
    };
    let inserted = Entity::insert(active)
        .on_conflict(
            OnConflict::column(Column::TransactionHash)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(inserted > 0)
}

/// Oldest unprocessed rows first, in a stable order.
pub async fn next_batch<C: ConnectionTrait>(db: &C, limit: u64) -> Result<Vec<Model>, Error> {
    let batch = Entity::find()
        .filter(Column::Processed.eq(false))
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .limit(limit)
        .all(db)
        .await?;
    Ok(batch)
}

pub async fn mark_processed<C: ConnectionTrait>(db: &C, id: i64) -> Result<(), Error> {
    Entity::update_many()
        .col_expr(Column::Processed, sea_orm::sea_query::Expr::value(true))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}
