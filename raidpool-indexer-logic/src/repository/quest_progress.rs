use anyhow::{anyhow, Error};
use entity::{
    quest_definitions,
    quest_progress::{ActiveModel, Column, Entity},
};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ActiveValue, ConnectionTrait, EntityTrait,
    QuerySelect,
};

#[derive(Debug, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub current_count: i32,
    pub newly_completed: bool,
}

/// Increments the counter for one user and quest within the given period.
/// The row is locked for the duration of the surrounding transaction, and a
/// counter that already reached its target is frozen: the call returns `None`
/// and the caller must not grant anything.
pub async fn apply_increment<C: ConnectionTrait>(
    db: &C,
    user_address: &[u8],
    definition: &quest_definitions::Model,
    season: i64,
) -> Result<Option<ProgressUpdate>, Error> {
    let blank = ActiveModel {
        user_address: ActiveValue::Set(user_address.to_vec()),
        quest_id: ActiveValue::Set(definition.id),
        season: ActiveValue::Set(season),
        current_count: ActiveValue::Set(0),
        completed: ActiveValue::Set(false),
        claimed: ActiveValue::Set(false),
        updated_at: ActiveValue::NotSet,
    };
    Entity::insert(blank)
        .on_conflict(
            OnConflict::columns([Column::UserAddress, Column::QuestId, Column::Season])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let row = Entity::find_by_id((user_address.to_vec(), definition.id, season))
        .lock_exclusive()
        .one(db)
        .await?
        .ok_or_else(|| anyhow!("quest progress row missing right after upsert"))?;

    if row.completed {
        return Ok(None);
    }

    let current_count = row.current_count + definition.increment;
    let newly_completed = current_count >= definition.max_completions;

    let mut active: ActiveModel = row.into();
    active.current_count = ActiveValue::Set(current_count);
    active.completed = ActiveValue::Set(newly_completed);
    active.updated_at = ActiveValue::Set(chrono::Utc::now().naive_utc());
    active.update(db).await?;

    Ok(Some(ProgressUpdate {
        current_count,
        newly_completed,
    }))
}
