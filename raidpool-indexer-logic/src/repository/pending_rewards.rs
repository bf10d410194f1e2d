use anyhow::Error;
use entity::pending_rewards::{ActiveModel, Column, Entity, Model};
use sea_orm::{
    prelude::BigDecimal, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};

pub async fn enqueue<C: ConnectionTrait>(
    db: &C,
    user_address: &[u8],
    quest_id: i32,
    shares: &BigDecimal,
) -> Result<(), Error> {
    let active = ActiveModel {
        id: ActiveValue::NotSet,
        user_address: ActiveValue::Set(user_address.to_vec()),
        quest_id: ActiveValue::Set(quest_id),
        shares: ActiveValue::Set(shares.clone()),
        released: ActiveValue::Set(false),
        created_at: ActiveValue::NotSet,
    };
    Entity::insert(active).exec_without_returning(db).await?;
    Ok(())
}

pub async fn unreleased_for_user<C: ConnectionTrait>(
    db: &C,
    user_address: &[u8],
) -> Result<Vec<Model>, Error> {
    let rewards = Entity::find()
        .filter(Column::UserAddress.eq(user_address.to_vec()))
        .filter(Column::Released.eq(false))
        .all(db)
        .await?;
    Ok(rewards)
}
