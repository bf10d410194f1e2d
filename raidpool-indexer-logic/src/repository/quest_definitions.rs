use anyhow::Error;
use entity::{
    quest_definitions::{Column, Entity, Model},
    sea_orm_active_enums::EventKind,
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

pub async fn active_for_kinds<C: ConnectionTrait>(
    db: &C,
    kinds: &[EventKind],
) -> Result<Vec<Model>, Error> {
    let definitions = Entity::find()
        .filter(Column::Active.eq(true))
        .filter(Column::EventKind.is_in(kinds.iter().cloned()))
        .all(db)
        .await?;
    Ok(definitions)
}
