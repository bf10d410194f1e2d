use anyhow::Error;
use entity::indexer_cursors::Entity;
use sea_orm::{ConnectionTrait, EntityTrait, Statement};

pub async fn get<C: ConnectionTrait>(db: &C, id: &str) -> Result<Option<i64>, Error> {
    let cursor = Entity::find_by_id(id.to_string()).one(db).await?;
    Ok(cursor.map(|c| c.last_block))
}

/// Moves the cursor forward. A concurrent writer can never move it back:
/// the stored value only grows.
pub async fn advance<C: ConnectionTrait>(db: &C, id: &str, last_block: u64) -> Result<(), Error> {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        r#"
INSERT INTO indexer_cursors (id, last_block, updated_at)
VALUES ($1, $2, (now() at time zone 'utc'))
ON CONFLICT (id) DO UPDATE
SET last_block = GREATEST(indexer_cursors.last_block, EXCLUDED.last_block),
    updated_at = (now() at time zone 'utc')"#,
        [id.into(), (last_block as i64).into()],
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tests::init_db;

    #[tokio::test]
    async fn advance_is_monotonic() {
        let db = init_db("cursors_advance_is_monotonic").await;
        let db = db.client();

        assert_eq!(get(db.as_ref(), "pool_events").await.unwrap(), None);

        advance(db.as_ref(), "pool_events", 100).await.unwrap();
        assert_eq!(get(db.as_ref(), "pool_events").await.unwrap(), Some(100));

        advance(db.as_ref(), "pool_events", 250).await.unwrap();
        assert_eq!(get(db.as_ref(), "pool_events").await.unwrap(), Some(250));

        // a late writer with an older window must not rewind the cursor
        advance(db.as_ref(), "pool_events", 180).await.unwrap();
        assert_eq!(get(db.as_ref(), "pool_events").await.unwrap(), Some(250));
    }
}
