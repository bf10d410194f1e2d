use crate::types::common::u256_to_decimal;
use anyhow::Error;
use entity::users::{Entity, Model};
use ethers::types::{Address, U256};
use sea_orm::{ConnectionTrait, EntityTrait, Statement};

/// Overwrites the cached share balance with an authoritative onchain read.
pub async fn set_shares<C: ConnectionTrait>(
    db: &C,
    address: Address,
    shares: U256,
) -> Result<(), Error> {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        r#"
INSERT INTO users (address, shares, last_seen_at)
VALUES ($1, $2, (now() at time zone 'utc'))
ON CONFLICT (address) DO UPDATE
SET shares = EXCLUDED.shares,
    last_seen_at = (now() at time zone 'utc')"#,
        [
            address.as_bytes().into(),
            u256_to_decimal(shares).into(),
        ],
    ))
    .await?;
    Ok(())
}

/// Applies an event delta when the onchain read is unavailable. Balances are
/// clamped at zero rather than allowed to go negative.
pub async fn adjust_shares<C: ConnectionTrait>(
    db: &C,
    address: Address,
    amount: U256,
    gain: bool,
) -> Result<(), Error> {
    let delta = if gain {
        u256_to_decimal(amount)
    } else {
        -u256_to_decimal(amount)
    };
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        r#"
INSERT INTO users (address, shares, last_seen_at)
VALUES ($1, GREATEST($2, 0), (now() at time zone 'utc'))
ON CONFLICT (address) DO UPDATE
SET shares = GREATEST(users.shares + $2, 0),
    last_seen_at = (now() at time zone 'utc')"#,
        [address.as_bytes().into(), delta.into()],
    ))
    .await?;
    Ok(())
}

/// Creates the row if needed and bumps the activity timestamp.
pub async fn touch<C: ConnectionTrait>(db: &C, address: Address) -> Result<(), Error> {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        r#"
INSERT INTO users (address, last_seen_at)
VALUES ($1, (now() at time zone 'utc'))
ON CONFLICT (address) DO UPDATE
SET last_seen_at = (now() at time zone 'utc')"#,
        [address.as_bytes().into()],
    ))
    .await?;
    Ok(())
}

pub async fn add_reputation<C: ConnectionTrait>(
    db: &C,
    address: Address,
    points: i64,
) -> Result<(), Error> {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        r#"
INSERT INTO users (address, reputation, last_seen_at)
VALUES ($1, $2, (now() at time zone 'utc'))
ON CONFLICT (address) DO UPDATE
SET reputation = users.reputation + EXCLUDED.reputation,
    last_seen_at = (now() at time zone 'utc')"#,
        [address.as_bytes().into(), points.into()],
    ))
    .await?;
    Ok(())
}

pub async fn find_by_address<C: ConnectionTrait>(
    db: &C,
    address: Address,
) -> Result<Option<Model>, Error> {
    let user = Entity::find_by_id(address.as_bytes().to_vec()).one(db).await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tests::{addr, init_db};
    use pretty_assertions::assert_eq;
    use sea_orm::prelude::BigDecimal;

    #[tokio::test]
    async fn share_updates_prefer_authoritative_reads() {
        let db = init_db("users_share_updates").await;
        let db = db.client();
        let user = addr(1);

        adjust_shares(db.as_ref(), user, U256::from(100), true)
            .await
            .unwrap();
        let stored = find_by_address(db.as_ref(), user).await.unwrap().unwrap();
        assert_eq!(stored.shares, BigDecimal::from(100));

        set_shares(db.as_ref(), user, U256::from(42)).await.unwrap();
        let stored = find_by_address(db.as_ref(), user).await.unwrap().unwrap();
        assert_eq!(stored.shares, BigDecimal::from(42));
    }

    #[tokio::test]
    async fn losses_clamp_at_zero() {
        let db = init_db("users_losses_clamp").await;
        let db = db.client();
        let victim = addr(2);

        // losing before any tracked balance must not go negative
        adjust_shares(db.as_ref(), victim, U256::from(500), false)
            .await
            .unwrap();
        let stored = find_by_address(db.as_ref(), victim).await.unwrap().unwrap();
        assert_eq!(stored.shares, BigDecimal::from(0));

        set_shares(db.as_ref(), victim, U256::from(30)).await.unwrap();
        adjust_shares(db.as_ref(), victim, U256::from(500), false)
            .await
            .unwrap();
        let stored = find_by_address(db.as_ref(), victim).await.unwrap().unwrap();
        assert_eq!(stored.shares, BigDecimal::from(0));
    }

    #[tokio::test]
    async fn reputation_accumulates() {
        let db = init_db("users_reputation").await;
        let db = db.client();
        let user = addr(3);

        add_reputation(db.as_ref(), user, 50).await.unwrap();
        add_reputation(db.as_ref(), user, 25).await.unwrap();
        let stored = find_by_address(db.as_ref(), user).await.unwrap().unwrap();
        assert_eq!(stored.reputation, 75);
    }
}
