use crate::types::event::PoolEvent;
use blockscout_service_launcher::test_database::TestDbGuard;
use chrono::NaiveDateTime;
use entity::sea_orm_active_enums::EventKind;
use ethers::types::{Address, H256, U256};

pub async fn init_db(test_name: &str) -> TestDbGuard {
    TestDbGuard::new::<migration::Migrator>(test_name).await
}

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn tx_hash(n: u64) -> H256 {
    H256::from_low_u64_be(n)
}

pub fn timestamp(secs: i64) -> NaiveDateTime {
    chrono::DateTime::from_timestamp(secs, 0).unwrap().naive_utc()
}

pub fn raid_event(tx: u64, attacker: u64, target: Option<u64>, stolen: u64) -> PoolEvent {
    PoolEvent {
        transaction_hash: tx_hash(tx),
        block_number: 100,
        block_timestamp: timestamp(1_700_000_000),
        kind: EventKind::Raid,
        actor: addr(attacker),
        counterpart: target.map(addr),
        shares_amount: Some(U256::from(stolen)),
        self_penalty: Some(U256::from(stolen / 10)),
        fee_paid: None,
    }
}

pub fn join_event(tx: u64, player: u64, referrer: Option<u64>) -> PoolEvent {
    PoolEvent {
        transaction_hash: tx_hash(tx),
        block_number: 100,
        block_timestamp: timestamp(1_700_000_000),
        kind: EventKind::Join,
        actor: addr(player),
        counterpart: referrer.map(addr),
        shares_amount: None,
        self_penalty: None,
        fee_paid: Some(U256::from(5_000_000u64)),
    }
}

pub fn claim_event(tx: u64, player: u64, amount: u64) -> PoolEvent {
    PoolEvent {
        transaction_hash: tx_hash(tx),
        block_number: 100,
        block_timestamp: timestamp(1_700_000_000),
        kind: EventKind::Claim,
        actor: addr(player),
        counterpart: None,
        shares_amount: Some(U256::from(amount)),
        self_penalty: None,
        fee_paid: None,
    }
}
