use crate::types::common::u256_to_decimal;
use chrono::NaiveDateTime;
use entity::{chain_events, sea_orm_active_enums::EventKind};
use ethers::types::{Address, H256, U256};

/// A normalized pool contract event, one per transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolEvent {
    pub transaction_hash: H256,
    pub block_number: u64,
    pub block_timestamp: NaiveDateTime,
    pub kind: EventKind,
    pub actor: Address,
    /// Referrer for joins, raid target for raids. `None` when the event
    /// does not carry one or the raid target could not be recovered.
    pub counterpart: Option<Address>,
    /// Shares stolen for raids, shares claimed for claims. Micro-units.
    pub shares_amount: Option<U256>,
    pub self_penalty: Option<U256>,
    pub fee_paid: Option<U256>,
}

impl PoolEvent {
    pub fn is_raid(&self) -> bool {
        matches!(self.kind, EventKind::Raid | EventKind::HighStakesRaid)
    }
}

impl From<PoolEvent> for chain_events::Model {
    fn from(v: PoolEvent) -> Self {
        Self {
            transaction_hash: v.transaction_hash.as_bytes().to_vec(),
            block_number: v.block_number as i64,
            block_timestamp: v.block_timestamp,
            kind: v.kind,
            actor: v.actor.as_bytes().to_vec(),
            counterpart: v.counterpart.map(|a| a.as_bytes().to_vec()),
            shares_amount: v.shares_amount.map(u256_to_decimal),
            self_penalty: v.self_penalty.map(u256_to_decimal),
            fee_paid: v.fee_paid.map(u256_to_decimal),
            processed: false,
            inserted_at: Default::default(),
            updated_at: Default::default(),
        }
    }
}
