use crate::{
    indexer::client::{ClaimFilter, JoinFilter},
    types::event::PoolEvent,
};
use anyhow::{anyhow, bail, Result};
use chrono::NaiveDateTime;
use entity::sea_orm_active_enums::EventKind;
use ethers::{
    contract::{parse_log, EthEvent},
    types::{Address, Bytes, Log, H256, U256},
    utils::keccak256,
};
use lazy_static::lazy_static;

lazy_static! {
    /// The Raid event predates the published ABI, so it is matched by raw
    /// topic hash and unpacked by hand.
    pub static ref RAID_TOPIC: H256 =
        H256::from(keccak256("Raid(address,address,uint256,uint256)"));
    pub static ref TRANSFER_TOPIC: H256 =
        H256::from(keccak256("Transfer(address,address,uint256)"));
}

/// Join fees are emitted in whole share tokens. Everything stored and
/// compared downstream is in micro-units. A fee too large to scale is
/// saturated rather than dropping the event.
pub fn to_micro_units(amount: U256) -> U256 {
    amount
        .checked_mul(U256::from(1_000_000u64))
        .unwrap_or_else(|| {
            tracing::warn!(%amount, "fee overflows the micro-unit range, saturating");
            U256::MAX
        })
}

pub(crate) fn transaction_context(log: &Log) -> Result<(H256, u64)> {
    if log.removed == Some(true) {
        bail!("unexpected removed log");
    }
    let transaction_hash = log
        .transaction_hash
        .ok_or_else(|| anyhow!("log has no transaction hash"))?;
    let block_number = log
        .block_number
        .ok_or_else(|| anyhow!("log has no block number"))?
        .as_u64();
    Ok((transaction_hash, block_number))
}

/// Decodes one pool log into a normalized event. `sibling_logs` are the other
/// logs of the same receipt, consulted only to classify raids. Unknown topics
/// yield `None`.
pub fn decode(
    log: &Log,
    sibling_logs: &[Log],
    high_stakes_fee: U256,
    block_timestamp: NaiveDateTime,
) -> Result<Option<PoolEvent>> {
    let topic0 = match log.topics.first() {
        Some(topic0) => *topic0,
        None => return Ok(None),
    };

    if topic0 == JoinFilter::signature() {
        decode_join(log, block_timestamp).map(Some)
    } else if topic0 == ClaimFilter::signature() {
        decode_claim(log, block_timestamp).map(Some)
    } else if topic0 == *RAID_TOPIC {
        decode_raid(log, sibling_logs, high_stakes_fee, block_timestamp).map(Some)
    } else {
        Ok(None)
    }
}

fn decode_join(log: &Log, block_timestamp: NaiveDateTime) -> Result<PoolEvent> {
    let (transaction_hash, block_number) = transaction_context(log)?;
    let join: JoinFilter = parse_log(log.clone())?;
    Ok(PoolEvent {
        transaction_hash,
        block_number,
        block_timestamp,
        kind: EventKind::Join,
        actor: join.player,
        counterpart: Some(join.referrer).filter(|r| !r.is_zero()),
        shares_amount: None,
        self_penalty: None,
        fee_paid: Some(to_micro_units(join.amount_paid)),
    })
}

fn decode_claim(log: &Log, block_timestamp: NaiveDateTime) -> Result<PoolEvent> {
    let (transaction_hash, block_number) = transaction_context(log)?;
    let claim: ClaimFilter = parse_log(log.clone())?;
    Ok(PoolEvent {
        transaction_hash,
        block_number,
        block_timestamp,
        kind: EventKind::Claim,
        actor: claim.player,
        counterpart: None,
        shares_amount: Some(claim.amount),
        self_penalty: None,
        fee_paid: None,
    })
}

/// Raid logs carry the attacker and target as indexed topics and two uint256
/// data words. A raid is high-stakes when the same receipt contains a token
/// transfer whose amount equals the configured entry fee.
fn decode_raid(
    log: &Log,
    sibling_logs: &[Log],
    high_stakes_fee: U256,
    block_timestamp: NaiveDateTime,
) -> Result<PoolEvent> {
    let (transaction_hash, block_number) = transaction_context(log)?;
    let actor = log
        .topics
        .get(1)
        .map(address_from_topic)
        .ok_or_else(|| anyhow!("raid log has no attacker topic"))?;
    let counterpart = log
        .topics
        .get(2)
        .map(address_from_topic)
        .filter(|target| !target.is_zero());

    let shares_amount = data_word(&log.data, 0);
    let self_penalty = data_word(&log.data, 1);

    let paid_entry_fee = sibling_logs.iter().any(|sibling| {
        sibling.topics.first() == Some(&*TRANSFER_TOPIC)
            && data_word(&sibling.data, 0) == Some(high_stakes_fee)
    });

    let (kind, fee_paid) = if paid_entry_fee {
        (EventKind::HighStakesRaid, Some(high_stakes_fee))
    } else {
        (EventKind::Raid, None)
    };

    Ok(PoolEvent {
        transaction_hash,
        block_number,
        block_timestamp,
        kind,
        actor,
        counterpart,
        shares_amount,
        self_penalty,
        fee_paid,
    })
}

fn address_from_topic(topic: &H256) -> Address {
    Address::from_slice(&topic.as_bytes()[12..])
}

fn data_word(data: &Bytes, index: usize) -> Option<U256> {
    data.get(index * 32..(index + 1) * 32)
        .map(U256::from_big_endian)
}
