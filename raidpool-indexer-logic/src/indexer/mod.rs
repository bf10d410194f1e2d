pub mod client;
pub mod decoder;

use crate::{
    repository,
    settings::IndexerSettings,
    types::{event::PoolEvent, quest::QuestPayload},
};
use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use client::{ChainReader, ClaimFilter, JoinFilter};
use ethers::{
    contract::EthEvent,
    types::{Log, U256},
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::{collections::HashMap, sync::Arc};
use tracing::instrument;

pub const CURSOR_ID: &str = "pool_events";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub fetched: usize,
    pub persisted: usize,
    pub failed: usize,
    pub backfilled: usize,
    pub cursor_advanced_to: Option<u64>,
}

pub struct Indexer<R: ChainReader> {
    reader: R,
    db: Arc<DatabaseConnection>,
    settings: IndexerSettings,
}

/// The block range a cycle should scan, or `None` when caught up. A cursor
/// too far behind the head is re-anchored near it so routine polling stays
/// cheap; the claim backfill covers what the jump skipped over.
pub fn compute_window(
    cursor: Option<i64>,
    height: u64,
    settings: &IndexerSettings,
) -> Option<(u64, u64)> {
    let mut from = match cursor {
        Some(last_block) => (last_block as u64).checked_add(1)?,
        None => settings.start_block,
    };
    if from > height {
        return None;
    }
    if height - from > settings.staleness_threshold {
        let clamped = height.saturating_sub(settings.recent_window_size);
        tracing::warn!(
            from,
            clamped,
            "cursor is stale, jumping ahead to the recent window"
        );
        from = clamped;
    }
    let to = height.min(from.saturating_add(settings.max_window_size));
    Some((from, to))
}

impl<R: ChainReader + Send + Sync> Indexer<R> {
    pub fn new(reader: R, db: Arc<DatabaseConnection>, settings: IndexerSettings) -> Self {
        Self {
            reader,
            db,
            settings,
        }
    }

    /// One poll: scan the next window, persist what decodes, then sweep the
    /// trailing claim range. The cursor only advances when every log in the
    /// window was handled, so a partial failure is retried next cycle.
    #[instrument(name = "indexer_cycle", skip_all, level = "info")]
    pub async fn run_cycle(&self) -> Result<CycleStats> {
        let mut stats = CycleStats::default();
        let mut timestamps = HashMap::new();

        let height = self.reader.current_height().await?;
        let cursor = repository::cursors::get(self.db.as_ref(), CURSOR_ID).await?;

        if let Some((from, to)) = compute_window(cursor, height, &self.settings) {
            let mut logs = Vec::new();
            for topic0 in [
                JoinFilter::signature(),
                ClaimFilter::signature(),
                *decoder::RAID_TOPIC,
            ] {
                logs.extend(self.reader.logs(topic0, from, to).await?);
            }
            logs.sort_by_key(|log| (log.block_number, log.log_index));
            stats.fetched = logs.len();

            for log in &logs {
                match self.handle_log(log, &mut timestamps).await {
                    Ok(true) => stats.persisted += 1,
                    Ok(false) => {}
                    Err(err) => {
                        stats.failed += 1;
                        tracing::error!(
                            error = ?err,
                            transaction_hash = ?log.transaction_hash,
                            "failed to handle log"
                        );
                    }
                }
            }

            if stats.failed == 0 {
                repository::cursors::advance(self.db.as_ref(), CURSOR_ID, to).await?;
                stats.cursor_advanced_to = Some(to);
            } else {
                tracing::warn!(
                    failed = stats.failed,
                    from,
                    to,
                    "window had failures, holding cursor for retry"
                );
            }
        }

        if self.settings.claim_backfill.enabled {
            self.run_claim_backfill(height, &mut timestamps, &mut stats)
                .await;
        }

        tracing::info!(
            fetched = stats.fetched,
            persisted = stats.persisted,
            failed = stats.failed,
            backfilled = stats.backfilled,
            cursor = stats.cursor_advanced_to,
            "indexer cycle finished"
        );
        Ok(stats)
    }

    async fn handle_log(
        &self,
        log: &Log,
        timestamps: &mut HashMap<u64, NaiveDateTime>,
    ) -> Result<bool> {
        let topic0 = match log.topics.first() {
            Some(topic0) => *topic0,
            None => return Ok(false),
        };
        let (transaction_hash, block_number) = decoder::transaction_context(log)?;

        // raids need the full receipt to tell high-stakes entries apart
        let siblings = if topic0 == *decoder::RAID_TOPIC {
            self.reader
                .receipt(transaction_hash)
                .await?
                .ok_or_else(|| anyhow!("no receipt for mined transaction"))?
                .logs
        } else {
            Vec::new()
        };

        let block_timestamp = match timestamps.get(&block_number) {
            Some(timestamp) => *timestamp,
            None => {
                let secs = self.reader.block_timestamp(block_number).await?;
                let timestamp = chrono::DateTime::from_timestamp(secs as i64, 0)
                    .ok_or_else(|| anyhow!("block timestamp out of range"))?
                    .naive_utc();
                timestamps.insert(block_number, timestamp);
                timestamp
            }
        };

        let event = match decoder::decode(
            log,
            &siblings,
            self.settings.high_stakes_fee,
            block_timestamp,
        )? {
            Some(event) => event,
            None => return Ok(false),
        };
        self.persist_event(&event).await?;
        Ok(true)
    }

    /// Writes the event, its outbox row and the processed flag in one
    /// transaction. Balance corrections for raids ride in the same
    /// transaction; the chain reads happen before it opens.
    async fn persist_event(&self, event: &PoolEvent) -> Result<()> {
        let balances = if event.is_raid() {
            Some(self.read_balances(event).await)
        } else {
            None
        };

        let txn = self.db.begin().await?;
        repository::chain_events::upsert(&txn, event).await?;
        repository::quest_events::enqueue(
            &txn,
            event.transaction_hash.as_bytes(),
            event.kind.clone(),
            event.actor.as_bytes(),
            &QuestPayload::from(event),
        )
        .await?;
        repository::chain_events::mark_processed(&txn, event.transaction_hash).await?;
        match balances {
            Some(balances) => self.apply_balances(&txn, event, balances).await?,
            None => repository::users::touch(&txn, event.actor).await?,
        }
        txn.commit().await?;
        Ok(())
    }

    async fn read_balances(&self, event: &PoolEvent) -> (Option<U256>, Option<U256>) {
        let actor = match self.reader.share_balance(event.actor).await {
            Ok(balance) => Some(balance),
            Err(err) => {
                tracing::warn!(
                    error = ?err,
                    address = ?event.actor,
                    "share balance read failed, falling back to event delta"
                );
                None
            }
        };
        let mut counterpart = None;
        if let Some(target) = event.counterpart {
            counterpart = match self.reader.share_balance(target).await {
                Ok(balance) => Some(balance),
                Err(err) => {
                    tracing::warn!(
                        error = ?err,
                        address = ?target,
                        "share balance read failed, falling back to event delta"
                    );
                    None
                }
            };
        }
        (actor, counterpart)
    }

    async fn apply_balances(
        &self,
        txn: &DatabaseTransaction,
        event: &PoolEvent,
        (actor, counterpart): (Option<U256>, Option<U256>),
    ) -> Result<()> {
        let stolen = event.shares_amount.unwrap_or_default();
        match actor {
            Some(balance) => repository::users::set_shares(txn, event.actor, balance).await?,
            None => repository::users::adjust_shares(txn, event.actor, stolen, true).await?,
        }
        if let Some(target) = event.counterpart {
            match counterpart {
                Some(balance) => repository::users::set_shares(txn, target, balance).await?,
                None => repository::users::adjust_shares(txn, target, stolen, false).await?,
            }
        }
        Ok(())
    }

    /// Claim logs were emitted long before this indexer existed, so every
    /// cycle re-checks a trailing block range for them. Chunk failures are
    /// skipped rather than retried; the next cycle covers the same range
    /// again.
    async fn run_claim_backfill(
        &self,
        height: u64,
        timestamps: &mut HashMap<u64, NaiveDateTime>,
        stats: &mut CycleStats,
    ) {
        let settings = &self.settings.claim_backfill;
        let mut from = height.saturating_sub(settings.window);
        while from <= height {
            let to = from
                .saturating_add(settings.chunk_size.saturating_sub(1))
                .min(height);
            match self.reader.logs(ClaimFilter::signature(), from, to).await {
                Ok(logs) => {
                    for log in logs {
                        match self.handle_log(&log, timestamps).await {
                            Ok(true) => stats.backfilled += 1,
                            Ok(false) => {}
                            Err(err) => {
                                tracing::warn!(
                                    error = ?err,
                                    transaction_hash = ?log.transaction_hash,
                                    "claim backfill log failed"
                                );
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = ?err, from, to, "claim backfill chunk failed, skipping");
                }
            }
            from = match to.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }
    }
}


#[cfg(test)]
mod cycle_tests {
    use super::*;
    use crate::repository::tests::{addr, init_db, tx_hash};
    use anyhow::bail;
    use async_trait::async_trait;
    use entity::sea_orm_active_enums::EventKind;
    use ethers::types::{Address, Bytes, TransactionReceipt, H256};
    use pretty_assertions::assert_eq;
    use sea_orm::prelude::BigDecimal;

    #[derive(Default)]
    struct MockReader {
        height: u64,
        logs: Vec<Log>,
        receipts: HashMap<H256, TransactionReceipt>,
        balances: HashMap<Address, U256>,
        fail_log_fetch: bool,
        fail_balance_reads: bool,
    }

    #[async_trait]
    impl ChainReader for MockReader {
        async fn current_height(&self) -> Result<u64> {
            Ok(self.height)
        }

        async fn logs(&self, topic0: H256, from_block: u64, to_block: u64) -> Result<Vec<Log>> {
            if self.fail_log_fetch {
                bail!("rpc unavailable");
            }
            Ok(self
                .logs
                .iter()
                .filter(|log| {
                    log.topics.first() == Some(&topic0)
                        && (from_block..=to_block)
                            .contains(&log.block_number.unwrap().as_u64())
                })
                .cloned()
                .collect())
        }

        async fn receipt(&self, transaction_hash: H256) -> Result<Option<TransactionReceipt>> {
            Ok(self.receipts.get(&transaction_hash).cloned())
        }

        async fn share_balance(&self, address: Address) -> Result<U256> {
            if self.fail_balance_reads {
                bail!("rpc unavailable");
            }
            Ok(self.balances.get(&address).copied().unwrap_or_default())
        }

        async fn block_timestamp(&self, block_number: u64) -> Result<u64> {
            Ok(1_700_000_000 + block_number)
        }
    }

    fn topic(address: Address) -> H256 {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(address.as_bytes());
        H256::from(bytes)
    }

    fn words(values: &[U256]) -> Bytes {
        let mut bytes = vec![0u8; values.len() * 32];
        for (i, value) in values.iter().enumerate() {
            value.to_big_endian(&mut bytes[i * 32..(i + 1) * 32]);
        }
        Bytes::from(bytes)
    }

    fn raid_log(tx: u64, block: u64, attacker: Address, target: Address, stolen: u64) -> Log {
        Log {
            topics: vec![*decoder::RAID_TOPIC, topic(attacker), topic(target)],
            data: words(&[U256::from(stolen), U256::from(stolen / 10)]),
            block_number: Some(block.into()),
            transaction_hash: Some(tx_hash(tx)),
            ..Default::default()
        }
    }

    fn claim_log(tx: u64, block: u64, player: Address, amount: u64) -> Log {
        Log {
            topics: vec![ClaimFilter::signature(), topic(player)],
            data: words(&[U256::from(amount)]),
            block_number: Some(block.into()),
            transaction_hash: Some(tx_hash(tx)),
            ..Default::default()
        }
    }

    fn settings() -> IndexerSettings {
        IndexerSettings {
            start_block: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn raid_cycle_resyncs_balances_from_chain() {
        let db = init_db("indexer_raid_resync").await;
        let db = db.client();
        let (attacker, target) = (addr(1), addr(2));

        crate::repository::users::set_shares(db.as_ref(), attacker, U256::from(100))
            .await
            .unwrap();
        crate::repository::users::set_shares(db.as_ref(), target, U256::from(100))
            .await
            .unwrap();

        let log = raid_log(1, 50, attacker, target, 10);
        let reader = MockReader {
            height: 100,
            receipts: HashMap::from([(
                tx_hash(1),
                TransactionReceipt {
                    logs: vec![log.clone()],
                    ..Default::default()
                },
            )]),
            balances: HashMap::from([
                (attacker, U256::from(110)),
                (target, U256::from(90)),
            ]),
            logs: vec![log],
            ..Default::default()
        };

        let indexer = Indexer::new(reader, db.clone(), settings());
        let stats = indexer.run_cycle().await.unwrap();
        assert_eq!(stats.persisted, 1);
        assert_eq!(stats.cursor_advanced_to, Some(100));

        let stored = crate::repository::chain_events::find_by_transaction_hash(
            db.as_ref(),
            tx_hash(1),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(stored.kind, EventKind::Raid);
        assert!(stored.processed);

        let outbox = crate::repository::quest_events::next_batch(db.as_ref(), 10)
            .await
            .unwrap();
        assert_eq!(outbox.len(), 1);

        let attacker_row = crate::repository::users::find_by_address(db.as_ref(), attacker)
            .await
            .unwrap()
            .unwrap();
        let target_row = crate::repository::users::find_by_address(db.as_ref(), target)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(attacker_row.shares, BigDecimal::from(110));
        assert_eq!(target_row.shares, BigDecimal::from(90));
    }

    #[tokio::test]
    async fn balance_read_failure_falls_back_to_event_deltas() {
        let db = init_db("indexer_raid_delta_fallback").await;
        let db = db.client();
        let (attacker, target) = (addr(1), addr(2));

        crate::repository::users::set_shares(db.as_ref(), attacker, U256::from(100))
            .await
            .unwrap();
        crate::repository::users::set_shares(db.as_ref(), target, U256::from(5))
            .await
            .unwrap();

        let log = raid_log(1, 50, attacker, target, 10);
        let reader = MockReader {
            height: 100,
            receipts: HashMap::from([(
                tx_hash(1),
                TransactionReceipt {
                    logs: vec![log.clone()],
                    ..Default::default()
                },
            )]),
            fail_balance_reads: true,
            logs: vec![log],
            ..Default::default()
        };

        let indexer = Indexer::new(reader, db.clone(), settings());
        let stats = indexer.run_cycle().await.unwrap();
        assert_eq!(stats.persisted, 1);

        let attacker_row = crate::repository::users::find_by_address(db.as_ref(), attacker)
            .await
            .unwrap()
            .unwrap();
        let target_row = crate::repository::users::find_by_address(db.as_ref(), target)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(attacker_row.shares, BigDecimal::from(110));
        // the victim had fewer shares tracked than were stolen
        assert_eq!(target_row.shares, BigDecimal::from(0));
    }

    #[tokio::test]
    async fn fetch_failure_aborts_cycle_and_holds_cursor() {
        let db = init_db("indexer_fetch_failure").await;
        let db = db.client();
        crate::repository::cursors::advance(db.as_ref(), CURSOR_ID, 40)
            .await
            .unwrap();

        let reader = MockReader {
            height: 100,
            fail_log_fetch: true,
            ..Default::default()
        };
        let indexer = Indexer::new(reader, db.clone(), settings());

        assert!(indexer.run_cycle().await.is_err());
        assert_eq!(
            crate::repository::cursors::get(db.as_ref(), CURSOR_ID)
                .await
                .unwrap(),
            Some(40)
        );
    }

    #[tokio::test]
    async fn backfill_picks_up_claims_behind_the_cursor() {
        let db = init_db("indexer_claim_backfill").await;
        let db = db.client();
        let player = addr(3);

        let height = 200_000u64;
        crate::repository::cursors::advance(db.as_ref(), CURSOR_ID, height)
            .await
            .unwrap();

        let reader = MockReader {
            height,
            logs: vec![claim_log(1, height - 50_000, player, 777)],
            ..Default::default()
        };
        let indexer = Indexer::new(reader, db.clone(), settings());

        let stats = indexer.run_cycle().await.unwrap();
        assert_eq!(stats.fetched, 0);
        assert_eq!(stats.backfilled, 1);

        let stored = crate::repository::chain_events::find_by_transaction_hash(
            db.as_ref(),
            tx_hash(1),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(stored.kind, EventKind::Claim);
        assert!(stored.processed);
    }
}
