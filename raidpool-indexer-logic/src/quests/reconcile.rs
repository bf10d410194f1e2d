use crate::{repository, types::quest::QuestPayload};
use anyhow::Result;
use ethers::types::H256;
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct HealStats {
    pub healed: usize,
    pub still_missing: usize,
}

/// Re-creates outbox rows for events that were committed as processed but
/// have no quest event. With the outbox written in the same transaction as
/// the event this should find nothing; it exists for rows written before the
/// outbox was introduced and for manual surgery gone wrong.
#[instrument(name = "reconciliation_sweep", skip_all, level = "info")]
pub async fn heal_missing_outbox_entries(
    db: &DatabaseConnection,
    window: Duration,
) -> Result<HealStats> {
    let orphans = repository::chain_events::find_processed_without_outbox(db, window).await?;
    let mut stats = HealStats::default();

    for event in orphans {
        match QuestPayload::try_from(&event) {
            Ok(payload) => {
                let inserted = repository::quest_events::enqueue(
                    db,
                    &event.transaction_hash,
                    event.kind.clone(),
                    &event.actor,
                    &payload,
                )
                .await?;
                if inserted {
                    stats.healed += 1;
                    tracing::info!(
                        transaction_hash = ?H256::from_slice(&event.transaction_hash),
                        "recreated a missing quest event"
                    );
                }
            }
            Err(err) => {
                stats.still_missing += 1;
                tracing::warn!(
                    error = ?err,
                    transaction_hash = ?H256::from_slice(&event.transaction_hash),
                    "event cannot be healed"
                );
            }
        }
    }

    if stats.healed > 0 || stats.still_missing > 0 {
        tracing::info!(
            healed = stats.healed,
            still_missing = stats.still_missing,
            "reconciliation sweep finished"
        );
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repository::tests::{claim_event, init_db, raid_event, tx_hash},
        settings::QuestEngineSettings,
    };
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn sweep_converges_and_healed_events_get_consumed() {
        let db = init_db("reconcile_heals_orphans").await;
        let db = db.client();

        // processed but never enqueued
        let orphan = raid_event(1, 10, Some(20), 150);
        repository::chain_events::upsert(db.as_ref(), &orphan).await.unwrap();
        repository::chain_events::mark_processed(db.as_ref(), tx_hash(1))
            .await
            .unwrap();

        let window = Duration::from_secs(3600);
        let stats = heal_missing_outbox_entries(db.as_ref(), window).await.unwrap();
        assert_eq!(stats.healed, 1);

        // a second sweep has nothing left to do
        let stats = heal_missing_outbox_entries(db.as_ref(), window).await.unwrap();
        assert_eq!(stats, HealStats::default());

        // the healed row flows through the engine like any other
        let engine = crate::quests::Engine::new(db.clone(), QuestEngineSettings::default());
        let stats = engine.process_pending_events().await.unwrap();
        assert_eq!(stats.processed, 1);
    }

    #[tokio::test]
    async fn events_without_amounts_stay_missing() {
        let db = init_db("reconcile_undecodable_amounts").await;
        let db = db.client();

        let mut broken = claim_event(1, 10, 0);
        broken.shares_amount = None;
        repository::chain_events::upsert(db.as_ref(), &broken).await.unwrap();
        repository::chain_events::mark_processed(db.as_ref(), tx_hash(1))
            .await
            .unwrap();

        let stats = heal_missing_outbox_entries(db.as_ref(), Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(stats.healed, 0);
        assert_eq!(stats.still_missing, 1);
    }
}
