use crate::{
    quests::period::period_index,
    repository,
    settings::QuestEngineSettings,
    types::quest::QuestPayload,
};
use anyhow::Result;
use entity::{quest_events, sea_orm_active_enums::EventKind};
use ethers::types::{Address, H256};
use sea_orm::{prelude::BigDecimal, DatabaseConnection, TransactionTrait};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct EngineCycleStats {
    pub processed: usize,
    pub failed: usize,
}

/// Consumes the outbox and turns events into quest progress and rewards.
pub struct Engine {
    db: Arc<DatabaseConnection>,
    settings: QuestEngineSettings,
}

/// Which quest kinds an event progresses. A high-stakes raid is still a
/// raid, so it counts toward both.
fn progressed_kinds(kind: &EventKind) -> Vec<EventKind> {
    match kind {
        EventKind::HighStakesRaid => vec![EventKind::HighStakesRaid, EventKind::Raid],
        kind => vec![kind.clone()],
    }
}

impl Engine {
    pub fn new(db: Arc<DatabaseConnection>, settings: QuestEngineSettings) -> Self {
        Self { db, settings }
    }

    /// One engine cycle. Each event is applied in its own transaction and
    /// only marked consumed after that transaction commits, so a crash
    /// between the two replays the event. Replays are harmless: completed
    /// counters are frozen and reward grants hang off completion.
    #[instrument(name = "quest_engine_cycle", skip_all, level = "info")]
    pub async fn process_pending_events(&self) -> Result<EngineCycleStats> {
        let batch =
            repository::quest_events::next_batch(self.db.as_ref(), self.settings.batch_size)
                .await?;
        let mut stats = EngineCycleStats::default();

        for event in batch {
            match self.apply_event(&event).await {
                Ok(()) => {
                    repository::quest_events::mark_processed(self.db.as_ref(), event.id).await?;
                    stats.processed += 1;
                }
                Err(err) => {
                    stats.failed += 1;
                    tracing::warn!(
                        error = ?err,
                        event_id = event.id,
                        "quest event failed, leaving it for the next cycle"
                    );
                }
            }
        }

        if stats.processed > 0 || stats.failed > 0 {
            tracing::info!(
                processed = stats.processed,
                failed = stats.failed,
                "quest engine cycle finished"
            );
        }
        Ok(stats)
    }

    async fn apply_event(&self, event: &quest_events::Model) -> Result<()> {
        // a malformed payload is a bug in the producer, surface it early
        let _payload: QuestPayload = serde_json::from_value(event.payload.clone())?;

        let actor = Address::from_slice(&event.actor);
        let kinds = progressed_kinds(&event.kind);

        // periods follow the onchain time of the event, not when the row
        // reached the outbox
        let occurred_at = repository::chain_events::find_by_transaction_hash(
            self.db.as_ref(),
            H256::from_slice(&event.transaction_hash),
        )
        .await?
        .map(|chain_event| chain_event.block_timestamp)
        .unwrap_or(event.created_at);

        let txn = self.db.begin().await?;
        repository::users::touch(&txn, actor).await?;

        let definitions = repository::quest_definitions::active_for_kinds(&txn, &kinds).await?;
        for definition in definitions {
            let season = period_index(
                &definition.reset_frequency,
                occurred_at,
                self.settings.current_season,
            );
            let update =
                repository::quest_progress::apply_increment(&txn, &event.actor, &definition, season)
                    .await?;
            if let Some(update) = update {
                if update.newly_completed {
                    repository::users::add_reputation(&txn, actor, definition.reward_reputation)
                        .await?;
                    if definition.reward_shares > BigDecimal::from(0) {
                        repository::pending_rewards::enqueue(
                            &txn,
                            &event.actor,
                            definition.id,
                            &definition.reward_shares,
                        )
                        .await?;
                    }
                    tracing::info!(
                        quest = definition.slug,
                        actor = ?actor,
                        season,
                        "quest completed"
                    );
                }
            }
        }

        txn.commit().await?;
        Ok(())
    }
}
