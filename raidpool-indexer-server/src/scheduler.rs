use crate::{server::AppState, Settings};
use raidpool_indexer_logic::quests::reconcile;
use tokio::time::sleep;

/// Spawns the three background loops: chain polling, outbox consumption and
/// the reconciliation sweep. Loops never exit; a failed run is logged and
/// retried on the next tick.
pub fn start(state: AppState, settings: &Settings) {
    {
        let state = state.clone();
        let interval = settings.indexer.polling_interval;
        tokio::spawn(async move {
            loop {
                {
                    let _guard = state.indexer_lock.lock().await;
                    if let Err(err) = state.indexer.run_cycle().await {
                        tracing::error!(error = ?err, "indexer cycle failed, retrying next tick");
                    }
                }
                sleep(interval).await;
            }
        });
    }

    {
        let state = state.clone();
        let interval = settings.quests.polling_interval;
        tokio::spawn(async move {
            loop {
                {
                    let _guard = state.engine_lock.lock().await;
                    if let Err(err) = state.engine.process_pending_events().await {
                        tracing::error!(error = ?err, "quest engine cycle failed, retrying next tick");
                    }
                }
                sleep(interval).await;
            }
        });
    }

    {
        let interval = settings.quests.reconcile_interval;
        tokio::spawn(async move {
            loop {
                sleep(interval).await;
                if let Err(err) =
                    reconcile::heal_missing_outbox_entries(state.db.as_ref(), state.reconcile_window)
                        .await
                {
                    tracing::error!(error = ?err, "reconciliation sweep failed, retrying next tick");
                }
            }
        });
    }
}
