use ethers::types::{Address, U256};
use serde::Deserialize;
use serde_with::serde_as;
use std::time;

#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IndexerSettings {
    /// HTTP JSON-RPC endpoint of the chain node.
    pub rpc_url: String,

    /// Address of the share pool contract whose logs are indexed.
    pub pool_address: Address,

    /// First block to scan when no cursor has been stored yet.
    pub start_block: u64,

    /// Upper bound on the number of blocks fetched in one cycle.
    pub max_window_size: u64,

    /// A cursor lagging the chain head by more than this many blocks is
    /// considered stale and the routine scan jumps forward.
    pub staleness_threshold: u64,

    /// How far behind the head a stale cursor is re-anchored.
    pub recent_window_size: u64,

    /// Entry fee (micro-units) that marks a raid as high-stakes.
    pub high_stakes_fee: U256,

    pub claim_backfill: ClaimBackfillSettings,

    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub polling_interval: time::Duration,

    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub request_timeout: time::Duration,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            pool_address: Address::zero(),
            start_block: 0,
            max_window_size: 1000,
            staleness_threshold: 50_000,
            recent_window_size: 5000,
            high_stakes_fee: U256::from(20_000_000u64),
            claim_backfill: Default::default(),
            polling_interval: time::Duration::from_secs(12),
            request_timeout: time::Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClaimBackfillSettings {
    pub enabled: bool,
    /// How many trailing blocks each cycle re-checks for claim logs.
    pub window: u64,
    /// Blocks per `eth_getLogs` request within the backfill window.
    pub chunk_size: u64,
}

impl Default for ClaimBackfillSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window: 100_000,
            chunk_size: 2000,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct QuestEngineSettings {
    /// Outbox rows claimed per engine cycle.
    pub batch_size: u64,

    /// Season identifier used as the period for seasonal quests.
    pub current_season: i64,

    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub polling_interval: time::Duration,

    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub reconcile_interval: time::Duration,

    /// How far back the reconciliation sweep looks for events that were
    /// marked processed but never reached the outbox.
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub reconcile_window: time::Duration,
}

impl Default for QuestEngineSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            current_season: 1,
            polling_interval: time::Duration::from_secs(10),
            reconcile_interval: time::Duration::from_secs(3600),
            reconcile_window: time::Duration::from_secs(86_400),
        }
    }
}
