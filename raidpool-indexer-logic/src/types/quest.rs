use crate::types::{common::decimal_to_u256, event::PoolEvent};
use anyhow::{anyhow, Error};
use entity::{chain_events, sea_orm_active_enums::EventKind};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Outbox payload stored alongside each quest event. Kept self-contained so
/// the quest engine never has to reach back to the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestPayload {
    Join {
        referrer: Option<Address>,
        fee_paid: U256,
    },
    Raid {
        target: Option<Address>,
        shares_stolen: U256,
        high_stakes: bool,
    },
    Claim {
        amount: U256,
    },
}

impl From<&PoolEvent> for QuestPayload {
    fn from(event: &PoolEvent) -> Self {
        match event.kind {
            EventKind::Join => QuestPayload::Join {
                referrer: event.counterpart,
                fee_paid: event.fee_paid.unwrap_or_default(),
            },
            EventKind::Raid | EventKind::HighStakesRaid => QuestPayload::Raid {
                target: event.counterpart,
                shares_stolen: event.shares_amount.unwrap_or_default(),
                high_stakes: event.kind == EventKind::HighStakesRaid,
            },
            EventKind::Claim => QuestPayload::Claim {
                amount: event.shares_amount.unwrap_or_default(),
            },
        }
    }
}

impl TryFrom<&chain_events::Model> for QuestPayload {
    type Error = Error;

    /// Rebuilds the payload from a stored event. Used by the reconciliation
    /// sweep, so amounts are required: a row that never had them decoded
    /// cannot be healed and stays missing.
    fn try_from(event: &chain_events::Model) -> Result<Self, Self::Error> {
        let shares_amount = event.shares_amount.as_ref().and_then(decimal_to_u256);
        match event.kind {
            EventKind::Join => Ok(QuestPayload::Join {
                referrer: event.counterpart.as_ref().map(|a| Address::from_slice(a)),
                fee_paid: event
                    .fee_paid
                    .as_ref()
                    .and_then(decimal_to_u256)
                    .unwrap_or_default(),
            }),
            EventKind::Raid | EventKind::HighStakesRaid => Ok(QuestPayload::Raid {
                target: event.counterpart.as_ref().map(|a| Address::from_slice(a)),
                shares_stolen: shares_amount
                    .ok_or_else(|| anyhow!("raid event has no decoded stolen amount"))?,
                high_stakes: event.kind == EventKind::HighStakesRaid,
            }),
            EventKind::Claim => Ok(QuestPayload::Claim {
                amount: shares_amount
                    .ok_or_else(|| anyhow!("claim event has no decoded amount"))?,
            }),
        }
    }
}
