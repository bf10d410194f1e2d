pub mod chain_events;
pub mod cursors;
pub mod pending_rewards;
pub mod quest_definitions;
pub mod quest_events;
pub mod quest_progress;
pub mod users;

#[cfg(test)]
pub mod tests;
