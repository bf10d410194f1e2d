pub mod indexer;
pub mod quests;
pub mod repository;
pub mod settings;
pub mod types;
