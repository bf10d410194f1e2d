pub mod common;
pub mod event;
pub mod quest;
