pub mod engine;
pub mod period;
pub mod reconcile;

pub use engine::Engine;
