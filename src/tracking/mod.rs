pub mod aggregator;
pub mod engine;
pub mod escalation;
pub mod evaluator;
pub mod policy;
pub mod streak;

pub use engine::{GoalProgressReport, GoalTrackingEngine};
