//! Agentic layer - goal execution against the streaming backend

pub mod execution;
pub mod goals;

pub use execution::{GoalContext, GoalExecutor, GoalOutcome, StreamingGoalExecutor};
pub use goals::{GoalController, RunOptions, RunReport};
