//! Goal batches
//!
//! A [`GoalController`] runs a list of goals strictly one after another through
//! a [`GoalExecutor`](crate::agentic::execution::GoalExecutor), with
//! cooperative cancellation and optional partial selection.

pub mod manager;
pub mod scheduler;
pub mod source;
pub mod types;

pub use manager::GoalController;
pub use source::{load_goal_file, parse_goal_list};
pub use types::{AdhocReport, RunOptions, RunReport};
