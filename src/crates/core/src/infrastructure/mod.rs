//! Infrastructure layer

pub mod events;

pub use events::{GoalEvent, GoalEventBus};
