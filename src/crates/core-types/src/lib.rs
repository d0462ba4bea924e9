//! DataPilot shared DTOs
//!
//! Plain data exchanged between the stream decoder, the turn aggregator and the
//! goal controller. No behavior beyond small constructors and accessors lives here.

pub mod event;
pub mod goal;
pub mod turn;

pub use event::{BlockLabel, EventKind, LabeledBlock, Origin, ParsedEvent};
pub use goal::{GoalRecord, GoalSpec, GoalStatus, RunState};
pub use turn::RenderableTurn;
