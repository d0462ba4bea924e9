// DataPilot Core Library - goal execution against the streaming task runner
// Four-layer architecture: Util -> Infrastructure -> Service -> Agentic

pub mod agentic; // Agentic layer - goal controller, stream executor
pub mod infrastructure; // Infrastructure layer - goal events
pub mod service; // Service layer - configuration
pub mod util; // Utility layer - errors, helper functions

// Export main types
pub use util::errors::*;

// Export service layer components
pub use service::config::{BackendConfig, DataPilotConfig, ExecutionConfig};

// Export infrastructure components
pub use infrastructure::events::{GoalEvent, GoalEventBus};

// Export Agentic layer core types
pub use agentic::{
    execution::{GoalContext, GoalExecutor, GoalOutcome, StreamingGoalExecutor},
    goals::{load_goal_file, parse_goal_list, AdhocReport, GoalController, RunOptions, RunReport},
};

pub use datapilot_core_types::{GoalRecord, GoalSpec, GoalStatus, RenderableTurn, RunState};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
