use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Stopped,
}

impl GoalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GoalStatus::Completed | GoalStatus::Failed | GoalStatus::Stopped
        )
    }

    /// Statuses only move forward: pending -> running -> terminal.
    pub fn can_transition_to(&self, next: GoalStatus) -> bool {
        matches!(
            (self, next),
            (GoalStatus::Pending, GoalStatus::Running)
                | (
                    GoalStatus::Running,
                    GoalStatus::Completed | GoalStatus::Failed | GoalStatus::Stopped
                )
        )
    }
}

/// Run-level state of the execution controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running { cursor: usize },
    Completed,
    Cancelled,
    HaltedOnFailure,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }
}

/// A goal as supplied by a goal source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl GoalSpec {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Text sent to the executor; falls back to the title when no description is given.
    pub fn prompt(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.title
        } else {
            &self.description
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    pub title: String,
    pub description: String,
    pub status: GoalStatus,

    /// Final answer of the last turn produced for this goal, if any.
    #[serde(default)]
    pub output_text: String,
    #[serde(default)]
    pub error: Option<String>,

    pub updated_at_ms: i64,
    #[serde(default)]
    pub started_at_ms: Option<i64>,
    #[serde(default)]
    pub finished_at_ms: Option<i64>,
}

impl GoalRecord {
    pub fn pending(spec: GoalSpec, now_ms: i64) -> Self {
        Self {
            title: spec.title,
            description: spec.description,
            status: GoalStatus::Pending,
            output_text: String::new(),
            error: None,
            updated_at_ms: now_ms,
            started_at_ms: None,
            finished_at_ms: None,
        }
    }

    pub fn spec(&self) -> GoalSpec {
        GoalSpec::new(self.title.clone(), self.description.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_moves_forward_only() {
        assert!(GoalStatus::Pending.can_transition_to(GoalStatus::Running));
        assert!(GoalStatus::Running.can_transition_to(GoalStatus::Stopped));
        assert!(!GoalStatus::Pending.can_transition_to(GoalStatus::Completed));
        assert!(!GoalStatus::Completed.can_transition_to(GoalStatus::Running));
        assert!(!GoalStatus::Failed.can_transition_to(GoalStatus::Pending));
    }

    #[test]
    fn prompt_falls_back_to_title() {
        assert_eq!(GoalSpec::new("Sales", "  ").prompt(), "Sales");
        assert_eq!(GoalSpec::new("Sales", "Sum Q3").prompt(), "Sum Q3");
    }

    #[test]
    fn goal_spec_description_is_optional() {
        let spec: GoalSpec = serde_json::from_str(r#"{"title":"Churn"}"#).unwrap();
        assert_eq!(spec.description, "");
    }
}
