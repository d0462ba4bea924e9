//! Goal lists
//!
//! Goals arrive either as a file on disk (JSON or TOML) or embedded in free-form
//! backend output, where the JSON list may be surrounded by prose.

use crate::util::errors::{DataPilotError, DataPilotResult};
use datapilot_core_types::GoalSpec;
use log::{debug, warn};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawGoal {
    Title(String),
    Full {
        title: String,
        #[serde(default)]
        description: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawGoalList {
    goals: Vec<RawGoal>,
}

/// Extracts a goal list from possibly noisy text.
///
/// Accepts `{"goals": [...]}` or a bare array; each goal is either an object
/// with `title` and optional `description`, or a plain string used as title.
pub fn parse_goal_list(text: &str) -> DataPilotResult<Vec<GoalSpec>> {
    let object_start = text.find('{');
    let array_start = text.find('[');
    let raw = match (object_start, array_start) {
        (Some(o), Some(a)) if a < o => parse_array(text, a)?,
        (None, Some(a)) => parse_array(text, a)?,
        (Some(o), _) => {
            let end = text.rfind('}').filter(|end| *end > o).ok_or_else(|| {
                DataPilotError::validation("Goal list did not contain a JSON object end")
            })?;
            let list: RawGoalList = serde_json::from_str(&text[o..=end]).map_err(|e| {
                warn!("Failed to parse goal list JSON: {}", e);
                DataPilotError::validation(format!("Failed to parse goal list JSON: {}", e))
            })?;
            list.goals
        }
        (None, None) => {
            return Err(DataPilotError::validation(
                "Goal list did not contain JSON",
            ))
        }
    };
    into_specs(raw)
}

fn parse_array(text: &str, start: usize) -> DataPilotResult<Vec<RawGoal>> {
    let end = text
        .rfind(']')
        .filter(|end| *end > start)
        .ok_or_else(|| DataPilotError::validation("Goal list did not contain a JSON array end"))?;
    serde_json::from_str(&text[start..=end]).map_err(|e| {
        warn!("Failed to parse goal list JSON: {}", e);
        DataPilotError::validation(format!("Failed to parse goal list JSON: {}", e))
    })
}

fn into_specs(raw: Vec<RawGoal>) -> DataPilotResult<Vec<GoalSpec>> {
    if raw.is_empty() {
        return Err(DataPilotError::validation("Goal list is empty"));
    }
    raw.into_iter()
        .enumerate()
        .map(|(index, goal)| {
            let spec = match goal {
                RawGoal::Title(title) => GoalSpec::new(title, ""),
                RawGoal::Full { title, description } => GoalSpec::new(title, description),
            };
            validate_goal(index, &spec)?;
            Ok(spec)
        })
        .collect()
}

pub(crate) fn validate_goal(index: usize, spec: &GoalSpec) -> DataPilotResult<()> {
    if spec.title.trim().is_empty() {
        return Err(DataPilotError::validation(format!(
            "Goal {} has an empty title",
            index
        )));
    }
    Ok(())
}

/// Loads goals from a `.toml` file (`[[goals]]` tables) or any other file
/// holding a JSON goal list.
pub async fn load_goal_file(path: &Path) -> DataPilotResult<Vec<GoalSpec>> {
    let text = tokio::fs::read_to_string(path).await?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let goals = if is_toml {
        let list: RawGoalList = toml::from_str(&text).map_err(|e| {
            DataPilotError::validation(format!(
                "Failed to parse goal file {}: {}",
                path.display(),
                e
            ))
        })?;
        into_specs(list.goals)?
    } else {
        parse_goal_list(&text)?
    };
    debug!(
        "Loaded goal file: path={}, goals={}",
        path.display(),
        goals.len()
    );
    Ok(goals)
}
