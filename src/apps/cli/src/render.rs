//! Plain-text rendering of transcripts and reports

use datapilot_core::{GoalRecord, GoalStatus, RenderableTurn, RunReport};
use std::fmt::Write;

pub fn render_turns(turns: &[RenderableTurn]) -> String {
    let mut out = String::new();
    for turn in turns {
        match turn {
            RenderableTurn::UserTurn { content } => {
                let _ = writeln!(out, "> {}", content);
            }
            RenderableTurn::SimpleBotTurn { text } => {
                let _ = writeln!(out, "{}", text);
            }
            RenderableTurn::ComplexBotTurn {
                thought_sequence,
                final_answer,
            } => {
                for event in thought_sequence {
                    for block in &event.blocks {
                        let _ = writeln!(
                            out,
                            "  [{}] {}: {}",
                            event.kind,
                            block.label.as_str(),
                            block.content
                        );
                    }
                }
                if let Some(answer) = final_answer {
                    let _ = writeln!(out, "= {}", answer);
                }
            }
        }
    }
    out
}

fn status_marker(status: GoalStatus) -> &'static str {
    match status {
        GoalStatus::Pending => " ",
        GoalStatus::Running => "~",
        GoalStatus::Completed => "✓",
        GoalStatus::Failed => "✗",
        GoalStatus::Stopped => "■",
    }
}

pub fn render_progress(index: Option<usize>, title: &str, status: GoalStatus) -> String {
    match index {
        Some(index) => format!("[{}] {}. {} ({:?})", status_marker(status), index, title, status),
        None => format!("[{}] {} ({:?})", status_marker(status), title, status),
    }
}

pub fn render_record(index: Option<usize>, record: &GoalRecord) -> String {
    let mut line = match index {
        Some(index) => format!("[{}] {}. {}", status_marker(record.status), index, record.title),
        None => format!("[{}] {}", status_marker(record.status), record.title),
    };
    if !record.output_text.is_empty() {
        let _ = write!(line, " -> {}", record.output_text);
    }
    if let Some(error) = &record.error {
        let _ = write!(line, " ({})", error);
    }
    line
}

pub fn render_report(report: &RunReport) -> String {
    let mut out = format!("Run {} finished: {:?}\n", report.run_id, report.state);
    for (index, goal) in report.goals.iter().enumerate() {
        out.push_str(&render_record(Some(index), goal));
        out.push('\n');
    }
    out
}
