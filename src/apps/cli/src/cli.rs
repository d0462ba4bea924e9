use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use datapilot_core::DataPilotConfig;

use crate::commands;
use crate::logging;

#[derive(Debug, Parser)]
#[command(name = "datapilot", about = "Run data-analysis goals against the DataPilot task runner")]
pub struct Cli {
    /// Config file (defaults to <config dir>/datapilot/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging unless DATAPILOT_LOG_LEVEL says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a goal list from a JSON or TOML file, one goal at a time
    Run(RunArgs),
    /// Run a single ad-hoc goal
    Ask(AskArgs),
    /// Decode a recorded stream file and print its turns
    Replay(ReplayArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[arg(value_name = "GOALS_FILE")]
    pub goals: PathBuf,
    /// Zero-based goal indices to run, e.g. `--select 0,2`
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<usize>,
    #[arg(long)]
    pub continue_on_failure: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AskArgs {
    #[arg(value_name = "GOAL", required = true)]
    pub goal: Vec<String>,
    #[arg(long)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ReplayArgs {
    #[arg(value_name = "STREAM_FILE")]
    pub file: PathBuf,
    /// Characters per simulated chunk
    #[arg(long, default_value_t = 64)]
    pub chunk_size: usize,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init_logging(self.verbose)?;
        let output = commands::Output { json: self.json };

        match self.command {
            Command::Run(args) => {
                let config = DataPilotConfig::resolve(self.config.as_deref()).await?;
                commands::run_goals(&config, args, output).await
            }
            Command::Ask(args) => {
                let config = DataPilotConfig::resolve(self.config.as_deref()).await?;
                commands::ask(&config, args, output).await
            }
            Command::Replay(args) => commands::replay(args, output).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_selection() {
        let cli = Cli::parse_from([
            "datapilot",
            "run",
            "goals.toml",
            "--select",
            "0,2",
            "--continue-on-failure",
            "--json",
        ]);
        assert!(cli.json);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.goals, PathBuf::from("goals.toml"));
                assert_eq!(args.select, vec![0, 2]);
                assert!(args.continue_on_failure);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn ask_collects_goal_words() {
        let cli = Cli::parse_from(["datapilot", "-v", "ask", "total", "sales", "2024"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Ask(args) => assert_eq!(args.goal.join(" "), "total sales 2024"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn ask_requires_a_goal() {
        assert!(Cli::try_parse_from(["datapilot", "ask"]).is_err());
    }
}
