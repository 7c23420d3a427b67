use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use learning_history::config::Config;
use learning_history::history::scheduler::today;
use learning_history::history::{summarize, Direction, RetentionScheduler};
use learning_history::{logging, snapshot};

#[derive(Parser)]
#[command(name = "learning-history", about = "Inspect learning-history snapshots", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print per-notebook review counts for today as JSON
    Due {
        /// History snapshot written by the engine
        path: PathBuf,
        /// Count reverse-direction (meaning to expression) reviews
        #[arg(long)]
        reverse: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.logging);

    match cli.command {
        Command::Due { path, reverse } => {
            let direction = if reverse {
                Direction::Reverse
            } else {
                Direction::Forward
            };
            due(&config, &path, direction)
        }
    }
}

fn due(config: &Config, path: &Path, direction: Direction) -> ExitCode {
    let book = match snapshot::load(path) {
        Ok(book) => book,
        Err(err) => {
            tracing::error!(error = %err, path = %path.display(), "failed to load snapshot");
            return ExitCode::FAILURE;
        }
    };

    let scheduler = match RetentionScheduler::new(config.scheduler.clone()) {
        Ok(scheduler) => scheduler,
        Err(err) => {
            tracing::error!(error = %err, "invalid scheduler configuration");
            return ExitCode::FAILURE;
        }
    };

    let stats = summarize(&book, &scheduler, direction, today());
    match serde_json::to_string_pretty(&stats) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to encode stats");
            ExitCode::FAILURE
        }
    }
}
