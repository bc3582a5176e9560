use clap::{Parser, Subcommand};
use dsw_bandits::config::AppConfig;
use dsw_bandits::errors::ConfigurationError;
use dsw_bandits::export::save_results;
use dsw_bandits::session::Session;
use std::error::Error;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dsw-bandits")]
#[command(author, version, about = "Thompson Sampling simulations on non-stationary bandits", long_about = None)]
struct Cli {
    /// Configuration file, without extension
    #[arg(short, long, global = true, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured session and export its results as CSV
    Run {
        /// Directory receiving the CSV files
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Master seed, overrides the configured one
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Play the configured environment once and save what happened as a replay log
    Record {
        /// JSON file receiving the replay log
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    match cli.command {
        Commands::Run { output, seed } => {
            if seed.is_some() {
                config.session.seed = seed;
            }
            let mut session = Session::from_config(&config)?;
            info!(seed = session.seed(), "Session configured");

            let result = session.run(
                config.session.n_step,
                config.session.n_test,
                config.session.use_replay,
            )?;
            let output = output.unwrap_or(config.output.path);
            save_results(result, &output)?;
        }
        Commands::Record { output } => {
            let output = output
                .or(config.output.replay_path.clone())
                .ok_or("No output file given for the replay log")?;
            let mut session = Session::from_config(&config)?;
            session.run(config.session.n_step, 1, false)?;

            let replay = session
                .replays()
                .first()
                .ok_or(ConfigurationError::RecordingDisabled)?;
            replay.save(&output)?;
        }
    }

    Ok(())
}
