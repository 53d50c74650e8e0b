//! Lane Tactics - Development Tools

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lane_core::ai::EnemyAi;
use lane_core::forecast::ForecastConfig;
use lane_core::math::{from_millis, Fixed};
use lane_tools::error::Result;
use lane_tools::report::{forecast_battle, run_round, to_json};
use lane_tools::scenario::Scenario;
use lane_tools::validate::validate_data_directory;

#[derive(Parser)]
#[command(name = "lane-tools")]
#[command(about = "Development tools for Lane Tactics")]
struct Cli {
    /// Path to data directory
    #[arg(long, global = true, default_value = "assets/data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate,
    /// Forecast a scenario and print the snapshot as JSON
    Forecast {
        /// Scenario file
        scenario: PathBuf,
        /// Seconds to simulate
        #[arg(long, default_value_t = 30.0)]
        horizon: f64,
        /// Step length in milliseconds
        #[arg(long, default_value_t = 100)]
        step_ms: i64,
    },
    /// Let the AI plan the enemy side and run the round headless
    Simulate {
        /// Scenario file
        scenario: PathBuf,
        /// Override the AI seed
        #[arg(long)]
        seed: Option<u64>,
        /// Use the scenario's scripted enemy plans instead of the AI
        #[arg(long)]
        scripted: bool,
        /// Round time limit in seconds
        #[arg(long, default_value_t = 60.0)]
        max_seconds: f64,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli.data, cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(data_dir: &Path, command: Commands) -> Result<()> {
    match command {
        Commands::Validate => {
            tracing::info!("Validating data files in: {}", data_dir.display());
            validate_data_directory(data_dir)?;
            tracing::info!("Validation passed");
        }
        Commands::Forecast {
            scenario,
            horizon,
            step_ms,
        } => {
            let data = validate_data_directory(data_dir)?;
            let battle = Scenario::load(&scenario)?.build_battle(&data)?;
            let config = ForecastConfig {
                step_ms,
                ..ForecastConfig::default()
            };
            let summary = forecast_battle(&battle, Fixed::from_num(horizon), &config);
            println!("{}", to_json(&summary)?);
        }
        Commands::Simulate {
            scenario,
            seed,
            scripted,
            max_seconds,
        } => {
            let data = validate_data_directory(data_dir)?;
            let mut battle = Scenario::load(&scenario)?.build_battle(&data)?;
            let mut ai = EnemyAi::new(data.ai.clone());
            if let Some(seed) = seed {
                ai.reseed(seed);
            }
            let ai = if scripted { None } else { Some(&mut ai) };
            let summary = run_round(&mut battle, ai, from_millis(100), Fixed::from_num(max_seconds));
            println!("{}", to_json(&summary)?);
        }
    }
    Ok(())
}
