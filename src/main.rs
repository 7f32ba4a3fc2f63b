use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contagion::{Config, Driver, Engine};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Run {
        #[arg(long)]
        steps: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        delay_ms: Option<u64>,
    },

    Check,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mut cfg = Config::from_file(&args.config).context("failed to construct cfg")?;

    match args.command {
        Command::Run {
            steps,
            seed,
            delay_ms,
        } => {
            if let Some(steps) = steps {
                cfg.driver.n_steps = steps;
            }
            if seed.is_some() {
                cfg.seed = seed;
            }
            if let Some(delay_ms) = delay_ms {
                cfg.driver.delay_ms = delay_ms;
            }
            log::info!("{cfg:#?}");
            run_simulation(cfg)?;
        }
        Command::Check => log::info!("{cfg:#?}"),
    }

    Ok(())
}

fn run_simulation(cfg: Config) -> Result<()> {
    let driver_cfg = cfg.driver.clone();

    let engine = Engine::new(cfg).context("failed to reset engine")?;
    log::info!("initial state | {}", engine.stats());

    let mut driver = Driver::new(engine, Duration::from_millis(driver_cfg.delay_ms));
    let summary = driver.run(driver_cfg.n_steps, driver_cfg.steps_per_report);
    log::info!("{summary:#?}");

    Ok(())
}
