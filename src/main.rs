use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use gini_fetcher_lib::bridge::{GiniBridge, ProcessLauncher};
use gini_fetcher_lib::commands::lookup::{render_json, render_text};
use gini_fetcher_lib::config::AppConfig;
use gini_fetcher_lib::core::orchestrator;
use gini_fetcher_lib::fetcher::normalize_country_code;
use gini_fetcher_lib::fetcher::worldbank::WorldBankFetcher;
use gini_fetcher_lib::logging;

/// Fetch a country's GINI index from the World Bank and optionally run it
/// through the native processing routine.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// ISO 3166-1 alpha-3 country code, e.g. ARG, USA, BRA
    country_code: String,

    /// Send the latest GINI value through the 32-bit native bridge
    #[arg(long)]
    process: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    logging::init("warn");
    let cli = Cli::parse();

    let Some(code) = normalize_country_code(&cli.country_code) else {
        eprintln!(
            "Invalid country code '{}': enter a 3-letter ISO code (e.g. ARG, USA, BRA).",
            cli.country_code.trim()
        );
        return Ok(ExitCode::from(2));
    };

    let config = AppConfig::from_env()?;
    let fetcher = WorldBankFetcher::new(config.fetch.clone());
    let mut bridge = GiniBridge::new(ProcessLauncher::new(config.bridge.clone()));

    let mut report = orchestrator::lookup(&fetcher, &code, &config.fetch.date_range).await;

    if cli.process {
        match &report.latest {
            Some(latest) => {
                report.processing = Some(orchestrator::process_latest(&mut bridge, latest).await);
            }
            None => eprintln!("Nothing to process: no valid GINI value for {}.", code),
        }
    }

    if cli.json {
        println!("{}", render_json(&report)?);
    } else {
        print!("{}", render_text(&report));
    }

    Ok(if report.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
