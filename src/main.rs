use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use chrono_tz::Tz;
use clap::Parser;
use frostwatch_alerts::schedule::{force_from_env, format_local};
use frostwatch_alerts::simulate::VALID_TEST_MODES;
use frostwatch_alerts::{
    current_conditions, forecast_lows, open_history_store, simulate_alerts, snapshot,
    FreezeAnalyzer, GateDecision, ScheduleGate, TestMode,
};
use frostwatch_core::{AppError, Config, ConfigError};
use frostwatch_notify::{Credentials, Mailer, Notification};
use frostwatch_weather::{to_samples, ForecastProvider};

/// Frost and extended freeze warnings by email
#[derive(Parser, Debug)]
#[command(name = "frostwatch", version, about)]
struct Cli {
    /// Send simulated alerts built from the live forecast: frost1, frost2, extended_freeze or all
    test_mode: Option<String>,

    /// Run the check even outside the scheduled hours
    #[arg(long)]
    force: bool,

    /// Path to config.toml
    #[arg(long, env = "FROSTWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the alert history file from the config
    #[arg(long)]
    history: Option<PathBuf>,

    /// Print the notification instead of mailing it and leave history untouched
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = frostwatch_core::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let (config, _) = Config::load_validated(cli.config.as_deref()).map_err(config_error)?;
    let tz = config.location.tz()?;

    let provider = ForecastProvider::new(&config.weather, &config.location)?;
    let mailer = Mailer::new(&config.email, Credentials::from_env());

    if let Some(mode) = cli.test_mode.as_deref() {
        return run_test_mode(mode, &config, tz, &provider, &mailer, cli.dry_run).await;
    }

    println!("Checking weather for {}...", config.location.name);

    let force = cli.force || force_from_env(std::env::var("FORCE_RUN").ok().as_deref());
    let gate = ScheduleGate::new(tz, config.schedule.scheduled_hours.clone());
    match gate.check(Utc::now(), force) {
        GateDecision::Skip { local_time } => {
            println!("Current {} time is {} - outside the scheduled window.", tz, local_time);
            println!("Skipping weather check until the next {} run.", gate.describe_hours());
            return Ok(());
        }
        GateDecision::Forced => tracing::info!("Outside scheduled hours; running anyway"),
        GateDecision::Run => {}
    }

    let forecast = match provider.fetch().await {
        Ok(forecast) => forecast,
        Err(e) => {
            tracing::error!("Forecast unavailable: {}", e);
            println!("Unable to retrieve weather forecast");
            return Ok(());
        }
    };
    println!(
        "Retrieved {} hours of forecast data from {}",
        forecast.readings.len(),
        forecast.source
    );

    let history_path = cli.history.unwrap_or_else(|| config.history_path.clone());
    let store = open_history_store(history_path, cli.dry_run)?;
    let samples = to_samples(&forecast.readings);
    let analysis = FreezeAnalyzer::new(tz).analyze_with_store(&samples, store.as_ref(), Utc::now())?;

    tracing::info!(
        events = analysis.events.len(),
        alerts = analysis.alerts.len(),
        "Freeze analysis complete"
    );

    if analysis.alerts.is_empty() {
        println!("No freezing conditions detected - sending status update");
    } else {
        println!("Found {} alert(s) to send", analysis.alerts.len());
    }

    let lows = forecast_lows(&forecast.readings);
    let notification = Notification::compose(
        analysis.alerts,
        Some(&lows),
        &config.location.name,
        &format_local(Utc::now(), tz),
    );
    send(&mailer, &notification, cli.dry_run).await;

    println!("\nNext 48 hours temperature summary:");
    for line in snapshot(&forecast.readings) {
        println!("{}", line);
    }

    Ok(())
}

async fn run_test_mode(
    mode: &str,
    config: &Config,
    tz: Tz,
    provider: &ForecastProvider,
    mailer: &Mailer,
    dry_run: bool,
) -> Result<(), AppError> {
    let name = mode.to_ascii_lowercase();
    let mode: TestMode = match name.parse() {
        Ok(mode) => mode,
        Err(e) => {
            println!("{}", e);
            println!("Valid options: {}", VALID_TEST_MODES);
            return Ok(());
        }
    };

    println!("Running in TEST MODE: {}", name);
    println!("Fetching real weather data for {}...", config.location.name);

    // Simulated alerts still go out when both providers are down.
    let readings = match provider.fetch().await {
        Ok(forecast) => forecast.readings,
        Err(e) => {
            tracing::warn!("Forecast unavailable, using placeholder conditions: {}", e);
            Vec::new()
        }
    };

    let alerts = simulate_alerts(mode, &current_conditions(&readings));
    println!("Sending {} TEST alert(s) with real weather data", alerts.len());

    let notification = Notification::compose(
        alerts,
        None,
        &config.location.name,
        &format_local(Utc::now(), tz),
    );
    send(mailer, &notification, dry_run).await;

    Ok(())
}

async fn send(mailer: &Mailer, notification: &Notification, dry_run: bool) {
    if dry_run {
        println!("Dry run, not sending email.");
        println!("Subject: {}\n\n{}", notification.subject, notification.body);
        return;
    }
    mailer.deliver(notification).await;
}

fn config_error(err: anyhow::Error) -> AppError {
    match err.downcast::<ConfigError>() {
        Ok(e) => AppError::Config(e),
        Err(other) => AppError::Other(other),
    }
}
