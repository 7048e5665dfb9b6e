use clap::{Args, Parser};
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use pp_api::telemetry::Telemetry;
use sentry::integrations::tracing::EventFilter;
use sentry::types::Dsn;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod config;

#[derive(Parser)]
enum CliCommand {
    /// Run the pp API
    Serve(CliArgs),
    /// Load and validate the config file, then exit
    CheckConfig(CliArgs),
}

#[derive(Args)]
struct CliArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not set up metrics: {0}")]
    Metrics(String),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("pp API error: {0}")]
    PpApi(#[from] pp_api::PpApiError),
}

fn main() -> ExitCode {
    let result = match CliCommand::parse() {
        CliCommand::Serve(args) => serve(args),
        CliCommand::CheckConfig(args) => Config::from_file(&args.config_file_path)
            .map(|_| println!("config ok"))
            .map_err(CliError::from),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn serve(args: CliArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config_file_path)?;

    // Sentry must be initialized before the runtime starts its threads.
    let sentry_guard = config.common.logging.dsn()?.map(init_sentry);
    let telemetry = Telemetry::new(sentry_guard.as_ref().is_some_and(|g| g.is_enabled()));

    init_logging(&config.common.logging, telemetry.is_enabled());
    if let Some(metrics) = &config.common.metrics {
        init_metrics(metrics)?;
    }

    tracing::info!(telemetry = telemetry.is_enabled(), "starting lets");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(pp_api::run(config.pp_api, telemetry))?;

    Ok(())
}

fn init_sentry(dsn: Dsn) -> sentry::ClientInitGuard {
    sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        attach_stacktrace: true,
        ..Default::default()
    })
}

fn init_logging(logging: &LoggingConfig, sentry_enabled: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // Errors are captured explicitly, logs only become breadcrumbs.
    let sentry_layer = sentry_enabled.then(|| {
        sentry::integrations::tracing::layer().event_filter(|metadata| match *metadata.level() {
            tracing::Level::TRACE | tracing::Level::DEBUG => EventFilter::Ignore,
            _ => EventFilter::Breadcrumb,
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();
}

fn init_metrics(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))
        .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| CliError::Metrics(e.to_string()))?;
    shared::metrics_defs::describe_all(pp_api::metrics_defs::ALL_METRICS);

    Ok(())
}
