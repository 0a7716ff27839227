//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - runs the cleaning and forecasting stages
//! - prints reports/plots
//! - writes the optional JSON summary

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{CleanPaths, Command, ForecastOpts, PlotArgs, ReportArgs};
use crate::domain::{FailurePolicy, ForecastConfig, MonthlyPoint, PipelineConfig};
use crate::error::AppError;
use crate::io::summary::{CleaningSummary, ForecastingSummary, RunSummary};

pub mod pipeline;

const TOOL_NAME: &str = "price-forecast";

/// Entry point for the `price-forecast` binary.
pub fn run() -> Result<(), AppError> {
    // A bare `price-forecast` (or one starting with flags) runs the whole job.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_tracing(&cli.log_level);

    match cli.command {
        Command::Run(args) => {
            let forecast = forecast_config_from_args(&args.forecast);
            let config = pipeline_config(&args.paths, args.output, forecast, &args.report)?;
            handle_run(&config)
        }
        Command::Clean(args) => {
            let config = pipeline_config(
                &args.paths,
                crate::cli::DEFAULT_FORECASTS.into(),
                ForecastConfig::default(),
                &args.report,
            )?;
            handle_clean(&config)
        }
        Command::Forecast(args) => {
            let paths = CleanPaths {
                input: crate::cli::DEFAULT_INPUT.into(),
                cleaned: crate::cli::DEFAULT_CLEANED.into(),
                aggregates: args.aggregates,
            };
            let forecast = forecast_config_from_args(&args.forecast);
            let config = pipeline_config(&paths, args.output, forecast, &args.report)?;
            handle_forecast(&config)
        }
        Command::Plot(args) => handle_plot(args),
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--log-level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_run(config: &PipelineConfig) -> Result<(), AppError> {
    let cleaned = pipeline::run_clean(config)?;
    print_cleaning(config, &cleaned);

    let forecast = pipeline::run_forecast(&cleaned.aggregates, config)?;
    print_forecasting(config, &forecast);

    write_summary(config, Some(&cleaned), Some(&forecast))
}

fn handle_clean(config: &PipelineConfig) -> Result<(), AppError> {
    let cleaned = pipeline::run_clean(config)?;
    print_cleaning(config, &cleaned);
    write_summary(config, Some(&cleaned), None)
}

fn handle_forecast(config: &PipelineConfig) -> Result<(), AppError> {
    let forecast = pipeline::run_forecast_from_file(config)?;
    print_forecasting(config, &forecast);
    write_summary(config, None, Some(&forecast))
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let aggregates = crate::io::aggregates::read_aggregates_csv(&args.aggregates)?;
    let forecasts = crate::io::forecasts::read_forecast_csv(&args.forecasts)?;

    let history: Vec<MonthlyPoint> = crate::aggregate::commodity_series(&aggregates)
        .into_iter()
        .find(|s| s.commodity == args.commodity)
        .map(|s| s.points)
        .unwrap_or_default();
    let predicted: Vec<_> = forecasts
        .into_iter()
        .filter(|p| p.commodity == args.commodity)
        .collect();

    if history.is_empty() && predicted.is_empty() {
        return Err(AppError::new(
            2,
            format!("Commodity `{}` not found in the aggregate or forecast tables", args.commodity),
        ));
    }

    let plot = crate::plot::render_forecast_plot(&args.commodity, &history, &predicted, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn print_cleaning(config: &PipelineConfig, out: &pipeline::CleanOutput) {
    println!(
        "{}",
        crate::report::format_cleaning_summary(&out.raw, &out.report, &out.aggregates, &out.stats, config.preview_rows)
    );
}

fn print_forecasting(config: &PipelineConfig, out: &pipeline::ForecastOutput) {
    println!(
        "{}",
        crate::report::format_forecast_summary(&out.run, &out.table, out.commodities, config.preview_rows)
    );
}

fn write_summary(
    config: &PipelineConfig,
    cleaned: Option<&pipeline::CleanOutput>,
    forecast: Option<&pipeline::ForecastOutput>,
) -> Result<(), AppError> {
    let Some(path) = &config.summary_path else {
        return Ok(());
    };

    let summary = RunSummary {
        tool: TOOL_NAME.to_string(),
        cleaning: cleaned.map(|c| {
            CleaningSummary::new(c.raw.rows_read, c.raw.malformed_rows, &c.report, c.aggregates.len())
        }),
        forecasting: forecast.map(|f| ForecastingSummary::new(&config.forecast, &f.run)),
    };
    crate::io::summary::write_summary_json(path, &summary)?;
    tracing::info!(path = %path.display(), "wrote run summary");
    Ok(())
}

/// Build the pipeline config; the forecast part is validated up front so bad
/// flags fail before any file is touched.
pub fn pipeline_config(
    paths: &CleanPaths,
    forecast_path: std::path::PathBuf,
    forecast: ForecastConfig,
    report: &ReportArgs,
) -> Result<PipelineConfig, AppError> {
    crate::forecast::validate_config(&forecast)?;

    Ok(PipelineConfig {
        input_path: paths.input.clone(),
        cleaned_path: paths.cleaned.clone(),
        aggregates_path: paths.aggregates.clone(),
        forecast_path,
        summary_path: report.summary.clone(),
        preview_rows: report.preview,
        forecast,
    })
}

pub fn forecast_config_from_args(args: &ForecastOpts) -> ForecastConfig {
    ForecastConfig {
        min_observations: args.min_months,
        horizon: args.horizon,
        interval_width: args.interval_width,
        uncertainty_samples: args.uncertainty_samples,
        seed: args.seed,
        yearly: args.yearly,
        yearly_order: args.yearly_order,
        n_changepoints: args.changepoints,
        changepoint_range: args.changepoint_range,
        changepoint_prior_scale: args.changepoint_prior_scale,
        seasonality_prior_scale: args.seasonality_prior_scale,
        failure_policy: if args.fail_fast {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Skip
        },
        threads: args.threads,
        ..ForecastConfig::default()
    }
}

/// Rewrite argv so `price-forecast` defaults to `price-forecast run`.
///
/// Rules:
/// - `price-forecast`                     -> `price-forecast run`
/// - `price-forecast --input x.csv ...`   -> `price-forecast run --input x.csv ...`
/// - `price-forecast --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "clean" | "forecast" | "plot");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run flags".
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
