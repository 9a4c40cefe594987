//! `vidstats` binary: parses the CLI, installs logging and runs the pipeline.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vidstats_core::config::VidstatsConfig;
use vidstats_pipeline::{Pipeline, RunReport, StageStatus};

use cli::{CliArgs, Command};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Config is read before logging starts so its level can seed the filter.
    // `VidstatsConfig::load` does not log; both outcomes are reported below
    // once the subscriber is up.
    let config_file = args.resolve_config_path();
    let (config, config_error) = match VidstatsConfig::load(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (VidstatsConfig::default(), Some(e)),
    };

    let filter = args.resolve_log_filter(&config.general.log_level);
    init_tracing(&filter, args.json);

    tracing::info!("Starting vidstats v{}", env!("CARGO_PKG_VERSION"));
    match config_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config. Using defaults."
        ),
    }

    let command = args.command();
    let mut pipeline = Pipeline::new(config);
    if let Command::Report {
        top_n: Some(top_n),
    } = command
    {
        pipeline = pipeline.with_top_n(top_n);
    }

    let report = match command.stage() {
        None => pipeline.run(),
        Some(stage) => pipeline.run_stage(stage),
    };

    if args.json {
        if let Err(e) = print_json(&report) {
            tracing::error!(error = %e, "Failed to print run report");
        }
    } else {
        log_summary(&report);
    }

    if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_tracing(filter: &str, to_stderr: bool) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if to_stderr {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.init();
    }
}

fn print_json(report: &RunReport) -> vidstats_core::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

fn log_summary(report: &RunReport) {
    for record in &report.stages {
        match &record.status {
            StageStatus::Succeeded => tracing::info!(stage = %record.stage, "succeeded"),
            StageStatus::Failed { error } => {
                tracing::error!(stage = %record.stage, error = %error, "failed")
            }
            StageStatus::Skipped => tracing::warn!(stage = %record.stage, "skipped"),
        }
    }
    if report.success {
        tracing::info!(run_id = %report.run_id, "YouTube data pipeline executed successfully");
    } else {
        tracing::error!(run_id = %report.run_id, "YouTube data pipeline failed");
    }
}
