mod cli;
mod driver;
mod metrics;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use leonardo_core::{
    converter::FALLBACK_DURATION_SECS, load_config_or_default, validate_config, Config, Converter,
    FfmpegConverter, JobState, LoggingConfig, PresetCatalog,
};

use cli::{Cli, Commands};

/// Exit status for a conversion cancelled from the terminal.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging, cli.verbose);

    let command = command_name(&cli.command);
    let result = run(cli.command, config).await;
    metrics::record_command(command, result.is_ok());

    if cli.metrics {
        match metrics::encode_metrics() {
            Ok(text) => print!("{}", text),
            Err(e) => error!("Failed to encode metrics: {:#}", e),
        }
    }

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{} failed", command);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load(path: Option<&Path>) -> Result<Config> {
    let config = load_config_or_default(path).with_context(|| match path {
        Some(path) => format!("Failed to load config from {:?}", path),
        None => "Failed to load config from environment".to_string(),
    })?;
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Convert { .. } => "convert",
        Commands::Presets => "presets",
        Commands::Check => "check",
        Commands::Probe { .. } => "probe",
    }
}

async fn run(command: Commands, config: Config) -> Result<ExitCode> {
    let catalog = PresetCatalog::builtin();
    let converter = FfmpegConverter::new(config.converter);

    match command {
        Commands::Presets => {
            for (index, preset) in catalog.list().iter().enumerate() {
                let marker = if index == 0 { " (default)" } else { "" };
                println!("{}{}", preset.name, marker);
                println!("    extension: {}", preset.output_extension);
                println!("    args:      {}", preset.args.join(" "));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Check => match converter.validate().await {
            Ok(version) => {
                println!("{}", version);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{}", driver::describe_unavailable(&e));
                Ok(ExitCode::FAILURE)
            }
        },

        Commands::Probe { file } => {
            let secs = converter.probe_duration(&file).await;
            if secs == FALLBACK_DURATION_SECS {
                println!(
                    "{}: duration unknown (using {}s)",
                    file.display(),
                    FALLBACK_DURATION_SECS
                );
            } else {
                println!("{}: {:.2}s", file.display(), secs);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Convert {
            input,
            output,
            preset,
        } => {
            let request = driver::resolve_request(&catalog, &input, output, preset.as_deref())?;
            let outcome =
                driver::run_conversion(&converter, request, &mut io::stderr()).await?;
            info!(
                job_id = %outcome.job_id,
                "Conversion {} after {} ms",
                outcome.state,
                outcome.elapsed_ms
            );

            Ok(match outcome.state {
                JobState::Completed => ExitCode::SUCCESS,
                JobState::Cancelled => ExitCode::from(EXIT_CANCELLED),
                _ => ExitCode::FAILURE,
            })
        }
    }
}
