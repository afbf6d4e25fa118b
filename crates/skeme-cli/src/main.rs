//! Skeme CLI - resolve `$ref` references across JSON and YAML documents
//!
//! This is the main entry point for the `skeme` binary. It loads a document
//! from a URL or local path, inlines every reference and prints the result.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::Cli;
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::io;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // Configuration is needed before logging: it may name a log file
    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", error::format_error(&e, cli.use_color()));
            process::exit(e.exit_code());
        }
    };

    control::set_override(cli.use_color() && config.output.color);

    let _guard = match init_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    match run(cli, config).await {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(verbosity = cli.verbosity_level()))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    if let Some(shell) = cli.completions {
        return handlers::handle_completions(shell, &mut io::stdout());
    }

    let format = match cli.output {
        Some(format) => format,
        None => config.output.output_format()?,
    };

    let mut output = OutputWriter::new(
        format,
        control::SHOULD_COLORIZE.should_colorize(),
        cli.quiet,
        cli.verbosity_level(),
    );
    if !config.output.progress {
        output = output.without_progress();
    }

    tracing::info!(?format, "Resolving document");
    handlers::handle_resolve(&cli, &config, &mut output).await
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<Option<WorkerGuard>> {
    let verbosity = cli.verbosity_level();
    let mut logging_config = LoggingConfig::from_verbosity(verbosity);
    logging_config.merge_with_file(&config.logging, verbosity);
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["skeme", "spec.json"]);
        assert_eq!(cli.verbosity_level(), 0);
        assert_eq!(cli.target(), Some("spec.json"));

        let cli = Cli::parse_from(["skeme", "-vv", "--url", "http://host/spec.json"]);
        assert_eq!(cli.verbosity_level(), 2);
        assert_eq!(cli.target(), Some("http://host/spec.json"));

        let cli = Cli::parse_from(["skeme", "--quiet", "spec.json"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_file_logging_defaults_keep_verbosity_level() {
        let cli = Cli::parse_from(["skeme", "-q", "spec.json"]);
        let verbosity = cli.verbosity_level();
        let mut logging_config = LoggingConfig::from_verbosity(verbosity);
        logging_config.merge_with_file(&Config::default().logging, verbosity);
        assert_eq!(logging_config.level, "warn");
    }
}
