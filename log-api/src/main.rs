mod config;
mod observability;

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError};
use log_ingest::LogIngestError;
use log_ingest::config::ValidationError;
use observability::ObservabilityError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "log-api", about = "Accepts logs over HTTP and publishes them to Kafka")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the log and admin listeners
    Run(ConfigArgs),
    /// Load and validate a config file, then exit
    Validate(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, short = 'c')]
    config_file: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Observability(#[from] ObservabilityError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Ingest(#[from] LogIngestError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        CliCommand::Run(args) => run(&args),
        CliCommand::Validate(args) => validate(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "log-api failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &ConfigArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config_file)?;
    config.ingest.validate()?;

    let _guard = observability::init(
        config.common.logging.as_ref(),
        config.common.metrics.as_ref(),
    )?;
    tracing::info!(config_file = %args.config_file.display(), "Starting log-api");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(log_ingest::run(config.ingest))?;

    Ok(())
}

fn validate(args: &ConfigArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config_file)?;
    config.ingest.validate()?;

    println!("{} is valid", args.config_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run_command() {
        let cli = Cli::try_parse_from(["log-api", "run", "--config-file", "log-api.yaml"])
            .expect("parse");
        match cli.command {
            CliCommand::Run(args) => assert_eq!(args.config_file, PathBuf::from("log-api.yaml")),
            CliCommand::Validate(_) => panic!("expected run"),
        }
    }

    #[test]
    fn config_file_is_required() {
        assert!(Cli::try_parse_from(["log-api", "validate"]).is_err());
    }

    #[test]
    fn validate_rejects_invalid_config() {
        use std::io::Write;

        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(
            tmp,
            "ingest:\n  service:\n    region: ''\n  producer:\n    backend:\n      type: noop\n"
        )
        .expect("write yaml");

        let args = ConfigArgs {
            config_file: tmp.path().to_path_buf(),
        };
        assert!(matches!(
            validate(&args),
            Err(CliError::Validation(ValidationError::EmptyRegion))
        ));
    }
}
