use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use gridsweep_core::{CoverageRequest, ExecutionResult, ValidationError};
use gridsweep_service::{logging, CoverageService, ServiceConfig, ServiceError, ServiceResponse};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .value_parser(clap::value_parser!(PathBuf))
        .help("TOML configuration file");
    let store_arg = Arg::new("store")
        .long("store")
        .value_parser(clap::value_parser!(PathBuf))
        .help("JSON-lines store file (overrides configuration)");

    Command::new("gridsweep")
        .version(gridsweep_service::VERSION)
        .about("Grid path coverage with conflict-safe result storage")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Compute coverage for a request and store the result")
                .arg(
                    Arg::new("request")
                        .long("request")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Request JSON file, or - for stdin"),
                )
                .arg(config_arg.clone())
                .arg(store_arg.clone()),
        )
        .subcommand(
            Command::new("list")
                .about("Print stored executions")
                .arg(config_arg)
                .arg(store_arg),
        )
}

fn load_config(args: &ArgMatches) -> anyhow::Result<ServiceConfig> {
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::new(),
    };
    let config = config.with_env_overrides()?;
    Ok(match args.get_one::<PathBuf>("store") {
        Some(path) => config.with_store_path(path),
        None => config,
    })
}

/// Message returned when the request body is not JSON at all
const UNPARSEABLE_REQUEST: &str = "Request body is not valid JSON.";

fn read_request(path: &Path) -> anyhow::Result<String> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read request from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request {}", path.display()))?
    };
    Ok(text)
}

fn parse_request(text: &str) -> Result<CoverageRequest, ServiceError> {
    serde_json::from_str(text).map_err(|e| {
        tracing::info!(error = %e, "request body rejected");
        ServiceError::from(ValidationError::single(UNPARSEABLE_REQUEST))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();
    let (command, args) = matches
        .subcommand()
        .context("a subcommand is required")?;

    let config = load_config(args)?;
    logging::init(&config.log)?;
    let service = CoverageService::from_config(&config)?;

    match command {
        "run" => {
            let path = args
                .get_one::<PathBuf>("request")
                .context("--request is required")?;
            let request = match parse_request(&read_request(path)?) {
                Ok(request) => request,
                Err(error) => {
                    let response = ServiceResponse::from(Err::<ExecutionResult, _>(error));
                    println!("{}", serde_json::to_string_pretty(&response)?);
                    return Ok(ExitCode::FAILURE);
                }
            };

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, cancelling request");
                    on_signal.cancel();
                }
            });

            let response = service.respond(&request, &cancel).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        "list" => {
            let history = service.history().await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
            Ok(ExitCode::SUCCESS)
        }
        other => anyhow::bail!("unknown subcommand {other}"),
    }
}
