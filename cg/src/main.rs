//! contractgen - natural-language to Solidity generator
//!
//! CLI entry point for one-shot generation, serve mode and the offline tools.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use contractgen::api::GenerateResponse;
use contractgen::classifier::Classifier;
use contractgen::cli::{Cli, Command, GenerateArgs, OutputFormat, get_log_path};
use contractgen::config::Config;
use contractgen::domain::Category;
use contractgen::ipc::{self, GeneratorClient};
use contractgen::sanitizer;
use contractgen::ContractGenerator;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging is not initialized yet, so nothing here can be traced
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, "contractgen loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    let success = match cli.command {
        Command::Generate { args } => cmd_generate(&config, &args).await?,
        Command::Request { args, socket } => cmd_request(&args, socket).await?,
        Command::Serve { socket } => {
            cmd_serve(&config, socket).await?;
            true
        }
        Command::Categories => {
            cmd_categories();
            true
        }
        Command::Classify { requirements } => {
            cmd_classify(&requirements);
            true
        }
        Command::Sanitize { file } => cmd_sanitize(file)?,
    };

    if !success {
        debug!("main: command reported failure");
        std::process::exit(1);
    }
    Ok(())
}

/// Run one generation in-process
async fn cmd_generate(config: &Config, args: &GenerateArgs) -> Result<bool> {
    debug!(identity = %args.identity, "cmd_generate: called");
    let response = match ContractGenerator::from_config(config) {
        Ok(generator) => generator.handle(&args.identity, args.to_body()).await,
        Err(e) => GenerateResponse::failure(&e),
    };
    print_response(&response, &args.format)
}

/// Forward one generation to a running server
async fn cmd_request(args: &GenerateArgs, socket: Option<PathBuf>) -> Result<bool> {
    debug!(?socket, identity = %args.identity, "cmd_request: called");
    let client = match socket {
        Some(path) => GeneratorClient::with_socket_path(path),
        None => GeneratorClient::new(),
    };
    if !client.socket_exists() {
        eprintln!("{} no server socket found; start one with `cg serve`", "error:".red().bold());
        return Ok(false);
    }

    let response = client.generate(&args.identity, args.to_body()).await?;
    print_response(&response, &args.format)
}

/// Serve requests until interrupted
async fn cmd_serve(config: &Config, socket: Option<PathBuf>) -> Result<()> {
    let socket_path = socket.unwrap_or_else(ipc::get_socket_path);
    debug!(?socket_path, "cmd_serve: called");

    let generator = Arc::new(ContractGenerator::from_config(config).context("Failed to start generator")?);
    let sweeper = generator.governor().spawn_sweeper(config.governor.sweep_interval());

    let (listener, socket_path) = ipc::create_listener_at(&socket_path)?;
    println!("{} {}", "Listening on".green(), socket_path.display());
    info!(?socket_path, "Serve mode started");

    let result = tokio::select! {
        result = ipc::serve(listener, generator) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, shutting down");
            Ok(())
        }
    };

    sweeper.abort();
    ipc::cleanup_socket(&socket_path);
    result
}

fn cmd_categories() {
    debug!("cmd_categories: called");
    for category in Category::ALL {
        println!("{:<14} {}", category.id().bold(), category.name());
        let keywords = category.keywords();
        if keywords.is_empty() {
            println!("{:<14} {}", "", "(fallback)".dimmed());
        } else {
            println!("{:<14} {}", "", keywords.join(", ").dimmed());
        }
    }
}

fn cmd_classify(requirements: &str) {
    debug!("cmd_classify: called");
    let category = Classifier::default().classify(requirements);
    println!("{} ({})", category.id().green().bold(), category.name());
}

/// Sanitize a file or stdin and print the body
fn cmd_sanitize(file: Option<PathBuf>) -> Result<bool> {
    debug!(?file, "cmd_sanitize: called");
    let raw = match file {
        Some(path) => fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    match sanitizer::sanitize(&raw) {
        Ok(body) => {
            println!("{}", body);
            Ok(true)
        }
        Err(e) => {
            print_error(&e.to_string());
            Ok(false)
        }
    }
}

fn print_response(response: &GenerateResponse, format: &OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(response).context("Failed to serialize response")?;
            println!("{}", json);
        }
        OutputFormat::Text => match (&response.data, &response.error) {
            (Some(data), _) => println!("{}", data.artifact),
            (None, Some(error)) => print_error(&error.message),
            (None, None) => print_error("empty response"),
        },
    }
    Ok(response.success)
}

fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}
