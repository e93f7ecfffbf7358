//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::api::GenerateRequestBody;
use crate::domain::GenerationOptions;

/// contractgen - natural-language to Solidity generator
#[derive(Parser)]
#[command(
    name = "cg",
    about = "Generate Solidity smart contracts from plain-language requirements",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a contract in this process
    Generate {
        #[command(flatten)]
        args: GenerateArgs,
    },

    /// Send a generation request to a running `cg serve`
    Request {
        #[command(flatten)]
        args: GenerateArgs,

        /// Socket path of the server
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },

    /// Serve generation requests on a Unix socket
    Serve {
        /// Socket path to bind
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },

    /// List contract categories and their keywords
    Categories,

    /// Show which category requirements would be classified as
    Classify {
        /// Requirements text
        requirements: String,
    },

    /// Sanitize a raw model response from a file or stdin
    Sanitize {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
    },
}

/// Arguments shared by `generate` and `request`
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Plain-language contract requirements
    pub requirements: String,

    /// Explicit category (erc20, erc721, multisig, crowdfunding, defi, dao, generic)
    #[arg(long)]
    pub category: Option<String>,

    /// Contract or token name
    #[arg(long)]
    pub name: Option<String>,

    /// Token symbol
    #[arg(long)]
    pub symbol: Option<String>,

    /// Initial token supply
    #[arg(long = "initial-supply")]
    pub initial_supply: Option<String>,

    /// Requested feature; repeat for several
    #[arg(long = "feature", value_name = "FEATURE")]
    pub features: Vec<String>,

    /// Caller identity used for rate limiting
    #[arg(long, default_value = "local")]
    pub identity: String,

    /// Output format
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

impl GenerateArgs {
    /// Build the wire request from the arguments
    pub fn to_body(&self) -> GenerateRequestBody {
        debug!(?self.category, "GenerateArgs::to_body: called");
        let options = GenerationOptions {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            initial_supply: self.initial_supply.clone(),
            features: self.features.clone(),
        };

        GenerateRequestBody {
            requirements: self.requirements.clone(),
            category: self.category.clone(),
            options: if options.is_empty() { None } else { Some(options) },
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("contractgen")
        .join("logs")
        .join("contractgen.log")
}

/// Output format for generation results
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Response envelope as pretty JSON
    #[default]
    Json,
    /// Contract source only, errors on stderr
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "plain" | "source" => Ok(Self::Text),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: json or text", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_generate() {
        let cli = Cli::parse_from([
            "cg",
            "generate",
            "A utility token called FooCoin",
            "--symbol",
            "FOO",
            "--feature",
            "mintable",
            "--feature",
            "burnable",
        ]);
        let Command::Generate { args } = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.requirements, "A utility token called FooCoin");
        assert_eq!(args.identity, "local");
        assert_eq!(args.format, OutputFormat::Json);

        let body = args.to_body();
        let options = body.options.unwrap();
        assert_eq!(options.symbol.as_deref(), Some("FOO"));
        assert_eq!(options.features, vec!["mintable".to_string(), "burnable".to_string()]);
    }

    #[test]
    fn test_generate_without_options_sends_none() {
        let cli = Cli::parse_from(["cg", "generate", "A DAO for the club", "--category", "dao"]);
        let Command::Generate { args } = cli.command else {
            panic!("expected generate");
        };
        let body = args.to_body();
        assert!(body.options.is_none());
        assert_eq!(body.category.as_deref(), Some("dao"));
    }

    #[test]
    fn test_cli_parse_request_with_socket() {
        let cli = Cli::parse_from([
            "cg",
            "request",
            "A DAO",
            "--socket",
            "/tmp/cg.sock",
            "--identity",
            "10.0.0.1",
            "--format",
            "text",
        ]);
        let Command::Request { args, socket } = cli.command else {
            panic!("expected request");
        };
        assert_eq!(socket, Some(PathBuf::from("/tmp/cg.sock")));
        assert_eq!(args.identity, "10.0.0.1");
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from(["cg", "categories", "--log-level", "debug", "-c", "/tmp/cg.yml"]);
        assert!(matches!(cli.command, Command::Categories));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/cg.yml")));
    }

    #[test]
    fn test_cli_parse_sanitize_stdin() {
        let cli = Cli::parse_from(["cg", "sanitize"]);
        assert!(matches!(cli.command, Command::Sanitize { file: None }));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("source".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_log_path() {
        assert!(get_log_path().ends_with("contractgen/logs/contractgen.log"));
    }
}
