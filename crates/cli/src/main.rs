//! testtool CLI - Main Entry Point
//!
//! Lists the configured modules and submits them from the terminal.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use testtool_cli::commands::{modules, submit};
use testtool_cli::output;
use testtool_common::{HttpTransport, ToolConfig};

/// testtool - schema-driven test forms
#[derive(Parser)]
#[command(name = "testtool")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "TESTTOOL_CONFIG", default_value = "testtool.toml", global = true)]
    config: PathBuf,

    /// Base URL for module endpoints (overrides the configuration)
    #[arg(long, env = "TESTTOOL_BACKEND_URL", global = true)]
    backend_url: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect registered modules
    #[command(subcommand)]
    Modules(modules::ModulesCommands),

    /// Submit a module form
    Submit(submit::SubmitArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ToolConfig::load(&cli.config)?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }

    match cli.command {
        Commands::Modules(cmd) => {
            let registry = config.registry()?;
            modules::execute(cmd, &registry, cli.format).await?
        }
        Commands::Submit(args) => {
            let registry = config.registry()?;
            let transport = HttpTransport::new(&config.backend_url, config.request_timeout())?;
            if !submit::execute(args, &registry, &transport, cli.format).await? {
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("testtool CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Backend: {}", config.backend_url);
        }
    }

    Ok(())
}
