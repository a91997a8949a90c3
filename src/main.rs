//! certsmith - Certificate Request Workbench
//!
//! Entry point: parses the command line, loads configuration, and either
//! launches the interactive workspace UI (the default) or runs one of the
//! non-interactive subcommands. The certgen backend must answer a `PING`
//! before the UI starts; a dead backend is a fatal startup error rather
//! than something the user discovers mid-edit.

mod commands;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use certsmith::certgen::Certgen;
use certsmith::configs::AppConfig;
use certsmith::exporter::{ExportFormat, ExportOptions};
use certsmith::workspace::Workspace;

#[derive(Parser)]
#[command(name = "certsmith")]
#[command(about = "Compose and export X.509 certificates through the certgen backend")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the certgen backend binary
    #[arg(long, env = "CERTSMITH_CERTGEN")]
    certgen: Option<PathBuf>,

    /// Open a previously saved workspace file in the UI
    #[arg(long)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export certificates from a saved workspace file without the UI
    Export {
        /// Workspace JSON file holding the certificate requests
        #[arg(short, long)]
        requests: PathBuf,

        /// Output directory (default: the configured export directory)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format: pem or pkcs12
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Password protecting exported private keys
        #[arg(long)]
        password: Option<String>,

        /// Whether to write the CA certificate alongside the leaves
        #[arg(long)]
        include_ca: Option<bool>,
    },

    /// Check that the certgen backend responds
    Ping,

    /// Print application and backend versions
    Version,
}

fn main() -> Result<()> {
    // log to stderr so the TUI owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)?;
    if let Some(path) = cli.certgen {
        config.certgen.binary_path = path;
    }
    let certgen = Certgen::new(config.certgen.binary_path.clone());

    match cli.command {
        None => {
            certgen.ping().with_context(|| {
                format!(
                    "the certgen backend at '{}' is not responding",
                    config.certgen.binary_path.display()
                )
            })?;

            let workspace = match &cli.workspace {
                Some(path) => Workspace::load(path, config.defaults.clone())?,
                None => Workspace::new(config.defaults.clone()),
            };

            ui::run_ui(config, certgen, workspace);
            Ok(())
        }
        Some(Commands::Export {
            requests,
            out,
            format,
            password,
            include_ca,
        }) => {
            let mut options = ExportOptions::from_config(&config.export);
            if let Some(out) = out {
                options.export_dir = out;
            }
            if let Some(format) = format {
                options.format = format;
            }
            if let Some(password) = password {
                options.password = password;
            }
            if let Some(include_ca) = include_ca {
                options.include_ca = include_ca;
            }
            commands::export::handle_export(&certgen, &requests, &options)
        }
        Some(Commands::Ping) => {
            certgen.ping()?;
            println!("✓ certgen backend responded");
            Ok(())
        }
        Some(Commands::Version) => {
            println!("certsmith {}", env!("CARGO_PKG_VERSION"));
            println!("certgen backend {}", certgen.version()?);
            Ok(())
        }
    }
}
