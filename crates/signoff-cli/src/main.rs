// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Exit code for runtime errors.
const EXIT_RUNTIME_ERROR: i32 = 1;

#[derive(Parser, Debug)]
#[command(name = "signoff", version, about = "Content-signing workflow engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a P-384 signing keypair and write it as two PEM files.
    Keygen {
        /// Directory to write the PEM files into.
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Filename stem; produces `<stem>.private.pem` and `<stem>.public.pem`.
        #[arg(long, default_value = "signoff")]
        name: String,
    },

    /// Load and validate a resource-map config file.
    CheckConfig {
        /// Path to the TOML config file.
        file: PathBuf,
    },

    /// Print the capability descriptor a host would expose at its root endpoint.
    Capabilities {
        /// Path to the TOML config file.
        file: PathBuf,

        /// Description to advertise in the descriptor.
        #[arg(long, default_value = "content-signing workflow engine")]
        description: String,

        /// URL to advertise in the descriptor.
        #[arg(long, default_value = "https://example.invalid")]
        url: String,

        /// Version to advertise in the descriptor.
        #[arg(long, default_value_t = env!("CARGO_PKG_VERSION").to_string())]
        version: String,
    },

    /// Run a full editor-request / reviewer-approve cycle against an
    /// in-memory backend and print a summary.
    Demo {
        /// Print the summary as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Keygen { out, name } => cmd_keygen(&out, &name),
        Commands::CheckConfig { file } => cmd_check_config(&file),
        Commands::Capabilities { file, description, url, version } => {
            cmd_capabilities(&file, &description, &url, &version)
        }
        Commands::Demo { json } => cmd_demo(json).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(EXIT_RUNTIME_ERROR);
    }
}

fn cmd_keygen(out: &std::path::Path, name: &str) -> Result<()> {
    let (private_path, public_path) = commands::keygen(out, name)?;
    println!("private key: {}", private_path.display());
    println!("public key:  {}", public_path.display());
    Ok(())
}

fn cmd_check_config(file: &std::path::Path) -> Result<()> {
    for line in commands::check_config(file)? {
        println!("{line}");
    }
    Ok(())
}

fn cmd_capabilities(file: &std::path::Path, description: &str, url: &str, version: &str) -> Result<()> {
    println!("{}", commands::capabilities_json(file, description, url, version)?);
    Ok(())
}

async fn cmd_demo(json: bool) -> Result<()> {
    let report = commands::run_demo().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("destination signed: {}", report.destination_signed);
        println!("records mirrored:   {}", report.mirrored_records);
        println!("events:             {}", report.events.join(", "));
    }
    Ok(())
}
