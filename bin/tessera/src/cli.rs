//! Tessera CLI entry point.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use tessera_api::{BackendMode, ClientConfig};
use tessera_client::StorageClient;

/// Tessera - client for a proof-backed decentralized storage network
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// RPC endpoint of the storage network.
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Backend selection: auto, real, or substitute.
    #[arg(long, global = true, default_value = "auto")]
    mode: String,

    /// Enable CDN delivery mode.
    #[arg(long, global = true)]
    cdn: bool,

    /// Network identifier.
    #[arg(long, global = true, default_value = "calibration")]
    network: String,

    /// Treat this deployment as production (real-backend failures are fatal).
    #[arg(long, global = true)]
    production: bool,

    /// Wallet private key, hex-encoded.
    #[arg(long, global = true, env = "TESSERA_WALLET_KEY", hide_env_values = true)]
    wallet_key: Option<String>,

    /// Address of the storage service to approve spending for.
    #[arg(long, global = true)]
    service_address: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a file (or stdin with "-") and print the storage record.
    Store {
        /// File to upload, or "-" for stdin.
        file: String,
    },
    /// Download content by identifier.
    Retrieve {
        /// Content identifier to retrieve.
        cid: String,
        /// Write the payload to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Confirm an identifier is still retrievable, without downloading it.
    Verify {
        /// Content identifier to verify.
        cid: String,
    },
    /// Print the fetchable URL for an identifier.
    Url {
        /// Content identifier to resolve.
        cid: String,
    },
    /// Print an operational snapshot (provider, proof set, balance).
    Stats,
}

impl Cli {
    fn config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig {
            mode: BackendMode::from_str(&self.mode)
                .wrap_err_with(|| format!("unknown backend mode {:?}", self.mode))?,
            production: self.production,
            cdn_enabled: self.cdn,
            network: self.network.clone(),
            wallet_key: self.wallet_key.clone(),
            ..ClientConfig::default()
        };
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        }
        if let Some(address) = &self.service_address {
            config.service_address = Address::from_str(address)
                .wrap_err_with(|| format!("invalid service address {address:?}"))?;
        }
        Ok(config)
    }
}

/// Parse arguments, set up logging, and dispatch the subcommand.
pub(crate) async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let client = StorageClient::new(cli.config()?);

    match &cli.command {
        Command::Store { file } => {
            let data = if file == "-" {
                let mut buffer = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut buffer)
                    .wrap_err("failed to read stdin")?;
                buffer
            } else {
                std::fs::read(file).wrap_err_with(|| format!("failed to read {file}"))?
            };
            let result = client.store_data(data).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Retrieve { cid, output } => {
            let result = client.retrieve_data(cid).await?;
            let bytes = result.payload.into_bytes();
            match output {
                Some(path) => {
                    std::fs::write(path, &bytes)
                        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(mime_type = %result.mime_type, path = %path.display(), "payload written");
                }
                None => std::io::stdout()
                    .write_all(&bytes)
                    .wrap_err("failed to write payload to stdout")?,
            }
        }
        Command::Verify { cid } => {
            let available = client.verify(cid).await?;
            println!("{available}");
            if !available {
                std::process::exit(1);
            }
        }
        Command::Url { cid } => {
            println!("{}", client.get_cdn_url(cid)?);
        }
        Command::Stats => {
            client.initialize().await?;
            let stats = client.stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
