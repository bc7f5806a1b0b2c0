use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use tron_watch::security::{KeyVault, SealedKey};

#[derive(Parser)]
#[command(name = "watch-cli")]
#[command(about = "Management CLI for the TRON ledger monitor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key
    #[arg(short, long, env = "TRON_WATCH_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show poller state and counters
    Status,
    /// List watched addresses
    Addresses,
    /// Start watching an address
    Watch { address: String },
    /// Stop watching an address
    Unwatch { address: String },
    /// List transactions awaiting a terminal status
    Pending,
    /// Show the stored record for a transaction
    Tx { tx_id: String },
    /// Print a fresh 32-byte vault key as hex
    GenKey,
    /// Encrypt a private key with the vault key from ENCRYPTION_KEY
    Seal {
        /// Hex private key; read from TRON_PRIVATE_KEY when omitted
        #[arg(env = "TRON_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
        #[arg(long, default_value = "ENCRYPTION_KEY")]
        key_env: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Local commands need no server
    match &cli.command {
        Commands::GenKey => {
            println!("{}", KeyVault::generate_key_hex().as_str());
            return Ok(());
        }
        Commands::Seal { private_key, key_env } => {
            let vault = KeyVault::from_env(key_env)?;
            let sealed = SealedKey::seal(private_key, &vault)?;
            println!("{}", serde_json::to_string_pretty(&sealed)?);
            return Ok(());
        }
        _ => {}
    }

    let client = reqwest::Client::new();
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Addresses => client.get(format!("{}/admin/addresses", cli.url)),
        Commands::Watch { address } => client
            .post(format!("{}/admin/addresses", cli.url))
            .json(&serde_json::json!({ "address": address })),
        Commands::Unwatch { address } => {
            client.delete(format!("{}/admin/addresses/{}", cli.url, address))
        }
        Commands::Pending => client.get(format!("{}/admin/pending", cli.url)),
        Commands::Tx { tx_id } => client.get(format!("{}/admin/transactions/{}", cli.url, tx_id)),
        Commands::GenKey | Commands::Seal { .. } => unreachable!("handled above"),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
