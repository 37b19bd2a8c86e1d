use anyhow::{Context, Result};
use clap::{Arg, Command};
use dinetime::db::{get_db_pool, DatabaseConfig};
use dinetime::services::accounts::{self, WalletImport};
use dinetime::utils::{self, validation::is_valid_solana_address};
use dinetime::PgStore;
use std::fs;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    utils::init_logging();

    let matches = Command::new("import-wallet-analysis")
        .about("Store the wallet analysis of a registered user")
        .arg(
            Arg::new("wallet")
                .long("wallet")
                .help("Solana address of the user")
                .required(true),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .help("JSON document with the analysis (camelCase fields)")
                .required(true),
        )
        .get_matches();

    let wallet = matches
        .get_one::<String>("wallet")
        .context("--wallet is required")?;
    let file = matches
        .get_one::<String>("file")
        .context("--file is required")?;

    if !is_valid_solana_address(wallet) {
        anyhow::bail!("{} is not a valid Solana address", wallet);
    }

    let raw = fs::read_to_string(file).with_context(|| format!("reading {}", file))?;
    let import: WalletImport = serde_json::from_str(&raw).with_context(|| format!("parsing {}", file))?;

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;
    let store = PgStore::new(pool);

    let analysis = accounts::import_wallet_analysis(&store, wallet, import).await?;
    info!(
        "Imported analysis for {}: {} NFTs, {} collections, sybil score {:?}",
        wallet,
        analysis.nft_count,
        analysis.top_collections.len(),
        analysis.sybil_score
    );

    Ok(())
}
