use chrono::Utc;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use subscription_cron::application::billing::{BillingJob, BillingSettings};
use subscription_cron::config::Config;
use subscription_cron::domain::ports::{
    BillingPorts, PaymentStoreRef, SubscriptionStoreRef, WalletStoreRef,
};
use subscription_cron::infrastructure::helius::HeliusIndexer;
use subscription_cron::infrastructure::in_memory::{
    InMemoryPaymentStore, InMemorySubscriptionStore, InMemoryWalletStore,
};
use subscription_cron::infrastructure::transfer::HttpTransferExecutor;
use subscription_cron::interfaces::csv::payment_writer::PaymentWriter;
use subscription_cron::interfaces::http::{AppState, build_router};
use subscription_cron::interfaces::seed::SeedData;
use subscription_cron::telemetry::{DEFAULT_FILTER, init_tracing};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = "DATABASE_PATH")]
    db_path: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the cron route over HTTP
    Serve {
        /// Listen address
        #[arg(long, default_value = "0.0.0.0:3000", env = "LISTEN_ADDR")]
        addr: SocketAddr,

        /// Seconds a request waits for the billing pass before answering 504
        #[arg(long, default_value_t = 300, env = "MAX_DURATION_SECS")]
        max_duration: u64,
    },
    /// Run one billing pass now and print the payments it created as CSV
    Run {
        /// JSON file with subscriptions and wallets to load before the pass
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

struct Stores {
    subscriptions: SubscriptionStoreRef,
    payments: PaymentStoreRef,
    wallets: WalletStoreRef,
}

fn in_memory_stores() -> Stores {
    Stores {
        subscriptions: Arc::new(InMemorySubscriptionStore::new()),
        payments: Arc::new(InMemoryPaymentStore::new()),
        wallets: Arc::new(InMemoryWalletStore::new()),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    use subscription_cron::infrastructure::rocksdb::RocksDBStore;

    let Some(path) = db_path else {
        return Ok(in_memory_stores());
    };
    let store = RocksDBStore::open(path).into_diagnostic()?;
    info!(path = %path.display(), "Opened RocksDB store");
    Ok(Stores {
        subscriptions: Arc::new(store.clone()),
        payments: Arc::new(store.clone()),
        wallets: Arc::new(store),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores())
}

async fn serve(config: Config, ports: BillingPorts, addr: SocketAddr, max_duration: u64) -> Result<()> {
    let state = AppState::new(&config, ports).with_max_duration(Duration::from_secs(max_duration));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    info!(%addr, "subscription-cron listening");
    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}

async fn run_once(config: Config, ports: BillingPorts, seed: Option<PathBuf>) -> Result<()> {
    let receive_wallet = config
        .receive_wallet
        .clone()
        .ok_or_else(|| miette!("EAP_RECEIVE_WALLET_ADDRESS env var not set"))?;

    if let Some(path) = seed {
        SeedData::from_path(path)
            .into_diagnostic()?
            .load_into(&ports)
            .await
            .into_diagnostic()?;
    }

    let job = BillingJob::new(
        ports.clone(),
        BillingSettings {
            receive_wallet,
            price: config.subscription_price,
        },
    );
    let mut report = job.run(Utc::now()).await.into_diagnostic()?;
    report.payments.sort_by_key(|outcome| outcome.subscription_id);

    let mut payments = Vec::with_capacity(report.payments.len());
    for outcome in &report.payments {
        if let Some(payment) = ports.payments.get(outcome.payment_id).await.into_diagnostic()? {
            payments.push(payment);
        }
    }

    let stdout = io::stdout();
    let mut writer = PaymentWriter::new(stdout.lock());
    writer.write_payments(&payments).into_diagnostic()?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(DEFAULT_FILTER, cli.log_json);

    let config = Config::from_env().into_diagnostic()?;
    let stores = open_stores(cli.db_path.as_deref())?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .into_diagnostic()?;
    let ports = BillingPorts {
        subscriptions: stores.subscriptions,
        payments: stores.payments,
        wallets: stores.wallets,
        indexer: Arc::new(HeliusIndexer::new(
            client.clone(),
            config.helius_rpc_url.clone(),
            config.helius_api_key.clone(),
        )),
        transfers: Arc::new(HttpTransferExecutor::new(
            client,
            config.transfer_url.clone(),
            config.transfer_api_key.clone(),
        )),
    };

    match cli.command {
        Command::Serve { addr, max_duration } => serve(config, ports, addr, max_duration).await,
        Command::Run { seed } => run_once(config, ports, seed).await,
    }
}
