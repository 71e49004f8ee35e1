mod api;
mod balances;
mod config;
mod types;
mod utils;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    balances::{monitor::BalanceMonitor, types::MonitorEvent},
    config::MonitorConfig,
    types::chain::ChainType,
};

#[derive(Parser, Debug)]
#[command(name = "balance-monitor")]
#[command(about = "Track the native balance of one address across supported chains", long_about = None)]
struct Args {
    /// Chain of the address to track (bitcoin, ethereum, solana); detected from
    /// the address format when omitted
    #[arg(short, long)]
    chain: Option<ChainType>,

    /// Address to track
    #[arg(short, long)]
    address: Option<String>,

    /// Preferred provider endpoint for `--chain`
    #[arg(short, long, requires = "chain")]
    source: Option<String>,

    /// Polling period in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// HTTP bind address
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Fetch the balance once, print it and exit
    #[arg(long, requires = "address")]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    dotenv().ok();

    let args = Args::parse();

    let mut config = MonitorConfig::new();
    if let Some(interval_ms) = args.interval_ms.filter(|ms| *ms > 0) {
        config.set_refresh_interval_ms(interval_ms);
    }
    if let Some(bind) = args.bind {
        config.set_bind_addr(bind);
    }
    if let (Some(chain), Some(source)) = (args.chain, args.source) {
        config.set_preferred_source(chain, source);
    }

    let monitor = BalanceMonitor::new(&config).context("failed to build HTTP client")?;

    let tracked = args.address.map(|address| {
        let chain = args.chain.unwrap_or_else(|| {
            let detected = ChainType::detect(&address);
            info!(%address, chain = %detected, "Detected chain from address format");
            detected
        });
        (chain, address)
    });

    if args.once {
        let (chain, address) = tracked.unwrap_or_default();
        let result = monitor.fetch_balance(chain, &address).await;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    // Log every event the monitor publishes
    let mut events = monitor.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(MonitorEvent::BalanceUpdated(result)) if result.success => {
                    info!(
                        chain = %result.chain,
                        address = %result.address,
                        balance = result.balance,
                        source = %result.data_source,
                        "balance updated"
                    );
                }
                Ok(MonitorEvent::BalanceUpdated(result)) => {
                    warn!(
                        chain = %result.chain,
                        address = %result.address,
                        error = %result.error_message,
                        "balance fetch failed"
                    );
                }
                Ok(MonitorEvent::AddressChanged(tracked)) => {
                    info!(chain = %tracked.chain, address = %tracked.address, "tracking address");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event logger lagged behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    if let Some((chain, address)) = tracked {
        monitor.set_address(chain, address).await;
    }

    let app = api::router(monitor);

    let addr = config.bind_addr();
    info!(%addr, "Server running at http://");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
