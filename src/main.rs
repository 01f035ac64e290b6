//! Cross-exchange arbitrage engine entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal_macros::dec;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cross_arb::api::{create_router, AppState};
use cross_arb::arbitrage::Engine;
use cross_arb::config::Config;
use cross_arb::notify::{Notifier, TracingSink};
use cross_arb::utils::shutdown_signal;
use cross_arb::venue::{ExchangeAdapter, PaperVenueBuilder};

/// Cross-exchange arbitrage engine.
#[derive(Parser, Debug)]
#[command(name = "cross-arb")]
#[command(about = "Watches venue order books and arbitrages profitable spreads")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// Trade against the built-in paper venues instead of live adapters.
    #[arg(long)]
    paper: bool,

    /// HTTP server port for health/metrics (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the arbitrage engine (default).
    Run {
        /// Trade against the built-in paper venues instead of live adapters.
        #[arg(long)]
        paper: bool,

        /// HTTP server port for health/metrics (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Report per-venue balances and unresolved open orders.
    CheckBalances,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("cross_arb=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::CheckBalances) => cmd_check_balances().await,
        Some(Command::Run { paper, port }) => cmd_run(paper, port).await,
        None => cmd_run(args.paper, args.port).await,
    }
}

/// Built-in paper venues for smoke runs without live adapters.
///
/// "alpha" charges an on-chain withdrawal fee before its purchases can be
/// sold elsewhere; "beta" has no such constraint.
fn build_paper_venues() -> Vec<Arc<dyn ExchangeAdapter>> {
    let alpha = PaperVenueBuilder::new("alpha")
        .fee_deduction(dec!(0.014))
        .withdrawal_fee(dec!(0.01))
        .bid(dec!(0.98), dec!(5000))
        .ask(dec!(1.00), dec!(5000))
        .balance(dec!(10000), dec!(10000))
        .build();

    let beta = PaperVenueBuilder::new("beta")
        .fee_deduction(dec!(0.004))
        .bid(dec!(1.05), dec!(5000))
        .ask(dec!(1.07), dec!(5000))
        .balance(dec!(10000), dec!(10000))
        .build();

    vec![Arc::new(alpha), Arc::new(beta)]
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CROSS-ARB - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Profit Threshold: {}", config.profit_threshold);
    println!("  Min Trade Volume: {}", config.min_trade_volume);
    println!("  Listing Buffer: {}", config.listing_buffer);
    println!(
        "  Reserves: {} quote / {} base",
        config.quote_reserve, config.base_reserve
    );
    println!("  Book Valid Window: {}s", config.book_valid_window_secs);
    println!("  Sync Tolerance: {}s", config.sync_tolerance_secs);
    println!("  Fetch Interval: {}ms", config.fetch_interval_ms);
    println!("  Tick Interval: {}ms", config.tick_interval_ms);
    println!("  Balance Refresh: {}s", config.balance_refresh_secs);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Report per-venue balances and unresolved open orders.
async fn cmd_check_balances() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CROSS-ARB - BALANCE CHECK (paper venues)");
    println!("======================================================================");

    for venue in build_paper_venues() {
        println!("\nVenue: {}", venue.name());

        print!("  Balances... ");
        match venue.balances().await {
            Ok(balance) => {
                println!("OK");
                println!("    Quote: {}", balance.quote);
                println!("    Base:  {}", balance.base);
            }
            Err(e) => {
                println!("FAILED");
                println!("    Error: {}", e);
            }
        }

        print!("  Open orders... ");
        match venue.open_orders().await {
            Ok(orders) if orders.is_empty() => println!("none"),
            Ok(orders) => {
                println!("{} open", orders.len());
                for order in orders {
                    println!(
                        "    {} {} {} @ {}",
                        order.id, order.side, order.volume, order.price
                    );
                }
            }
            Err(e) => {
                println!("FAILED");
                println!("    Error: {}", e);
            }
        }
    }

    println!("\n======================================================================");
    println!("BALANCE CHECK COMPLETED");
    println!("======================================================================");

    Ok(())
}

/// Run the arbitrage engine.
async fn cmd_run(paper: bool, port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    if !paper {
        anyhow::bail!(
            "no live venue adapters are linked into this binary; \
             embed the library with your adapters, or pass --paper for a smoke run"
        );
    }

    let venues = build_paper_venues();
    anyhow::ensure!(venues.len() >= 2, "at least two venues are required");

    info!("Configuration loaded successfully");
    info!("Mode: PAPER");
    info!("Profit threshold: {}", config.profit_threshold);
    info!("Min trade volume: {}", config.min_trade_volume);

    // Install the Prometheus recorder before any metric is touched.
    let prometheus = PrometheusBuilder::new().install_recorder()?;
    cross_arb::metrics::init_metrics();

    let app_state = AppState::new().with_prometheus(prometheus);

    // Start HTTP server
    let port = port_override.unwrap_or(config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());
    let _server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    // Notifications are best-effort and must never affect trading.
    let (notifier, _notify_handle) = Notifier::spawn(Arc::new(TracingSink));

    let engine = Engine::new(venues, config, notifier, app_state);

    info!("Initiating arbitrage engine...");
    tokio::select! {
        result = engine.run() => {
            error!("engine stopped: fatal condition");
            result.map_err(Into::into)
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received");
            Ok(())
        }
    }
}
