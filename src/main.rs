use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use configuration::{
    CancelFilter, Config, InstrumentReleaseMode, ReducerSettings, SessionSettings,
    TradingParameters, UnderflowPolicy,
};
use core_types::Position;
use engine::{TradingSession, feed_events};
use reducer::{TradingState, build_reducer, total_holdings};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Capacity of the channel between the event feed and the session.
const EVENT_BUFFER: usize = 1024;

/// The main entry point for the Automata trading-state tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the config file and defaults still apply.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = configuration::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let _guard = configuration::init_tracing(&config.logging)
        .context("Failed to initialize logging")?;

    match cli.command {
        Commands::Replay(args) => handle_replay(args, config).await,
        Commands::Params(args) => handle_params(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Tracks orders, cash and instrument positions from a stream of trading events.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to `automata.toml` if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fold a JSON-lines event file through the reducer and print the final state.
    Replay(ReplayArgs),
    /// Validate and print the session's trading parameters.
    Params(ParamsArgs),
}

#[derive(Parser)]
struct ReplayArgs {
    /// File with one `{"type": ..., "payload": ...}` event per line.
    #[arg(long)]
    events: PathBuf,

    /// Override the configured halt release mode.
    #[arg(long, value_enum)]
    release_mode: Option<InstrumentReleaseMode>,

    /// Override the configured cancellation filter.
    #[arg(long, value_enum)]
    cancel_filter: Option<CancelFilter>,

    /// Override the configured negative-position policy.
    #[arg(long, value_enum)]
    underflow: Option<UnderflowPolicy>,

    /// Refuse events the order lifecycle does not allow.
    #[arg(long)]
    strict: bool,

    /// Print the remaining orders as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ParamsArgs {
    /// The API authorization token.
    token: String,
    /// Comma-separated tickers, e.g. "SBER,GAZP".
    tickers: String,
    /// Comma-separated candle intervals, one per ticker, e.g. "1min,hour".
    intervals: String,
    /// "true" for the sandbox environment, anything else for live trading.
    sandbox: String,
}

// ==============================================================================
// Replay Command Logic
// ==============================================================================

async fn handle_replay(args: ReplayArgs, config: Config) -> anyhow::Result<()> {
    let settings = reducer_settings(&args, config.reducer);
    info!(?settings, events = %args.events.display(), "Starting replay");

    let file = tokio::fs::File::open(&args.events)
        .await
        .with_context(|| format!("Failed to open events file {}", args.events.display()))?;

    let mut session = TradingSession::new(build_reducer(settings), initial_state(&config.session));
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let feeder = tokio::spawn(feed_events(BufReader::new(file), tx));

    let report = session.run(rx).await;
    let fed = feeder.await.context("Event feed task failed")?;

    let state = session.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(state.orders())?);
    } else {
        print_market(&state);
        print_orders(&state);
        print_positions(&state);
    }
    println!(
        "\nApplied {} event(s), rejected {}.",
        report.applied, report.rejected
    );
    if report.rejected > 0 {
        warn!(rejected = report.rejected, "Some events were rejected; see the log for details");
    }

    fed.context("Event feed stopped early")?;
    Ok(())
}

/// Command-line flags win over the configuration file.
fn reducer_settings(args: &ReplayArgs, mut settings: ReducerSettings) -> ReducerSettings {
    if let Some(mode) = args.release_mode {
        settings.release_mode = mode;
    }
    if let Some(filter) = args.cancel_filter {
        settings.cancel_filter = filter;
    }
    if let Some(policy) = args.underflow {
        settings.underflow = policy;
    }
    settings.strict |= args.strict;
    settings
}

fn initial_state(session: &SessionSettings) -> TradingState {
    let cash = session
        .currency_map()
        .into_iter()
        .map(|(currency, balance)| (currency, Position::new(balance, None)))
        .collect();
    let holdings = session
        .instrument_map()
        .into_iter()
        .map(|(figi, balance)| (figi, Position::new(balance, None)))
        .collect();
    TradingState::with_holdings(session.settlement_currency, cash, holdings)
}

fn print_market(state: &TradingState) {
    println!("\n--- Market ---");
    match state.instrument_info() {
        Some(info) => println!(
            "Instrument: {} (lot {}, step {}, {})",
            info.figi,
            info.lot,
            info.min_price_increment,
            if info.can_trade { "trading" } else { "halted" }
        ),
        None => println!("Instrument: no trading rules received"),
    }
    if let Some(candle) = state.candle() {
        println!(
            "Last candle: {} {} close {} (high {}, low {})",
            candle.date_time, candle.interval, candle.close, candle.high, candle.low
        );
    }
    if let Some(book) = state.orderbook() {
        let level = |stake: Option<&core_types::StakeState>| {
            stake.map_or_else(|| "-".to_string(), |s| format!("{} x {}", s.price, s.count))
        };
        println!(
            "Order book: bid {} / ask {}",
            level(book.best_bid()),
            level(book.best_ask())
        );
    }
}

fn print_orders(state: &TradingState) {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Side", "Status", "Executed / Requested", "Price", "FIGI"]);
    for order in state.orders() {
        table.add_row(vec![
            Cell::new(&order.id),
            Cell::new(format!("{:?}", order.side)),
            Cell::new(if order.status.is_pending() {
                format!("{} (awaiting exchange)", order.status)
            } else {
                order.status.to_string()
            }),
            Cell::new(format!("{} / {}", order.executed_lots, order.requested_lots)),
            Cell::new(order.price),
            Cell::new(&order.figi),
        ]);
    }
    println!("\n--- Open Orders ({}) ---", state.orders().len());
    println!("{table}");
}

fn print_positions(state: &TradingState) {
    let mut cash: Vec<_> = state.currency_positions().iter().collect();
    cash.sort_by_key(|(currency, _)| **currency);
    let mut holdings: Vec<_> = state.instrument_positions().iter().collect();
    holdings.sort_by(|a, b| a.0.cmp(b.0));

    let mut table = Table::new();
    table.set_header(vec!["Asset", "Balance", "Blocked", "Total"]);
    for (currency, position) in cash {
        table.add_row(position_row(&currency.to_string(), position));
    }
    for (figi, position) in holdings {
        table.add_row(position_row(figi, position));
    }

    let cash_total: Decimal = total_holdings(state.currency_positions());
    println!(
        "\n--- Positions (settlement {}, available {}, all currencies {}) ---",
        state.settlement_currency(),
        state.available_cash(),
        cash_total
    );
    println!("{table}");
}

fn position_row(asset: &str, position: &Position) -> Vec<Cell> {
    vec![
        Cell::new(asset),
        Cell::new(position.balance),
        Cell::new(position.blocked),
        Cell::new(position.total()),
    ]
}

// ==============================================================================
// Params Command Logic
// ==============================================================================

fn handle_params(args: ParamsArgs) -> anyhow::Result<()> {
    let params = TradingParameters::from_program_args(
        &args.token,
        &args.tickers,
        &args.intervals,
        &args.sandbox,
    )
    .context("Invalid trading parameters")?;

    let mut table = Table::new();
    table.set_header(vec!["Ticker", "Candle Interval"]);
    for (ticker, interval) in params.subscriptions() {
        table.add_row(vec![Cell::new(ticker), Cell::new(interval)]);
    }

    println!("Token:   {}", params.masked_token());
    println!(
        "Mode:    {}",
        if params.sandbox_mode { "sandbox" } else { "live" }
    );
    println!("{table}");
    Ok(())
}
