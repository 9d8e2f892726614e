//! Blackjack room server.
//!
//! Serves the room API over HTTP, streams room events to viewers and sweeps
//! expired stage deadlines in the background.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use bj_server::{api, config::ServerConfig, logging, metrics};
use blackjack_rooms::{
    Broadcaster, DeckProvider, LocalDeck, MemoryStore, RemoteDeck, RoomService,
};
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use tokio::sync::watch;

const HELP: &str = "\
Run a shared blackjack room server

USAGE:
  bj_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --deck-api   URL         Deck service base URL       [default: env DECK_API_URL or in-process shuffling]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DECK_API_URL             deckofcardsapi-compatible service, e.g. https://deckofcardsapi.com/api/deck
  METRICS_BIND             Prometheus scrape address
  DEADLINE_WATCH_SECS      Deadline sweep period
  SSE_KEEP_ALIVE_SECS      Keep-alive comment interval on event streams
  BROADCAST_BUFFER         Frames buffered per viewer before dropping
  ROOM_STARTING_BALANCE    Default chips for new seats
  ROOM_MIN_BET             Default minimum bet for new rooms
  ROOM_BETTING_SECS        Default betting window
  ROOM_TURN_SECS           Default turn window
  ROOM_DECK_COUNT          Default number of decks in the shoe
  ROOM_DEALER_HITS_SOFT_17 Whether the dealer draws on a soft 17
  RUST_LOG                 Log filter (e.g., info,blackjack_rooms=debug)
";

struct Args {
    bind: Option<SocketAddr>,
    deck_api: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        deck_api: pargs.opt_value_from_str("--deck-api")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.deck_api)?;
    config.validate()?;

    // Catching signals for a graceful exit.
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    set_handler(move || {
        let _ = shutdown_tx.send(true);
    })?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics at http://{}/metrics", addr);
    }

    let deck: Arc<dyn DeckProvider> = match &config.deck_api_url {
        Some(url) => {
            info!("Drawing cards from {}", url);
            Arc::new(RemoteDeck::new(url.clone()))
        }
        None => {
            info!("Shuffling cards in process");
            Arc::new(LocalDeck::new())
        }
    };

    let rooms = Arc::new(RoomService::new(
        Arc::new(MemoryStore::new()),
        deck,
        Arc::new(Broadcaster::new(config.broadcast_buffer)),
    ));
    let watcher = Arc::clone(&rooms).spawn_deadline_watcher(config.deadline_watch);

    let app = api::create_router(api::AppState {
        rooms,
        room_defaults: config.room_defaults.clone(),
        keep_alive: config.keep_alive,
    });

    info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    watcher.abort();

    Ok(())
}
