//! Ticker Board Binary
//!
//! Loads the KRW ticker table, keeps it fresh from the realtime stream and
//! logs view changes until interrupted.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin ticker-board
//! ```
//!
//! # Environment Variables
//!
//! All optional:
//! - `TICKER_BOARD_REST_URL`: REST base URL (default: <https://api.upbit.com>)
//! - `TICKER_BOARD_STREAM_URL`: WebSocket URL (default: <wss://api.upbit.com/websocket/v1>)
//! - `TICKER_BOARD_MARKETS`: comma separated market symbols (default: built-in KRW list)
//! - `TICKER_BOARD_MODE`: streaming | polling (default: streaming)
//! - `TICKER_BOARD_HEALTH_PORT`: Health check HTTP port, 0 disables (default: 8083)
//! - `TICKER_BOARD_METRICS_ENABLED`: Prometheus recorder (default: true)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use ticker_board::infrastructure::health::{HealthServer, HealthServerState};
use ticker_board::infrastructure::telemetry;
use ticker_board::{
    BoardConfig, BoardHandle, StreamClient, TickerBoard, UpbitRestClient, init_metrics,
};

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Rows included in the periodic view log line.
const LOGGED_ROWS: usize = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    load_dotenv();

    // Initialize telemetry (tracing + optional OpenTelemetry)
    let _telemetry_guard = telemetry::init()?;

    tracing::info!("Starting Ticker Board");

    let config = BoardConfig::from_env()?;
    log_config(&config);

    if config.server.metrics_enabled {
        init_metrics()?;
    }

    let shutdown_token = CancellationToken::new();

    // Exchange adapters
    let (event_tx, event_rx) = mpsc::channel(config.stream.event_capacity.max(1));
    let stream_client = Arc::new(StreamClient::new(config.stream_client_config(), event_tx));
    let rest_client = Arc::new(UpbitRestClient::new(&config.rest_client_config())?);

    let board = TickerBoard::spawn(
        config.ticker_board_config(),
        rest_client,
        stream_client,
        event_rx,
    );

    // Spawn health server
    if config.server.health_port == 0 {
        tracing::info!("Health server disabled");
    } else {
        let health_state = Arc::new(HealthServerState::new(
            env!("CARGO_PKG_VERSION").to_string(),
            board.clone(),
        ));
        let health_server = HealthServer::new(
            config.server.health_port,
            health_state,
            shutdown_token.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = health_server.run().await {
                tracing::error!(error = %e, "Health server error");
            }
        });
    }

    let view_logger = tokio::spawn(log_views(board.clone(), shutdown_token.clone()));

    board.activate().await?;
    tracing::info!("Ticker board ready");

    await_shutdown(shutdown_token).await;

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, board.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Board did not stop in time"
        );
    }
    let _ = view_logger.await;

    tracing::info!("Ticker board stopped");
    Ok(())
}

/// Log view changes, connectivity and errors until cancelled.
async fn log_views(board: BoardHandle, cancel: CancellationToken) {
    let mut views = board.views();
    let mut connectivity = board.connectivity();
    let mut errors = board.errors();

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            Some(view) = views.next() => {
                if view.changed.is_some() {
                    tracing::trace!(changed = ?view.changed, "Row updated");
                    continue;
                }
                let top: Vec<String> = view
                    .records
                    .iter()
                    .take(LOGGED_ROWS)
                    .map(|r| {
                        format!("{} {} {:+.2}%", r.base_asset(), r.trade_price, r.change_percent())
                    })
                    .collect();
                tracing::info!(rows = view.len(), sort = %view.sort, top = ?top, "Table refreshed");
            }
            Some(connected) = connectivity.next() => {
                tracing::info!(connected, "Stream connectivity changed");
            }
            Some(error) = errors.next() => {
                match error {
                    Ok(error) => tracing::warn!(error = %error, "Board error"),
                    Err(e) => tracing::debug!(error = %e, "Error stream lagged"),
                }
            }
        }
    }
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &BoardConfig) {
    tracing::info!(
        mode = config.board.mode.as_str(),
        markets = config.exchange.markets.len(),
        quote_currency = %config.exchange.quote_currency,
        health_port = config.server.health_port,
        metrics_enabled = config.server.metrics_enabled,
        "Configuration loaded"
    );
    tracing::debug!(
        rest_url = %config.exchange.rest_url,
        stream_url = %config.exchange.stream_url,
        reconnect_delay_secs = config.stream.reconnect_delay.as_secs(),
        max_retries = config.stream.max_retries,
        "Exchange endpoints"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
