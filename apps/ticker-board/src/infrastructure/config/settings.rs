//! Board Configuration Settings
//!
//! Configuration types for the ticker board, loaded from environment
//! variables. Every variable is optional; unparseable numbers fall back to
//! their defaults, while malformed URLs and empty market lists are errors.

use std::time::Duration;

use reqwest::Url;

use crate::application::services::board::{BoardMode, TickerBoardConfig};
use crate::application::services::hub::BroadcastConfig;
use crate::infrastructure::upbit::markets::{dedup_markets, krw_markets};
use crate::infrastructure::upbit::reconnect::ReconnectConfig;
use crate::infrastructure::upbit::rest::RestClientConfig;
use crate::infrastructure::upbit::stream::StreamClientConfig;

/// How the table is refreshed after the first snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Realtime WebSocket updates.
    #[default]
    Streaming,
    /// Periodic snapshot re-fetch.
    Polling,
}

impl RefreshMode {
    /// Parse mode from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "polling" | "poll" => Self::Polling,
            _ => Self::Streaming,
        }
    }

    /// Get the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Polling => "polling",
        }
    }
}

/// Exchange endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSettings {
    /// REST base URL.
    pub rest_url: String,
    /// WebSocket URL.
    pub stream_url: String,
    /// Quote currency for the snapshot.
    pub quote_currency: String,
    /// Markets to subscribe to.
    pub markets: Vec<String>,
    /// Ticket tag for the subscribe request.
    pub ticket: String,
    /// REST request timeout.
    pub request_timeout: Duration,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            rest_url: "https://api.upbit.com".to_string(),
            stream_url: "wss://api.upbit.com/websocket/v1".to_string(),
            quote_currency: "KRW".to_string(),
            markets: krw_markets(),
            ticket: "ticker-board".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Stream connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Delay between connecting and subscribing.
    pub subscribe_delay: Duration,
    /// Fixed delay before each reconnection attempt.
    pub reconnect_delay: Duration,
    /// Retries after the initial attempt before giving up.
    pub max_retries: u32,
    /// Capacity of the stream event channel.
    pub event_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            subscribe_delay: Duration::from_millis(2_000),
            reconnect_delay: Duration::from_secs(5),
            max_retries: 3,
            event_capacity: 4_096,
        }
    }
}

/// Board orchestration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSettings {
    /// Refresh mode.
    pub mode: RefreshMode,
    /// Polling interval when `mode` is polling.
    pub poll_interval: Duration,
    /// Capacity of the delta broadcast channel.
    pub delta_capacity: usize,
    /// Capacity of the error broadcast channel.
    pub error_capacity: usize,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            mode: RefreshMode::Streaming,
            poll_interval: Duration::from_secs(5),
            delta_capacity: 1_024,
            error_capacity: 64,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Health check HTTP port (0 = disabled).
    pub health_port: u16,
    /// Whether the Prometheus recorder is installed.
    pub metrics_enabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            health_port: 8083,
            metrics_enabled: true,
        }
    }
}

/// Complete board configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardConfig {
    /// Exchange endpoints and universe.
    pub exchange: ExchangeSettings,
    /// Stream connection settings.
    pub stream: StreamSettings,
    /// Board settings.
    pub board: BoardSettings,
    /// Server settings.
    pub server: ServerSettings,
}

impl BoardConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is malformed or the market list is empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is malformed, the market list is empty, or
    /// a market is not quoted in the quote currency.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Self::default();

        let rest_url = env
            .string("TICKER_BOARD_REST_URL")
            .unwrap_or(defaults.exchange.rest_url);
        validate_url("TICKER_BOARD_REST_URL", &rest_url, &["http", "https"])?;

        let stream_url = env
            .string("TICKER_BOARD_STREAM_URL")
            .unwrap_or(defaults.exchange.stream_url);
        validate_url("TICKER_BOARD_STREAM_URL", &stream_url, &["ws", "wss"])?;

        let markets = match env.string("TICKER_BOARD_MARKETS") {
            Some(list) => dedup_markets(list.split(',')),
            None => defaults.exchange.markets,
        };
        if markets.is_empty() {
            return Err(ConfigError::EmptyValue("TICKER_BOARD_MARKETS".to_string()));
        }

        let quote_currency = env
            .string("TICKER_BOARD_QUOTE_CURRENCY")
            .map_or(defaults.exchange.quote_currency, |q| q.trim().to_uppercase());
        if quote_currency.is_empty() {
            return Err(ConfigError::EmptyValue(
                "TICKER_BOARD_QUOTE_CURRENCY".to_string(),
            ));
        }
        if let Some(market) = markets
            .iter()
            .find(|m| m.split_once('-').map(|(quote, _)| quote) != Some(quote_currency.as_str()))
        {
            return Err(ConfigError::MarketQuoteMismatch {
                market: market.clone(),
                quote: quote_currency,
            });
        }

        let exchange = ExchangeSettings {
            rest_url,
            stream_url,
            quote_currency,
            markets,
            ticket: env
                .string("TICKER_BOARD_TICKET")
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(defaults.exchange.ticket),
            request_timeout: env.duration_secs(
                "TICKER_BOARD_REQUEST_TIMEOUT_SECS",
                defaults.exchange.request_timeout,
            ),
        };

        let stream = StreamSettings {
            subscribe_delay: env.duration_millis(
                "TICKER_BOARD_SUBSCRIBE_DELAY_MS",
                defaults.stream.subscribe_delay,
            ),
            reconnect_delay: env.duration_secs(
                "TICKER_BOARD_RECONNECT_DELAY_SECS",
                defaults.stream.reconnect_delay,
            ),
            max_retries: env.parse("TICKER_BOARD_MAX_RETRIES", defaults.stream.max_retries),
            event_capacity: env.parse(
                "TICKER_BOARD_EVENT_CAPACITY",
                defaults.stream.event_capacity,
            ),
        };

        let board = BoardSettings {
            mode: env
                .string("TICKER_BOARD_MODE")
                .map(|s| RefreshMode::from_str_case_insensitive(&s))
                .unwrap_or_default(),
            poll_interval: env.duration_secs(
                "TICKER_BOARD_POLL_INTERVAL_SECS",
                defaults.board.poll_interval,
            ),
            delta_capacity: env.parse(
                "TICKER_BOARD_DELTA_CAPACITY",
                defaults.board.delta_capacity,
            ),
            error_capacity: env.parse(
                "TICKER_BOARD_ERROR_CAPACITY",
                defaults.board.error_capacity,
            ),
        };

        let server = ServerSettings {
            health_port: env.parse("TICKER_BOARD_HEALTH_PORT", defaults.server.health_port),
            metrics_enabled: env.flag(
                "TICKER_BOARD_METRICS_ENABLED",
                defaults.server.metrics_enabled,
            ),
        };

        Ok(Self {
            exchange,
            stream,
            board,
            server,
        })
    }

    /// Settings for the snapshot REST client.
    #[must_use]
    pub fn rest_client_config(&self) -> RestClientConfig {
        RestClientConfig {
            base_url: self.exchange.rest_url.clone(),
            quote_currency: self.exchange.quote_currency.clone(),
            markets: self.exchange.markets.clone(),
            timeout: self.exchange.request_timeout,
        }
    }

    /// Settings for the WebSocket stream client.
    #[must_use]
    pub fn stream_client_config(&self) -> StreamClientConfig {
        StreamClientConfig {
            url: self.exchange.stream_url.clone(),
            ticket: self.exchange.ticket.clone(),
            markets: self.exchange.markets.clone(),
            subscribe_delay: self.stream.subscribe_delay,
            reconnect: ReconnectConfig::new(self.stream.reconnect_delay, self.stream.max_retries),
        }
    }

    /// Settings for the board orchestrator.
    #[must_use]
    pub fn ticker_board_config(&self) -> TickerBoardConfig {
        let mode = match self.board.mode {
            RefreshMode::Streaming => BoardMode::Streaming,
            RefreshMode::Polling => BoardMode::Polling {
                interval: self.board.poll_interval,
            },
        };
        TickerBoardConfig {
            mode,
            broadcast: BroadcastConfig {
                delta_capacity: self.board.delta_capacity,
                error_capacity: self.board.error_capacity,
            },
            ..TickerBoardConfig::default()
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable holds an unusable URL.
    #[error("environment variable {key} is not a valid URL: {reason}")]
    InvalidUrl {
        /// Variable name.
        key: String,
        /// Why the URL was rejected.
        reason: String,
    },
    /// A market is quoted in a different currency than the snapshot.
    #[error("market {market} is not quoted in {quote}")]
    MarketQuoteMismatch {
        /// Offending market symbol.
        market: String,
        /// Configured quote currency.
        quote: String,
    },
}

fn validate_url(key: &str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::InvalidUrl {
            key: key.to_string(),
            reason: format!("scheme must be one of {schemes:?}, got {}", url.scheme()),
        });
    }
    Ok(())
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.string(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.string(key)
            .map_or(default, |v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
    }

    fn duration_secs(&self, key: &str, default: Duration) -> Duration {
        self.string(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(default, Duration::from_secs)
    }

    fn duration_millis(&self, key: &str, default: Duration) -> Duration {
        self.string(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(default, Duration::from_millis)
    }
}
