//! Ticker Model
//!
//! The normalized representation of one market's latest trading state.
//! Both the REST snapshot and the WebSocket stream decode into this type,
//! so the reconciliation store never sees wire-format details.
//!
//! # Identity
//!
//! A ticker is identified by its market symbol, formatted
//! `"<QUOTE>-<BASE>"` (for example `"KRW-BTC"`). The store holds exactly
//! one record per symbol and replaces records wholesale.

use serde::{Deserialize, Serialize};

// =============================================================================
// Change Direction
// =============================================================================

/// Direction of the price change relative to the previous close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeDirection {
    /// Price is above the previous close.
    Rise,
    /// Price is below the previous close.
    Fall,
    /// Price is unchanged.
    Even,
}

impl ChangeDirection {
    /// Wire representation (`RISE`, `FALL`, `EVEN`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rise => "RISE",
            Self::Fall => "FALL",
            Self::Even => "EVEN",
        }
    }
}

impl std::fmt::Display for ChangeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Ticker Record
// =============================================================================

/// Latest trading state of a single market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    /// Market symbol, e.g. `KRW-BTC`.
    pub market: String,
    /// Direction of the change since the previous close.
    pub change: ChangeDirection,
    /// Current trade price.
    pub trade_price: f64,
    /// Signed change as a fraction (`-0.0372` is -3.72%).
    pub signed_change_rate: f64,
    /// Signed absolute change in price.
    pub signed_change_price: f64,
    /// Cumulative traded value since the exchange's daily epoch (UTC 0).
    pub acc_trade_price: f64,
}

impl TickerRecord {
    /// Quote currency part of the symbol (`KRW` in `KRW-BTC`).
    #[must_use]
    pub fn quote_currency(&self) -> &str {
        self.market
            .split_once('-')
            .map_or(self.market.as_str(), |(quote, _)| quote)
    }

    /// Base asset part of the symbol (`BTC` in `KRW-BTC`).
    #[must_use]
    pub fn base_asset(&self) -> &str {
        self.market
            .split_once('-')
            .map_or(self.market.as_str(), |(_, base)| base)
    }

    /// Change rate expressed in percent.
    #[must_use]
    pub fn change_percent(&self) -> f64 {
        self.signed_change_rate * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc() -> TickerRecord {
        TickerRecord {
            market: "KRW-BTC".to_string(),
            change: ChangeDirection::Fall,
            trade_price: 4_150.0,
            signed_change_rate: -0.0372,
            signed_change_price: -154.0,
            acc_trade_price: 1_000_000.0,
        }
    }

    #[test]
    fn symbol_parts() {
        let ticker = btc();
        assert_eq!(ticker.quote_currency(), "KRW");
        assert_eq!(ticker.base_asset(), "BTC");
    }

    #[test]
    fn symbol_without_separator() {
        let ticker = TickerRecord {
            market: "BTC".to_string(),
            ..btc()
        };
        assert_eq!(ticker.quote_currency(), "BTC");
        assert_eq!(ticker.base_asset(), "BTC");
    }

    #[test]
    fn change_percent_scales_rate() {
        assert!((btc().change_percent() + 3.72).abs() < 1e-9);
    }

    #[test]
    fn change_direction_wire_names() {
        assert_eq!(
            serde_json::to_string(&ChangeDirection::Rise).unwrap(),
            "\"RISE\""
        );
        let fall: ChangeDirection = serde_json::from_str("\"FALL\"").unwrap();
        assert_eq!(fall, ChangeDirection::Fall);
        assert!(serde_json::from_str::<ChangeDirection>("\"rise\"").is_err());
        assert_eq!(ChangeDirection::Even.to_string(), "EVEN");
    }
}
