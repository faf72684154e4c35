//! Upbit Wire Messages
//!
//! Serde types for the exchange's REST and WebSocket payloads.
//!
//! # Ticker Formats
//!
//! The stream delivers tickers in one of two key layouts depending on the
//! requested format:
//!
//! ```json
//! {"cd":"KRW-BTC","tp":4150.0,"c":"FALL","scp":-154.0,"scr":-0.0372,"atp":1.0e9}
//! {"code":"KRW-BTC","trade_price":4150.0,"change":"FALL",...}
//! ```
//!
//! The REST snapshot uses the verbose names but keys the symbol as `market`.

use serde::{Deserialize, Serialize};

use crate::domain::ticker::{ChangeDirection, TickerRecord};

// =============================================================================
// Inbound Tickers
// =============================================================================

/// Stream ticker in the abbreviated `SIMPLE` layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompactTicker {
    /// Market symbol.
    #[serde(rename = "cd")]
    pub code: String,
    /// Trade price.
    #[serde(rename = "tp")]
    pub trade_price: f64,
    /// Change direction.
    #[serde(rename = "c")]
    pub change: ChangeDirection,
    /// Signed change price.
    #[serde(rename = "scp")]
    pub signed_change_price: f64,
    /// Signed change rate.
    #[serde(rename = "scr")]
    pub signed_change_rate: f64,
    /// Accumulated trade value.
    #[serde(rename = "atp")]
    pub acc_trade_price: f64,
}

/// Stream ticker in the default (verbose) layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerboseTicker {
    /// Market symbol.
    pub code: String,
    /// Trade price.
    pub trade_price: f64,
    /// Change direction.
    pub change: ChangeDirection,
    /// Signed change price.
    pub signed_change_price: f64,
    /// Signed change rate.
    pub signed_change_rate: f64,
    /// Accumulated trade value.
    pub acc_trade_price: f64,
}

/// One element of the REST `/v1/ticker/all` response.
///
/// The endpoint returns many more fields than the board uses; unknown fields
/// are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTicker {
    /// Market symbol.
    pub market: String,
    /// Change direction.
    pub change: ChangeDirection,
    /// Trade price.
    pub trade_price: f64,
    /// Signed change rate.
    pub signed_change_rate: f64,
    /// Signed change price.
    pub signed_change_price: f64,
    /// Accumulated trade value over the last 24h window.
    pub acc_trade_price: f64,
}

impl From<CompactTicker> for TickerRecord {
    fn from(t: CompactTicker) -> Self {
        Self {
            market: t.code,
            change: t.change,
            trade_price: t.trade_price,
            signed_change_rate: t.signed_change_rate,
            signed_change_price: t.signed_change_price,
            acc_trade_price: t.acc_trade_price,
        }
    }
}

impl From<VerboseTicker> for TickerRecord {
    fn from(t: VerboseTicker) -> Self {
        Self {
            market: t.code,
            change: t.change,
            trade_price: t.trade_price,
            signed_change_rate: t.signed_change_rate,
            signed_change_price: t.signed_change_price,
            acc_trade_price: t.acc_trade_price,
        }
    }
}

impl From<RawTicker> for TickerRecord {
    fn from(t: RawTicker) -> Self {
        Self {
            market: t.market,
            change: t.change,
            trade_price: t.trade_price,
            signed_change_rate: t.signed_change_rate,
            signed_change_price: t.signed_change_price,
            acc_trade_price: t.acc_trade_price,
        }
    }
}

// =============================================================================
// Subscribe Request
// =============================================================================

/// Ticket field identifying the client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketField {
    /// Client-chosen ticket tag.
    pub ticket: String,
}

/// Type field selecting the ticker channel and its symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeField {
    /// Channel type, always `ticker` here.
    #[serde(rename = "type")]
    pub kind: String,
    /// Market symbols to subscribe to.
    pub codes: Vec<String>,
    /// Skip the initial snapshot frame per symbol.
    #[serde(rename = "isOnlyRealtime")]
    pub is_only_realtime: bool,
}

/// Format field selecting the payload key layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatField {
    /// `SIMPLE` for abbreviated keys, `DEFAULT` for full names.
    pub format: String,
}

/// Subscribe request, serialized as a three-element JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest(pub TicketField, pub TypeField, pub FormatField);

impl SubscribeRequest {
    /// Realtime ticker subscription for `codes` in the abbreviated format.
    #[must_use]
    pub fn ticker(ticket: impl Into<String>, codes: Vec<String>) -> Self {
        Self(
            TicketField {
                ticket: ticket.into(),
            },
            TypeField {
                kind: "ticker".to_string(),
                codes,
                is_only_realtime: true,
            },
            FormatField {
                format: "SIMPLE".to_string(),
            },
        )
    }

    /// Subscribed symbols.
    #[must_use]
    pub fn codes(&self) -> &[String] {
        &self.1.codes
    }

    /// Serialize to the JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_request_wire_shape() {
        let request = SubscribeRequest::ticker(
            "ticker-board",
            vec!["KRW-BTC".to_string(), "KRW-ETH".to_string()],
        );
        let value: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"ticket": "ticker-board"},
                {"type": "ticker", "codes": ["KRW-BTC", "KRW-ETH"], "isOnlyRealtime": true},
                {"format": "SIMPLE"}
            ])
        );
        assert_eq!(request.codes().len(), 2);
    }

    #[test]
    fn rest_ticker_ignores_extra_fields() {
        let json = r#"{
            "market": "KRW-BTC",
            "trade_date": "20250619",
            "change": "RISE",
            "trade_price": 145000000.0,
            "signed_change_rate": 0.0123,
            "signed_change_price": 1760000.0,
            "acc_trade_price": 123456789012.5,
            "acc_trade_price_24h": 999.0,
            "timestamp": 1718790000000
        }"#;
        let raw: RawTicker = serde_json::from_str(json).unwrap();
        let record = TickerRecord::from(raw);
        assert_eq!(record.market, "KRW-BTC");
        assert_eq!(record.change, ChangeDirection::Rise);
        assert!((record.acc_trade_price - 123_456_789_012.5).abs() < 1e-3);
    }

    #[test]
    fn compact_ticker_maps_to_record() {
        let json = r#"{"ty":"ticker","cd":"KRW-ETH","tp":5000.0,"c":"EVEN","scp":0.0,"scr":0.0,"atp":42.0}"#;
        let compact: CompactTicker = serde_json::from_str(json).unwrap();
        let record = TickerRecord::from(compact);
        assert_eq!(record.market, "KRW-ETH");
        assert_eq!(record.change, ChangeDirection::Even);
        assert!((record.trade_price - 5000.0).abs() < f64::EPSILON);
    }
}
