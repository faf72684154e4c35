//! Sort Controller
//!
//! Tri-state column sorting for the ticker table.
//!
//! # Cycle
//!
//! Selecting a column that is not active sorts by it descending. Selecting
//! the active column again cycles `Descending -> Ascending -> None`, and
//! `None` restores the default order (traded value, descending).
//!
//! ```text
//! default ──select(c)──▶ (c, Desc) ──select(c)──▶ (c, Asc) ──select(c)──▶ default
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::ticker::TickerRecord;

// =============================================================================
// Columns and Directions
// =============================================================================

/// Column the table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    /// Current trade price.
    Price,
    /// Signed change rate.
    ChangeRate,
    /// Cumulative traded value.
    TradeValue,
    /// No explicit column; the default order applies.
    #[default]
    None,
}

impl SortColumn {
    /// Numeric key this column sorts by.
    ///
    /// Adding `0.0` folds `-0.0` into `0.0` so the two tie under `total_cmp`.
    const fn key(self, record: &TickerRecord) -> f64 {
        let key = match self {
            Self::Price => record.trade_price,
            Self::ChangeRate => record.signed_change_rate,
            Self::TradeValue | Self::None => record.acc_trade_price,
        };
        key + 0.0
    }
}

/// Direction of an active sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
    /// No active sort.
    #[default]
    None,
}

// =============================================================================
// Sort State
// =============================================================================

/// Active sort column and direction.
///
/// The direction is `None` exactly when the column is `None`. The fields are
/// private so only [`SortState::default`] and [`SortState::select`] can
/// produce values, which keeps that pairing intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortState {
    column: SortColumn,
    direction: SortDirection,
}

impl SortState {
    /// Active column.
    #[must_use]
    pub const fn column(&self) -> SortColumn {
        self.column
    }

    /// Active direction.
    #[must_use]
    pub const fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Whether the default order applies.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self.column, SortColumn::None)
    }

    /// State after the user selects `column`.
    #[must_use]
    pub const fn select(self, column: SortColumn) -> Self {
        match column {
            SortColumn::None => Self::cleared(),
            _ if !same_column(self.column, column) => Self {
                column,
                direction: SortDirection::Descending,
            },
            _ => match self.direction {
                SortDirection::Descending => Self {
                    column,
                    direction: SortDirection::Ascending,
                },
                SortDirection::Ascending | SortDirection::None => Self::cleared(),
            },
        }
    }

    /// Ordering of two records under this state.
    #[must_use]
    pub fn compare(&self, a: &TickerRecord, b: &TickerRecord) -> Ordering {
        let key_a = self.column.key(a);
        let key_b = self.column.key(b);
        match self.direction {
            SortDirection::Ascending => key_a.total_cmp(&key_b),
            SortDirection::Descending | SortDirection::None => key_b.total_cmp(&key_a),
        }
    }

    /// Stable in-place sort of `records`.
    pub fn apply(&self, records: &mut [TickerRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }

    const fn cleared() -> Self {
        Self {
            column: SortColumn::None,
            direction: SortDirection::None,
        }
    }
}

impl std::fmt::Display for SortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.column, self.direction) {
            (SortColumn::None, _) => f.write_str("default"),
            (column, direction) => write!(f, "{column:?} {direction:?}"),
        }
    }
}

// `PartialEq` is not const yet.
const fn same_column(a: SortColumn, b: SortColumn) -> bool {
    matches!(
        (a, b),
        (SortColumn::Price, SortColumn::Price)
            | (SortColumn::ChangeRate, SortColumn::ChangeRate)
            | (SortColumn::TradeValue, SortColumn::TradeValue)
            | (SortColumn::None, SortColumn::None)
    )
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;
    use crate::domain::ticker::ChangeDirection;

    fn record(market: &str, price: f64, rate: f64, value: f64) -> TickerRecord {
        TickerRecord {
            market: market.to_string(),
            change: ChangeDirection::Even,
            trade_price: price,
            signed_change_rate: rate,
            signed_change_price: 0.0,
            acc_trade_price: value,
        }
    }

    fn markets(records: &[TickerRecord]) -> Vec<&str> {
        records.iter().map(|r| r.market.as_str()).collect()
    }

    #[test]
    fn default_state_is_cleared() {
        let state = SortState::default();
        assert_eq!(state.column(), SortColumn::None);
        assert_eq!(state.direction(), SortDirection::None);
        assert!(state.is_default());
    }

    #[test_case(SortColumn::Price)]
    #[test_case(SortColumn::ChangeRate)]
    #[test_case(SortColumn::TradeValue)]
    fn selecting_three_times_cycles_back_to_default(column: SortColumn) {
        let first = SortState::default().select(column);
        assert_eq!(first.column(), column);
        assert_eq!(first.direction(), SortDirection::Descending);

        let second = first.select(column);
        assert_eq!(second.direction(), SortDirection::Ascending);

        let third = second.select(column);
        assert_eq!(third, SortState::default());
    }

    #[test]
    fn switching_column_restarts_descending() {
        let state = SortState::default()
            .select(SortColumn::Price)
            .select(SortColumn::Price)
            .select(SortColumn::ChangeRate);
        assert_eq!(state.column(), SortColumn::ChangeRate);
        assert_eq!(state.direction(), SortDirection::Descending);
    }

    #[test]
    fn selecting_none_clears() {
        let state = SortState::default()
            .select(SortColumn::TradeValue)
            .select(SortColumn::None);
        assert_eq!(state, SortState::default());
        assert_eq!(SortState::default().select(SortColumn::None), SortState::default());
    }

    #[test]
    fn default_order_is_trade_value_descending() {
        let mut rows = vec![
            record("KRW-BTC", 1.0, 0.0, 100.0),
            record("KRW-ETH", 2.0, 0.0, 200.0),
            record("KRW-XRP", 3.0, 0.0, 150.0),
        ];
        SortState::default().apply(&mut rows);
        assert_eq!(markets(&rows), ["KRW-ETH", "KRW-XRP", "KRW-BTC"]);
    }

    #[test]
    fn price_orders_follow_direction() {
        let mut rows = vec![
            record("KRW-BTC", 300.0, 0.0, 0.0),
            record("KRW-ETH", 100.0, 0.0, 0.0),
            record("KRW-XRP", 200.0, 0.0, 0.0),
        ];
        let desc = SortState::default().select(SortColumn::Price);
        desc.apply(&mut rows);
        assert_eq!(markets(&rows), ["KRW-BTC", "KRW-XRP", "KRW-ETH"]);

        desc.select(SortColumn::Price).apply(&mut rows);
        assert_eq!(markets(&rows), ["KRW-ETH", "KRW-XRP", "KRW-BTC"]);
    }

    #[test]
    fn change_rate_handles_negative_values() {
        let mut rows = vec![
            record("KRW-BTC", 0.0, -0.05, 0.0),
            record("KRW-ETH", 0.0, 0.02, 0.0),
            record("KRW-XRP", 0.0, 0.0, 0.0),
        ];
        SortState::default().select(SortColumn::ChangeRate).apply(&mut rows);
        assert_eq!(markets(&rows), ["KRW-ETH", "KRW-XRP", "KRW-BTC"]);
    }

    #[test]
    fn ties_keep_prior_order() {
        let mut rows = vec![
            record("KRW-A", 1.0, 0.0, 0.0),
            record("KRW-B", 1.0, 0.0, 0.0),
            record("KRW-C", 1.0, 0.0, 0.0),
        ];
        SortState::default().select(SortColumn::Price).apply(&mut rows);
        assert_eq!(markets(&rows), ["KRW-A", "KRW-B", "KRW-C"]);
    }

    // An unchanged pair (0.0 vs -0.0) must not swap under either direction.
    #[test_case(1 ; "descending")]
    #[test_case(2 ; "ascending")]
    fn negative_zero_ties_keep_prior_order(selections: usize) {
        let mut rows = vec![
            record("KRW-A", 1.0, 0.0, 1.0),
            record("KRW-B", 1.0, -0.0, 1.0),
        ];
        let state = (0..selections).fold(SortState::default(), |state, _| {
            state.select(SortColumn::ChangeRate)
        });
        assert_eq!(state.compare(&rows[0], &rows[1]), Ordering::Equal);

        state.apply(&mut rows);
        assert_eq!(markets(&rows), ["KRW-A", "KRW-B"]);

        rows.reverse();
        state.apply(&mut rows);
        assert_eq!(markets(&rows), ["KRW-B", "KRW-A"]);
    }

    #[test]
    fn display_state() {
        assert_eq!(SortState::default().to_string(), "default");
        assert_eq!(
            SortState::default().select(SortColumn::Price).to_string(),
            "Price Descending"
        );
    }

    fn any_column() -> impl Strategy<Value = SortColumn> {
        prop_oneof![
            Just(SortColumn::Price),
            Just(SortColumn::ChangeRate),
            Just(SortColumn::TradeValue),
            Just(SortColumn::None),
        ]
    }

    proptest! {
        #[test]
        fn direction_none_iff_column_none(selections in proptest::collection::vec(any_column(), 0..32)) {
            let state = selections
                .into_iter()
                .fold(SortState::default(), SortState::select);
            prop_assert_eq!(
                state.column() == SortColumn::None,
                state.direction() == SortDirection::None
            );
        }
    }
}
