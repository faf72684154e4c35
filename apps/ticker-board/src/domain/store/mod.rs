//! Reconciliation Store
//!
//! Owns the ordered ticker table. A REST snapshot seeds it, stream updates
//! replace individual records, and the active [`SortState`] decides the row
//! order after every mutation.
//!
//! # Invariants
//!
//! - At most one record per market symbol.
//! - Records are only created by [`TickerStore::load_snapshot`]; updates for
//!   symbols the snapshot did not contain are dropped.
//! - The table is always fully sorted when a method returns.

use std::collections::HashMap;

use crate::domain::sort::{SortColumn, SortState};
use crate::domain::ticker::TickerRecord;

/// Ordered, de-duplicated ticker table.
#[derive(Debug, Clone, Default)]
pub struct TickerStore {
    records: Vec<TickerRecord>,
    sort: SortState,
}

impl TickerStore {
    /// Create an empty store in the default order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table with `records`.
    ///
    /// Duplicate symbols collapse to their last occurrence. The active sort is
    /// re-applied.
    pub fn load_snapshot(&mut self, records: impl IntoIterator<Item = TickerRecord>) {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut table: Vec<TickerRecord> = Vec::new();

        for record in records {
            if let Some(&index) = positions.get(&record.market) {
                table[index] = record;
            } else {
                positions.insert(record.market.clone(), table.len());
                table.push(record);
            }
        }

        self.sort.apply(&mut table);
        self.records = table;
    }

    /// Replace the record for `record.market` and re-sort.
    ///
    /// Returns the record's new row index, or `None` if the symbol is not in
    /// the table (the table is left untouched).
    pub fn apply_update(&mut self, record: TickerRecord) -> Option<usize> {
        let index = self.position(&record.market)?;
        let market = record.market.clone();
        self.records[index] = record;
        self.sort.apply(&mut self.records);
        self.position(&market)
    }

    /// Cycle the sort for `column` and re-order the table.
    pub fn set_sort(&mut self, column: SortColumn) -> SortState {
        self.sort = self.sort.select(column);
        self.sort.apply(&mut self.records);
        self.sort
    }

    /// Active sort.
    #[must_use]
    pub const fn sort_state(&self) -> SortState {
        self.sort
    }

    /// Copy of the current table in display order.
    #[must_use]
    pub fn snapshot_view(&self) -> Vec<TickerRecord> {
        self.records.clone()
    }

    /// Current table in display order.
    #[must_use]
    pub fn records(&self) -> &[TickerRecord] {
        &self.records
    }

    /// Record for `market`, if present.
    #[must_use]
    pub fn get(&self, market: &str) -> Option<&TickerRecord> {
        self.records.iter().find(|r| r.market == market)
    }

    /// Whether `market` is in the table.
    #[must_use]
    pub fn contains(&self, market: &str) -> bool {
        self.position(market).is_some()
    }

    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every row. The sort state is kept.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn position(&self, market: &str) -> Option<usize> {
        self.records.iter().position(|r| r.market == market)
    }
}
