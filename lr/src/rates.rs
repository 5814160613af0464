//! Interest-rate table for security-deposit projections
//!
//! Maps a calendar year to the annual simple-interest rate (as a fraction)
//! that applies to deposits held during that year.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Built-in rates, one entry per supported year
pub const DEFAULT_RATES: &[(i32, f64)] = &[(2023, 0.0195), (2024, 0.027), (2025, 0.0095), (2026, 0.0)];

/// Year to annual rate lookup
///
/// Years missing from the table accrue nothing. A deposit whose start year
/// precedes [`RateTable::min_year`] is outside the supported range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: BTreeMap<i32, f64>,
}

impl RateTable {
    pub fn new(rates: BTreeMap<i32, f64>) -> Self {
        debug!(years = rates.len(), "RateTable::new: called");
        Self { rates }
    }

    /// Rate for a year, `None` when the table has no entry
    pub fn rate_for(&self, year: i32) -> Option<f64> {
        self.rates.get(&year).copied()
    }

    /// Earliest supported year
    pub fn min_year(&self) -> Option<i32> {
        self.rates.keys().next().copied()
    }

    /// Latest configured year
    pub fn max_year(&self) -> Option<i32> {
        self.rates.keys().next_back().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.rates.iter().map(|(year, rate)| (*year, *rate))
    }
}

impl Default for RateTable {
    fn default() -> Self {
        DEFAULT_RATES.iter().copied().collect()
    }
}

impl FromIterator<(i32, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (i32, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = RateTable::default();
        assert_eq!(table.min_year(), Some(2023));
        assert_eq!(table.max_year(), Some(2026));
        assert_eq!(table.rate_for(2024), Some(0.027));
        assert_eq!(table.rate_for(2026), Some(0.0));
        assert_eq!(table.rate_for(2022), None);
    }

    #[test]
    fn test_empty_table() {
        let table = RateTable::new(BTreeMap::new());
        assert!(table.is_empty());
        assert_eq!(table.min_year(), None);
    }

    #[test]
    fn test_from_iter_orders_years() {
        let table: RateTable = [(2030, 0.01), (2028, 0.02)].into_iter().collect();
        assert_eq!(table.min_year(), Some(2028));
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![(2028, 0.02), (2030, 0.01)]);
    }
}
