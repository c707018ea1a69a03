use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::rollup::record::Segmented;
use crate::types::Market;

/// Membership sets selecting a market / powertrain / year segment.
///
/// A record passes when its year, market and powertrain are all members.
/// An empty set for any dimension selects nothing; use [`SegmentFilter::all_of`]
/// for the unfiltered default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentFilter {
    pub years: BTreeSet<i32>,
    pub markets: BTreeSet<Market>,
    pub powertrains: BTreeSet<String>,
}

impl SegmentFilter {
    /// Every distinct year, market and powertrain observed in `items`.
    pub fn all_of<T: Segmented>(items: &[T]) -> Self {
        SegmentFilter {
            years: items.iter().map(|i| i.year()).collect(),
            markets: items.iter().map(|i| i.market().clone()).collect(),
            powertrains: items.iter().map(|i| i.powertrain().to_string()).collect(),
        }
    }

    pub fn with_years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    pub fn with_markets<M: Into<Market>>(mut self, markets: impl IntoIterator<Item = M>) -> Self {
        self.markets = markets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_powertrains<P: Into<String>>(
        mut self,
        powertrains: impl IntoIterator<Item = P>,
    ) -> Self {
        self.powertrains = powertrains.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches<T: Segmented>(&self, item: &T) -> bool {
        self.years.contains(&item.year())
            && self.markets.contains(item.market())
            && self.powertrains.contains(item.powertrain())
    }

    /// Select the matching items, preserving input order.
    pub fn apply<T: Segmented + Clone>(&self, items: &[T]) -> Vec<T> {
        items.iter().filter(|i| self.matches(*i)).cloned().collect()
    }
}
