//! Sort selector to filter-state mapping.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

use crate::catalog::Product;
use crate::filters::FilterState;
use crate::CoreError;

pub const ORDERING_KEY: &str = "ordering";
pub const PRICE_SORT_KEY: &str = "price_sort";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    Bestselling,
    PriceLow,
    PriceHigh,
}

impl SortOption {
    /// Writes the sort into `state`. `Bestselling` clears both sort keys so
    /// the server default ordering applies.
    pub fn apply(self, state: &mut FilterState) {
        state.remove(ORDERING_KEY);
        state.remove(PRICE_SORT_KEY);
        let (ordering, price_sort) = match self {
            SortOption::Bestselling => return,
            SortOption::PriceLow => ("price_value", "asc"),
            SortOption::PriceHigh => ("-price_value", "desc"),
        };
        state.set_content(ORDERING_KEY, ordering);
        state.set_content(PRICE_SORT_KEY, price_sort);
    }

    /// Reads the sort back out of a filter state.
    #[must_use]
    pub fn from_state(state: &FilterState) -> Self {
        match state.get(PRICE_SORT_KEY).map(|v| v.to_query_value()).as_deref() {
            Some("asc") => SortOption::PriceLow,
            Some("desc") => SortOption::PriceHigh,
            _ => SortOption::Bestselling,
        }
    }

    /// Sorts `products` locally unless the server already ordered them.
    ///
    /// Products without a price sort last in either direction.
    pub fn apply_client_side(self, products: &mut [Product], server_ordering: Option<&str>) {
        if server_ordering.is_some_and(|o| !o.is_empty()) {
            return;
        }
        let descending = match self {
            SortOption::Bestselling => return,
            SortOption::PriceLow => false,
            SortOption::PriceHigh => true,
        };
        products.sort_by(|a, b| match (a.price_value, b.price_value) {
            (Some(x), Some(y)) if descending => y.cmp(&x),
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::Bestselling => "bestselling",
            SortOption::PriceLow => "price-low",
            SortOption::PriceHigh => "price-high",
        }
    }
}

impl FromStr for SortOption {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bestselling" => Ok(SortOption::Bestselling),
            "price-low" => Ok(SortOption::PriceLow),
            "price-high" => Ok(SortOption::PriceHigh),
            other => Err(CoreError::UnknownSort(other.to_owned())),
        }
    }
}

impl std::fmt::Display for SortOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
