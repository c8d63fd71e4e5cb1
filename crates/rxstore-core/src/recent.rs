use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;

pub const RECENTLY_VIEWED_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentlyViewedEntry {
    pub product_id: i64,
    pub slug: Option<String>,
    pub name: Option<String>,
    /// Route the product was opened from, e.g. `/thuoc/giam-dau/panadol`.
    pub path: String,
    pub viewed_at: DateTime<Utc>,
}

/// Most-recent-first list of product views, bounded in size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentlyViewed {
    entries: Vec<RecentlyViewedEntry>,
}

impl RecentlyViewed {
    #[must_use]
    pub fn entries(&self) -> &[RecentlyViewedEntry] {
        &self.entries
    }

    /// Records a view, moving an already-present product to the front.
    pub fn record(&mut self, product: &Product, path: &str, viewed_at: DateTime<Utc>) {
        self.entries.retain(|e| e.product_id != product.id);
        self.entries.insert(
            0,
            RecentlyViewedEntry {
                product_id: product.id,
                slug: product.slug.clone(),
                name: product.name.clone(),
                path: path.to_owned(),
                viewed_at,
            },
        );
        self.entries.truncate(RECENTLY_VIEWED_CAPACITY);
    }
}
