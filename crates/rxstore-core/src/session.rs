//! Per-navigation route and filter state.
//!
//! [`RouteSession`] is the single owner of the current [`FilterState`]. Every
//! change goes through whole-object replacement, and each state maps to one
//! [`RequestKey`]. A response is applied only if it was requested under the
//! key that is still current; anything else is stale and dropped.

use serde::Serialize;

use crate::filters::FilterState;
use crate::route::RoutePath;
use crate::sort::SortOption;

/// Identity of one main-fetch request: API path plus canonical query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestKey {
    pub path: String,
    pub query: String,
}

impl RequestKey {
    #[must_use]
    pub fn new(route: &RoutePath, filters: &FilterState) -> Self {
        Self {
            path: route.joined(),
            query: filters.to_query_string(true),
        }
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.query.is_empty() {
            write!(f, "/{}", self.path)
        } else {
            write!(f, "/{}?{}", self.path, self.query)
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteSession {
    route: RoutePath,
    filters: FilterState,
    default_page_size: u32,
}

impl RouteSession {
    #[must_use]
    pub fn new(path: &str, default_page_size: u32) -> Self {
        Self {
            route: RoutePath::parse(path),
            filters: FilterState::new(default_page_size),
            default_page_size,
        }
    }

    #[must_use]
    pub fn route(&self) -> &RoutePath {
        &self.route
    }

    #[must_use]
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub fn request_key(&self) -> RequestKey {
        RequestKey::new(&self.route, &self.filters)
    }

    /// Moves to a new path. Filters reset whenever the segments change (the
    /// leaf of a nested route may itself be a subcategory, so any structural
    /// change is a different listing); returns `true` if they did.
    pub fn navigate(&mut self, path: &str) -> bool {
        let next = RoutePath::parse(path);
        let changed = next != self.route;
        self.route = next;
        if changed {
            self.filters = FilterState::new(self.default_page_size);
        }
        changed
    }

    /// Replaces the whole filter state.
    pub fn replace_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    /// Resets to page one with no content filters, keeping the page size.
    pub fn clear_filters(&mut self) {
        self.replace_filters(self.filters.cleared());
    }

    /// Applies a sort selection, returning to the first page.
    pub fn apply_sort(&mut self, sort: SortOption) {
        let mut next = self.filters.clone();
        sort.apply(&mut next);
        next.page = 1;
        self.replace_filters(next);
    }

    /// Whether a response requested under `key` may still be applied.
    #[must_use]
    pub fn is_current(&self, key: &RequestKey) -> bool {
        *key == self.request_key()
    }
}
