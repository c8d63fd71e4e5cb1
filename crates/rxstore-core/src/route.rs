//! URL path segmentation for category and product routes.
//!
//! Storefront routes are `/{category-slug}` for a root listing and
//! `/{category-slug}/{...slug}` for anything nested. Whether a nested path is
//! a deeper listing or a product page cannot be known from the path alone;
//! [`RoutePath`] only provides the shape the resolver needs to ask the API.

use serde::Serialize;

/// Ordered, non-empty path segments of a storefront route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RoutePath {
    segments: Vec<String>,
}

impl RoutePath {
    /// Splits a raw path into segments.
    ///
    /// A single leading slash is stripped, and any query string or fragment is
    /// ignored. Empty segments (trailing or doubled slashes) are dropped so
    /// `"a/b/"` has two segments, not three.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let path = raw.split(['?', '#']).next().unwrap_or_default();
        let path = path.strip_prefix('/').unwrap_or(path);
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `true` when the nested resolver owns this path (two or more segments).
    #[must_use]
    pub fn is_valid_nested_path(&self) -> bool {
        self.segments.len() >= 2
    }

    /// `true` for a bare category root such as `/thuc-pham-chuc-nang`.
    #[must_use]
    pub fn is_root_path(&self) -> bool {
        self.segments.len() == 1
    }

    /// All segments but the last, joined with `/`. `None` unless the path is
    /// a valid nested path.
    #[must_use]
    pub fn category_path(&self) -> Option<String> {
        if !self.is_valid_nested_path() {
            return None;
        }
        Some(self.segments[..self.segments.len() - 1].join("/"))
    }

    /// The trailing segment. `None` unless the path is a valid nested path.
    #[must_use]
    pub fn leaf_slug(&self) -> Option<&str> {
        if !self.is_valid_nested_path() {
            return None;
        }
        self.segments.last().map(String::as_str)
    }

    /// The last segment regardless of depth.
    #[must_use]
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Segments joined with `/`, no leading slash. This is exactly the API
    /// path requested for the route.
    #[must_use]
    pub fn joined(&self) -> String {
        self.segments.join("/")
    }
}

impl std::fmt::Display for RoutePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.joined())
    }
}

/// Turns a slug into display text by replacing hyphens with spaces.
#[must_use]
pub fn humanize_slug(slug: &str) -> String {
    slug.replace('-', " ")
}
