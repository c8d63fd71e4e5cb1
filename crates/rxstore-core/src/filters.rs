//! Listing filter state and its query-string form.
//!
//! `page` and `page_size` are pagination and live in dedicated fields; every
//! other key is a content filter. A key whose value is empty is treated as
//! absent everywhere: it is never serialized and never shown as active.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::catalog::DynamicFilterGroup;
use crate::CoreError;

pub const PAGE_KEY: &str = "page";
pub const PAGE_SIZE_KEY: &str = "page_size";

/// Characters left unescaped in query values, matching URL "unreserved".
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(String),
    Multi(Vec<String>),
}

impl FilterValue {
    /// Parses a raw value; a comma inside it means multi-select.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.contains(',') {
            FilterValue::Multi(
                raw.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_owned)
                    .collect(),
            )
        } else {
            FilterValue::Scalar(raw.trim().to_owned())
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Individual selected values, empty ones skipped. A scalar holding a
    /// comma-joined string yields each part.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            FilterValue::Scalar(v) => v
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect(),
            FilterValue::Multi(vs) => vs
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }

    /// Wire form: multi-select values comma-joined.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        self.values().join(",")
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::Multi(values)
    }
}

/// Pagination plus content filters for one listing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub page: u32,
    pub page_size: u32,
    values: BTreeMap<String, FilterValue>,
}

/// A content filter currently narrowing the listing, with display labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveFilter {
    pub key: String,
    pub label: String,
    pub values: Vec<ActiveFilterValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveFilterValue {
    pub value: String,
    pub label: String,
}

impl FilterState {
    /// Fresh state: first page, no content filters.
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            values: BTreeMap::new(),
        }
    }

    /// Sets a key, routing `page`/`page_size` to the pagination fields.
    /// An empty value removes the key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFilter`] when a pagination key is not a
    /// positive integer.
    pub fn set(&mut self, key: &str, value: impl Into<FilterValue>) -> Result<(), CoreError> {
        let value = value.into();
        match key {
            PAGE_KEY => self.page = parse_positive(key, &value)?,
            PAGE_SIZE_KEY => self.page_size = parse_positive(key, &value)?,
            _ if value.is_empty() => {
                self.values.remove(key);
            }
            _ => {
                self.values.insert(key.to_owned(), value);
            }
        }
        Ok(())
    }

    /// Builder-style [`Self::set`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::set`].
    pub fn with(mut self, key: &str, value: impl Into<FilterValue>) -> Result<Self, CoreError> {
        self.set(key, value)?;
        Ok(self)
    }

    /// Sets a content key that is known not to be a pagination key.
    pub(crate) fn set_content(&mut self, key: &str, value: impl Into<FilterValue>) {
        debug_assert!(key != PAGE_KEY && key != PAGE_SIZE_KEY);
        let value = value.into();
        if value.is_empty() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_owned(), value);
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// The value for a content key, `None` when absent or empty.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key).filter(|v| !v.is_empty())
    }

    /// Content filters only; pagination is never included.
    pub fn content_filters(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        self.content_filters().count()
    }

    /// Back to page one with no content filters, keeping the page size.
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self::new(self.page_size)
    }

    /// Query pairs in canonical order: pagination first (when included),
    /// then content keys sorted. Empty values are omitted.
    #[must_use]
    pub fn query_pairs(&self, include_pagination: bool) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.values.len() + 2);
        if include_pagination {
            pairs.push((PAGE_KEY.to_owned(), self.page.to_string()));
            pairs.push((PAGE_SIZE_KEY.to_owned(), self.page_size.to_string()));
        }
        pairs.extend(
            self.content_filters()
                .map(|(k, v)| (k.to_owned(), v.to_query_value())),
        );
        pairs
    }

    /// Percent-encoded query string without the leading `?`. Commas in
    /// multi-select values are encoded (`brand=5%2C9`).
    #[must_use]
    pub fn to_query_string(&self, include_pagination: bool) -> String {
        self.query_pairs(include_pagination)
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_VALUE),
                    utf8_percent_encode(v, QUERY_VALUE)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Active content filters labelled from the sidebar groups when the key
    /// and option are known; raw key and values otherwise.
    #[must_use]
    pub fn active_filters(&self, groups: &[DynamicFilterGroup]) -> Vec<ActiveFilter> {
        self.content_filters()
            .map(|(key, value)| {
                let group = groups.iter().find(|g| g.id == key);
                let values = value
                    .values()
                    .into_iter()
                    .map(|v| ActiveFilterValue {
                        value: v.to_owned(),
                        label: group
                            .and_then(|g| g.option_label(v))
                            .unwrap_or(v)
                            .to_owned(),
                    })
                    .collect();
                ActiveFilter {
                    key: key.to_owned(),
                    label: group.map_or_else(|| key.to_owned(), |g| g.label.clone()),
                    values,
                }
            })
            .collect()
    }
}

fn parse_positive(key: &str, value: &FilterValue) -> Result<u32, CoreError> {
    let raw = value.to_query_value();
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(CoreError::InvalidFilter {
            key: key.to_owned(),
            reason: "must be greater than zero".to_owned(),
        }),
        Err(e) => Err(CoreError::InvalidFilter {
            key: key.to_owned(),
            reason: e.to_string(),
        }),
    }
}
