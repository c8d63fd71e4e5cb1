//! Storefront API payload types.
//!
//! ## Observed shape
//!
//! The catch-all route `GET /{segments}` answers with either a single product
//! or a listing envelope, and nothing in the body says which. Listing
//! envelopes always carry `results`; category listings also carry
//! `categoryName`. See [`crate::classify`] for how the two are told apart.
//!
//! Listing metadata keys are camelCase (`categoryName`, `overLimit`,
//! `productCount`, `hasSubcategories`) while product fields are snake_case
//! (`price_value`, `category_info`).
//!
//! ### `subcategories`
//! Sometimes `null`, sometimes an object when the category has none. Only an
//! array is honoured; anything else deserializes to `None`.
//!
//! ### `results` and `category_info`
//! A product that fails to parse is dropped from `results` rather than
//! failing the page, and `results: null` is an empty page. A crumb without a
//! `slug` is dropped from its chain.
//!
//! ### `price_value`
//! Usually a JSON integer in VND (`150000`), occasionally a decimal string.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A single product as returned by a detail route or inside `results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub price_value: Option<Decimal>,

    /// Medicine-specific detail block. Passed through to presentation as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicine: Option<serde_json::Value>,

    #[serde(
        default,
        deserialize_with = "ok_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_info: Option<CategoryInfo>,

    /// Everything else the backend sends, preserved for presentation.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Product {
    /// The product's category chain, root first. Empty when not provided.
    #[must_use]
    pub fn category_chain(&self) -> &[CategoryCrumb] {
        self.category_info
            .as_ref()
            .map_or(&[], |info| info.category.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    #[serde(default, deserialize_with = "skip_malformed")]
    pub category: Vec<CategoryCrumb>,
}

/// One level of the authoritative category chain attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCrumb {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub slug: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(
        default,
        rename = "productCount",
        alias = "product_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub product_count: Option<u64>,
}

impl Subcategory {
    /// Display name, falling back to the humanized slug.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_owned(),
            _ => crate::route::humanize_slug(&self.slug),
        }
    }
}

/// Listing envelope from `GET /{segments}` when `results` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCollection {
    #[serde(default)]
    pub count: u64,

    /// `null` reads as an empty page; products that do not parse are skipped.
    #[serde(default, deserialize_with = "skip_malformed")]
    pub results: Vec<Product>,

    #[serde(default)]
    pub category_name: Option<String>,

    #[serde(default, deserialize_with = "array_or_none")]
    pub subcategories: Option<Vec<Subcategory>>,

    #[serde(default)]
    pub over_limit: Option<bool>,

    #[serde(default)]
    pub product_count: Option<u64>,

    #[serde(default)]
    pub has_subcategories: Option<bool>,

    /// Ordering the server already applied, if any.
    #[serde(default)]
    pub ordering: Option<String>,
}

/// Response from `GET /dynamic-filters/{categorySlug}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersResponse {
    #[serde(default, deserialize_with = "filter_groups")]
    pub filters: Vec<DynamicFilterGroup>,

    #[serde(default)]
    pub category_name: Option<String>,

    #[serde(default, deserialize_with = "array_or_none")]
    pub subcategories: Option<Vec<Subcategory>>,

    #[serde(default)]
    pub over_limit: Option<bool>,

    #[serde(default)]
    pub product_count: Option<u64>,

    #[serde(default)]
    pub has_subcategories: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Single,
    Multiple,
    Range,
}

/// One facet of the filter sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicFilterGroup {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FilterKind,
    #[serde(default)]
    pub options: Vec<FilterOption>,
}

impl DynamicFilterGroup {
    /// Drops options whose value repeats an earlier one; first wins.
    fn dedup_options(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.options.retain(|opt| seen.insert(opt.value.clone()));
    }

    #[must_use]
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|opt| opt.value == value)
            .map(|opt| opt.label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Accepts any JSON value; yields `Some` only for arrays. Elements that do
/// not parse are skipped.
fn array_or_none<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Like [`array_or_none`], but anything other than an array is empty.
fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(array_or_none::<D, T>(deserializer)?.unwrap_or_default())
}

/// A nested block that does not parse is dropped instead of failing its parent.
fn ok_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn filter_groups<'de, D>(deserializer: D) -> Result<Vec<DynamicFilterGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut groups = skip_malformed::<D, DynamicFilterGroup>(deserializer)?;
    for group in &mut groups {
        group.dedup_options();
    }
    Ok(groups)
}

/// Option values are ids; the backend sends some as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for option value, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_keeps_unknown_fields() {
        let product: Product = serde_json::from_value(json!({
            "id": 42,
            "medicine": {"ingredient": "Paracetamol"},
            "price_value": 150_000,
            "unit": "Hộp"
        }))
        .unwrap();
        assert_eq!(product.id, 42);
        assert_eq!(product.price_value, Some(Decimal::from(150_000)));
        assert_eq!(product.extra.get("unit"), Some(&json!("Hộp")));
        assert!(product.category_chain().is_empty());
    }

    #[test]
    fn price_value_accepts_decimal_string() {
        let product: Product =
            serde_json::from_value(json!({"id": 1, "price_value": "99000.50"})).unwrap();
        assert_eq!(product.price_value, Some(Decimal::new(9_900_050, 2)));
    }

    #[test]
    fn non_array_subcategories_become_none() {
        let collection: ProductCollection = serde_json::from_value(json!({
            "count": 0,
            "results": [],
            "subcategories": {}
        }))
        .unwrap();
        assert!(collection.subcategories.is_none());

        let collection: ProductCollection = serde_json::from_value(json!({
            "count": 0,
            "results": [],
            "subcategories": null
        }))
        .unwrap();
        assert!(collection.subcategories.is_none());
    }

    #[test]
    fn array_subcategories_skip_malformed_entries() {
        let collection: ProductCollection = serde_json::from_value(json!({
            "results": [],
            "subcategories": [{"slug": "a", "name": "A"}, {"name": "no slug"}]
        }))
        .unwrap();
        let subs = collection.subcategories.unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].slug, "a");
    }

    #[test]
    fn filter_group_options_are_unique_by_value() {
        let response: FiltersResponse = serde_json::from_value(json!({
            "filters": [{
                "id": "brand",
                "label": "Thương hiệu",
                "type": "multiple",
                "options": [
                    {"value": 5, "label": "DHG", "count": 12},
                    {"value": "5", "label": "DHG duplicate"},
                    {"value": "9", "label": "Traphaco"}
                ]
            }]
        }))
        .unwrap();
        let group = &response.filters[0];
        assert_eq!(group.kind, FilterKind::Multiple);
        assert_eq!(group.options.len(), 2);
        assert_eq!(group.option_label("5"), Some("DHG"));
        assert_eq!(group.option_label("9"), Some("Traphaco"));
    }

    #[test]
    fn subcategory_display_name_falls_back_to_slug() {
        let sub = Subcategory {
            slug: "vitamin-tong-hop".to_owned(),
            name: None,
            image: None,
            product_count: None,
        };
        assert_eq!(sub.display_name(), "vitamin tong hop");
    }

    #[test]
    fn crumbs_without_slug_are_dropped_from_the_chain() {
        let product: Product = serde_json::from_value(json!({
            "id": 2,
            "category_info": {"category": [
                {"name": "Thuốc"},
                {"name": "Giảm đau", "slug": "giam-dau"}
            ]}
        }))
        .unwrap();
        let slugs: Vec<&str> = product
            .category_chain()
            .iter()
            .map(|c| c.slug.as_str())
            .collect();
        assert_eq!(slugs, ["giam-dau"]);
    }

    #[test]
    fn unreadable_category_info_is_dropped() {
        let product: Product =
            serde_json::from_value(json!({"id": 3, "category_info": "thuoc"})).unwrap();
        assert!(product.category_info.is_none());
    }

    #[test]
    fn null_results_read_as_empty_page() {
        let collection: ProductCollection =
            serde_json::from_value(json!({"results": null, "categoryName": "X"})).unwrap();
        assert!(collection.results.is_empty());
    }

    #[test]
    fn products_that_do_not_parse_are_skipped() {
        let collection: ProductCollection = serde_json::from_value(json!({
            "count": 3,
            "results": [{"id": 1}, {"name": "no id"}, {"id": 3}]
        }))
        .unwrap();
        let ids: Vec<i64> = collection.results.iter().map(|p| p.id).collect();
        assert_eq!(ids, [1, 3]);
        assert_eq!(collection.count, 3);
    }
}
